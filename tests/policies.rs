use route_bdd::analysis::{accepted_routes, count_routes, denied_routes, weakest_precondition};
use route_bdd::ast::{
    BooleanExpr, Community, CommunityMatchExpr, CommunitySetExpr, LineAction, Statement,
};
use route_bdd::config::{Configuration, RouteFilterList, RoutingPolicy};
use route_bdd::error::Error;
use route_bdd::model::{example, examples};
use route_bdd::prefix::{Prefix, PrefixRange};
use route_bdd::settings::{AnalysisConfig, ExplorationMode};
use route_bdd::transfer::TransferBdd;
use test_log::test;

fn net(s: &str) -> Prefix {
    s.parse().unwrap()
}

fn config() -> Configuration {
    let blackhole = Community::standard(65535, 666);
    Configuration::new("edge1")
        .with_route_filter_list(RouteFilterList::new(
            "customers",
            vec![
                (LineAction::Deny, PrefixRange::new(net("10.0.0.0/8"), 8, 32)),
                (LineAction::Permit, PrefixRange::new(net("100.64.0.0/10"), 16, 24)),
            ],
        ))
        .with_policy(RoutingPolicy::new(
            "mark",
            vec![
                Statement::SetCommunities(CommunitySetExpr::Union(vec![
                    CommunitySetExpr::Input,
                    CommunitySetExpr::Literal(vec![Community::standard(64500, 100)]),
                ])),
                Statement::set_local_preference(200),
                Statement::return_true(),
            ],
        ))
        .with_policy(RoutingPolicy::new(
            "import",
            vec![
                Statement::if_then(
                    BooleanExpr::has_community(CommunityMatchExpr::Is(blackhole)),
                    vec![Statement::reject()],
                ),
                Statement::if_then(
                    BooleanExpr::and(vec![
                        BooleanExpr::match_route_filter("customers"),
                        BooleanExpr::call("mark"),
                    ]),
                    vec![Statement::accept()],
                ),
                Statement::reject(),
            ],
        ))
}

#[test]
fn test_accepted_routes_are_customers() {
    let config = config();
    let tbdd = TransferBdd::new(&config, AnalysisConfig::default()).unwrap();
    let result = tbdd.interpret("import").unwrap();
    let bdd = tbdd.bdd();

    let lp200 = result.route.local_preference.value(bdd, 200);
    assert!(bdd.is_implies(result.accept(), lp200));

    let customers = PrefixRange::new(net("100.64.0.0/10"), 16, 24);
    for route in examples(&tbdd, result.accept(), 5) {
        assert!(customers.includes(&route.prefix), "{}", route);
        assert!(!route.communities.iter().any(|c| c == "65535:666"), "{}", route);
    }
}

#[test]
fn test_modes_agree() {
    let config = config();
    let merged = TransferBdd::new(&config, AnalysisConfig::default()).unwrap();
    let settings = AnalysisConfig::default().with_mode(ExplorationMode::Paths);
    let paths = TransferBdd::new(&config, settings).unwrap();

    // Separate pools, so compare through witnesses and counts.
    let a = merged.interpret("import").unwrap();
    let b = paths.interpret("import").unwrap();
    assert_eq!(
        count_routes(merged.bdd(), merged.layout(), a.accept()),
        count_routes(paths.bdd(), paths.layout(), b.accept())
    );
}

#[test]
fn test_path_queries() {
    let config = config();
    let tbdd = TransferBdd::new(&config, AnalysisConfig::default()).unwrap();
    let bdd = tbdd.bdd();
    let paths = tbdd.paths("import").unwrap();
    let result = tbdd.interpret("import").unwrap();

    let accepted = accepted_routes(bdd, &paths);
    let denied = denied_routes(bdd, &paths);
    assert_eq!(accepted, result.accept());
    assert_eq!(denied, -accepted);

    let lp200 = weakest_precondition(bdd, &paths, |route| route.local_preference.value(bdd, 200));
    assert_eq!(lp200, accepted);
    let lp100 = weakest_precondition(bdd, &paths, |route| route.local_preference.value(bdd, 100));
    assert!(bdd.is_zero(lp100));

    let denied_example = example(&tbdd, denied).unwrap();
    assert!(!PrefixRange::new(net("100.64.0.0/10"), 16, 24).includes(&denied_example.prefix)
        || denied_example.communities.iter().any(|c| c == "65535:666"));
}

#[test]
fn test_errors_surface() {
    let config = config();
    let tbdd = TransferBdd::new(&config, AnalysisConfig::default()).unwrap();
    assert!(matches!(tbdd.interpret("export"), Err(Error::MalformedReference { .. })));

    let invalid = AnalysisConfig::default().with_storage_bits(40);
    assert!(matches!(TransferBdd::new(&config, invalid), Err(Error::InvalidConfig(_))));
}
