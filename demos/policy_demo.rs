use clap::Parser;

use route_bdd::analysis::{accepted_routes, count_routes, denied_routes, weakest_precondition};
use route_bdd::ast::{
    AsPathMatchExpr, BooleanExpr, Community, CommunityMatchExpr, CommunitySetExpr, LineAction,
    Statement,
};
use route_bdd::config::{AsPathAccessList, Configuration, RouteFilterList, RoutingPolicy};
use route_bdd::model::{example_path, examples};
use route_bdd::prefix::PrefixRange;
use route_bdd::settings::{AnalysisConfig, ExplorationMode};
use route_bdd::transfer::TransferBdd;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Policy to analyse.
    #[arg(value_name = "NAME", default_value = "import")]
    policy: String,

    /// BDD size (in bits, so the actual size is `2^size` nodes).
    #[clap(long, value_name = "INT", default_value = "20")]
    size: usize,

    /// Number of example routes to print.
    #[clap(long, value_name = "INT", default_value = "3")]
    examples: usize,

    /// Let guards see attributes written earlier in the policy.
    #[clap(long)]
    output_attributes: bool,

    /// Print every control-flow path.
    #[clap(long)]
    paths: bool,

    /// Debug logging.
    #[clap(short, long)]
    verbose: bool,
}

/// A small edge-router configuration.
fn sample_config() -> color_eyre::Result<Configuration> {
    let customers = RouteFilterList::new(
        "customers",
        vec![
            (LineAction::Deny, PrefixRange::new("10.0.0.0/8".parse()?, 8, 32)),
            (LineAction::Permit, PrefixRange::new("100.64.0.0/10".parse()?, 16, 24)),
            (LineAction::Permit, PrefixRange::new("203.0.113.0/24".parse()?, 24, 32)),
        ],
    );
    let transit = AsPathAccessList::new(
        "transit",
        vec![(LineAction::Permit, " 174 "), (LineAction::Permit, " 3356 ")],
    );

    let no_export = Community::standard(65535, 65281);
    let blackhole = Community::standard(65535, 666);

    let tag_customer = RoutingPolicy::new(
        "tag-customer",
        vec![
            Statement::SetCommunities(CommunitySetExpr::Union(vec![
                CommunitySetExpr::Input,
                CommunitySetExpr::Literal(vec![Community::standard(64500, 100)]),
            ])),
            Statement::set_local_preference(200),
            Statement::return_true(),
        ],
    );

    let import = RoutingPolicy::new(
        "import",
        vec![
            Statement::if_then(
                BooleanExpr::has_community(CommunityMatchExpr::Is(blackhole)),
                vec![Statement::reject()],
            ),
            Statement::if_then(
                BooleanExpr::and(vec![
                    BooleanExpr::match_route_filter("customers"),
                    BooleanExpr::call("tag-customer"),
                ]),
                vec![Statement::accept()],
            ),
            Statement::if_then(
                BooleanExpr::MatchAsPath(AsPathMatchExpr::list("transit")),
                vec![
                    Statement::set_local_preference(80),
                    Statement::SetCommunities(CommunitySetExpr::Difference(
                        Box::new(CommunitySetExpr::Input),
                        CommunityMatchExpr::Is(no_export),
                    )),
                    Statement::accept(),
                ],
            ),
            Statement::reject(),
        ],
    );

    Ok(Configuration::new("edge1")
        .with_route_filter_list(customers)
        .with_as_path_access_list(transit)
        .with_policy(tag_customer)
        .with_policy(import))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = if args.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let config = sample_config()?;
    let settings = AnalysisConfig::default()
        .with_storage_bits(args.size)
        .with_output_attributes(args.output_attributes)
        .with_mode(ExplorationMode::Merged);
    let tbdd = TransferBdd::new(&config, settings)?;
    let bdd = tbdd.bdd();
    println!("bdd = {:?}", bdd);
    println!("layout = {:?}", tbdd.layout());

    let result = tbdd.interpret(&args.policy)?;
    println!(
        "accept condition of size {}: {}",
        bdd.size(result.accept()),
        bdd.to_bracket_string(result.accept())
    );
    println!("changed fields: {:?}", result.route.diff(tbdd.input_route()));

    let paths = tbdd.paths(&args.policy)?;
    let accepted = accepted_routes(bdd, &paths);
    let denied = denied_routes(bdd, &paths);
    assert_eq!(accepted, result.accept());
    println!(
        "{} paths, {} accepted and {} denied assignments",
        paths.len(),
        count_routes(bdd, tbdd.layout(), accepted),
        count_routes(bdd, tbdd.layout(), denied)
    );

    if args.paths {
        for (i, path) in paths.iter().enumerate() {
            let verdict = if path.accepted { "accept" } else { "deny" };
            match example_path(&tbdd, path) {
                Some((input, output)) => {
                    println!("path #{} ({}):", i, verdict);
                    println!("  in:  {}", input);
                    println!("  out: {}", output);
                }
                None => println!("path #{} ({}): no well-formed route", i, verdict),
            }
        }
    }

    println!("Accepted routes:");
    for route in examples(&tbdd, accepted, args.examples) {
        println!("  {}", route);
    }
    println!("Denied routes:");
    for route in examples(&tbdd, denied, args.examples) {
        println!("  {}", route);
    }

    let lp200 = weakest_precondition(bdd, &paths, |route| route.local_preference.value(bdd, 200));
    println!("Routes leaving with local preference 200:");
    for route in examples(&tbdd, lp200, args.examples) {
        println!("  {}", route);
    }

    println!("bdd = {:?}", bdd);
    println!("nodes: {} of {}", bdd.num_nodes(), bdd.capacity());
    let (hits, misses) = bdd.cache_stats();
    println!("cache hits: {}, misses: {}", hits, misses);

    let time_total = time_total.elapsed();
    println!("\nDone in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
