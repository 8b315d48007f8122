//! A small regular-expression front end producing [`Dfa`] languages.
//!
//! Community and AS-path regexes use search semantics: a pattern matches a
//! string if it matches any substring. To give `^` and `$` a meaning in any
//! position, every string `s` is embedded as `BEGIN s END`, the anchors
//! become those marker symbols, and every language is intersected with the
//! set of well-formed embedded strings.

use crate::automata::{CharClass, Dfa, Nfa, StateId};
use crate::error::{Error, Result};

pub const BEGIN: char = '\u{2}';
pub const END: char = '\u{3}';

/// Upper bound on `{m,n}` repetition counts.
const MAX_REPEAT: u32 = 256;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Regex {
    Empty,
    Class(CharClass),
    Concat(Vec<Regex>),
    Alt(Vec<Regex>),
    Star(Box<Regex>),
    Repeat {
        inner: Box<Regex>,
        min: u32,
        max: Option<u32>,
    },
}

fn markers() -> CharClass {
    CharClass::single(BEGIN).or(&CharClass::single(END))
}

/// Any character that may occur inside a string.
fn any_char() -> CharClass {
    CharClass::full().minus(&markers())
}

fn digit() -> CharClass {
    CharClass::range('0', '9')
}

fn word() -> CharClass {
    CharClass::range('a', 'z')
        .or(&CharClass::range('A', 'Z'))
        .or(&digit())
        .or(&CharClass::single('_'))
}

fn space() -> CharClass {
    [' ', '\t', '\n', '\r', '\u{b}', '\u{c}']
        .into_iter()
        .fold(CharClass::empty(), |acc, c| acc.or(&CharClass::single(c)))
}

struct Parser<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str) -> Self {
        Parser {
            pattern,
            chars: pattern.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::unsupported(format!(
            "regex '{}' at position {}: {}",
            self.pattern, self.pos, message
        ))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next(&mut self) -> Result<char> {
        let c = self.peek().ok_or_else(|| self.error("unexpected end"))?;
        self.pos += 1;
        Ok(c)
    }

    fn parse(mut self) -> Result<Regex> {
        let regex = self.alternation()?;
        if self.pos != self.chars.len() {
            return Err(self.error("unbalanced ')'"));
        }
        Ok(regex)
    }

    fn alternation(&mut self) -> Result<Regex> {
        let mut branches = vec![self.concatenation()?];
        while self.eat('|') {
            branches.push(self.concatenation()?);
        }
        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or(Regex::Empty)
        } else {
            Regex::Alt(branches)
        })
    }

    fn concatenation(&mut self) -> Result<Regex> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.repetition()?);
        }
        Ok(match items.len() {
            0 => Regex::Empty,
            1 => items.pop().unwrap_or(Regex::Empty),
            _ => Regex::Concat(items),
        })
    }

    fn repetition(&mut self) -> Result<Regex> {
        let mut atom = self.atom()?;
        loop {
            atom = match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    Regex::Star(Box::new(atom))
                }
                Some('+') => {
                    self.pos += 1;
                    Regex::Repeat {
                        inner: Box::new(atom),
                        min: 1,
                        max: None,
                    }
                }
                Some('?') => {
                    self.pos += 1;
                    Regex::Repeat {
                        inner: Box::new(atom),
                        min: 0,
                        max: Some(1),
                    }
                }
                Some('{') => {
                    self.pos += 1;
                    let (min, max) = self.bounds()?;
                    Regex::Repeat {
                        inner: Box::new(atom),
                        min,
                        max,
                    }
                }
                _ => return Ok(atom),
            };
            // Lazy and possessive suffixes do not change the language.
            let _ = self.eat('?') || self.eat('+');
        }
    }

    fn number(&mut self) -> Result<Option<u32>> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let n = digits
            .parse::<u32>()
            .map_err(|_| self.error("repetition count too large"))?;
        if n > MAX_REPEAT {
            return Err(self.error("repetition count too large"));
        }
        Ok(Some(n))
    }

    fn bounds(&mut self) -> Result<(u32, Option<u32>)> {
        let min = self
            .number()?
            .ok_or_else(|| self.error("expected repetition count"))?;
        let max = if self.eat(',') {
            self.number()?
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(self.error("expected '}'"));
        }
        if matches!(max, Some(max) if max < min) {
            return Err(self.error("invalid repetition bounds"));
        }
        Ok((min, max))
    }

    fn atom(&mut self) -> Result<Regex> {
        let c = self.next()?;
        Ok(match c {
            '(' => {
                if self.eat('?') && !self.eat(':') {
                    return Err(self.error("unsupported group modifier"));
                }
                let inner = self.alternation()?;
                if !self.eat(')') {
                    return Err(self.error("expected ')'"));
                }
                inner
            }
            '[' => Regex::Class(self.class()?),
            '.' => Regex::Class(any_char()),
            '^' => Regex::Class(CharClass::single(BEGIN)),
            '$' => Regex::Class(CharClass::single(END)),
            '\\' => Regex::Class(self.escape()?),
            '*' | '+' | '?' | '{' => return Err(self.error("nothing to repeat")),
            c => Regex::Class(CharClass::single(c)),
        })
    }

    fn escape(&mut self) -> Result<CharClass> {
        let c = self.next()?;
        Ok(match c {
            'd' => digit(),
            'D' => any_char().minus(&digit()),
            'w' => word(),
            'W' => any_char().minus(&word()),
            's' => space(),
            'S' => any_char().minus(&space()),
            't' => CharClass::single('\t'),
            'n' => CharClass::single('\n'),
            'r' => CharClass::single('\r'),
            c if c.is_ascii_alphanumeric() => {
                return Err(self.error("unsupported escape"));
            }
            c => CharClass::single(c),
        })
    }

    fn class(&mut self) -> Result<CharClass> {
        let negated = self.eat('^');
        let mut class = CharClass::empty();
        let mut first = true;
        loop {
            let c = self.next()?;
            if c == ']' && !first {
                break;
            }
            first = false;
            let lo = if c == '\\' {
                let escaped = self.escape()?;
                match escaped.ranges() {
                    [(a, b)] if a == b => char::from_u32(*a).unwrap_or(c),
                    _ => {
                        class = class.or(&escaped);
                        continue;
                    }
                }
            } else {
                c
            };
            if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                self.pos += 1;
                let mut hi = self.next()?;
                if hi == '\\' {
                    hi = self.next()?;
                }
                if hi < lo {
                    return Err(self.error("invalid character range"));
                }
                class = class.or(&CharClass::range(lo, hi));
            } else {
                class = class.or(&CharClass::single(lo));
            }
        }
        Ok(if negated {
            any_char().minus(&class)
        } else {
            class.minus(&markers())
        })
    }
}

pub fn parse(pattern: &str) -> Result<Regex> {
    Parser::new(pattern).parse()
}

impl Regex {
    /// Thompson construction of the fragment `from -> ... -> to`.
    fn build(&self, nfa: &mut Nfa, from: StateId, to: StateId) {
        match self {
            Regex::Empty => nfa.add_epsilon(from, to),
            Regex::Class(class) => nfa.add_transition(from, class.clone(), to),
            Regex::Concat(items) => {
                let mut cur = from;
                for (i, item) in items.iter().enumerate() {
                    let next = if i + 1 == items.len() {
                        to
                    } else {
                        nfa.add_state()
                    };
                    item.build(nfa, cur, next);
                    cur = next;
                }
            }
            Regex::Alt(branches) => {
                for branch in branches {
                    branch.build(nfa, from, to);
                }
            }
            Regex::Star(inner) => {
                let hub = nfa.add_state();
                nfa.add_epsilon(from, hub);
                inner.build(nfa, hub, hub);
                nfa.add_epsilon(hub, to);
            }
            Regex::Repeat { inner, min, max } => {
                let mut cur = from;
                for _ in 0..*min {
                    let next = nfa.add_state();
                    inner.build(nfa, cur, next);
                    cur = next;
                }
                match max {
                    None => Regex::Star(inner.clone()).build(nfa, cur, to),
                    Some(max) => {
                        for _ in *min..*max {
                            let next = nfa.add_state();
                            nfa.add_epsilon(cur, to);
                            inner.build(nfa, cur, next);
                            cur = next;
                        }
                        nfa.add_epsilon(cur, to);
                    }
                }
            }
        }
    }
}

/// All well-formed embedded strings: `BEGIN (any)* END`.
pub fn universe() -> Dfa {
    let regex = Regex::Concat(vec![
        Regex::Class(CharClass::single(BEGIN)),
        Regex::Star(Box::new(Regex::Class(any_char()))),
        Regex::Class(CharClass::single(END)),
    ]);
    to_dfa(&regex)
}

fn to_dfa(regex: &Regex) -> Dfa {
    let mut nfa = Nfa::new();
    let (start, accept) = (nfa.start, nfa.accept);
    regex.build(&mut nfa, start, accept);
    nfa.determinize()
}

/// Embedded strings containing a match of `pattern`.
pub fn search_language(pattern: &str) -> Result<Dfa> {
    let regex = parse(pattern)?;
    let anything = Regex::Star(Box::new(Regex::Class(CharClass::full())));
    let search = Regex::Concat(vec![anything.clone(), regex, anything]);
    Ok(to_dfa(&search).intersection(&universe()))
}

/// The single embedded string `value`.
pub fn literal_language(value: &str) -> Dfa {
    let regex = Regex::Concat(
        std::iter::once(BEGIN)
            .chain(value.chars())
            .chain(std::iter::once(END))
            .map(|c| Regex::Class(CharClass::single(c)))
            .collect(),
    );
    to_dfa(&regex)
}

pub fn embed(value: &str) -> String {
    format!("{}{}{}", BEGIN, value, END)
}

/// Inverse of [`embed`] for witnesses produced by [`Dfa::shortest_path`].
pub fn unembed(word: &[char]) -> String {
    word.iter().filter(|&&c| c != BEGIN && c != END).collect()
}

/// Does `value` contain a match of `pattern`?
pub fn is_match(pattern: &str, value: &str) -> Result<bool> {
    Ok(search_language(pattern)?.accepts(&embed(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_search_semantics() {
        assert!(is_match("40", "10 40 50").unwrap());
        assert!(is_match(" 40$", "10 40").unwrap());
        assert!(!is_match(" 40$", "10 40 50").unwrap());
        assert!(is_match("^30:", "30:20").unwrap());
        assert!(!is_match("^30:", "130:20").unwrap());
        assert!(is_match(":20$", "30:20").unwrap());
        assert!(is_match("^$", "").unwrap());
        assert!(!is_match("^$", "1").unwrap());
    }

    #[test]
    fn test_anchor_inside_alternation() {
        assert!(is_match("(^| )40( |$)", "40").unwrap());
        assert!(is_match("(^| )40( |$)", "10 40 20").unwrap());
        assert!(!is_match("(^| )40( |$)", "140").unwrap());
    }

    #[test]
    fn test_classes_and_repetition() {
        assert!(is_match("^[0-9]+:[1-3]{2}$", "65000:13").unwrap());
        assert!(!is_match("^[0-9]+:[1-3]{2}$", "65000:14").unwrap());
        assert!(is_match("^\\d{1,3}$", "123").unwrap());
        assert!(!is_match("^\\d{1,3}$", "1234").unwrap());
        assert!(is_match("^[^:]*$", "abc").unwrap());
        assert!(!is_match("^[^:]*$", "a:c").unwrap());
        assert!(is_match("^a.c$", "abc").unwrap());
        assert!(is_match("^(?:ab)*$", "abab").unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("(ab"), Err(Error::Unsupported(_))));
        assert!(matches!(parse("ab)"), Err(Error::Unsupported(_))));
        assert!(matches!(parse("*a"), Err(Error::Unsupported(_))));
        assert!(matches!(parse("a{3,1}"), Err(Error::Unsupported(_))));
        assert!(matches!(parse("\\p{L}"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_literal_language() {
        let dfa = literal_language("30:20");
        assert!(dfa.accepts(&embed("30:20")));
        assert!(!dfa.accepts(&embed("30:200")));
        assert!(literal_language("1:1").difference(&universe()).is_empty());
        assert_eq!(unembed(&dfa.shortest_path().unwrap()), "30:20");
    }
}
