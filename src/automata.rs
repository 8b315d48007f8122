//! Symbolic finite automata over Unicode characters.
//!
//! Transitions are labelled with [`CharClass`] predicates instead of single
//! characters. Every [`Dfa`] built here is complete: each state has an
//! outgoing edge for every character, so complement is a flip of the
//! accepting flags and products never lose strings.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

const MAX_CHAR: u32 = 0x10FFFF;

/// Characters tried first when a witness string is generated.
const PREFERRED_CHARS: &str = "0123456789: abcdefghijklmnopqrstuvwxyz";

/// A set of characters as sorted, disjoint, non-adjacent inclusive ranges.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CharClass {
    ranges: Vec<(u32, u32)>,
}

impl CharClass {
    pub fn empty() -> Self {
        CharClass { ranges: Vec::new() }
    }

    pub fn full() -> Self {
        CharClass {
            ranges: vec![(0, MAX_CHAR)],
        }
    }

    /// Normalize arbitrary ranges (unsorted, overlapping) into a class.
    pub fn from_ranges(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.sort_unstable();
        let mut out = Vec::<(u32, u32)>::new();
        for (a, b) in ranges {
            if a > b {
                continue;
            }
            if let Some(last) = out.last_mut() {
                if a <= last.1.saturating_add(1) {
                    last.1 = last.1.max(b);
                    continue;
                }
            }
            out.push((a, b));
        }
        CharClass { ranges: out }
    }

    pub fn single(ch: char) -> Self {
        let u = ch as u32;
        CharClass { ranges: vec![(u, u)] }
    }

    pub fn range(a: char, b: char) -> Self {
        CharClass::from_ranges(vec![(a as u32, b as u32)])
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn contains(&self, c: char) -> bool {
        let u = c as u32;
        self.ranges
            .binary_search_by(|&(s, e)| {
                if e < u {
                    std::cmp::Ordering::Less
                } else if s > u {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn and(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a1, b1) = self.ranges[i];
            let (a2, b2) = other.ranges[j];
            let lo = a1.max(a2);
            let hi = b1.min(b2);
            if lo <= hi {
                out.push((lo, hi));
            }
            if b1 < b2 {
                i += 1;
            } else {
                j += 1;
            }
        }
        CharClass::from_ranges(out)
    }

    pub fn or(&self, other: &Self) -> Self {
        let mut all = self.ranges.clone();
        all.extend(other.ranges.iter());
        CharClass::from_ranges(all)
    }

    pub fn not(&self) -> Self {
        let mut out = Vec::new();
        let mut cur = 0u32;
        for &(s, e) in &self.ranges {
            if cur < s {
                out.push((cur, s - 1));
            }
            cur = e + 1;
        }
        if cur <= MAX_CHAR {
            out.push((cur, MAX_CHAR));
        }
        CharClass { ranges: out }
    }

    pub fn minus(&self, other: &Self) -> Self {
        self.and(&other.not())
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// A representative character, readable ones first.
    pub fn sample(&self) -> Option<char> {
        if let Some(c) = PREFERRED_CHARS.chars().find(|&c| self.contains(c)) {
            return Some(c);
        }
        self.ranges.iter().find_map(|&(s, e)| first_char(s, e))
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for &(a, b) in &self.ranges {
            if a == b {
                write!(f, "{:x};", a)?;
            } else {
                write!(f, "{:x}-{:x};", a, b)?;
            }
        }
        write!(f, "]")
    }
}

pub type StateId = usize;

/// Nondeterministic automaton with epsilon moves, one start and one accepting state.
#[derive(Clone, Debug)]
pub struct Nfa {
    transitions: Vec<Vec<(Option<CharClass>, StateId)>>,
    pub start: StateId,
    pub accept: StateId,
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

impl Nfa {
    pub fn new() -> Self {
        Nfa {
            transitions: vec![Vec::new(), Vec::new()],
            start: 0,
            accept: 1,
        }
    }

    pub fn add_state(&mut self) -> StateId {
        self.transitions.push(Vec::new());
        self.transitions.len() - 1
    }

    pub fn add_transition(&mut self, from: StateId, label: CharClass, to: StateId) {
        self.transitions[from].push((Some(label), to));
    }

    pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.transitions[from].push((None, to));
    }

    fn closure(&self, states: impl IntoIterator<Item = StateId>) -> BTreeSet<StateId> {
        let mut set = BTreeSet::new();
        let mut stack: Vec<StateId> = states.into_iter().collect();
        while let Some(s) = stack.pop() {
            if set.insert(s) {
                for (label, t) in &self.transitions[s] {
                    if label.is_none() {
                        stack.push(*t);
                    }
                }
            }
        }
        set
    }

    /// Subset construction. The result is complete and minimal.
    pub fn determinize(&self) -> Dfa {
        let mut index: HashMap<BTreeSet<StateId>, StateId> = HashMap::new();
        let mut sets: Vec<BTreeSet<StateId>> = Vec::new();
        let mut dfa = Dfa::default();
        let mut queue = VecDeque::new();

        let start = self.closure([self.start]);
        index.insert(start.clone(), 0);
        sets.push(start);
        dfa.push_state(false);
        queue.push_back(0);

        while let Some(id) = queue.pop_front() {
            let set = sets[id].clone();
            dfa.accepting[id] = set.contains(&self.accept);

            let labels: Vec<&CharClass> = set
                .iter()
                .flat_map(|&s| self.transitions[s].iter())
                .filter_map(|(label, _)| label.as_ref())
                .collect();

            // Group the atoms of the local alphabet by their target set.
            let mut grouped: BTreeMap<BTreeSet<StateId>, Vec<(u32, u32)>> = BTreeMap::new();
            for (lo, hi) in atoms(&labels) {
                let Some(c) = first_char(lo, hi) else {
                    continue;
                };
                let targets = set.iter().flat_map(|&s| {
                    self.transitions[s].iter().filter_map(move |(label, t)| match label {
                        Some(label) if label.contains(c) => Some(*t),
                        _ => None,
                    })
                });
                let target = self.closure(targets);
                grouped.entry(target).or_default().push((lo, hi));
            }

            for (target, ranges) in grouped {
                let tid = match index.get(&target) {
                    Some(&tid) => tid,
                    None => {
                        let tid = sets.len();
                        index.insert(target.clone(), tid);
                        sets.push(target);
                        dfa.push_state(false);
                        queue.push_back(tid);
                        tid
                    }
                };
                dfa.transitions[id].push((CharClass::from_ranges(ranges), tid));
            }
        }

        dfa.minimize()
    }
}

fn first_char(lo: u32, hi: u32) -> Option<char> {
    [lo, 0xE000.max(lo)]
        .into_iter()
        .filter(|&u| u <= hi)
        .find_map(char::from_u32)
}

/// Split the alphabet into maximal intervals on which every label is constant.
fn atoms(labels: &[&CharClass]) -> Vec<(u32, u32)> {
    let mut bounds = BTreeSet::new();
    bounds.insert(0u32);
    for label in labels {
        for &(a, b) in label.ranges() {
            bounds.insert(a);
            if b < MAX_CHAR {
                bounds.insert(b + 1);
            }
        }
    }
    let bounds: Vec<u32> = bounds.into_iter().collect();
    bounds
        .iter()
        .enumerate()
        .map(|(i, &lo)| {
            let hi = bounds.get(i + 1).map_or(MAX_CHAR, |&next| next - 1);
            (lo, hi)
        })
        .collect()
}

/// Complete deterministic automaton. State 0 is the start state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Dfa {
    accepting: Vec<bool>,
    transitions: Vec<Vec<(CharClass, StateId)>>,
}

impl Dfa {
    fn push_state(&mut self, accepting: bool) -> StateId {
        self.accepting.push(accepting);
        self.transitions.push(Vec::new());
        self.accepting.len() - 1
    }

    /// The language of all strings (`full`) or no strings.
    pub fn trivial(full: bool) -> Self {
        let mut dfa = Dfa::default();
        dfa.push_state(full);
        dfa.transitions[0].push((CharClass::full(), 0));
        dfa
    }

    pub fn num_states(&self) -> usize {
        self.accepting.len()
    }

    fn step(&self, state: StateId, c: char) -> Option<StateId> {
        self.transitions[state]
            .iter()
            .find(|(label, _)| label.contains(c))
            .map(|&(_, t)| t)
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut cur = 0;
        for c in input.chars() {
            match self.step(cur, c) {
                Some(next) => cur = next,
                None => return false,
            }
        }
        self.accepting[cur]
    }

    pub fn complement(&self) -> Self {
        let mut out = self.clone();
        for a in &mut out.accepting {
            *a = !*a;
        }
        out
    }

    pub fn intersection(&self, other: &Self) -> Self {
        self.product(other, |a, b| a && b)
    }

    pub fn union(&self, other: &Self) -> Self {
        self.product(other, |a, b| a || b)
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.product(other, |a, b| a && !b)
    }

    fn product(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        let mut index: HashMap<(StateId, StateId), StateId> = HashMap::new();
        let mut pairs = vec![(0, 0)];
        let mut out = Dfa::default();
        index.insert((0, 0), 0);
        out.push_state(op(self.accepting[0], other.accepting[0]));

        let mut i = 0;
        while i < pairs.len() {
            let (p, q) = pairs[i];
            for (lp, tp) in &self.transitions[p] {
                for (lq, tq) in &other.transitions[q] {
                    let label = lp.and(lq);
                    if label.is_empty() {
                        continue;
                    }
                    let key = (*tp, *tq);
                    let tid = match index.get(&key) {
                        Some(&tid) => tid,
                        None => {
                            let tid = out.push_state(op(self.accepting[*tp], other.accepting[*tq]));
                            index.insert(key, tid);
                            pairs.push(key);
                            tid
                        }
                    };
                    out.transitions[i].push((label, tid));
                }
            }
            i += 1;
        }

        out.minimize()
    }

    pub fn is_empty(&self) -> bool {
        self.shortest_path().is_none()
    }

    /// Both automata accept the same language.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.difference(other).is_empty() && other.difference(self).is_empty()
    }

    /// A shortest accepted string, if the language is not empty.
    pub fn shortest_path(&self) -> Option<Vec<char>> {
        let mut prev: Vec<Option<(StateId, char)>> = vec![None; self.num_states()];
        let mut visited = vec![false; self.num_states()];
        let mut queue = VecDeque::new();
        visited[0] = true;
        queue.push_back(0);

        while let Some(s) = queue.pop_front() {
            if self.accepting[s] {
                let mut word = Vec::new();
                let mut cur = s;
                while let Some((p, c)) = prev[cur] {
                    word.push(c);
                    cur = p;
                }
                word.reverse();
                return Some(word);
            }
            for (label, t) in &self.transitions[s] {
                if visited[*t] {
                    continue;
                }
                if let Some(c) = label.sample() {
                    visited[*t] = true;
                    prev[*t] = Some((s, c));
                    queue.push_back(*t);
                }
            }
        }
        None
    }

    /// Moore partition refinement. Also merges parallel edges.
    pub fn minimize(&self) -> Self {
        let n = self.num_states();
        let mut block: Vec<usize> = self.accepting.iter().map(|&a| a as usize).collect();
        let mut count = 0;

        loop {
            let mut ids: BTreeMap<(usize, Vec<(usize, CharClass)>), usize> = BTreeMap::new();
            let mut next = vec![0; n];
            for s in 0..n {
                let sig = (block[s], self.signature(s, &block));
                let len = ids.len();
                next[s] = *ids.entry(sig).or_insert(len);
            }
            let new_count = ids.len();
            block = next;
            if new_count == count {
                break;
            }
            count = new_count;
        }

        let mut out = Dfa::default();
        let mut representative = vec![usize::MAX; count];
        for s in 0..n {
            if representative[block[s]] == usize::MAX {
                representative[block[s]] = s;
                out.push_state(self.accepting[s]);
            }
        }
        for (b, &s) in representative.iter().enumerate() {
            out.transitions[b] = self
                .signature(s, &block)
                .into_iter()
                .map(|(target, label)| (label, target))
                .collect();
        }
        out
    }

    fn signature(&self, s: StateId, block: &[usize]) -> Vec<(usize, CharClass)> {
        let mut grouped: BTreeMap<usize, CharClass> = BTreeMap::new();
        for (label, t) in &self.transitions[s] {
            let entry = grouped.entry(block[*t]).or_insert_with(CharClass::empty);
            *entry = entry.or(label);
        }
        grouped.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// Automaton for `prefix` followed by anything.
    fn starts_with(prefix: &str) -> Dfa {
        let mut nfa = Nfa::new();
        let mut cur = nfa.start;
        for c in prefix.chars() {
            let next = nfa.add_state();
            nfa.add_transition(cur, CharClass::single(c), next);
            cur = next;
        }
        nfa.add_epsilon(cur, nfa.accept);
        nfa.add_transition(nfa.accept, CharClass::full(), nfa.accept);
        nfa.determinize()
    }

    #[test]
    fn test_char_class_ops() {
        let a = CharClass::range('a', 'f');
        let b = CharClass::range('d', 'k');
        assert_eq!(a.and(&b), CharClass::range('d', 'f'));
        assert_eq!(a.or(&b), CharClass::range('a', 'k'));
        assert_eq!(a.minus(&b), CharClass::range('a', 'c'));
        assert!(a.not().contains('z'));
        assert!(!a.not().contains('b'));
        assert_eq!(CharClass::full().not(), CharClass::empty());
        assert_eq!(a.not().not(), a);
    }

    #[test]
    fn test_sample_prefers_readable() {
        assert_eq!(CharClass::full().sample(), Some('0'));
        assert_eq!(CharClass::single('\u{2}').sample(), Some('\u{2}'));
        assert_eq!(CharClass::empty().sample(), None);
    }

    #[test]
    fn test_determinize_and_accept() {
        let dfa = starts_with("ab");
        assert!(dfa.accepts("ab"));
        assert!(dfa.accepts("abc"));
        assert!(!dfa.accepts("a"));
        assert!(!dfa.accepts("ba"));
        // start, "a" seen, accepting, sink
        assert_eq!(dfa.num_states(), 4);
    }

    #[test]
    fn test_boolean_operations() {
        let a = starts_with("a");
        let ab = starts_with("ab");

        let diff = a.difference(&ab);
        assert!(diff.accepts("a"));
        assert!(diff.accepts("ac"));
        assert!(!diff.accepts("abc"));

        assert!(ab.difference(&a).is_empty());
        assert!(a.union(&ab).equivalent(&a));
        assert!(a.intersection(&ab).equivalent(&ab));
        assert!(!a.equivalent(&ab));
        assert!(a.intersection(&a.complement()).is_empty());
    }

    #[test]
    fn test_shortest_path() {
        let dfa = starts_with("xy");
        assert_eq!(dfa.shortest_path(), Some(vec!['x', 'y']));
        assert_eq!(Dfa::trivial(false).shortest_path(), None);
        assert_eq!(Dfa::trivial(true).shortest_path(), Some(vec![]));
    }
}
