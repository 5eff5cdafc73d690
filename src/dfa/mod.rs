/*!
Ahead-of-time compiled dense DFAs.

A [`Regex`] here is a set of three table driven DFAs built by full subset
construction over a Thompson NFA. A search makes up to three linear
passes, each a tight loop of one table load per input byte:

1. An unanchored forward DFA scans for the end of a match. Its subsets
   are priority ordered and pruned at match states, and merging of fresh
   start states stops once a match has been seen, so the final match end
   it reports belongs to a match starting at the leftmost possible
   offset.
2. An anchored DFA over the reversed pattern scans backwards from that
   end and reports the smallest start whose span matches.
3. An anchored forward DFA scans from that start and reports the largest
   end, upgrading the result to leftmost-longest.

The construction refuses patterns it cannot express as plain tables:
`^`/`$` assertions would need position aware start states, and patterns
matching the empty string would need the unanchored pass to accept
everywhere. Callers fall back to the NFA simulation for those, which
reports identical results where both engines apply. Transition tables
are compressed by byte equivalence classes, so a typical DNA pattern
needs a handful of columns rather than 256.
*/

use core::mem::size_of;
use std::collections::HashMap;

use crate::{
    nfa::thompson::{State, NFA},
    search::{Input, Match},
    util::{alphabet::ByteClasses, primitives::StateID, sparse::SparseSet},
};

/// The identifier of the dead state in every DFA.
const DEAD: u32 = 0;

/// An error that can occur while compiling DFAs from an NFA.
#[non_exhaustive]
#[derive(Clone, Debug, thiserror::Error)]
pub enum BuildError {
    #[error("patterns with ^ or $ cannot be compiled to a DFA")]
    HasLook,
    #[error("patterns matching the empty string cannot be compiled to a DFA")]
    MatchesEmpty,
    #[error("DFA exceeded size limit of {limit} bytes")]
    TooBig { limit: usize },
}

/// Configuration for DFA construction.
#[derive(Clone, Debug)]
pub struct Config {
    size_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Cap the total size of each DFA's transition table. Subset
    /// construction is worst case exponential in the NFA, so a cap is
    /// kept on by default and hitting it reports
    /// [`BuildError::TooBig`].
    pub fn size_limit(mut self, limit: Option<usize>) -> Config {
        self.size_limit = limit;
        self
    }

    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit
    }
}

impl Default for Config {
    fn default() -> Config {
        Config { size_limit: Some(1 << 26) }
    }
}

/// A fully compiled search engine for one pattern.
#[derive(Clone, Debug)]
pub struct Regex {
    /// Unanchored, priority pruned. Finds the end of a leftmost match.
    search: DFA,
    /// Anchored over the reversed pattern. Finds the match start.
    reverse: DFA,
    /// Anchored over the forward pattern. Extends the start to the
    /// longest end.
    anchored: DFA,
}

impl Regex {
    /// Compile the forward and reverse NFAs of one pattern into DFAs.
    ///
    /// The NFAs must be built from the same pattern, one with
    /// [`thompson::Config::reverse`](crate::nfa::thompson::Config::reverse)
    /// set.
    pub fn build(
        nfa: &NFA,
        reverse_nfa: &NFA,
        config: &Config,
    ) -> Result<Regex, BuildError> {
        if nfa.has_look() {
            return Err(BuildError::HasLook);
        }
        if nfa.matches_empty() {
            return Err(BuildError::MatchesEmpty);
        }
        let search = Determinizer::new(nfa, Kind::Unanchored, config).build()?;
        let anchored = Determinizer::new(nfa, Kind::Anchored, config).build()?;
        let reverse =
            Determinizer::new(reverse_nfa, Kind::Anchored, config).build()?;
        Ok(Regex { search, reverse, anchored })
    }

    /// Find the leftmost-longest match within the input's span.
    pub fn find(&self, input: &Input<'_>) -> Option<Match> {
        let haystack = input.haystack();
        let end = self.search.find_fwd(haystack, input.start(), input.end())?;
        let start = self
            .reverse
            .find_rev(haystack, input.start(), end)
            .expect("reverse scan finds the start of a known match");
        let end = self
            .anchored
            .find_fwd(haystack, start, input.end())
            .expect("anchored scan rediscovers a known match");
        Some(Match::new(start, end))
    }

    pub fn is_match(&self, input: &Input<'_>) -> bool {
        self.search
            .find_fwd(input.haystack(), input.start(), input.end())
            .is_some()
    }

    /// Heap used by the three transition tables, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.search.memory_usage()
            + self.reverse.memory_usage()
            + self.anchored.memory_usage()
    }
}

/// A dense table driven DFA.
#[derive(Clone, Debug)]
struct DFA {
    /// Row major: `table[sid * stride + class]`.
    table: Vec<u32>,
    is_match: Vec<bool>,
    classes: ByteClasses,
    stride: usize,
    start: u32,
}

impl DFA {
    #[inline]
    fn next_state(&self, sid: u32, byte: u8) -> u32 {
        let class = usize::from(self.classes.get(byte));
        self.table[sid as usize * self.stride + class]
    }

    /// Scan forward over `haystack[start..end]` and return the position
    /// one past the last byte of the last match seen before the DFA
    /// dies.
    fn find_fwd(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> Option<usize> {
        let mut sid = self.start;
        let mut last = None;
        for at in start..end {
            sid = self.next_state(sid, haystack[at]);
            if sid == DEAD {
                break;
            }
            if self.is_match[sid as usize] {
                last = Some(at + 1);
            }
        }
        last
    }

    /// Scan backward from `end` down to `lower` and return the smallest
    /// position at which an accepting state was entered. An accept at
    /// position `i` means `haystack[i..end]` matches the pattern this
    /// DFA was reversed from.
    fn find_rev(
        &self,
        haystack: &[u8],
        lower: usize,
        end: usize,
    ) -> Option<usize> {
        let mut sid = self.start;
        let mut last = None;
        let mut at = end;
        while at > lower {
            at -= 1;
            sid = self.next_state(sid, haystack[at]);
            if sid == DEAD {
                break;
            }
            if self.is_match[sid as usize] {
                last = Some(at);
            }
        }
        last
    }

    fn memory_usage(&self) -> usize {
        self.table.len() * size_of::<u32>() + self.is_match.len()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Kind {
    /// Subsets are priority ordered lists, pruned at the first match
    /// state, with the NFA start closure merged in at lowest priority
    /// until a match has been seen.
    Unanchored,
    /// Subsets are plain sorted sets and matching starts only at the
    /// scan position.
    Anchored,
}

/// One subset of NFA states, i.e. one DFA state under construction.
///
/// Only byte consuming NFA states are stored; epsilon states are
/// resolved away by the closure and match states fold into `is_match`.
#[derive(Clone, Eq, Hash, PartialEq)]
struct Subset {
    states: Vec<StateID>,
    /// Whether the NFA start closure is still merged into successors.
    seeding: bool,
    is_match: bool,
}

struct Determinizer<'a> {
    nfa: &'a NFA,
    kind: Kind,
    size_limit: Option<usize>,
    stride: usize,
    table: Vec<u32>,
    is_match: Vec<bool>,
    seen: SparseSet,
    stack: Vec<StateID>,
}

impl<'a> Determinizer<'a> {
    fn new(nfa: &'a NFA, kind: Kind, config: &Config) -> Determinizer<'a> {
        Determinizer {
            nfa,
            kind,
            size_limit: config.size_limit,
            stride: nfa.byte_classes().alphabet_len(),
            table: Vec::new(),
            is_match: Vec::new(),
            seen: SparseSet::new(nfa.states().len()),
            stack: Vec::new(),
        }
    }

    fn build(mut self) -> Result<DFA, BuildError> {
        self.alloc_state(false)?;
        debug_assert_eq!(DEAD, 0);

        self.seen.clear();
        let mut start = Subset {
            states: Vec::new(),
            seeding: self.kind == Kind::Unanchored,
            is_match: false,
        };
        let hit = self.closure(self.nfa.start(), &mut start.states);
        debug_assert!(!hit, "empty matching NFAs are rejected before here");
        if self.kind == Kind::Anchored {
            start.states.sort();
        }

        let start_id = self.alloc_state(false)?;
        let mut cache = HashMap::new();
        cache.insert(start.clone(), start_id);
        // One transition per byte equivalence class.
        let reps: Vec<u8> =
            self.nfa.byte_classes().representatives().collect();
        let mut uncompiled = vec![(start, start_id)];
        while let Some((subset, sid)) = uncompiled.pop() {
            for &byte in &reps {
                let child = self.next_subset(&subset, byte);
                let child_id = if child.states.is_empty()
                    && !child.is_match
                    && !child.seeding
                {
                    DEAD
                } else if let Some(&id) = cache.get(&child) {
                    id
                } else {
                    let id = self.alloc_state(child.is_match)?;
                    cache.insert(child.clone(), id);
                    uncompiled.push((child, id));
                    id
                };
                let class =
                    usize::from(self.nfa.byte_classes().get(byte));
                self.table[sid as usize * self.stride + class] = child_id;
            }
        }

        Ok(DFA {
            table: self.table,
            is_match: self.is_match,
            classes: self.nfa.byte_classes().clone(),
            stride: self.stride,
            start: start_id,
        })
    }

    /// The subset reached from `parent` by consuming `byte`.
    fn next_subset(&mut self, parent: &Subset, byte: u8) -> Subset {
        self.seen.clear();
        let mut states = Vec::new();
        let mut is_match = false;
        for &id in &parent.states {
            let target = match *self.nfa.state(id) {
                State::ByteRange { trans } => {
                    trans.matches(byte).then_some(trans.next)
                }
                State::Sparse { ref transitions } => transitions
                    .iter()
                    .find(|t| t.matches(byte))
                    .map(|t| t.next),
                _ => None,
            };
            if let Some(target) = target {
                if self.closure(target, &mut states) {
                    is_match = true;
                    // Everything of lower priority is unreachable under
                    // leftmost semantics.
                    if self.kind == Kind::Unanchored {
                        break;
                    }
                }
            }
        }
        let seeding = parent.seeding && !is_match;
        if seeding {
            let hit = self.closure(self.nfa.start(), &mut states);
            debug_assert!(!hit);
        }
        if self.kind == Kind::Anchored {
            states.sort();
        }
        Subset { states, seeding, is_match }
    }

    /// Collect the byte consuming states reachable from `from` through
    /// epsilon transitions, in priority order. Returns whether a match
    /// state was reached; in unanchored construction that also abandons
    /// the rest of the closure.
    fn closure(&mut self, from: StateID, states: &mut Vec<StateID>) -> bool {
        let mut hit = false;
        self.stack.clear();
        self.stack.push(from);
        while let Some(id) = self.stack.pop() {
            if !self.seen.insert(id) {
                continue;
            }
            match *self.nfa.state(id) {
                State::Empty { next } => self.stack.push(next),
                State::Union { ref alternates } => {
                    self.stack.extend(alternates.iter().rev().copied())
                }
                State::ByteRange { .. } | State::Sparse { .. } => {
                    states.push(id)
                }
                State::Match => {
                    hit = true;
                    if self.kind == Kind::Unanchored {
                        self.stack.clear();
                    }
                }
                State::Fail => {}
                State::Look { .. } => {
                    unreachable!("assertions are rejected before determinization")
                }
            }
        }
        hit
    }

    fn alloc_state(&mut self, is_match: bool) -> Result<u32, BuildError> {
        let id = self.is_match.len();
        let size = (id + 1) * self.stride * size_of::<u32>();
        if let Some(limit) = self.size_limit {
            if size > limit {
                return Err(BuildError::TooBig { limit });
            }
        }
        if id >= u32::MAX as usize {
            return Err(BuildError::TooBig { limit: usize::MAX });
        }
        self.is_match.push(is_match);
        self.table.extend(core::iter::repeat(DEAD).take(self.stride));
        Ok(id as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::{
        pikevm::PikeVM,
        thompson::{Compiler, Config as NfaConfig},
    };

    fn regex(pattern: &str) -> Regex {
        try_regex(pattern).unwrap()
    }

    fn try_regex(pattern: &str) -> Result<Regex, BuildError> {
        let nfa = NFA::new(pattern).unwrap();
        let rev = Compiler::new()
            .configure(NfaConfig::new().reverse(true))
            .build(pattern)
            .unwrap();
        Regex::build(&nfa, &rev, &Config::new())
    }

    fn find(re: &Regex, haystack: &str) -> Option<Match> {
        re.find(&Input::new(haystack))
    }

    #[test]
    fn scenario_scan() {
        let re = regex("a[ct]g");
        let hay = "aag atg acg";
        assert_eq!(find(&re, hay), Some(Match::must(4..7)));
        assert_eq!(
            re.find(&Input::new(hay).span(7..hay.len())),
            Some(Match::must(8..11)),
        );
        assert_eq!(re.find(&Input::new(hay).span(11..hay.len())), None);
    }

    #[test]
    fn leftmost_longest() {
        assert_eq!(find(&regex("a|ab"), "ab"), Some(Match::must(0..2)));
        assert_eq!(find(&regex("ab|a"), "ab"), Some(Match::must(0..2)));
        assert_eq!(find(&regex("ab|b"), "xb ab"), Some(Match::must(1..2)));
        // The later seeded `bc` thread must not steal the match.
        assert_eq!(find(&regex("ab|bc"), "abc"), Some(Match::must(0..2)));
        // Nor may an early short match hide a longer leftmost one.
        assert_eq!(
            find(&regex("abcde|c"), "abcde"),
            Some(Match::must(0..5)),
        );
        assert_eq!(find(&regex("a+"), "baaa"), Some(Match::must(1..4)));
    }

    #[test]
    fn rejects_assertions_and_empty_matches() {
        assert!(matches!(try_regex("^a"), Err(BuildError::HasLook)));
        assert!(matches!(try_regex("a$"), Err(BuildError::HasLook)));
        assert!(matches!(try_regex("a*"), Err(BuildError::MatchesEmpty)));
        assert!(matches!(try_regex("a?"), Err(BuildError::MatchesEmpty)));
    }

    #[test]
    fn size_limit() {
        let nfa = NFA::new("[ab]{1,32}z").unwrap();
        let rev = Compiler::new()
            .configure(NfaConfig::new().reverse(true))
            .build("[ab]{1,32}z")
            .unwrap();
        let err = Regex::build(
            &nfa,
            &rev,
            &Config::new().size_limit(Some(512)),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::TooBig { limit: 512 }));
    }

    #[test]
    fn agrees_with_pikevm() {
        let patterns = [
            "agggtaaa|tttaccct",
            "[cgt]gggtaaa|tttaccc[acg]",
            "a[act]ggtaaa|tttacc[agt]t",
            "tHa[Nt]",
            "aND|caN|Ha[DS]|WaS",
            "a[NSt]|BY",
            "<[^>]*>",
            r"\|[^|][^|]*\|",
            "a|ab",
            "ab|bc",
            "a{2,4}",
        ];
        // Deterministic junk with some planted fragments.
        let mut hay = String::new();
        for i in 0..400usize {
            hay.push_str(match i % 7 {
                0 => "agggtaaa",
                1 => "caN<x>tt",
                2 => "|ab|",
                3 => "tttaccct",
                4 => "tHaN WaS",
                5 => "ggcgtcca",
                _ => "aabbcc  ",
            });
        }
        for pattern in patterns {
            let dfa = regex(pattern);
            let vm = PikeVM::new(NFA::new(pattern).unwrap());
            let mut cache = vm.create_cache();
            let mut at = 0;
            while at <= hay.len() {
                let input = Input::new(&hay).span(at..hay.len());
                let got = dfa.find(&input);
                let want = vm.search(&mut cache, &input);
                assert_eq!(want, got, "pattern {pattern:?} at offset {at}");
                match want {
                    None => break,
                    Some(m) => at = m.end().max(at + 1),
                }
            }
        }
    }
}
