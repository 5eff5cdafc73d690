/*!
Thompson NFA construction.

A [`Compiler`] translates an [`Hir`](crate::syntax::hir::Hir) into an
[`NFA`] using Thompson's construction: each sub-expression becomes a
small fragment with one entry and one exit, and fragments compose by
patching exits to entries. The produced NFA is anchored; unanchored
searches are the engines' concern (the PikeVM seeds threads at every
offset, the DFA reseeds its start states).

The same compiler also builds reversed NFAs, which match the reversed
pattern. The DFA engine runs one backwards over the haystack to recover
match start positions.
*/

use core::mem::size_of;

use crate::{
    syntax::{
        self,
        hir::{ClassBytes, Hir, HirKind, Look, Repetition},
    },
    util::{
        alphabet::{ByteClassSet, ByteClasses},
        primitives::StateID,
    },
};

/// An error that can occur while building an NFA.
#[non_exhaustive]
#[derive(Clone, Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Syntax(#[from] syntax::Error),
    #[error("NFA exceeded size limit of {limit} bytes")]
    TooBig { limit: usize },
}

/// Configuration for NFA construction.
#[derive(Clone, Debug)]
pub struct Config {
    reverse: bool,
    size_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Build an NFA that matches the reversed pattern. Literals and
    /// concatenations compile back to front and the anchors swap roles.
    pub fn reverse(mut self, yes: bool) -> Config {
        self.reverse = yes;
        self
    }

    /// Cap the heap used by the NFA's state graph. `None` disables the
    /// check. Counted repetitions expand to copies of their
    /// sub-expression, so the graph can be much bigger than the pattern.
    pub fn size_limit(mut self, limit: Option<usize>) -> Config {
        self.size_limit = limit;
        self
    }

    pub fn get_reverse(&self) -> bool {
        self.reverse
    }

    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit
    }
}

impl Default for Config {
    fn default() -> Config {
        Config { reverse: false, size_limit: Some(10 * (1 << 20)) }
    }
}

/// A single NFA state.
#[derive(Clone, Eq, PartialEq)]
pub enum State {
    /// Consume one byte in the range and move on.
    ByteRange { trans: Transition },
    /// Consume one byte matching any of the (sorted, non-overlapping)
    /// transitions.
    Sparse { transitions: Box<[Transition]> },
    /// A zero-width assertion that must hold at the current position.
    Look { look: Look, next: StateID },
    /// An unconditional epsilon transition.
    Empty { next: StateID },
    /// Epsilon transitions to each alternate, in priority order.
    Union { alternates: Box<[StateID]> },
    /// A state with no outgoing transitions. Compiled from classes that
    /// match no byte.
    Fail,
    /// A match of the whole pattern.
    Match,
}

impl State {
    /// Heap memory attributed to this state beyond its inline size.
    fn memory_usage(&self) -> usize {
        match self {
            State::Sparse { transitions } => {
                transitions.len() * size_of::<Transition>()
            }
            State::Union { alternates } => {
                alternates.len() * size_of::<StateID>()
            }
            _ => 0,
        }
    }
}

impl core::fmt::Debug for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            State::ByteRange { trans } => write!(f, "{trans:?}"),
            State::Sparse { transitions } => {
                let mut first = true;
                write!(f, "sparse(")?;
                for trans in transitions.iter() {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{trans:?}")?;
                }
                write!(f, ")")
            }
            State::Look { look, next } => write!(f, "{look:?} => {next:?}"),
            State::Empty { next } => write!(f, "e => {next:?}"),
            State::Union { alternates } => {
                write!(f, "union({alternates:?})")
            }
            State::Fail => write!(f, "FAIL"),
            State::Match => write!(f, "MATCH"),
        }
    }
}

/// A byte range transition: consume one byte in `[start, end]` and go to
/// `next`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Transition {
    pub start: u8,
    pub end: u8,
    pub next: StateID,
}

impl Transition {
    #[inline]
    pub fn matches(&self, byte: u8) -> bool {
        self.start <= byte && byte <= self.end
    }
}

impl core::fmt::Debug for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.start == self.end {
            write!(f, "{:02X} => {:?}", self.start, self.next)
        } else {
            write!(f, "{:02X}-{:02X} => {:?}", self.start, self.end, self.next)
        }
    }
}

/// A compiled NFA.
///
/// Immutable once built, and cheap to query. All search time mutable
/// scratch lives in the engines' caches, so one NFA can serve any number
/// of concurrent searches.
#[derive(Clone, Debug)]
pub struct NFA {
    states: Box<[State]>,
    start: StateID,
    byte_classes: ByteClasses,
    has_look: bool,
}

impl NFA {
    /// Compile the pattern with a default configuration.
    pub fn new(pattern: &str) -> Result<NFA, BuildError> {
        Compiler::new().build(pattern)
    }

    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    #[inline]
    pub fn state(&self, id: StateID) -> &State {
        &self.states[id.as_usize()]
    }

    /// The anchored start state.
    #[inline]
    pub fn start(&self) -> StateID {
        self.start
    }

    /// The byte equivalence classes induced by this NFA's transitions.
    #[inline]
    pub fn byte_classes(&self) -> &ByteClasses {
        &self.byte_classes
    }

    /// Whether any state is a `^`/`$` assertion.
    #[inline]
    pub fn has_look(&self) -> bool {
        self.has_look
    }

    /// Whether the NFA matches the empty string, i.e. a match state is
    /// reachable from the start through epsilon transitions alone.
    pub fn matches_empty(&self) -> bool {
        let mut stack = vec![self.start];
        let mut seen = vec![false; self.states.len()];
        while let Some(id) = stack.pop() {
            if seen[id.as_usize()] {
                continue;
            }
            seen[id.as_usize()] = true;
            match self.state(id) {
                State::Match => return true,
                State::Empty { next } => stack.push(*next),
                State::Union { alternates } => {
                    stack.extend(alternates.iter().copied())
                }
                // Stop at assertions. They only matter to the DFA
                // builder, which rejects NFAs containing them anyway.
                State::Look { .. } => {}
                State::ByteRange { .. }
                | State::Sparse { .. }
                | State::Fail => {}
            }
        }
        false
    }

    /// The complete set of bytes a match can begin with, when that set is
    /// small enough to be useful to a prefilter. Returns `None` when a
    /// match can begin with an assertion or an empty match, or when more
    /// than three distinct bytes can start a match.
    pub fn start_bytes(&self) -> Option<Vec<u8>> {
        let mut stack = vec![self.start];
        let mut seen = vec![false; self.states.len()];
        let mut bytes = [false; 256];
        let mut count = 0usize;
        let mut add = |start: u8, end: u8, bytes: &mut [bool; 256]| {
            for byte in start..=end {
                if !bytes[usize::from(byte)] {
                    bytes[usize::from(byte)] = true;
                    count += 1;
                }
            }
            count <= 3
        };
        while let Some(id) = stack.pop() {
            if seen[id.as_usize()] {
                continue;
            }
            seen[id.as_usize()] = true;
            match self.state(id) {
                State::Look { .. } | State::Match => return None,
                State::Empty { next } => stack.push(*next),
                State::Union { alternates } => {
                    stack.extend(alternates.iter().copied())
                }
                State::ByteRange { trans } => {
                    if !add(trans.start, trans.end, &mut bytes) {
                        return None;
                    }
                }
                State::Sparse { transitions } => {
                    for trans in transitions.iter() {
                        if !add(trans.start, trans.end, &mut bytes) {
                            return None;
                        }
                    }
                }
                State::Fail => {}
            }
        }
        Some(
            (0..=u8::MAX).filter(|&b| bytes[usize::from(b)]).collect(),
        )
    }

    /// Approximate heap usage, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.states.len() * size_of::<State>()
            + self
                .states
                .iter()
                .map(State::memory_usage)
                .sum::<usize>()
    }
}

/// An entry and exit pair for a compiled sub-expression. The exit's
/// outgoing transition is left dangling until the fragment is composed.
#[derive(Clone, Copy, Debug)]
struct ThompsonRef {
    start: StateID,
    end: StateID,
}

/// Compiles an [`Hir`] into an [`NFA`].
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    config: Config,
    states: Vec<State>,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::default()
    }

    pub fn configure(mut self, config: Config) -> Compiler {
        self.config = config;
        self
    }

    /// Parse and compile the pattern.
    pub fn build(&mut self, pattern: &str) -> Result<NFA, BuildError> {
        let hir = syntax::parse(pattern)?;
        self.build_from_hir(&hir)
    }

    /// Compile an already parsed pattern.
    pub fn build_from_hir(&mut self, hir: &Hir) -> Result<NFA, BuildError> {
        self.states.clear();
        let frag = self.c(hir)?;
        let mat = self.push(State::Match)?;
        self.patch(frag.end, mat);

        let mut set = ByteClassSet::empty();
        let mut has_look = false;
        for state in self.states.iter() {
            match state {
                State::ByteRange { trans } => {
                    set.set_range(trans.start, trans.end)
                }
                State::Sparse { transitions } => {
                    for trans in transitions.iter() {
                        set.set_range(trans.start, trans.end);
                    }
                }
                State::Look { .. } => has_look = true,
                _ => {}
            }
        }
        Ok(NFA {
            states: core::mem::take(&mut self.states).into_boxed_slice(),
            start: frag.start,
            byte_classes: set.byte_classes(),
            has_look,
        })
    }

    fn c(&mut self, hir: &Hir) -> Result<ThompsonRef, BuildError> {
        match hir.kind() {
            HirKind::Empty => self.c_empty(),
            HirKind::Literal(bytes) => self.c_literal(bytes),
            HirKind::Class(class) => self.c_class(class),
            HirKind::Look(look) => self.c_look(*look),
            HirKind::Repetition(rep) => self.c_repetition(rep),
            HirKind::Concat(subs) => self.c_concat(subs),
            HirKind::Alternation(subs) => self.c_alternation(subs),
        }
    }

    fn c_empty(&mut self) -> Result<ThompsonRef, BuildError> {
        let id = self.push(State::Empty { next: StateID::MAX })?;
        Ok(ThompsonRef { start: id, end: id })
    }

    /// A fragment that can never match. Its exit is unreachable but still
    /// patchable, which keeps composition uniform.
    fn c_fail(&mut self) -> Result<ThompsonRef, BuildError> {
        let start = self.push(State::Fail)?;
        let end = self.push(State::Empty { next: StateID::MAX })?;
        Ok(ThompsonRef { start, end })
    }

    fn c_literal(&mut self, bytes: &[u8]) -> Result<ThompsonRef, BuildError> {
        debug_assert!(!bytes.is_empty());
        let mut it = bytes.iter().copied();
        let mut prev: Option<ThompsonRef> = None;
        loop {
            let byte = if self.config.reverse {
                match it.next_back() {
                    Some(byte) => byte,
                    None => break,
                }
            } else {
                match it.next() {
                    Some(byte) => byte,
                    None => break,
                }
            };
            let id = self.push(State::ByteRange {
                trans: Transition { start: byte, end: byte, next: StateID::MAX },
            })?;
            prev = Some(match prev {
                None => ThompsonRef { start: id, end: id },
                Some(frag) => {
                    self.patch(frag.end, id);
                    ThompsonRef { start: frag.start, end: id }
                }
            });
        }
        Ok(prev.expect("literals are non-empty"))
    }

    fn c_class(&mut self, class: &ClassBytes) -> Result<ThompsonRef, BuildError> {
        let ranges = class.ranges();
        if ranges.is_empty() {
            return self.c_fail();
        }
        let id = if let [range] = ranges {
            self.push(State::ByteRange {
                trans: Transition {
                    start: range.start(),
                    end: range.end(),
                    next: StateID::MAX,
                },
            })?
        } else {
            let transitions = ranges
                .iter()
                .map(|r| Transition {
                    start: r.start(),
                    end: r.end(),
                    next: StateID::MAX,
                })
                .collect();
            self.push(State::Sparse { transitions })?
        };
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_look(&mut self, look: Look) -> Result<ThompsonRef, BuildError> {
        // In the reversed pattern the ends of the haystack trade places.
        let look = if self.config.reverse {
            match look {
                Look::Start => Look::End,
                Look::End => Look::Start,
            }
        } else {
            look
        };
        let id = self.push(State::Look { look, next: StateID::MAX })?;
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_concat(&mut self, subs: &[Hir]) -> Result<ThompsonRef, BuildError> {
        let mut prev: Option<ThompsonRef> = None;
        let mut forward = subs.iter();
        let mut backward = subs.iter().rev();
        loop {
            let sub = if self.config.reverse {
                backward.next()
            } else {
                forward.next()
            };
            let sub = match sub {
                Some(sub) => sub,
                None => break,
            };
            let frag = self.c(sub)?;
            prev = Some(match prev {
                None => frag,
                Some(head) => {
                    self.patch(head.end, frag.start);
                    ThompsonRef { start: head.start, end: frag.end }
                }
            });
        }
        match prev {
            Some(frag) => Ok(frag),
            None => self.c_empty(),
        }
    }

    fn c_alternation(&mut self, subs: &[Hir]) -> Result<ThompsonRef, BuildError> {
        if subs.is_empty() {
            return self.c_fail();
        }
        let frags = subs
            .iter()
            .map(|sub| self.c(sub))
            .collect::<Result<Vec<_>, _>>()?;
        let alternates = frags.iter().map(|f| f.start).collect();
        let union = self.push(State::Union { alternates })?;
        let end = self.push(State::Empty { next: StateID::MAX })?;
        for frag in frags {
            self.patch(frag.end, end);
        }
        Ok(ThompsonRef { start: union, end })
    }

    fn c_repetition(&mut self, rep: &Repetition) -> Result<ThompsonRef, BuildError> {
        match (rep.min, rep.max) {
            (0, Some(0)) => self.c_empty(),
            (0, None) => self.c_star(&rep.sub, rep.greedy),
            (min, None) => {
                // `a{2,}` is `aa` followed by `a*`.
                let mut frag = None;
                for _ in 0..min {
                    let next = self.c(&rep.sub)?;
                    frag = Some(self.join(frag, next));
                }
                let star = self.c_star(&rep.sub, rep.greedy)?;
                Ok(self.join(frag, star))
            }
            (min, Some(max)) => {
                debug_assert!(min <= max);
                // `a{2,4}` is `aa` followed by `(a(a)?)?`.
                let mut frag = None;
                for _ in 0..min {
                    let next = self.c(&rep.sub)?;
                    frag = Some(self.join(frag, next));
                }
                let mut opt: Option<ThompsonRef> = None;
                for _ in min..max {
                    let sub = self.c(&rep.sub)?;
                    let inner = match opt {
                        None => sub,
                        Some(tail) => {
                            self.patch(sub.end, tail.start);
                            ThompsonRef { start: sub.start, end: tail.end }
                        }
                    };
                    opt = Some(self.c_question(inner, rep.greedy)?);
                }
                match opt {
                    Some(opt) => Ok(self.join(frag, opt)),
                    None => match frag {
                        Some(frag) => Ok(frag),
                        None => self.c_empty(),
                    },
                }
            }
        }
    }

    fn c_star(&mut self, sub: &Hir, greedy: bool) -> Result<ThompsonRef, BuildError> {
        // The union is created first so the loop has a fixed point to
        // return to, then its alternates are filled in.
        let union = self.push(State::Union { alternates: Box::new([]) })?;
        let frag = self.c(sub)?;
        self.patch(frag.end, union);
        let empty = self.push(State::Empty { next: StateID::MAX })?;
        let alternates = if greedy {
            Box::new([frag.start, empty])
        } else {
            Box::new([empty, frag.start])
        };
        self.states[union.as_usize()] = State::Union { alternates };
        Ok(ThompsonRef { start: union, end: empty })
    }

    /// Wrap an already compiled fragment so it matches zero or one times.
    fn c_question(
        &mut self,
        frag: ThompsonRef,
        greedy: bool,
    ) -> Result<ThompsonRef, BuildError> {
        let empty = self.push(State::Empty { next: StateID::MAX })?;
        let alternates = if greedy {
            Box::new([frag.start, empty])
        } else {
            Box::new([empty, frag.start])
        };
        let union = self.push(State::Union { alternates })?;
        self.patch(frag.end, empty);
        Ok(ThompsonRef { start: union, end: empty })
    }

    /// Concatenate two fragments, the first being optional.
    fn join(&mut self, head: Option<ThompsonRef>, tail: ThompsonRef) -> ThompsonRef {
        match head {
            None => tail,
            Some(head) => {
                self.patch(head.end, tail.start);
                ThompsonRef { start: head.start, end: tail.end }
            }
        }
    }

    /// Point the dangling exit of `from` at `to`.
    fn patch(&mut self, from: StateID, to: StateID) {
        match &mut self.states[from.as_usize()] {
            State::ByteRange { trans } => trans.next = to,
            State::Sparse { transitions } => {
                for trans in transitions.iter_mut() {
                    trans.next = to;
                }
            }
            State::Look { next, .. } | State::Empty { next } => *next = to,
            state => {
                unreachable!("cannot patch {state:?}")
            }
        }
    }

    fn push(&mut self, state: State) -> Result<StateID, BuildError> {
        let memory = (self.states.len() + 1) * size_of::<State>()
            + state.memory_usage();
        if let Some(limit) = self.config.size_limit {
            if memory > limit {
                return Err(BuildError::TooBig { limit });
            }
        }
        if self.states.len() >= StateID::MAX.as_usize() {
            return Err(BuildError::TooBig { limit: usize::MAX });
        }
        let id = StateID::new(self.states.len());
        self.states.push(state);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_chain() {
        let nfa = NFA::new("atg").unwrap();
        // Walk the chain from the start state.
        let mut id = nfa.start();
        for &byte in b"atg" {
            match nfa.state(id) {
                State::ByteRange { trans } => {
                    assert!(trans.matches(byte));
                    assert!(!trans.matches(byte.to_ascii_uppercase()));
                    id = trans.next;
                }
                state => panic!("unexpected state {state:?}"),
            }
        }
        assert_eq!(nfa.state(id), &State::Match);
    }

    #[test]
    fn reverse_literal_chain() {
        let nfa = Compiler::new()
            .configure(Config::new().reverse(true))
            .build("atg")
            .unwrap();
        let mut id = nfa.start();
        for &byte in b"gta" {
            match nfa.state(id) {
                State::ByteRange { trans } => {
                    assert!(trans.matches(byte));
                    id = trans.next;
                }
                state => panic!("unexpected state {state:?}"),
            }
        }
        assert_eq!(nfa.state(id), &State::Match);
    }

    #[test]
    fn reverse_swaps_anchors() {
        let nfa = Compiler::new()
            .configure(Config::new().reverse(true))
            .build("^a")
            .unwrap();
        // Reversed `^a` is `a` then an end assertion.
        match nfa.state(nfa.start()) {
            State::ByteRange { trans } => {
                assert!(trans.matches(b'a'));
                assert_eq!(
                    nfa.state(trans.next),
                    &State::Look { look: Look::End, next: nfa_match(&nfa) },
                );
            }
            state => panic!("unexpected state {state:?}"),
        }
    }

    fn nfa_match(nfa: &NFA) -> StateID {
        let idx = nfa
            .states()
            .iter()
            .position(|s| matches!(s, State::Match))
            .unwrap();
        StateID::new(idx)
    }

    #[test]
    fn class_states() {
        let nfa = NFA::new("[ct]").unwrap();
        match nfa.state(nfa.start()) {
            State::Sparse { transitions } => {
                assert_eq!(transitions.len(), 2);
                assert!(transitions[0].matches(b'c'));
                assert!(transitions[1].matches(b't'));
            }
            state => panic!("unexpected state {state:?}"),
        }

        let nfa = NFA::new("[a-z]").unwrap();
        assert!(matches!(
            nfa.state(nfa.start()),
            State::ByteRange { .. }
        ));
    }

    #[test]
    fn has_look() {
        assert!(!NFA::new("abc").unwrap().has_look());
        assert!(NFA::new("^abc").unwrap().has_look());
        assert!(NFA::new("abc$").unwrap().has_look());
    }

    #[test]
    fn matches_empty() {
        assert!(NFA::new("a*").unwrap().matches_empty());
        assert!(NFA::new("(a|)").unwrap().matches_empty());
        assert!(NFA::new("").unwrap().matches_empty());
        assert!(!NFA::new("a").unwrap().matches_empty());
        assert!(!NFA::new("a+").unwrap().matches_empty());
    }

    #[test]
    fn start_bytes() {
        assert_eq!(
            NFA::new("agggtaaa|tttaccct").unwrap().start_bytes(),
            Some(vec![b'a', b't']),
        );
        assert_eq!(
            NFA::new("[cgt]gggtaaa|tttaccc[acg]").unwrap().start_bytes(),
            Some(vec![b'c', b'g', b't']),
        );
        // Four distinct start bytes is past the prefilter's sweet spot.
        assert_eq!(NFA::new("[acgt]x").unwrap().start_bytes(), None);
        // A possibly empty match has no required first byte.
        assert_eq!(NFA::new("a*").unwrap().start_bytes(), None);
        // Assertions defeat the analysis too.
        assert_eq!(NFA::new("^a").unwrap().start_bytes(), None);
    }

    #[test]
    fn size_limit() {
        let err = Compiler::new()
            .configure(Config::new().size_limit(Some(256)))
            .build("a{1000}")
            .unwrap_err();
        assert!(matches!(err, BuildError::TooBig { limit: 256 }));

        // Unlimited builds fine.
        Compiler::new()
            .configure(Config::new().size_limit(None))
            .build("a{1000}")
            .unwrap();
    }

    #[test]
    fn byte_classes_split_on_transitions() {
        let nfa = NFA::new("[a-z]+").unwrap();
        let classes = nfa.byte_classes();
        assert_eq!(classes.get(b'a'), classes.get(b'z'));
        assert_ne!(classes.get(b'a'), classes.get(b'A'));
    }
}
