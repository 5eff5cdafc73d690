/*!
An NFA simulation in the style of Thompson and Pike.

The [`PikeVM`] runs every viable thread of the NFA in lock step over the
haystack, one byte at a time, so a search always costs
`O(len(haystack) * len(nfa))` regardless of the pattern. That bound is
what makes it the engine of last resort: it handles every pattern the
compiler accepts, including assertions and possibly empty matches, just
not as fast as a DFA.

Searches use leftmost-longest semantics: among all matches, the one
starting earliest wins, and ties are broken by the longest extent. Every
thread carries the offset it was seeded at, and seeding stops as soon as
any match candidate is known, since later seeds can never start earlier.
*/

use crate::{
    nfa::thompson::{State, NFA},
    search::{Input, Match},
    util::{prefilter::Prefilter, primitives::StateID, sparse::SparseSet},
};

/// An NFA simulation that supports every compiled pattern.
#[derive(Clone, Debug)]
pub struct PikeVM {
    nfa: NFA,
    prefilter: Option<Prefilter>,
}

impl PikeVM {
    /// Create a PikeVM for the given NFA. When the NFA's matches can only
    /// begin with a few distinct bytes, a [`Prefilter`] is attached
    /// automatically.
    pub fn new(nfa: NFA) -> PikeVM {
        let prefilter = nfa
            .start_bytes()
            .as_deref()
            .and_then(Prefilter::from_start_bytes);
        PikeVM { nfa, prefilter }
    }

    /// Drop the prefilter, forcing the simulation to consider every
    /// offset itself.
    pub fn without_prefilter(mut self) -> PikeVM {
        self.prefilter = None;
        self
    }

    #[inline]
    pub fn nfa(&self) -> &NFA {
        &self.nfa
    }

    #[inline]
    pub fn prefilter(&self) -> Option<&Prefilter> {
        self.prefilter.as_ref()
    }

    /// Create the mutable scratch space used by searches. A cache may be
    /// reused across any number of searches with this PikeVM, but not
    /// with a different one.
    pub fn create_cache(&self) -> Cache {
        Cache::new(self)
    }

    /// Find the leftmost-longest match within the input's span.
    pub fn search(
        &self,
        cache: &mut Cache,
        input: &Input<'_>,
    ) -> Option<Match> {
        let haystack = input.haystack();
        let hay_len = haystack.len();
        let end = input.end();
        let Cache { stack, curr, next } = cache;
        let state_count = self.nfa.states().len();
        curr.resize(state_count);
        next.resize(state_count);
        // A previous search may have ended with live threads still in the
        // set; they belong to another haystack.
        curr.set.clear();
        next.set.clear();

        let mut matched: Option<(usize, usize)> = None;
        let mut at = input.start();
        loop {
            if curr.set.is_empty() {
                if matched.is_some() {
                    break;
                }
                // With no live threads and no candidate, nothing ties us
                // to the current offset, so jump to the next byte a match
                // could possibly start with.
                if let Some(ref pf) = self.prefilter {
                    if at < end {
                        match pf.find(&haystack[..end], at) {
                            Some(i) => at = i,
                            None => return None,
                        }
                    }
                }
            }
            // Seed a new thread at this offset. Once a candidate exists,
            // later seeds are pointless: they cannot start earlier.
            if matched.is_none() {
                self.epsilon_closure(
                    stack,
                    curr,
                    self.nfa.start(),
                    at,
                    at,
                    hay_len,
                    &mut matched,
                );
            }
            if at >= end {
                break;
            }
            let byte = haystack[at];
            at += 1;
            for i in 0..curr.set.len() {
                let id = curr.set.get(i);
                let thread_start = curr.starts[id.as_usize()];
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
                    self.epsilon_closure(
                        stack,
                        next,
                        target,
                        thread_start,
                        at,
                        hay_len,
                        &mut matched,
                    );
                }
            }
            core::mem::swap(curr, next);
            next.set.clear();
        }
        matched.map(|(start, end)| Match::new(start, end))
    }

    /// Add `from` and everything reachable from it through epsilon
    /// transitions at position `at` to the active set. Threads already in
    /// the set keep their start offset, which is never larger than
    /// `thread_start` because threads are processed oldest first.
    #[allow(clippy::too_many_arguments)]
    fn epsilon_closure(
        &self,
        stack: &mut Vec<StateID>,
        active: &mut ActiveStates,
        from: StateID,
        thread_start: usize,
        at: usize,
        hay_len: usize,
        matched: &mut Option<(usize, usize)>,
    ) {
        stack.push(from);
        while let Some(id) = stack.pop() {
            if !active.set.insert(id) {
                continue;
            }
            active.starts[id.as_usize()] = thread_start;
            match *self.nfa.state(id) {
                State::Empty { next } => stack.push(next),
                State::Union { ref alternates } => {
                    // Reversed so the first alternate pops first.
                    stack.extend(alternates.iter().rev().copied());
                }
                State::Look { look, next } => {
                    use crate::syntax::hir::Look;
                    let holds = match look {
                        Look::Start => at == 0,
                        Look::End => at == hay_len,
                    };
                    if holds {
                        stack.push(next);
                    }
                }
                State::Match => {
                    let better = match *matched {
                        None => true,
                        Some((start, end)) => {
                            thread_start < start
                                || (thread_start == start && at > end)
                        }
                    };
                    if better {
                        *matched = Some((thread_start, at));
                    }
                }
                State::ByteRange { .. }
                | State::Sparse { .. }
                | State::Fail => {}
            }
        }
    }
}

/// Mutable scratch space for a [`PikeVM`] search.
#[derive(Clone, Debug)]
pub struct Cache {
    stack: Vec<StateID>,
    curr: ActiveStates,
    next: ActiveStates,
}

impl Cache {
    pub fn new(re: &PikeVM) -> Cache {
        let state_count = re.nfa.states().len();
        Cache {
            stack: Vec::new(),
            curr: ActiveStates::new(state_count),
            next: ActiveStates::new(state_count),
        }
    }

    pub fn memory_usage(&self) -> usize {
        self.stack.capacity() * core::mem::size_of::<StateID>()
            + self.curr.memory_usage()
            + self.next.memory_usage()
    }
}

/// The set of live threads at one haystack position, with the offset
/// each was seeded at.
#[derive(Clone, Debug)]
struct ActiveStates {
    set: SparseSet,
    starts: Vec<usize>,
}

impl ActiveStates {
    fn new(capacity: usize) -> ActiveStates {
        ActiveStates {
            set: SparseSet::new(capacity),
            starts: vec![0; capacity],
        }
    }

    fn resize(&mut self, capacity: usize) {
        if self.set.capacity() != capacity {
            self.set.resize(capacity);
            self.starts.resize(capacity, 0);
        }
    }

    fn memory_usage(&self) -> usize {
        self.set.memory_usage()
            + self.starts.len() * core::mem::size_of::<usize>()
    }
}
