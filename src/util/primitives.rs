/*!
Lower level primitive types shared by every automaton in this crate.
*/

/// The identifier of an NFA or DFA state.
///
/// An identifier is always a `u32` internally. Automata are rejected at build
/// time once they grow anywhere near `u32::MAX` states, so conversions between
/// `StateID` and `usize` never fail in practice.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateID(u32);

impl StateID {
    /// The identifier of the first state in any automaton.
    pub const ZERO: StateID = StateID(0);

    /// The largest representable identifier. Used as a sentinel for
    /// transitions that have not been patched yet.
    pub const MAX: StateID = StateID(u32::MAX);

    /// Create a new state identifier.
    ///
    /// Callers are expected to have verified that `id` fits in a `u32`,
    /// which the size limit on automaton construction guarantees.
    #[inline]
    pub fn new(id: usize) -> StateID {
        debug_assert!(id <= u32::MAX as usize);
        StateID(id as u32)
    }

    #[inline]
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for StateID {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let id = StateID::new(42);
        assert_eq!(id.as_usize(), 42);
        assert_eq!(id.as_u32(), 42);
        assert!(StateID::ZERO < id);
        assert!(id < StateID::MAX);
    }
}
