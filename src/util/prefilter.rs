/*!
Literal prefilters.

A prefilter is a quick scan that finds candidate starting positions for a
match, so the full automaton simulation only runs where it could possibly
succeed. The DNA workload patterns all start with one of a few bytes
(`a`, `c`, `g`, `t`, `<`, `|`), which makes a `memchr` sweep over the
haystack dramatically cheaper than seeding NFA threads at every offset.

A prefilter is only consulted while the PikeVM has no live threads and no
match candidate, so skipping non-candidate bytes can never skip over a
potential match.
*/

use memchr::{memchr, memchr2, memchr3};

/// A scan for the small set of bytes a match can start with.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Prefilter {
    Byte1(u8),
    Byte2(u8, u8),
    Byte3(u8, u8, u8),
}

impl Prefilter {
    /// Build a prefilter from the complete set of bytes a match can begin
    /// with. Returns `None` when the set is too large to scan profitably.
    pub fn from_start_bytes(bytes: &[u8]) -> Option<Prefilter> {
        match *bytes {
            [a] => Some(Prefilter::Byte1(a)),
            [a, b] => Some(Prefilter::Byte2(a, b)),
            [a, b, c] => Some(Prefilter::Byte3(a, b, c)),
            _ => None,
        }
    }

    /// The position of the next candidate at or after `at`, or `None` if
    /// the rest of the haystack contains no candidate at all.
    #[inline]
    pub fn find(&self, haystack: &[u8], at: usize) -> Option<usize> {
        let rest = &haystack[at..];
        let found = match *self {
            Prefilter::Byte1(a) => memchr(a, rest),
            Prefilter::Byte2(a, b) => memchr2(a, b, rest),
            Prefilter::Byte3(a, b, c) => memchr3(a, b, c, rest),
        }?;
        Some(at + found)
    }
}
