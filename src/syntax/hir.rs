/*!
The high-level intermediate representation (HIR) of a parsed pattern.

The parser produces an [`Hir`] and the Thompson compiler consumes one.
Everything is byte oriented: character classes are sets of byte ranges and
literals are byte strings, which keeps the automata small for the ASCII
heavy workloads this crate targets.
*/

use itertools::Itertools;

/// A parsed pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hir {
    kind: HirKind,
}

/// The underlying kind of an [`Hir`] expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HirKind {
    /// Matches the empty string.
    Empty,
    /// Matches the literal byte string.
    Literal(Box<[u8]>),
    /// Matches any single byte in the class.
    Class(ClassBytes),
    /// A zero-width position assertion.
    Look(Look),
    /// A repetition of a sub-expression.
    Repetition(Repetition),
    /// A concatenation of expressions, matched in order.
    Concat(Vec<Hir>),
    /// An alternation of expressions.
    Alternation(Vec<Hir>),
}

impl Hir {
    #[inline]
    pub fn kind(&self) -> &HirKind {
        &self.kind
    }

    #[inline]
    pub fn into_kind(self) -> HirKind {
        self.kind
    }

    pub fn empty() -> Hir {
        Hir { kind: HirKind::Empty }
    }

    pub fn literal(bytes: impl Into<Box<[u8]>>) -> Hir {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Hir::empty();
        }
        Hir { kind: HirKind::Literal(bytes) }
    }

    pub fn class(class: ClassBytes) -> Hir {
        Hir { kind: HirKind::Class(class) }
    }

    pub fn look(look: Look) -> Hir {
        Hir { kind: HirKind::Look(look) }
    }

    pub fn repetition(rep: Repetition) -> Hir {
        Hir { kind: HirKind::Repetition(rep) }
    }

    /// `.`, which matches any byte except `\n`.
    pub fn dot() -> Hir {
        Hir::class(ClassBytes::new([
            ClassBytesRange::new(0, b'\n' - 1),
            ClassBytesRange::new(b'\n' + 1, u8::MAX),
        ]))
    }

    pub fn concat(mut subs: Vec<Hir>) -> Hir {
        subs.retain(|sub| !matches!(sub.kind(), HirKind::Empty));
        match subs.len() {
            0 => Hir::empty(),
            1 => subs.pop().expect("len checked"),
            _ => Hir { kind: HirKind::Concat(subs) },
        }
    }

    pub fn alternation(mut subs: Vec<Hir>) -> Hir {
        match subs.len() {
            1 => subs.pop().expect("len checked"),
            _ => Hir { kind: HirKind::Alternation(subs) },
        }
    }
}

/// A zero-width assertion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Look {
    /// `^`: only matches at the start of the haystack.
    Start,
    /// `$`: only matches at the end of the haystack.
    End,
}

/// A repetition such as `a*`, `a+`, `a?` or `a{2,4}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repetition {
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
    /// Greediness does not change which overall match is reported, since
    /// searches use leftmost-longest semantics, but it is preserved so the
    /// HIR round-trips the pattern faithfully.
    pub greedy: bool,
    pub sub: Box<Hir>,
}

/// A set of byte ranges, e.g. `[a-z0-9]`.
///
/// Always kept in canonical form: ranges are sorted, non-overlapping,
/// non-adjacent and non-empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClassBytes {
    ranges: Vec<ClassBytesRange>,
}

impl ClassBytes {
    /// Create a class from the given ranges. Overlapping, adjacent and
    /// unsorted ranges are allowed; the result is canonicalized.
    pub fn new<I: IntoIterator<Item = ClassBytesRange>>(
        ranges: I,
    ) -> ClassBytes {
        let mut class = ClassBytes { ranges: ranges.into_iter().collect() };
        class.canonicalize();
        class
    }

    /// A class matching no byte at all.
    pub fn empty() -> ClassBytes {
        ClassBytes { ranges: Vec::new() }
    }

    #[inline]
    pub fn ranges(&self) -> &[ClassBytesRange] {
        &self.ranges
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Add a range and restore canonical form.
    pub fn push(&mut self, range: ClassBytesRange) {
        self.ranges.push(range);
        self.canonicalize();
    }

    /// Union another class into this one.
    pub fn union(&mut self, other: &ClassBytes) {
        self.ranges.extend_from_slice(other.ranges());
        self.canonicalize();
    }

    /// Negate the class in place: afterwards it matches exactly the bytes
    /// it did not match before.
    pub fn negate(&mut self) {
        let old = core::mem::take(&mut self.ranges);
        let mut next: u16 = 0;
        for range in old {
            if u16::from(range.start) > next {
                self.ranges.push(ClassBytesRange::new(
                    next as u8,
                    range.start - 1,
                ));
            }
            next = u16::from(range.end) + 1;
        }
        if next <= u16::from(u8::MAX) {
            self.ranges.push(ClassBytesRange::new(next as u8, u8::MAX));
        }
    }

    fn canonicalize(&mut self) {
        self.ranges.sort();
        self.ranges = self
            .ranges
            .drain(..)
            .coalesce(|a, b| {
                if u16::from(b.start) <= u16::from(a.end) + 1 {
                    Ok(ClassBytesRange::new(a.start, a.end.max(b.end)))
                } else {
                    Err((a, b))
                }
            })
            .collect();
    }
}

/// An inclusive range of bytes in a [`ClassBytes`].
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub struct ClassBytesRange {
    start: u8,
    end: u8,
}

impl ClassBytesRange {
    /// Create a new inclusive range. Panics if `start > end`.
    pub fn new(start: u8, end: u8) -> ClassBytesRange {
        assert!(start <= end, "class range must be ordered");
        ClassBytesRange { start, end }
    }

    #[inline]
    pub fn start(&self) -> u8 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u8 {
        self.end
    }

    #[inline]
    pub fn matches(&self, byte: u8) -> bool {
        self.start <= byte && byte <= self.end
    }
}

impl core::fmt::Debug for ClassBytesRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02X}-{:02X}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_canonicalization() {
        let class = ClassBytes::new([
            ClassBytesRange::new(b'f', b'z'),
            ClassBytesRange::new(b'a', b'g'),
        ]);
        assert_eq!(class.ranges(), &[ClassBytesRange::new(b'a', b'z')]);

        // Adjacent ranges merge too.
        let class = ClassBytes::new([
            ClassBytesRange::new(b'a', b'c'),
            ClassBytesRange::new(b'd', b'f'),
        ]);
        assert_eq!(class.ranges(), &[ClassBytesRange::new(b'a', b'f')]);

        // Disjoint ranges stay apart, sorted.
        let class = ClassBytes::new([
            ClassBytesRange::new(b'x', b'z'),
            ClassBytesRange::new(b'a', b'c'),
        ]);
        assert_eq!(
            class.ranges(),
            &[
                ClassBytesRange::new(b'a', b'c'),
                ClassBytesRange::new(b'x', b'z'),
            ]
        );
    }

    #[test]
    fn class_negation() {
        let mut class = ClassBytes::new([ClassBytesRange::new(b'>', b'>')]);
        class.negate();
        assert_eq!(
            class.ranges(),
            &[
                ClassBytesRange::new(0, b'>' - 1),
                ClassBytesRange::new(b'>' + 1, u8::MAX),
            ]
        );
        assert!(class.ranges()[0].matches(b'a'));
        assert!(!class.ranges().iter().any(|r| r.matches(b'>')));

        // Negating everything gives the empty class, and vice versa.
        let mut all = ClassBytes::new([ClassBytesRange::new(0, u8::MAX)]);
        all.negate();
        assert!(all.is_empty());
        all.negate();
        assert_eq!(all.ranges(), &[ClassBytesRange::new(0, u8::MAX)]);
    }

    #[test]
    fn smart_constructors() {
        assert_eq!(Hir::literal(&b""[..]), Hir::empty());
        assert_eq!(Hir::concat(vec![]), Hir::empty());
        assert_eq!(
            Hir::concat(vec![Hir::empty(), Hir::literal(&b"a"[..])]),
            Hir::literal(&b"a"[..]),
        );
        assert_eq!(
            Hir::alternation(vec![Hir::literal(&b"a"[..])]),
            Hir::literal(&b"a"[..]),
        );
    }
}
