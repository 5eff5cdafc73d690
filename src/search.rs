/*!
The types exchanged between callers and the matching engines: [`Span`],
[`Match`] and [`Input`].
*/

use core::ops::Range;

/// A byte range `[start, end)` within a haystack.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl From<Range<usize>> for Span {
    #[inline]
    fn from(range: Range<usize>) -> Span {
        Span { start: range.start, end: range.end }
    }
}

impl From<Span> for Range<usize> {
    #[inline]
    fn from(span: Span) -> Range<usize> {
        span.range()
    }
}

impl PartialEq<Range<usize>> for Span {
    #[inline]
    fn eq(&self, range: &Range<usize>) -> bool {
        self.start == range.start && self.end == range.end
    }
}

impl core::fmt::Debug for Span {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A match over a haystack.
///
/// A match is simply the span of bytes the pattern matched; the matched
/// text itself is recovered by slicing the haystack with
/// [`Match::range`]. Matches are immutable once returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Match {
    span: Span,
}

impl Match {
    /// Create a match from a span, asserting that it is well formed.
    ///
    /// Mostly useful in tests:
    ///
    /// ```
    /// use seqre::{Match, Regex};
    ///
    /// let re = Regex::new("a[ct]g")?;
    /// assert_eq!(re.find("aag atg act"), Some(Match::must(4..7)));
    ///
    /// # Ok::<(), seqre::BuildError>(())
    /// ```
    #[inline]
    pub fn must<S: Into<Span>>(span: S) -> Match {
        let span = span.into();
        assert!(span.start <= span.end, "match span must be ordered");
        Match { span }
    }

    #[inline]
    pub(crate) fn new(start: usize, end: usize) -> Match {
        debug_assert!(start <= end);
        Match { span: Span { start, end } }
    }

    /// The starting byte offset, inclusive.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// The ending byte offset, exclusive.
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// True for a zero-width match.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// The parameters of a single search: a haystack and the span to search
/// within it.
///
/// Everything that coerces to a byte slice converts into an `Input`
/// covering the whole haystack, so the search APIs accept `&str` and
/// `&[u8]` directly. Restricting the span expresses "find the next match
/// at or after this offset":
///
/// ```
/// use seqre::{Input, Match, Regex};
///
/// let hay = "aag atg acg";
/// let re = Regex::new("a[ct]g")?;
/// assert_eq!(re.find(Input::new(hay).span(7..hay.len())), Some(Match::must(8..11)));
///
/// # Ok::<(), seqre::BuildError>(())
/// ```
///
/// Note that span offsets are absolute: anchors still refer to the real
/// haystack boundaries, and returned matches need no adjustment.
#[derive(Clone)]
pub struct Input<'h> {
    haystack: &'h [u8],
    span: Span,
}

impl<'h> Input<'h> {
    #[inline]
    pub fn new<H: ?Sized + AsRef<[u8]>>(haystack: &'h H) -> Input<'h> {
        let haystack = haystack.as_ref();
        Input { haystack, span: Span { start: 0, end: haystack.len() } }
    }

    /// Restrict the search to the given span. Panics when the span is out
    /// of bounds or inverted.
    #[inline]
    pub fn span<S: Into<Span>>(mut self, span: S) -> Input<'h> {
        let span = span.into();
        assert!(
            span.start <= span.end && span.end <= self.haystack.len(),
            "span {:?} out of bounds for haystack of length {}",
            span,
            self.haystack.len(),
        );
        self.span = span;
        self
    }

    #[inline]
    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    /// The inclusive start of the search span.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// The exclusive end of the search span.
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    #[inline]
    pub fn get_span(&self) -> Span {
        self.span
    }
}

impl<'h, H: ?Sized + AsRef<[u8]>> From<&'h H> for Input<'h> {
    #[inline]
    fn from(haystack: &'h H) -> Input<'h> {
        Input::new(haystack)
    }
}

impl core::fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Input")
            .field("haystack.len()", &self.haystack.len())
            .field("span", &self.span)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_accessors() {
        let m = Match::must(4..7);
        assert_eq!(m.start(), 4);
        assert_eq!(m.end(), 7);
        assert_eq!(m.len(), 3);
        assert!(!m.is_empty());
        assert_eq!(&"aag atg act"[m.range()], "atg");
    }

    #[test]
    fn input_conversions() {
        let input: Input<'_> = "abc".into();
        assert_eq!(input.haystack(), b"abc");
        assert_eq!(input.get_span(), 0..3);

        let bytes: &[u8] = b"xyz";
        let input: Input<'_> = bytes.into();
        assert_eq!(input.end(), 3);

        let owned = String::from("abcd");
        let input = Input::new(&owned).span(1..3);
        assert_eq!(input.start(), 1);
        assert_eq!(input.end(), 3);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn input_span_out_of_bounds() {
        let _ = Input::new("abc").span(0..4);
    }
}
