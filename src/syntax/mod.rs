/*!
Pattern parsing.

[`parse`] turns a pattern string into the byte oriented [`Hir`](hir::Hir)
that the Thompson compiler consumes. The supported syntax is the common
core of the classic regex dialects: literals, `.`, byte classes, the
`^`/`$` anchors, `*`/`+`/`?`/`{m,n}` repetitions, `(...)`/`(?:...)`
groups and `|` alternation. Capture group extraction, lookaround,
backreferences and inline flags are rejected with
[`Error::Unsupported`] rather than silently misinterpreted.

```
use seqre::syntax::parse;

let hir = parse("agggtaaa|tttaccct")?;
# let _ = hir;
# Ok::<(), seqre::syntax::Error>(())
```
*/

pub mod hir;
mod parse;

pub use parse::parse;

/// An error that occurred while parsing a pattern.
///
/// Every variant except [`Error::TrailingEscape`] carries the byte offset
/// into the pattern where the problem was found.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unclosed group starting at offset {offset}")]
    UnclosedGroup { offset: usize },
    #[error("unopened group close at offset {offset}")]
    UnopenedGroup { offset: usize },
    #[error("unclosed character class starting at offset {offset}")]
    UnclosedClass { offset: usize },
    #[error("invalid character class range at offset {offset}")]
    InvalidClassRange { offset: usize },
    #[error("repetition operator at offset {offset} has nothing to repeat")]
    DanglingRepetition { offset: usize },
    #[error("invalid counted repetition at offset {offset}")]
    InvalidRepetition { offset: usize },
    #[error("pattern ends with a trailing backslash")]
    TrailingEscape,
    #[error("unrecognized escape \\{} at offset {offset}", char::from(*.byte))]
    UnrecognizedEscape { offset: usize, byte: u8 },
    #[error("invalid hexadecimal escape at offset {offset}")]
    InvalidHexEscape { offset: usize },
    #[error("{feature} is not supported (at offset {offset})")]
    Unsupported { offset: usize, feature: &'static str },
}

impl Error {
    /// True when the pattern uses valid syntax of a richer dialect that
    /// this crate deliberately does not implement.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}
