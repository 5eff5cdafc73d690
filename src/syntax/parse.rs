use crate::syntax::{
    hir::{ClassBytes, ClassBytesRange, Hir, Look, Repetition},
    Error,
};

/// Parse a pattern string into an [`Hir`].
///
/// ```
/// use seqre::syntax::parse;
///
/// assert!(parse("a[ct]g").is_ok());
/// assert!(parse("tHa[Nt]").is_ok());
/// assert!(parse("a[ct").is_err());
/// assert!(parse(r"(?=look)").unwrap_err().is_unsupported());
/// ```
pub fn parse(pattern: &str) -> Result<Hir, Error> {
    let mut parser = Parser { pattern: pattern.as_bytes(), pos: 0 };
    let hir = parser.parse_alternation()?;
    if let Some(b')') = parser.peek() {
        return Err(Error::UnopenedGroup { offset: parser.pos });
    }
    debug_assert_eq!(parser.pos, parser.pattern.len());
    Ok(hir)
}

/// A recursive descent parser over the pattern bytes.
///
/// Precedence, lowest to highest: alternation, concatenation, repetition.
/// Groups override precedence. Multi-byte UTF-8 sequences in the pattern
/// are kept together as single literal atoms, so a repetition after one
/// applies to the whole character.
struct Parser<'p> {
    pattern: &'p [u8],
    pos: usize,
}

/// What an escape sequence or class member denotes.
enum Item {
    Byte(u8),
    Class(ClassBytes),
}

impl<'p> Parser<'p> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.pattern.get(self.pos + offset).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    fn bump_if(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_alternation(&mut self) -> Result<Hir, Error> {
        let mut alts = vec![self.parse_concat()?];
        while self.bump_if(b'|') {
            alts.push(self.parse_concat()?);
        }
        Ok(Hir::alternation(alts))
    }

    fn parse_concat(&mut self) -> Result<Hir, Error> {
        let mut subs = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'|') | Some(b')') => break,
                Some(_) => {
                    let atom = self.parse_atom()?;
                    subs.push(self.parse_repetitions(atom)?);
                }
            }
        }
        Ok(Hir::concat(subs))
    }

    /// Apply any number of trailing repetition operators to `atom`.
    /// `a**` is accepted and means `(a*)*`.
    fn parse_repetitions(&mut self, atom: Hir) -> Result<Hir, Error> {
        let mut hir = atom;
        loop {
            let (min, max) = match self.peek() {
                Some(b'*') => (0, None),
                Some(b'+') => (1, None),
                Some(b'?') => (0, Some(1)),
                Some(b'{') => {
                    self.pos += 1;
                    let (min, max) = self.parse_counted()?;
                    let greedy = !self.bump_if(b'?');
                    hir = Hir::repetition(Repetition {
                        min,
                        max,
                        greedy,
                        sub: Box::new(hir),
                    });
                    continue;
                }
                _ => break,
            };
            self.pos += 1;
            let greedy = !self.bump_if(b'?');
            hir = Hir::repetition(Repetition {
                min,
                max,
                greedy,
                sub: Box::new(hir),
            });
        }
        Ok(hir)
    }

    /// Parse the body of `{m}`, `{m,}` or `{m,n}`, after the `{`.
    fn parse_counted(&mut self) -> Result<(u32, Option<u32>), Error> {
        let offset = self.pos - 1;
        let min = self
            .parse_decimal()
            .ok_or(Error::InvalidRepetition { offset })?;
        let max = if self.bump_if(b',') {
            if self.peek() == Some(b'}') {
                None
            } else {
                Some(
                    self.parse_decimal()
                        .ok_or(Error::InvalidRepetition { offset })?,
                )
            }
        } else {
            Some(min)
        };
        if !self.bump_if(b'}') {
            return Err(Error::InvalidRepetition { offset });
        }
        if let Some(max) = max {
            if min > max {
                return Err(Error::InvalidRepetition { offset });
            }
        }
        Ok((min, max))
    }

    fn parse_decimal(&mut self) -> Option<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        // Reject absurd counts rather than overflow.
        let digits = core::str::from_utf8(&self.pattern[start..self.pos])
            .expect("ASCII digits");
        digits.parse().ok().filter(|&n| n <= 1_000_000)
    }

    fn parse_atom(&mut self) -> Result<Hir, Error> {
        let offset = self.pos;
        match self.bump().expect("caller checked for input") {
            b'(' => self.parse_group(offset),
            b'[' => self.parse_class(offset),
            b'.' => Ok(Hir::dot()),
            b'^' => Ok(Hir::look(Look::Start)),
            b'$' => Ok(Hir::look(Look::End)),
            b'\\' => match self.parse_escape(offset, false)? {
                Item::Byte(byte) => Ok(Hir::literal([byte])),
                Item::Class(class) => Ok(Hir::class(class)),
            },
            b'*' | b'+' | b'?' => {
                Err(Error::DanglingRepetition { offset })
            }
            b'{' => Err(Error::DanglingRepetition { offset }),
            byte if byte < 0x80 => Ok(Hir::literal([byte])),
            byte => {
                // Keep a whole UTF-8 sequence together as one atom.
                let len = utf8_len(byte);
                let end = (offset + len).min(self.pattern.len());
                self.pos = end;
                Ok(Hir::literal(&self.pattern[offset..end]))
            }
        }
    }

    fn parse_group(&mut self, open: usize) -> Result<Hir, Error> {
        if self.peek() == Some(b'?') {
            match self.peek_at(1) {
                Some(b':') => {
                    self.pos += 2;
                }
                Some(b'=') | Some(b'!') => {
                    return Err(Error::Unsupported {
                        offset: open,
                        feature: "lookahead",
                    })
                }
                Some(b'<') => {
                    return Err(Error::Unsupported {
                        offset: open,
                        feature: "lookbehind or named group",
                    })
                }
                _ => {
                    return Err(Error::Unsupported {
                        offset: open,
                        feature: "inline flags",
                    })
                }
            }
        }
        let hir = self.parse_alternation()?;
        if !self.bump_if(b')') {
            return Err(Error::UnclosedGroup { offset: open });
        }
        Ok(hir)
    }

    fn parse_class(&mut self, open: usize) -> Result<Hir, Error> {
        let negated = self.bump_if(b'^');
        let mut class = ClassBytes::empty();
        let mut first = true;
        loop {
            let offset = self.pos;
            let byte = match self.bump() {
                None => return Err(Error::UnclosedClass { offset: open }),
                // `]` as the very first member is a literal.
                Some(b']') if !first => break,
                Some(byte) => byte,
            };
            first = false;
            let lo = match byte {
                b'\\' => match self.parse_escape(offset, true)? {
                    Item::Byte(byte) => byte,
                    Item::Class(shorthand) => {
                        // Shorthands like `\d` cannot form a range, on
                        // either side of the dash.
                        if self.peek() == Some(b'-')
                            && matches!(self.peek_at(1), Some(b) if b != b']')
                        {
                            return Err(Error::InvalidClassRange {
                                offset: self.pos,
                            });
                        }
                        class.union(&shorthand);
                        continue;
                    }
                },
                byte => byte,
            };
            // A trailing `-` right before `]` is a literal dash.
            if self.peek() == Some(b'-') && self.peek_at(1) != Some(b']') {
                self.pos += 1;
                let hi_offset = self.pos;
                let hi = match self.bump() {
                    None => {
                        return Err(Error::UnclosedClass { offset: open })
                    }
                    Some(b'\\') => {
                        match self.parse_escape(hi_offset, true)? {
                            Item::Byte(byte) => byte,
                            Item::Class(_) => {
                                return Err(Error::InvalidClassRange {
                                    offset: hi_offset,
                                })
                            }
                        }
                    }
                    Some(byte) => byte,
                };
                if lo > hi {
                    return Err(Error::InvalidClassRange { offset });
                }
                class.push(ClassBytesRange::new(lo, hi));
            } else {
                class.push(ClassBytesRange::new(lo, lo));
            }
        }
        if negated {
            class.negate();
        }
        Ok(Hir::class(class))
    }

    /// Parse an escape sequence, after the backslash.
    fn parse_escape(
        &mut self,
        offset: usize,
        in_class: bool,
    ) -> Result<Item, Error> {
        let byte = self.bump().ok_or(Error::TrailingEscape)?;
        let item = match byte {
            b'n' => Item::Byte(b'\n'),
            b'r' => Item::Byte(b'\r'),
            b't' => Item::Byte(b'\t'),
            b'f' => Item::Byte(0x0C),
            b'v' => Item::Byte(0x0B),
            b'0' => Item::Byte(0x00),
            b'a' => Item::Byte(0x07),
            b'x' => Item::Byte(self.parse_hex(offset)?),
            b'd' => Item::Class(class_digit()),
            b'w' => Item::Class(class_word()),
            b's' => Item::Class(class_space()),
            b'D' => Item::Class(negated(class_digit())),
            b'W' => Item::Class(negated(class_word())),
            b'S' => Item::Class(negated(class_space())),
            b'A' if !in_class => {
                return Err(Error::Unsupported {
                    offset,
                    feature: r"\A (use ^ instead)",
                })
            }
            b'z' if !in_class => {
                return Err(Error::Unsupported {
                    offset,
                    feature: r"\z (use $ instead)",
                })
            }
            b'b' if in_class => Item::Byte(0x08),
            b'b' | b'B' => {
                return Err(Error::Unsupported {
                    offset,
                    feature: "word boundary assertion",
                })
            }
            b'p' | b'P' => {
                return Err(Error::Unsupported {
                    offset,
                    feature: "Unicode character class",
                })
            }
            b'1'..=b'9' => {
                return Err(Error::Unsupported {
                    offset,
                    feature: "backreference",
                })
            }
            byte if byte.is_ascii_alphanumeric() => {
                return Err(Error::UnrecognizedEscape { offset, byte })
            }
            // Identity escape for punctuation and metacharacters.
            byte if byte < 0x80 => Item::Byte(byte),
            byte => return Err(Error::UnrecognizedEscape { offset, byte }),
        };
        Ok(item)
    }

    /// Parse the `HH` of a `\xHH` escape.
    fn parse_hex(&mut self, offset: usize) -> Result<u8, Error> {
        let hi = self.bump().and_then(hex_digit);
        let lo = self.bump().and_then(hex_digit);
        match (hi, lo) {
            (Some(hi), Some(lo)) => Ok(hi * 16 + lo),
            _ => Err(Error::InvalidHexEscape { offset }),
        }
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// The length of a UTF-8 sequence given its leading byte.
fn utf8_len(leading: u8) -> usize {
    match leading {
        0xF0..=0xF7 => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

fn class_digit() -> ClassBytes {
    ClassBytes::new([ClassBytesRange::new(b'0', b'9')])
}

fn class_word() -> ClassBytes {
    ClassBytes::new([
        ClassBytesRange::new(b'0', b'9'),
        ClassBytesRange::new(b'A', b'Z'),
        ClassBytesRange::new(b'_', b'_'),
        ClassBytesRange::new(b'a', b'z'),
    ])
}

fn class_space() -> ClassBytes {
    ClassBytes::new([
        ClassBytesRange::new(b'\t', b'\r'),
        ClassBytesRange::new(b' ', b' '),
    ])
}

fn negated(mut class: ClassBytes) -> ClassBytes {
    class.negate();
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::hir::HirKind;

    fn lit(bytes: &[u8]) -> Hir {
        Hir::literal(bytes)
    }

    #[test]
    fn precedence() {
        // Alternation binds loosest.
        assert_eq!(
            parse("ab|c").unwrap(),
            Hir::alternation(vec![
                Hir::concat(vec![lit(b"a"), lit(b"b")]),
                lit(b"c"),
            ]),
        );
        // Repetition binds tightest.
        assert_eq!(
            parse("ab*").unwrap(),
            Hir::concat(vec![
                lit(b"a"),
                Hir::repetition(Repetition {
                    min: 0,
                    max: None,
                    greedy: true,
                    sub: Box::new(lit(b"b")),
                }),
            ]),
        );
        // Groups override.
        assert_eq!(
            parse("(ab)+").unwrap(),
            Hir::repetition(Repetition {
                min: 1,
                max: None,
                greedy: true,
                sub: Box::new(Hir::concat(vec![lit(b"a"), lit(b"b")])),
            }),
        );
        assert_eq!(parse("(?:ab)").unwrap(), parse("(ab)").unwrap());
    }

    #[test]
    fn classes() {
        assert_eq!(
            parse("[a-cx]").unwrap(),
            Hir::class(ClassBytes::new([
                ClassBytesRange::new(b'a', b'c'),
                ClassBytesRange::new(b'x', b'x'),
            ])),
        );
        // Negation.
        assert_eq!(
            parse("[^>]").unwrap(),
            Hir::class(ClassBytes::new([
                ClassBytesRange::new(0, b'>' - 1),
                ClassBytesRange::new(b'>' + 1, u8::MAX),
            ])),
        );
        // Leading `]` is a literal; trailing `-` is a literal.
        assert_eq!(
            parse("[]a]").unwrap(),
            Hir::class(ClassBytes::new([
                ClassBytesRange::new(b']', b']'),
                ClassBytesRange::new(b'a', b'a'),
            ])),
        );
        assert_eq!(
            parse("[a-]").unwrap(),
            Hir::class(ClassBytes::new([
                ClassBytesRange::new(b'-', b'-'),
                ClassBytesRange::new(b'a', b'a'),
            ])),
        );
        // Metacharacters are literals inside a class.
        assert_eq!(
            parse("[.*+]").unwrap(),
            Hir::class(ClassBytes::new([
                ClassBytesRange::new(b'*', b'*'),
                ClassBytesRange::new(b'+', b'+'),
                ClassBytesRange::new(b'.', b'.'),
            ])),
        );
        // Shorthands union into the class.
        assert_eq!(parse(r"[\d]").unwrap(), parse("[0-9]").unwrap());
    }

    #[test]
    fn shorthand_range_endpoints() {
        assert!(matches!(
            parse(r"[a-\d]").unwrap_err(),
            Error::InvalidClassRange { .. }
        ));
        assert!(matches!(
            parse(r"[\d-x]").unwrap_err(),
            Error::InvalidClassRange { .. }
        ));
        // A dash right before `]` is still a literal.
        assert_eq!(parse(r"[\d-]").unwrap(), parse("[-0-9]").unwrap());
    }

    #[test]
    fn escapes() {
        assert_eq!(parse(r"\|").unwrap(), lit(b"|"));
        assert_eq!(parse(r"\.").unwrap(), lit(b"."));
        assert_eq!(parse(r"\\").unwrap(), lit(b"\\"));
        assert_eq!(parse(r"\n").unwrap(), lit(b"\n"));
        assert_eq!(parse(r"\x41").unwrap(), lit(b"A"));
        assert_eq!(parse(r"\d").unwrap(), parse("[0-9]").unwrap());
        assert_eq!(
            parse(r"\w").unwrap(),
            parse("[0-9A-Z_a-z]").unwrap(),
        );
    }

    #[test]
    fn counted_repetitions() {
        assert_eq!(
            parse("a{2,4}").unwrap(),
            Hir::repetition(Repetition {
                min: 2,
                max: Some(4),
                greedy: true,
                sub: Box::new(lit(b"a")),
            }),
        );
        assert_eq!(
            parse("a{3}").unwrap(),
            Hir::repetition(Repetition {
                min: 3,
                max: Some(3),
                greedy: true,
                sub: Box::new(lit(b"a")),
            }),
        );
        assert_eq!(
            parse("a{2,}").unwrap(),
            Hir::repetition(Repetition {
                min: 2,
                max: None,
                greedy: true,
                sub: Box::new(lit(b"a")),
            }),
        );
        assert!(matches!(
            parse("a{4,2}").unwrap_err(),
            Error::InvalidRepetition { .. }
        ));
        assert!(matches!(
            parse("a{").unwrap_err(),
            Error::InvalidRepetition { .. }
        ));
    }

    #[test]
    fn non_greedy_parses() {
        match parse(".*?").unwrap().into_kind() {
            HirKind::Repetition(rep) => assert!(!rep.greedy),
            kind => panic!("unexpected hir: {kind:?}"),
        }
    }

    #[test]
    fn utf8_literal_atoms() {
        // A repetition after a multi-byte character applies to the whole
        // character, not its last byte.
        assert_eq!(
            parse("é+").unwrap(),
            Hir::repetition(Repetition {
                min: 1,
                max: None,
                greedy: true,
                sub: Box::new(lit("é".as_bytes())),
            }),
        );
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse("(ab").unwrap_err(),
            Error::UnclosedGroup { offset: 0 }
        ));
        assert!(matches!(
            parse("ab)").unwrap_err(),
            Error::UnopenedGroup { offset: 2 }
        ));
        assert!(matches!(
            parse("[ab").unwrap_err(),
            Error::UnclosedClass { offset: 0 }
        ));
        assert!(matches!(
            parse("[]").unwrap_err(),
            Error::UnclosedClass { .. }
        ));
        assert!(matches!(
            parse("*a").unwrap_err(),
            Error::DanglingRepetition { offset: 0 }
        ));
        assert!(matches!(
            parse("[z-a]").unwrap_err(),
            Error::InvalidClassRange { .. }
        ));
        assert!(matches!(parse("\\").unwrap_err(), Error::TrailingEscape));
        assert!(matches!(
            parse(r"\xZZ").unwrap_err(),
            Error::InvalidHexEscape { .. }
        ));
    }

    #[test]
    fn unsupported_features() {
        for pattern in [r"(?=a)", r"(?!a)", r"(?<name>a)", r"(?i)a", r"a\1", r"\bfoo", r"\p{L}"] {
            let err = parse(pattern).unwrap_err();
            assert!(err.is_unsupported(), "{pattern}: {err}");
        }
    }

    #[test]
    fn redux_patterns_parse() {
        for pattern in [
            ">.*\n|\n",
            "tHa[Nt]",
            "aND|caN|Ha[DS]|WaS",
            "a[NSt]|BY",
            "<[^>]*>",
            r"\|[^|][^|]*\|",
            "agggtaaa|tttaccct",
            "[cgt]gggtaaa|tttaccc[acg]",
            "a[act]ggtaaa|tttacc[agt]t",
            "ag[act]gtaaa|tttac[agt]ct",
            "agg[act]taaa|ttta[agt]cct",
            "aggg[acg]aaa|ttt[cgt]ccct",
            "agggt[cgt]aa|tt[acg]accct",
            "agggta[cgt]a|t[acg]taccct",
            "agggtaa[cgt]|[acg]ttaccct",
        ] {
            assert!(parse(pattern).is_ok(), "{pattern}");
        }
    }
}
