use std::sync::Arc;

use bon::bon;

use crate::{
    dfa,
    nfa::{
        pikevm::{self, PikeVM},
        thompson,
    },
    search::{Input, Match},
    syntax,
    util::pool::Pool,
};

/// An error that can occur while building a [`Regex`].
#[non_exhaustive]
#[derive(Clone, Debug, thiserror::Error)]
pub enum BuildError {
    /// The pattern is not valid, either because of a syntax error or
    /// because it uses a feature of a richer dialect that this crate
    /// deliberately rejects. [`syntax::Error::is_unsupported`] tells the
    /// two apart.
    #[error(transparent)]
    Syntax(syntax::Error),
    /// The NFA grew past its size limit.
    #[error(transparent)]
    Nfa(thompson::BuildError),
    /// DFA compilation failed and [`Engine::Dfa`] forbids falling back.
    #[error(transparent)]
    Dfa(#[from] dfa::BuildError),
}

impl BuildError {
    pub fn syntax_error(&self) -> Option<&syntax::Error> {
        match self {
            BuildError::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

impl From<syntax::Error> for BuildError {
    fn from(err: syntax::Error) -> BuildError {
        BuildError::Syntax(err)
    }
}

impl From<thompson::BuildError> for BuildError {
    fn from(err: thompson::BuildError) -> BuildError {
        match err {
            thompson::BuildError::Syntax(err) => BuildError::Syntax(err),
            err => BuildError::Nfa(err),
        }
    }
}

/// Which engines a [`Regex`] may compile and search with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Engine {
    /// Compile DFAs when the pattern supports them and fall back to the
    /// NFA simulation otherwise. Both report identical matches, so the
    /// choice is invisible apart from speed.
    #[default]
    Auto,
    /// Always simulate the NFA.
    Nfa,
    /// Require compiled DFAs. Building fails with
    /// [`BuildError::Dfa`] for patterns they cannot express.
    Dfa,
}

/// A compiled regular expression for searching haystacks.
///
/// A `Regex` bundles a Thompson NFA, its PikeVM simulation and, for
/// patterns that support it, a set of ahead-of-time compiled DFAs. Every
/// search reports the same leftmost-longest match no matter which engine
/// runs it.
///
/// ```
/// use seqre::{Match, Regex};
///
/// let re = Regex::new("a[ct]g")?;
/// assert_eq!(re.find("aag atg acg"), Some(Match::must(4..7)));
/// assert_eq!(re.count("aag atg acg"), 2);
///
/// # Ok::<(), seqre::BuildError>(())
/// ```
///
/// # Synchronization and cloning
///
/// A `Regex` is immutable once built and can be searched from any number
/// of threads. The NFA simulation needs mutable scratch space per
/// search, which is drawn from an internal thread safe pool; under heavy
/// contention, cloning the `Regex` into each thread gives every clone
/// its own pool while the compiled automata stay shared behind an `Arc`.
///
/// # Configuration
///
/// [`Regex::builder`] exposes the construction knobs:
///
/// ```
/// use seqre::{Engine, Match, Regex};
///
/// let re = Regex::builder()
///     .engine(Engine::Nfa)
///     .prefilter(false)
///     .build("agggtaaa|tttaccct")?;
/// assert!(re.is_match("cgtagggtaaacc"));
///
/// # Ok::<(), seqre::BuildError>(())
/// ```
pub struct Regex {
    /// The actual regex implementation.
    imp: Arc<RegexI>,
    /// A thread safe pool of scratch caches for the NFA simulation.
    ///
    /// Kept outside the `Arc` so that cloning a `Regex` gives the clone
    /// its own pool.
    pool: Pool<pikevm::Cache>,
}

/// The internal implementation of `Regex`, split out so that it can be
/// wrapped in an `Arc`.
struct RegexI {
    pikevm: PikeVM,
    dfa: Option<dfa::Regex>,
    pattern: Box<str>,
}

#[bon]
impl Regex {
    /// Compile a pattern with the default configuration.
    pub fn new(pattern: &str) -> Result<Regex, BuildError> {
        Regex::builder().build(pattern)
    }

    #[builder(builder_type = Builder, finish_fn(name = build, doc {
    /// Compile the pattern with this configuration.
    }))]
    pub fn builder(
        #[builder(finish_fn)] pattern: &str,
        /// Which engines may compile and execute searches.
        #[builder(default)] engine: Engine,
        /// Thompson NFA construction configuration. The reverse flag is
        /// managed internally and ignored here.
        #[builder(default)] thompson: thompson::Config,
        /// DFA construction configuration. Unused with [`Engine::Nfa`].
        #[builder(default)] dfa: dfa::Config,
        /// Scan for candidate match start bytes with `memchr` before
        /// seeding NFA threads. Only applies when the pattern's matches
        /// can start with at most three distinct bytes.
        #[builder(default = true)] prefilter: bool,
    ) -> Result<Regex, BuildError> {
        let hir = syntax::parse(pattern)?;
        let nfa = thompson::Compiler::new()
            .configure(thompson.clone().reverse(false))
            .build_from_hir(&hir)?;

        let compiled = match engine {
            Engine::Nfa => None,
            Engine::Auto | Engine::Dfa => {
                let reverse_nfa = thompson::Compiler::new()
                    .configure(thompson.clone().reverse(true))
                    .build_from_hir(&hir)?;
                match dfa::Regex::build(&nfa, &reverse_nfa, &dfa) {
                    Ok(re) => Some(re),
                    Err(err) if engine == Engine::Auto => {
                        log::debug!(
                            "pattern {pattern:?}: using the NFA simulation ({err})",
                        );
                        None
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        };

        let mut pikevm = PikeVM::new(nfa);
        if !prefilter {
            pikevm = pikevm.without_prefilter();
        }
        let imp = Arc::new(RegexI {
            pikevm,
            dfa: compiled,
            pattern: pattern.into(),
        });
        let pool = Regex::cache_pool(&imp);
        Ok(Regex { imp, pool })
    }

    fn cache_pool(imp: &Arc<RegexI>) -> Pool<pikevm::Cache> {
        let imp = Arc::clone(imp);
        Pool::new(move || imp.pikevm.create_cache())
    }
}

impl Regex {
    /// The leftmost-longest match in the input, if any.
    ///
    /// Searching a sub-span expresses "find the next match at or after
    /// an offset":
    ///
    /// ```
    /// use seqre::{Input, Match, Regex};
    ///
    /// let re = Regex::new("a[ct]g")?;
    /// let hay = "aag atg acg";
    /// assert_eq!(re.find(hay), Some(Match::must(4..7)));
    /// assert_eq!(
    ///     re.find(Input::new(hay).span(7..hay.len())),
    ///     Some(Match::must(8..11)),
    /// );
    /// assert_eq!(re.find(Input::new(hay).span(11..hay.len())), None);
    ///
    /// # Ok::<(), seqre::BuildError>(())
    /// ```
    pub fn find<'h, I: Into<Input<'h>>>(&self, input: I) -> Option<Match> {
        self.search(&input.into())
    }

    pub fn is_match<'h, I: Into<Input<'h>>>(&self, input: I) -> bool {
        self.search(&input.into()).is_some()
    }

    /// Iterate over all non-overlapping matches, leftmost first.
    pub fn find_iter<'r, 'h, I: Into<Input<'h>>>(
        &'r self,
        input: I,
    ) -> FindMatches<'r, 'h> {
        let input = input.into();
        let at = input.start();
        FindMatches { re: self, input, at, last_match_end: None }
    }

    /// The number of non-overlapping matches in the input.
    ///
    /// ```
    /// use seqre::Regex;
    ///
    /// assert_eq!(Regex::new("a|b")?.count("ababab"), 6);
    ///
    /// # Ok::<(), seqre::BuildError>(())
    /// ```
    pub fn count<'h, I: Into<Input<'h>>>(&self, input: I) -> usize {
        self.find_iter(input).count()
    }

    /// Replace every match in `haystack` with `replacement`.
    ///
    /// ```
    /// use seqre::Regex;
    ///
    /// let re = Regex::new("[0-9]+")?;
    /// assert_eq!(re.replace_all("x1y22z333", "#"), "x#y#z#");
    ///
    /// # Ok::<(), seqre::BuildError>(())
    /// ```
    pub fn replace_all(&self, haystack: &str, replacement: &str) -> String {
        let replaced = self
            .replace_all_bytes(haystack.as_bytes(), replacement.as_bytes());
        // Byte oriented matching can in principle split a multi-byte
        // character; degrade to lossy decoding rather than panic.
        String::from_utf8(replaced).unwrap_or_else(|err| {
            String::from_utf8_lossy(&err.into_bytes()).into_owned()
        })
    }

    /// Replace every match in `haystack` with `replacement`, operating
    /// on raw bytes.
    pub fn replace_all_bytes(
        &self,
        haystack: &[u8],
        replacement: &[u8],
    ) -> Vec<u8> {
        let mut dst = Vec::with_capacity(haystack.len());
        let mut last = 0;
        for m in self.find_iter(haystack) {
            dst.extend_from_slice(&haystack[last..m.start()]);
            dst.extend_from_slice(replacement);
            last = m.end();
        }
        dst.extend_from_slice(&haystack[last..]);
        dst
    }

    /// The pattern this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.imp.pattern
    }

    /// Whether searches run on compiled DFAs rather than the NFA
    /// simulation.
    pub fn uses_dfa(&self) -> bool {
        self.imp.dfa.is_some()
    }

    fn search(&self, input: &Input<'_>) -> Option<Match> {
        match self.imp.dfa {
            Some(ref dfa) => dfa.find(input),
            None => {
                let mut cache = self.pool.get();
                self.imp.pikevm.search(&mut cache, input)
            }
        }
    }
}

impl Clone for Regex {
    fn clone(&self) -> Regex {
        let imp = Arc::clone(&self.imp);
        let pool = Regex::cache_pool(&imp);
        Regex { imp, pool }
    }
}

impl core::fmt::Debug for Regex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &self.pattern())
            .field("dfa", &self.imp.dfa.is_some())
            .finish()
    }
}

/// An iterator over all non-overlapping matches, created by
/// [`Regex::find_iter`].
///
/// An empty match immediately after another match is skipped, and an
/// empty match advances the scan by one byte, so iteration always
/// terminates after at most `len(haystack) + 1` searches.
#[derive(Debug)]
pub struct FindMatches<'r, 'h> {
    re: &'r Regex,
    input: Input<'h>,
    at: usize,
    last_match_end: Option<usize>,
}

impl Iterator for FindMatches<'_, '_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if self.at > self.input.end() {
                return None;
            }
            let input =
                self.input.clone().span(self.at..self.input.end());
            let m = match self.re.search(&input) {
                None => {
                    self.at = self.input.end() + 1;
                    return None;
                }
                Some(m) => m,
            };
            if m.is_empty() {
                self.at = m.end() + 1;
                if Some(m.end()) == self.last_match_end {
                    continue;
                }
            } else {
                self.at = m.end();
            }
            self.last_match_end = Some(m.end());
            return Some(m);
        }
    }
}
