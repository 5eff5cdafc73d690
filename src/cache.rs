/*!
A concurrent cache of compiled patterns.

Workloads like the DNA benchmark compile a fixed set of patterns and run
them from many threads at once. [`RegexCache`] memoizes compilation by
pattern text so that each pattern is built once and every caller shares
the same automata, and [`get_or_compile`] does the same against a
process wide cache.
*/

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::meta::{BuildError, Regex};

static GLOBAL: Lazy<RegexCache> = Lazy::new(RegexCache::new);

/// Compile `pattern` through the process wide cache.
pub fn get_or_compile(pattern: &str) -> Result<Regex, BuildError> {
    RegexCache::global().get_or_compile(pattern)
}

/// A map from pattern text to its compiled [`Regex`].
///
/// Lookups and insertions take a shard lock, never a global one, so
/// concurrent callers with different patterns do not contend. Two
/// threads racing to compile the same uncached pattern may both compile
/// it, but only one result is stored and both receive a fully built
/// `Regex`.
///
/// ```
/// use seqre::RegexCache;
///
/// let cache = RegexCache::new();
/// let re = cache.get_or_compile("tHa[Nt]")?;
/// assert_eq!(re.replace_all("tHat tHaN", "<4>"), "<4> <4>");
/// assert_eq!(cache.len(), 1);
///
/// # Ok::<(), seqre::BuildError>(())
/// ```
#[derive(Debug, Default)]
pub struct RegexCache {
    map: DashMap<Box<str>, Regex>,
}

impl RegexCache {
    pub fn new() -> RegexCache {
        RegexCache { map: DashMap::new() }
    }

    /// The process wide cache used by [`get_or_compile`].
    pub fn global() -> &'static RegexCache {
        &GLOBAL
    }

    /// Return the cached regex for `pattern`, compiling and storing it
    /// on a miss. Errors are not cached; a failing pattern fails afresh
    /// on every call.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, BuildError> {
        if let Some(re) = self.map.get(pattern) {
            return Ok(re.clone());
        }
        // Compile outside the shard lock. A concurrent miss on the same
        // pattern compiles redundantly at most once per racing thread;
        // the entry API below keeps a single winner.
        let re = Regex::new(pattern)?;
        log::trace!("caching compiled pattern {pattern:?}");
        Ok(self
            .map
            .entry(Box::from(pattern))
            .or_insert(re)
            .clone())
    }

    /// The number of cached patterns.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every cached pattern.
    pub fn clear(&self) {
        self.map.clear();
    }
}
