/*!
A small byte oriented regex engine built for scan heavy workloads, such
as the classic DNA sequence benchmark: compile a handful of patterns
once, then count and replace their matches across megabytes of text from
many threads.

## Features
- A compact pattern dialect: literals, `.`, byte classes, `^`/`$`,
  `*`/`+`/`?`/`{m,n}` repetitions, groups and alternation. Richer
  features (captures, lookaround, backreferences) are rejected up front
  rather than approximated.
- Leftmost-longest match semantics, identical across engines.
- Two interchangeable engines behind one API: an always-available
  Thompson NFA simulation and, for patterns that support it, fully
  compiled dense DFAs that cost one table load per input byte.
- `memchr` based prefilters for patterns whose matches can only start
  with a few distinct bytes.
- Thread safe sharing: a compiled [`Regex`] is immutable and cheap to
  clone, and [`RegexCache`] memoizes compilation by pattern text.

## Usage
```
use seqre::{Match, Regex};

let re = Regex::new("agggtaaa|tttaccct")?;
let hay = "cggtaaagggtaaatttaccctaaa";
assert_eq!(re.find(hay), Some(Match::must(6..14)));
assert_eq!(re.count(hay), 2);

let re = Regex::new("tHa[Nt]")?;
assert_eq!(re.replace_all("tHat tHaN", "<4>"), "<4> <4>");

# Ok::<(), seqre::BuildError>(())
```

Counting across threads, the way the benchmark drives it:
```
use seqre::get_or_compile;

let seq = "agggtaaatttaccct".repeat(8);
let counts: Vec<usize> = std::thread::scope(|scope| {
    ["agggtaaa|tttaccct", "aggg.aaa|ttt.ccct"]
        .map(|p| {
            let seq = seq.as_str();
            scope.spawn(move || get_or_compile(p).unwrap().count(seq))
        })
        .map(|h| h.join().unwrap())
        .to_vec()
});
assert_eq!(counts, vec![16, 16]);
```

## Performance
The following `Cargo.toml` settings are recommended if best performance
is desired:
```toml
[profile.release]
lto = "fat"
codegen-units = 1
```
*/

pub mod cache;
pub mod dfa;
pub mod meta;
pub mod nfa;
mod search;
pub mod syntax;
pub mod util;

pub use crate::{
    cache::{get_or_compile, RegexCache},
    meta::{BuildError, Builder, Engine, Regex},
    search::{Input, Match, Span},
};
