/*!
The meta regex engine: the crate's primary search API.

A [`Regex`] owns every engine compiled for one pattern and routes each
search to the best one available. See the [`Regex`] documentation for
the details; most callers need nothing else from this module.
*/

mod regex;

pub use regex::{BuildError, Builder, Engine, FindMatches, Regex};
