/*!
Nondeterministic finite automata.

[`thompson`] builds an NFA from a parsed pattern and [`pikevm`] executes
one directly. The NFA is also the input to DFA construction in
[`crate::dfa`].
*/

pub mod pikevm;
pub mod thompson;
