/*!
Lower level utilities shared by the matching engines.
*/

pub mod alphabet;
pub mod pool;
pub mod prefilter;
pub mod primitives;
pub(crate) mod sparse;
