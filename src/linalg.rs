//! Exact row reduction and the algorithms built on it.
//!
//! [reduce::Reducer] is the shared kernel: it performs partial-pivot
//! elimination over [Rational](crate::domains::rational::Rational) entries
//! and records every row operation in a [trace::StepTrace]. The remaining
//! modules interpret a [reduce::ReductionResult] for one specific problem.

pub mod cramer;
pub mod determinant;
pub mod inverse;
pub mod matrix;
pub mod operations;
pub mod rank;
pub mod reduce;
pub mod system;
pub mod trace;
