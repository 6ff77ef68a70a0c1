//! rowtrace computes exact, fully traced solutions to textbook linear algebra problems.
//!
//! Every algorithm runs over exact rationals and records each row operation
//! together with a snapshot of the matrix, so that the elimination can be
//! replayed and audited step by step.
//!
//! For example:
//!
//! ```
//! use rowtrace::{linalg::{matrix::Matrix, system::classify_system}, printer::FormatOptions};
//!
//! let m = Matrix::parse(&[vec!["1", "1", "12"], vec!["1", "3", "26"]]).unwrap();
//! let report = classify_system(&m).unwrap();
//! for step in report.reduction.steps.render(&FormatOptions::unicode()) {
//!     println!("{}", step.description);
//! }
//! println!("{}", report.solution);
//! ```

pub mod domains;
pub mod equations;
pub mod linalg;
pub mod printer;
mod utils;
