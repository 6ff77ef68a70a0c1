//! Number domains used as matrix entries.

pub mod rational;
