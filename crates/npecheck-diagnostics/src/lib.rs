//! npecheck diagnostics - diagnostic types, rule catalog and output formatters.

pub mod diagnostic;
pub mod human;
pub mod rules;
pub mod sarif;

pub use diagnostic::*;
