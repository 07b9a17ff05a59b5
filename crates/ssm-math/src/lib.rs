//! Numerical primitives for posterior summaries.

pub mod math;

pub use math::moments::*;
pub use math::quantile::*;
