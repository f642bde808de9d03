//! Body separation and position integration

pub mod physics;
pub mod separation;

pub use physics::{integrate, Arena};
pub use separation::SeparationSolver;
