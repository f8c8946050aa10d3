pub mod engine;
pub mod indicators;

#[cfg(test)]
mod indicators_tests;

pub use engine::*;
pub use indicators::*;
