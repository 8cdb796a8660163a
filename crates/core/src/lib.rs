//! Domain core for the AI studio: request rules, the simulated generation
//! backend, artifact storage, and the time/randomness seams they share.

pub mod artifact;
pub mod clock;
pub mod error;
pub mod generation;
pub mod simulator;
pub mod types;
