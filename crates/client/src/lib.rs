//! Client side of the AI studio: a typed HTTP client and the
//! generate/retry/abort controller that drives it.

pub mod api;
pub mod controller;
pub mod error;
pub mod session;
pub mod types;
