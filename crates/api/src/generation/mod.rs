//! Generation service.
//!
//! The [`GenerationService`](service::GenerationService) ties the simulated
//! model, the artifact store, and the generation repository together behind
//! a single entry point used by the HTTP handlers.

pub mod service;
