//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&SqlitePool` as the first argument. Every method is a
//! single statement, so callers never observe partial writes.

pub mod generation_repo;
pub mod user_repo;

pub use generation_repo::GenerationRepo;
pub use user_repo::UserRepo;
