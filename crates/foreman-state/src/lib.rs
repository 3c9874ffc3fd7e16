//! Layer store, persistence boundary, and the plan manager.
//!
//! This crate holds the single point of shared mutable state in the
//! configuration core: the ordered layer stack and the cached effective
//! plan, kept consistent with what the blob store has made durable.

mod error;
mod manager;
mod store;

/// Error type returned by store and manager operations.
pub use error::StateError;
/// The plan manager.
pub use manager::PlanManager;
/// Persistence boundary and its built-in implementations.
pub use store::{BlobStore, DirStore, MemStore};
