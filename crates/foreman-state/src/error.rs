//! Error types for the layer store and plan manager.

use foreman_plan::PlanError;
use thiserror::Error;

/// Errors returned by plan manager operations.
///
/// Every mutation failure is all-or-nothing: the layer store and the cached
/// plan are left exactly as they were before the failed operation.
#[derive(Debug, Error)]
pub enum StateError {
    /// The request named no label.
    #[error("label must be set")]
    EmptyLabel,
    /// The request named an unsupported serialization format.
    #[error("invalid format {0:?}")]
    InvalidFormat(String),
    /// A new layer reused an existing label.
    #[error("layer {0:?} already exists")]
    DuplicateLabel(String),
    /// A combine targeted a label that is not in the store.
    #[error("layer {0:?} not found")]
    UnknownLabel(String),
    /// Layer content failed to parse or merge.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// The blob store failed; the in-memory mutation was rolled back.
    #[error("blob store error: {0}")]
    Store(#[source] std::io::Error),
}
