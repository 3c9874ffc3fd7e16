//! Error types for layer parsing, merging, and combination.

use std::fmt;
use thiserror::Error;

/// Kind of plan entry an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A service definition.
    Service,
    /// A health check definition.
    Check,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => f.write_str("service"),
            Self::Check => f.write_str("check"),
        }
    }
}

/// Errors returned while parsing or merging layers.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Layer content failed to parse as YAML.
    #[error("cannot parse layer YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// An entry was introduced or altered without an override directive.
    #[error("layer {layer:?} must define \"override\" for {kind} {name:?}")]
    MissingOverride {
        /// Label of the offending layer.
        layer: String,
        /// Whether the entry is a service or a check.
        kind: EntryKind,
        /// Name of the offending entry.
        name: String,
    },
    /// An entry used `merge` for a name absent from all lower layers.
    #[error("layer {layer:?} must define override=replace for new {kind} {name:?}")]
    InvalidOverride {
        /// Label of the offending layer.
        layer: String,
        /// Whether the entry is a service or a check.
        kind: EntryKind,
        /// Name of the offending entry.
        name: String,
    },
}
