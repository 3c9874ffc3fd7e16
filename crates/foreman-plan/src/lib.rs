//! Layer data model, deterministic merge, and access-gated rendering.
//!
//! This crate owns the configuration schema of the foreman daemon: named
//! layers folded in ascending order into one effective plan, and the
//! redaction policy applied before a plan leaves the core.

mod error;
mod merge;
mod model;
mod render;

/// Error type returned by parsing, merging, and combination.
pub use error::{EntryKind, PlanError};
/// The pure layer fold.
pub use merge::merge_layers;
/// Configuration schema models.
pub use model::{Check, CheckExec, CheckLevel, Layer, Override, Plan, Service, ServiceStartup};
/// Access-gated rendering.
pub use render::{REDACTION_MARKER, render, render_yaml};
