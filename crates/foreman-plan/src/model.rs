//! Configuration schema for foreman layers and plans.

use crate::PlanError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-entry directive governing how a layer's entry combines with lower
/// layers' entries for the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Override {
    /// Directive absent from the source document. Never legal in a stored
    /// layer; rejected uniformly in every layer, including the first.
    #[default]
    Unknown,
    /// This entry fully supersedes any lower entry with the same name.
    Replace,
    /// This entry's fields are overlaid onto the lower entry's fields.
    Merge,
}

/// Automatic startup behavior for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStartup {
    /// Started when the daemon starts.
    Enabled,
    /// Only started on explicit request.
    Disabled,
}

/// Severity tier of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    /// Failing the check means the workload is dead.
    Alive,
    /// Failing the check means the workload cannot serve traffic.
    Ready,
}

/// A single service definition within a layer or plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Service {
    /// How this definition combines with lower layers.
    #[serde(default, rename = "override")]
    pub override_: Override,
    /// Optional one-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Command line run to start the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Whether the service starts automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<ServiceStartup>,
    /// Environment variables passed to the service process. These are the
    /// sensitive payload redacted for non-admin callers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Service {
    /// Overlay the fields present in `other` onto this definition; fields
    /// absent in `other` are left untouched.
    pub fn merge_from(&mut self, other: &Service) {
        if other.override_ != Override::Unknown {
            self.override_ = other.override_;
        }
        if let Some(summary) = &other.summary {
            self.summary = Some(summary.clone());
        }
        if let Some(command) = &other.command {
            self.command = Some(command.clone());
        }
        if let Some(startup) = other.startup {
            self.startup = Some(startup);
        }
        for (name, value) in &other.environment {
            self.environment.insert(name.clone(), value.clone());
        }
    }
}

/// Command execution backing a health check, with its own environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckExec {
    /// Command line the check runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Environment variables for the check command; redacted like service
    /// environments.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl CheckExec {
    /// Overlay the fields present in `other` onto this block.
    pub fn merge_from(&mut self, other: &CheckExec) {
        if let Some(command) = &other.command {
            self.command = Some(command.clone());
        }
        for (name, value) in &other.environment {
            self.environment.insert(name.clone(), value.clone());
        }
    }
}

/// A single health check definition within a layer or plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Check {
    /// How this definition combines with lower layers.
    #[serde(default, rename = "override")]
    pub override_: Override,
    /// Check severity level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<CheckLevel>,
    /// How often the check runs, as free-form duration text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Command execution backing the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<CheckExec>,
}

impl Check {
    /// Overlay the fields present in `other` onto this definition; the
    /// exec block is merged field by field when both sides carry one.
    pub fn merge_from(&mut self, other: &Check) {
        if other.override_ != Override::Unknown {
            self.override_ = other.override_;
        }
        if let Some(level) = other.level {
            self.level = Some(level);
        }
        if let Some(period) = &other.period {
            self.period = Some(period.clone());
        }
        if let Some(exec) = &other.exec {
            match &mut self.exec {
                Some(existing) => existing.merge_from(exec),
                None => self.exec = Some(exec.clone()),
            }
        }
    }
}

/// A single named, ordered configuration fragment.
///
/// Label and order identify the layer within the store; neither is part of
/// the layer document itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Layer {
    /// Unique label assigned when the layer was added.
    #[serde(skip)]
    pub label: String,
    /// Merge position assigned at creation; ascending order is merge order.
    #[serde(skip)]
    pub order: u32,
    /// Optional one-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Services contributed by this layer, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, Service>,
    /// Health checks contributed by this layer, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, Check>,
}

impl Layer {
    /// Parse layer content from YAML and stamp its identity.
    pub fn parse(label: &str, order: u32, content: &str) -> Result<Self, PlanError> {
        debug!(
            "parsing layer (label={label}, order={order}, len={})",
            content.len()
        );
        let mut layer: Layer = serde_yaml::from_str(content)?;
        layer.label = label.to_string();
        layer.order = order;
        Ok(layer)
    }

    /// Serialize the layer document (without label or order) as YAML.
    pub fn to_yaml(&self) -> Result<String, PlanError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// The effective configuration computed by merging all layers in order.
///
/// A plan holds no state of its own: it is always derivable from the layer
/// sequence it retains, and regenerating it yields an identical value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Plan {
    /// Effective services after override resolution.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, Service>,
    /// Effective checks after override resolution.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, Check>,
    /// Source layers retained for introspection; not part of the document.
    #[serde(skip)]
    pub layers: Vec<Layer>,
}
