//! Access-gated rendering of plans.

use crate::error::PlanError;
use crate::model::{Check, Plan, Service};
use foreman_protocol::AccessLevel;
use std::collections::BTreeMap;

/// Placeholder substituted for environment values in redacted output.
pub const REDACTION_MARKER: &str = "***";

/// Produce the representation of `plan` appropriate to `access`.
///
/// Admin callers see the plan verbatim. Everyone else sees every
/// environment value, in service definitions and in check exec blocks,
/// replaced by the redaction marker; commands, overrides, and summaries
/// are unchanged. The source plan is never modified.
pub fn render(plan: &Plan, access: AccessLevel) -> Plan {
    let mut document = plan.clone();
    if access.reveals_secrets() {
        return document;
    }
    redact_services(&mut document.services);
    redact_checks(&mut document.checks);
    for layer in &mut document.layers {
        redact_services(&mut layer.services);
        redact_checks(&mut layer.checks);
    }
    document
}

/// Render `plan` for `access` and serialize it as a YAML document.
pub fn render_yaml(plan: &Plan, access: AccessLevel) -> Result<String, PlanError> {
    let document = render(plan, access);
    Ok(serde_yaml::to_string(&document)?)
}

fn redact_services(services: &mut BTreeMap<String, Service>) {
    for service in services.values_mut() {
        for value in service.environment.values_mut() {
            *value = REDACTION_MARKER.to_string();
        }
    }
}

fn redact_checks(checks: &mut BTreeMap<String, Check>) {
    for check in checks.values_mut() {
        if let Some(exec) = &mut check.exec {
            for value in exec.environment.values_mut() {
                *value = REDACTION_MARKER.to_string();
            }
        }
    }
}
