//! Deterministic merge of ordered layers into an effective plan.

use crate::error::{EntryKind, PlanError};
use crate::model::{Check, Layer, Override, Plan, Service};
use std::collections::BTreeMap;

/// Fold an ordered sequence of layers into one effective plan.
///
/// Layers are processed in ascending `order`; every service and check entry
/// must carry an explicit override directive. The fold performs no I/O and
/// no locking: the same sequence always yields the same plan or the same
/// error.
pub fn merge_layers(layers: &[Layer]) -> Result<Plan, PlanError> {
    let mut ordered: Vec<Layer> = layers.to_vec();
    ordered.sort_by_key(|layer| layer.order);

    let mut services: BTreeMap<String, Service> = BTreeMap::new();
    let mut checks: BTreeMap<String, Check> = BTreeMap::new();

    for layer in &ordered {
        for (name, service) in &layer.services {
            apply_entry(
                &mut services,
                service.override_,
                &layer.label,
                EntryKind::Service,
                name,
                service,
                Service::merge_from,
            )?;
        }
        for (name, check) in &layer.checks {
            apply_entry(
                &mut checks,
                check.override_,
                &layer.label,
                EntryKind::Check,
                name,
                check,
                Check::merge_from,
            )?;
        }
    }

    Ok(Plan {
        services,
        checks,
        layers: ordered,
    })
}

/// Resolve one layer entry against the accumulated state for its name.
fn apply_entry<T: Clone>(
    entries: &mut BTreeMap<String, T>,
    directive: Override,
    layer: &str,
    kind: EntryKind,
    name: &str,
    incoming: &T,
    merge_entry: fn(&mut T, &T),
) -> Result<(), PlanError> {
    match directive {
        Override::Unknown => Err(PlanError::MissingOverride {
            layer: layer.to_string(),
            kind,
            name: name.to_string(),
        }),
        Override::Replace => {
            entries.insert(name.to_string(), incoming.clone());
            Ok(())
        }
        Override::Merge => match entries.get_mut(name) {
            Some(existing) => {
                merge_entry(existing, incoming);
                Ok(())
            }
            None => Err(PlanError::InvalidOverride {
                layer: layer.to_string(),
                kind,
                name: name.to_string(),
            }),
        },
    }
}

impl Layer {
    /// Merge `other`'s content into this layer's own definition, under the
    /// same override rules as the layer fold.
    ///
    /// Every incoming entry is validated before any field changes, so a
    /// rejected combine leaves the layer untouched.
    pub fn combine_from(&mut self, other: &Layer) -> Result<(), PlanError> {
        for (name, service) in &other.services {
            self.check_incoming(service.override_, EntryKind::Service, name, |layer| {
                layer.services.contains_key(name)
            })?;
        }
        for (name, check) in &other.checks {
            self.check_incoming(check.override_, EntryKind::Check, name, |layer| {
                layer.checks.contains_key(name)
            })?;
        }

        if let Some(summary) = &other.summary {
            self.summary = Some(summary.clone());
        }
        if let Some(description) = &other.description {
            self.description = Some(description.clone());
        }
        for (name, service) in &other.services {
            match service.override_ {
                Override::Replace => {
                    self.services.insert(name.clone(), service.clone());
                }
                Override::Merge => {
                    if let Some(existing) = self.services.get_mut(name) {
                        existing.merge_from(service);
                    }
                }
                Override::Unknown => {}
            }
        }
        for (name, check) in &other.checks {
            match check.override_ {
                Override::Replace => {
                    self.checks.insert(name.clone(), check.clone());
                }
                Override::Merge => {
                    if let Some(existing) = self.checks.get_mut(name) {
                        existing.merge_from(check);
                    }
                }
                Override::Unknown => {}
            }
        }
        Ok(())
    }

    /// Validate one incoming entry's directive against this layer.
    fn check_incoming(
        &self,
        directive: Override,
        kind: EntryKind,
        name: &str,
        exists: impl Fn(&Layer) -> bool,
    ) -> Result<(), PlanError> {
        match directive {
            Override::Unknown => Err(PlanError::MissingOverride {
                layer: self.label.clone(),
                kind,
                name: name.to_string(),
            }),
            Override::Merge if !exists(self) => Err(PlanError::InvalidOverride {
                layer: self.label.clone(),
                kind,
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_layers;
    use crate::model::{Layer, Override, ServiceStartup};
    use crate::{EntryKind, PlanError};
    use pretty_assertions::assert_eq;

    fn layer(label: &str, order: u32, content: &str) -> Layer {
        Layer::parse(label, order, content).expect("layer")
    }

    #[test]
    fn merge_of_same_sequence_is_deterministic() {
        let layers = vec![
            layer(
                "base",
                0,
                "services:\n  static:\n    override: replace\n    command: echo static\n",
            ),
            layer(
                "extra",
                1,
                "services:\n  static:\n    override: merge\n    environment:\n      A: one\n",
            ),
        ];
        let first = serde_yaml::to_string(&merge_layers(&layers).expect("plan")).expect("yaml");
        let second = serde_yaml::to_string(&merge_layers(&layers).expect("plan")).expect("yaml");
        assert_eq!(first, second);
    }

    #[test]
    fn layers_fold_in_ascending_order_regardless_of_slice_order() {
        let low = layer(
            "low",
            0,
            "services:\n  svc:\n    override: replace\n    command: echo low\n",
        );
        let high = layer(
            "high",
            1,
            "services:\n  svc:\n    override: replace\n    command: echo high\n",
        );
        let plan = merge_layers(&[high, low]).expect("plan");
        let svc = plan.services.get("svc").expect("svc");
        assert_eq!(svc.command.as_deref(), Some("echo high"));
    }

    #[test]
    fn replace_supersedes_lower_entry_entirely() {
        let layers = vec![
            layer(
                "base",
                0,
                "services:\n  web:\n    override: replace\n    command: serve\n    environment:\n      TOKEN: hunter2\n",
            ),
            layer(
                "top",
                1,
                "services:\n  web:\n    override: replace\n    command: serve --v2\n",
            ),
        ];
        let plan = merge_layers(&layers).expect("plan");
        let web = plan.services.get("web").expect("web");
        assert_eq!(web.command.as_deref(), Some("serve --v2"));
        assert!(web.environment.is_empty());
    }

    #[test]
    fn merge_overlays_fields_and_keeps_absent_ones() {
        let layers = vec![
            layer(
                "base",
                0,
                "services:\n  web:\n    override: replace\n    command: serve\n    startup: enabled\n    environment:\n      A: one\n      B: two\n",
            ),
            layer(
                "top",
                1,
                "services:\n  web:\n    override: merge\n    summary: patched\n    environment:\n      B: three\n      C: four\n",
            ),
        ];
        let plan = merge_layers(&layers).expect("plan");
        let web = plan.services.get("web").expect("web");
        assert_eq!(web.command.as_deref(), Some("serve"));
        assert_eq!(web.summary.as_deref(), Some("patched"));
        assert_eq!(web.startup, Some(ServiceStartup::Enabled));
        assert_eq!(web.environment.get("A").map(String::as_str), Some("one"));
        assert_eq!(web.environment.get("B").map(String::as_str), Some("three"));
        assert_eq!(web.environment.get("C").map(String::as_str), Some("four"));
    }

    #[test]
    fn merge_for_new_name_is_rejected() {
        let layers = vec![layer(
            "solo",
            0,
            "services:\n  ghost:\n    override: merge\n    command: boo\n",
        )];
        let err = merge_layers(&layers).expect_err("invalid override");
        match err {
            PlanError::InvalidOverride { layer, kind, name } => {
                assert_eq!(layer, "solo");
                assert_eq!(kind, EntryKind::Service);
                assert_eq!(name, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_override_is_rejected_in_every_layer() {
        let layers = vec![layer("first", 0, "services:\n  web:\n    command: serve\n")];
        let err = merge_layers(&layers).expect_err("missing override");
        assert_eq!(
            err.to_string(),
            r#"layer "first" must define "override" for service "web""#
        );
    }

    #[test]
    fn check_exec_environment_merges_entry_by_entry() {
        let layers = vec![
            layer(
                "base",
                0,
                "checks:\n  ping:\n    override: replace\n    level: alive\n    exec:\n      command: /bin/ping\n      environment:\n        HOST: one\n",
            ),
            layer(
                "top",
                1,
                "checks:\n  ping:\n    override: merge\n    exec:\n      environment:\n        PORT: '80'\n",
            ),
        ];
        let plan = merge_layers(&layers).expect("plan");
        let ping = plan.checks.get("ping").expect("ping");
        let exec = ping.exec.as_ref().expect("exec");
        assert_eq!(exec.command.as_deref(), Some("/bin/ping"));
        assert_eq!(exec.environment.get("HOST").map(String::as_str), Some("one"));
        assert_eq!(exec.environment.get("PORT").map(String::as_str), Some("80"));
    }

    #[test]
    fn combine_replaces_and_merges_within_one_layer() {
        let mut base = layer(
            "base",
            0,
            "summary: original\nservices:\n  web:\n    override: replace\n    command: serve\n    environment:\n      A: one\n",
        );
        let incoming = layer(
            "base",
            0,
            "services:\n  web:\n    override: merge\n    environment:\n      B: two\n",
        );
        base.combine_from(&incoming).expect("combine");
        let web = base.services.get("web").expect("web");
        assert_eq!(web.command.as_deref(), Some("serve"));
        assert_eq!(web.environment.len(), 2);
        assert_eq!(base.summary.as_deref(), Some("original"));
        assert_eq!(web.override_, Override::Merge);
    }

    #[test]
    fn rejected_combine_leaves_layer_untouched() {
        let mut base = layer(
            "base",
            0,
            "services:\n  web:\n    override: replace\n    command: serve\n",
        );
        let before = base.clone();
        let incoming = layer("base", 0, "services:\n  web:\n    command: serve --v2\n");
        let err = base.combine_from(&incoming).expect_err("missing override");
        assert_eq!(
            err.to_string(),
            r#"layer "base" must define "override" for service "web""#
        );
        assert_eq!(base, before);
    }

    #[test]
    fn combine_rejects_merge_for_name_not_in_layer() {
        let mut base = layer(
            "base",
            0,
            "services:\n  web:\n    override: replace\n    command: serve\n",
        );
        let incoming = layer(
            "base",
            0,
            "services:\n  other:\n    override: merge\n    command: run\n",
        );
        let err = base.combine_from(&incoming).expect_err("invalid override");
        assert_eq!(
            err.to_string(),
            r#"layer "base" must define override=replace for new service "other""#
        );
    }
}
