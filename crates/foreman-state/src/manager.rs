//! Plan manager: the authoritative layer store and cached effective plan.

use crate::error::StateError;
use crate::store::BlobStore;
use foreman_plan::{Layer, Plan, merge_layers};
use foreman_protocol::{LayerAction, LayerFormat, LayerRequest};
use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

/// Mutable state guarded by the manager's lock.
struct ManagerState {
    layers: Vec<Layer>,
    next_order: u32,
    plan: Arc<Plan>,
}

/// Owns the ordered layer stack, serializes mutations, and caches the
/// effective plan recomputed after every successful change.
///
/// Writers hold the lock exclusively for the whole mutation, including the
/// blob-store write; readers share it. The cached plan is published as a
/// whole `Arc` and never patched in place, so a reader either sees the old
/// plan or the new one.
pub struct PlanManager {
    store: Arc<dyn BlobStore>,
    state: RwLock<ManagerState>,
}

impl PlanManager {
    /// Open a manager over `store`, reloading any persisted layers.
    ///
    /// Blob names that do not carry an order prefix and label are ignored
    /// with a warning; recognized blobs must parse and merge cleanly.
    pub fn open(store: Arc<dyn BlobStore>) -> Result<Self, StateError> {
        let mut layers = Vec::new();
        let mut next_order = 0;
        for (name, contents) in store.read_all().map_err(StateError::Store)? {
            let (order, label) = match parse_blob_name(&name) {
                Some(parts) => parts,
                None => {
                    warn!("ignoring unrecognized blob (name={name})");
                    continue;
                }
            };
            let layer = Layer::parse(&label, order, &contents)?;
            next_order = next_order.max(order + 1);
            layers.push(layer);
        }
        let plan = Arc::new(merge_layers(&layers)?);
        info!("plan manager opened (layers={})", layers.len());
        Ok(Self {
            store,
            state: RwLock::new(ManagerState {
                layers,
                next_order,
                plan,
            }),
        })
    }

    /// Validate and apply an inbound layer request.
    ///
    /// The label and format are checked before the content is parsed; any
    /// failure leaves the store and the cached plan untouched.
    pub fn apply(&self, request: &LayerRequest) -> Result<(), StateError> {
        if request.label.is_empty() {
            return Err(StateError::EmptyLabel);
        }
        if LayerFormat::parse(&request.format).is_none() {
            return Err(StateError::InvalidFormat(request.format.clone()));
        }
        let combine = request.action == LayerAction::Combine;
        self.add_layer(&request.label, &request.layer, combine)
    }

    /// Append a new layer, or combine content into an existing one.
    ///
    /// A trial merge over the candidate layer stack validates the change,
    /// the blob store write makes it durable, and only then is the
    /// in-memory state swapped. Nothing is committed before the persist
    /// succeeds, so a store failure rolls the mutation back by default.
    pub fn add_layer(&self, label: &str, content: &str, combine: bool) -> Result<(), StateError> {
        let mut state = self.state.write();
        if combine {
            let index = state
                .layers
                .iter()
                .position(|layer| layer.label == label)
                .ok_or_else(|| StateError::UnknownLabel(label.to_string()))?;
            let existing = &state.layers[index];
            let incoming = Layer::parse(label, existing.order, content)?;
            let mut combined = existing.clone();
            combined.combine_from(&incoming)?;

            let mut candidate = state.layers.clone();
            candidate[index] = combined;
            let plan = merge_layers(&candidate)?;
            self.persist(&candidate[index])?;
            state.layers = candidate;
            state.plan = Arc::new(plan);
            info!(
                "layer combined (label={label}, layers={})",
                state.layers.len()
            );
        } else {
            if state.layers.iter().any(|layer| layer.label == label) {
                return Err(StateError::DuplicateLabel(label.to_string()));
            }
            let layer = Layer::parse(label, state.next_order, content)?;
            let mut candidate = state.layers.clone();
            candidate.push(layer);
            let plan = merge_layers(&candidate)?;
            if let Some(appended) = candidate.last() {
                self.persist(appended)?;
            }
            state.layers = candidate;
            state.next_order += 1;
            state.plan = Arc::new(plan);
            info!(
                "layer appended (label={label}, layers={})",
                state.layers.len()
            );
        }
        Ok(())
    }

    /// The last successfully computed plan.
    ///
    /// O(1) and read-only; merges happen eagerly on mutation, never here.
    pub fn plan(&self) -> Arc<Plan> {
        self.state.read().plan.clone()
    }

    fn persist(&self, layer: &Layer) -> Result<(), StateError> {
        let contents = layer.to_yaml()?;
        self.store
            .put(&blob_name(layer.order, &layer.label), &contents)
            .map_err(StateError::Store)
    }
}

/// Blob name for a layer: zero-padded order prefix so lexical order is
/// merge order, then the label.
fn blob_name(order: u32, label: &str) -> String {
    format!("{order:03}-{label}.yaml")
}

/// Split a blob name back into order and label.
fn parse_blob_name(name: &str) -> Option<(u32, String)> {
    let stem = name.strip_suffix(".yaml")?;
    let (order, label) = stem.split_once('-')?;
    if label.is_empty() {
        return None;
    }
    Some((order.parse().ok()?, label.to_string()))
}
