//! Models that ship with modelrun.
//!
//! Every model registers itself under the `models` namespace when this crate is linked.

pub mod models;

use modelrun_core::registry::{ModelEntry, DEFAULT_NAMESPACE, MODEL_REGISTRY};

/// The models registered under the default namespace, sorted by name.
pub fn catalog() -> Vec<ModelEntry> {
    let prefix = format!("{DEFAULT_NAMESPACE}.");
    MODEL_REGISTRY
        .list()
        .into_iter()
        .filter(|entry| entry.name.starts_with(&prefix))
        .collect()
}
