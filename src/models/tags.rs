use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Constraints applied to discovered models, keyed by capability tag.
///
/// `true` requires the capability to be present, `false` requires it to be
/// absent; tags not in the map never affect the decision.
pub type CapabilityFilter = HashMap<String, bool>;

/// A single installed model as reported by the tags endpoint.
///
/// Only `name` is interpreted; every other field is carried through
/// untouched.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelEntry {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response shape of `GET /api/tags`.
#[derive(Deserialize, Debug, Clone)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Response shape of the capability-lookup endpoint.
#[derive(Deserialize, Debug, Clone)]
pub struct LibraryModel {
    #[serde(default)]
    pub capabilities: Vec<String>,
}
