use serde::{Deserialize, Serialize};

use crate::inference::StorageClass;

/// Per `(entity_id, attribute_name)` pair, the graph-side discovery
/// pointer (§3). Advisory: it tells the dispatcher where to look but is
/// not the source of truth for the attribute's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeLookupRecord {
    pub attribute_id: String,
    pub storage_class: StorageClass,
    pub storage_path: String,
    pub created: String,
    pub updated: String,
    pub schema_json: Option<serde_json::Value>,
}

/// Storage path convention of §4.8: `tables/…` | `graphs/…` |
/// `documents/…` | `unknown/…`.
pub fn storage_path_for(
    storage_class: StorageClass,
    entity_id: &str,
    attribute_name: &str,
) -> String {
    let prefix = match storage_class {
        StorageClass::Tabular => "tables",
        StorageClass::Graph => "graphs",
        StorageClass::Map | StorageClass::List | StorageClass::Scalar => "documents",
        StorageClass::Unknown => "unknown",
    };
    format!("{prefix}/{entity_id}/{attribute_name}")
}
