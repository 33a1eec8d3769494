use serde::{Deserialize, Serialize};

/// A single cell's primitive value, fed to the type inferencer (§4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// The Rust stand-in for the wire's opaque typed value (§9 Design
/// Notes: "Opaque typed values ... `(type_url, bytes)` pairs"). Every
/// caller decodes once, at this single boundary, into one of these
/// shapes before C2/C3 ever see it — that's the "single helper per
/// payload family" §9 asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Scalar(ScalarValue),
    List(Vec<RawValue>),
    /// A tabular payload: `{"columns": [...], "rows": [[...], ...]}`.
    Tabular {
        columns: Vec<String>,
        rows: Vec<Vec<ScalarValue>>,
    },
    /// A graph-shaped payload: `{"nodes": [...], "edges": [...]}`.
    Graph {
        nodes: Vec<serde_json::Value>,
        edges: Vec<serde_json::Value>,
    },
    /// Any other non-empty object.
    Map(std::collections::BTreeMap<String, RawValue>),
}

impl RawValue {
    /// Decode a JSON value from the wire into the shape C2 classifies.
    /// This is the single decoding boundary helper required by §9.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Scalar(ScalarValue::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Scalar(ScalarValue::Int(i))
                } else {
                    RawValue::Scalar(ScalarValue::Float(n.as_f64().unwrap_or_default()))
                }
            }
            serde_json::Value::String(s) => RawValue::Scalar(ScalarValue::String(s)),
            serde_json::Value::Array(items) => {
                RawValue::List(items.into_iter().map(RawValue::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let has_columns_rows = map.contains_key("columns") && map.contains_key("rows");
                let has_nodes_edges = map.contains_key("nodes") && map.contains_key("edges");

                if has_columns_rows {
                    let columns = map
                        .get("columns")
                        .and_then(|v| v.as_array())
                        .map(|arr| {
                            arr.iter()
                                .filter_map(|c| c.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                    let rows = map
                        .get("rows")
                        .and_then(|v| v.as_array())
                        .map(|arr| {
                            arr.iter()
                                .map(|row| {
                                    row.as_array()
                                        .map(|cells| {
                                            cells
                                                .iter()
                                                .map(|c| scalar_from_json(c.clone()))
                                                .collect()
                                        })
                                        .unwrap_or_default()
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    return RawValue::Tabular { columns, rows };
                }

                if has_nodes_edges {
                    let nodes = map
                        .get("nodes")
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    let edges = map
                        .get("edges")
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    return RawValue::Graph { nodes, edges };
                }

                if map.is_empty() {
                    return RawValue::Null;
                }

                RawValue::Map(
                    map.into_iter()
                        .map(|(k, v)| (k, RawValue::from_json(v)))
                        .collect(),
                )
            }
        }
    }
}

fn scalar_from_json(value: serde_json::Value) -> ScalarValue {
    match RawValue::from_json(value) {
        RawValue::Scalar(s) => s,
        RawValue::Null => ScalarValue::Null,
        // A row cell that turns out to be compound collapses to its
        // string form rather than panicking; C7 row validation will
        // reject it against any concrete column type anyway.
        other => ScalarValue::String(format!("{other:?}")),
    }
}
