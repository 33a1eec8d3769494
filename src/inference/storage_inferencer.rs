//! C2: classify an opaque structured value by shape alone (§4.2).

use serde::{Deserialize, Serialize};

use crate::model::RawValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    Tabular,
    Graph,
    Map,
    List,
    Scalar,
    Unknown,
}

/// Total, side-effect-free classification over structural signals only.
pub fn classify_storage(value: &RawValue) -> StorageClass {
    match value {
        RawValue::Tabular { .. } => StorageClass::Tabular,
        RawValue::Graph { .. } => StorageClass::Graph,
        RawValue::Map(map) if !map.is_empty() => StorageClass::Map,
        RawValue::Map(_) => StorageClass::Unknown,
        RawValue::List(_) => StorageClass::List,
        RawValue::Scalar(_) => StorageClass::Scalar,
        RawValue::Null => StorageClass::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScalarValue;

    #[test]
    fn tabular_value_classifies_as_tabular() {
        let v = RawValue::Tabular {
            columns: vec!["a".into()],
            rows: vec![vec![ScalarValue::Int(1)]],
        };
        assert_eq!(classify_storage(&v), StorageClass::Tabular);
    }

    #[test]
    fn graph_value_classifies_as_graph() {
        let v = RawValue::Graph {
            nodes: vec![],
            edges: vec![],
        };
        assert_eq!(classify_storage(&v), StorageClass::Graph);
    }

    #[test]
    fn empty_object_is_unknown() {
        let v = RawValue::Map(Default::default());
        assert_eq!(classify_storage(&v), StorageClass::Unknown);
    }

    #[test]
    fn non_empty_object_is_map() {
        let mut m = std::collections::BTreeMap::new();
        m.insert("k".to_string(), RawValue::Scalar(ScalarValue::Int(1)));
        assert_eq!(classify_storage(&RawValue::Map(m)), StorageClass::Map);
    }

    #[test]
    fn array_is_list() {
        assert_eq!(classify_storage(&RawValue::List(vec![])), StorageClass::List);
    }

    #[test]
    fn primitive_is_scalar() {
        assert_eq!(
            classify_storage(&RawValue::Scalar(ScalarValue::Bool(true))),
            StorageClass::Scalar
        );
    }

    #[test]
    fn null_is_unknown() {
        assert_eq!(classify_storage(&RawValue::Null), StorageClass::Unknown);
    }
}
