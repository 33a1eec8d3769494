//! C3: walk an inferred value and produce a `schema_info` tree (§4.3).

use serde::{Deserialize, Serialize};

use crate::inference::{classify_storage, infer_column, ColumnType, StorageClass};
use crate::model::RawValue;

/// One synthesized column of a tabular schema: its inferred type and
/// nullability. Kept as a named struct (rather than a bare tuple) so
/// the mapping table's stored JSON round-trips with named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub ty: ColumnType,
    pub is_nullable: bool,
}

/// The synthesized schema tree. For a tabular value, `columns`
/// preserves caller order for materialization while
/// `column(name)` gives order-independent lookup, matching §4.3's
/// "order-independent ... but the columns list preserves caller
/// order" requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub storage_class: StorageClass,
    pub columns: Vec<ColumnSchema>,
}

impl SchemaInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Synthesize a schema for a tabular value: one child per column,
/// whose type is the result of running C1 over the full column.
pub fn synthesize(value: &RawValue) -> Option<SchemaInfo> {
    let storage_class = classify_storage(value);
    match value {
        RawValue::Tabular { columns, rows } if storage_class == StorageClass::Tabular => {
            let mut out = Vec::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let cells: Vec<_> = rows.iter().map(|row| row[idx].clone()).collect();
                let running = infer_column(&cells);
                out.push(ColumnSchema {
                    name: name.clone(),
                    ty: running.ty,
                    is_nullable: running.nullable,
                });
            }
            Some(SchemaInfo {
                storage_class,
                columns: out,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScalarValue;

    #[test]
    fn synthesizes_one_column_per_header_preserving_order() {
        let value = RawValue::Tabular {
            columns: vec!["year".into(), "amount".into(), "currency".into()],
            rows: vec![
                vec![
                    ScalarValue::String("2023".into()),
                    ScalarValue::Int(90000),
                    ScalarValue::String("USD".into()),
                ],
                vec![
                    ScalarValue::String("2024".into()),
                    ScalarValue::Int(100000),
                    ScalarValue::String("USD".into()),
                ],
            ],
        };

        let schema = synthesize(&value).unwrap();
        let names: Vec<_> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["year", "amount", "currency"]);
        assert_eq!(schema.column("amount").unwrap().ty, ColumnType::Int);
        assert_eq!(schema.column("currency").unwrap().ty, ColumnType::String);
    }

    #[test]
    fn round_trip_classification_holds() {
        let value = RawValue::List(vec![]);
        assert_eq!(classify_storage(&value), StorageClass::List);
        // synthesize() only produces trees for tabular values; for
        // other storage classes the dispatcher never calls it.
        assert!(synthesize(&value).is_none());
    }
}
