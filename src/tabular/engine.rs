//! C7: the tabular attribute engine (§4.7) — the most intricate
//! subsystem. Orchestrates C1–C3 (type/schema inference) and C6
//! (relational adapter) for every attribute C2 classifies as tabular.

use std::collections::HashMap;
use std::sync::Arc;

use crate::inference::satisfies;
use crate::model::{RawValue, ScalarValue};
use crate::sanitize::backing_table_name;
use crate::schema::{check_compatible, synthesize, SchemaInfo};
use crate::store::RelationalStore;
use crate::{EntityError, Result};

pub struct TabularEngine {
    relational: Arc<RelationalStore>,
}

impl TabularEngine {
    pub fn new(relational: Arc<RelationalStore>) -> Self {
        Self { relational }
    }

    /// Step 1 of §4.7: every column header non-empty, every row's
    /// length equal to the column count.
    fn validate_structure(value: &RawValue) -> Result<(Vec<String>, Vec<Vec<ScalarValue>>)> {
        let RawValue::Tabular { columns, rows } = value else {
            return Err(EntityError::InvalidArgument(
                "value is not a tabular payload".to_string(),
            ));
        };

        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(EntityError::InvalidArgument(
                "tabular value has an empty column header".to_string(),
            ));
        }

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(EntityError::InvalidArgument(format!(
                    "row {idx} has {} cells, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
        }

        Ok((columns.clone(), rows.clone()))
    }

    /// Validates every cell of `rows` (whose columns are `columns`)
    /// against `stored`, per §4.7's row-validation rules. Returns the
    /// rows reordered into `stored`'s column order, ready for C6.
    fn validate_and_reorder(
        stored: &SchemaInfo,
        columns: &[String],
        rows: &[Vec<ScalarValue>],
    ) -> Result<Vec<Vec<ScalarValue>>> {
        let mut reordered = Vec::with_capacity(rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            let by_name: HashMap<&str, &ScalarValue> = columns
                .iter()
                .map(|c| c.as_str())
                .zip(row.iter())
                .collect();

            let mut out_row = Vec::with_capacity(stored.columns.len());
            for col in &stored.columns {
                let cell = by_name.get(col.name.as_str()).copied();
                match cell {
                    Some(value) => {
                        if !satisfies(col.ty, value) {
                            return Err(EntityError::SchemaViolation {
                                row_index,
                                column_name: col.name.clone(),
                                expected_type: format!("{:?}", col.ty),
                                observed_value: format!("{value:?}"),
                            });
                        }
                        out_row.push(value.clone());
                    }
                    None => out_row.push(ScalarValue::Null),
                }
            }
            reordered.push(out_row);
        }

        Ok(reordered)
    }

    /// Create/Update entry point: validate, synthesize, create-or-
    /// evolve the backing table, validate rows against the stored
    /// schema, then append (§4.7 steps 1-6). Append-only: there is no
    /// in-place row update or deletion through this path (§4.7).
    pub async fn write(&self, entity_id: &str, attribute_name: &str, value: &RawValue) -> Result<()> {
        let (columns, rows) = Self::validate_structure(value)?;
        let new_schema = synthesize(value).ok_or_else(|| {
            EntityError::InvalidArgument("tabular value failed schema synthesis".to_string())
        })?;

        let table_name = backing_table_name(entity_id, attribute_name);

        let mapping = self.relational.get_mapping(entity_id, attribute_name).await?;
        let mapping = match mapping {
            Some(mapping) => mapping,
            None => {
                self.relational.create_table(&table_name, &new_schema).await?;
                let mapping = self
                    .relational
                    .insert_mapping_if_absent(entity_id, attribute_name, &table_name)
                    .await?;
                self.relational
                    .put_schema_version(&table_name, 1, &new_schema)
                    .await?;
                mapping
            }
        };

        let (_, stored_schema) = self
            .relational
            .get_latest_schema(&mapping.table_name)
            .await?
            .ok_or_else(|| {
                EntityError::StoreUnavailable(format!(
                    "no schema recorded for table '{}'",
                    mapping.table_name
                ))
            })?;

        // Whether we created the table ourselves or lost a create race,
        // the new schema must still be compatible with whatever ended
        // up authoritative (§5: "the loser ... proceed[s] to the
        // compatibility path"). When we won the race this check is
        // trivially satisfied — a schema is always compatible with
        // itself.
        check_compatible(&stored_schema, &new_schema).map_err(|e| {
            EntityError::IncompatibleSchemaChange {
                table: mapping.table_name.clone(),
                reason: e.to_string(),
            }
        })?;

        let reordered = Self::validate_and_reorder(&stored_schema, &columns, &rows)?;

        self.relational
            .insert_rows(
                &mapping.table_name,
                mapping.entity_attribute_id,
                &stored_schema.columns,
                &reordered,
            )
            .await?;

        Ok(())
    }

    /// Read path: returns the backing table as a fresh tabular value
    /// (§4.7 "Read behaviour"). Start/end on the caller's time-bounded
    /// wrapper are assigned by the dispatcher, not here.
    pub async fn read(&self, entity_id: &str, attribute_name: &str) -> Result<RawValue> {
        let mapping = self
            .relational
            .get_mapping(entity_id, attribute_name)
            .await?
            .ok_or_else(|| {
                EntityError::NotFound(format!(
                    "no tabular attribute '{attribute_name}' for entity '{entity_id}'"
                ))
            })?;

        let (_, schema) = self
            .relational
            .get_latest_schema(&mapping.table_name)
            .await?
            .ok_or_else(|| {
                EntityError::StoreUnavailable(format!(
                    "no schema recorded for table '{}'",
                    mapping.table_name
                ))
            })?;

        self.relational
            .get_data(&mapping.table_name, &schema, None, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ColumnType, StorageClass};
    use crate::model::ScalarValue;
    use crate::schema::ColumnSchema;

    fn tabular(columns: &[&str], rows: Vec<Vec<ScalarValue>>) -> RawValue {
        RawValue::Tabular {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn rejects_mismatched_row_width() {
        let value = tabular(
            &["year", "amount"],
            vec![vec![ScalarValue::String("2023".into())]],
        );
        let err = TabularEngine::validate_structure(&value).unwrap_err();
        assert!(matches!(err, EntityError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_empty_column_header() {
        let value = tabular(&["", "amount"], vec![]);
        let err = TabularEngine::validate_structure(&value).unwrap_err();
        assert!(matches!(err, EntityError::InvalidArgument(_)));
    }

    #[test]
    fn validate_and_reorder_catches_schema_violation() {
        let stored = SchemaInfo {
            storage_class: StorageClass::Tabular,
            columns: vec![ColumnSchema {
                name: "amount".into(),
                ty: ColumnType::Int,
                is_nullable: false,
            }],
        };
        let columns = vec!["amount".to_string()];
        let rows = vec![vec![ScalarValue::String("not a number".into())]];

        let err = TabularEngine::validate_and_reorder(&stored, &columns, &rows).unwrap_err();
        assert!(matches!(err, EntityError::SchemaViolation { .. }));
    }

    #[test]
    fn validate_and_reorder_fills_missing_columns_with_null() {
        let stored = SchemaInfo {
            storage_class: StorageClass::Tabular,
            columns: vec![
                ColumnSchema {
                    name: "year".into(),
                    ty: ColumnType::String,
                    is_nullable: false,
                },
                ColumnSchema {
                    name: "currency".into(),
                    ty: ColumnType::String,
                    is_nullable: true,
                },
            ],
        };
        let columns = vec!["year".to_string()];
        let rows = vec![vec![ScalarValue::String("2025".into())]];

        let reordered = TabularEngine::validate_and_reorder(&stored, &columns, &rows).unwrap();
        assert_eq!(reordered[0][0], ScalarValue::String("2025".into()));
        assert_eq!(reordered[0][1], ScalarValue::Null);
    }
}
