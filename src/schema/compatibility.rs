//! Schema compatibility check run by C7 when a tabular attribute's
//! table already exists (§4.7).

use crate::inference::ColumnType;

use super::SchemaInfo;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompatibilityError {
    #[error("storage class changed")]
    StorageClassMismatch,
    #[error("column '{0}' dropped from existing schema")]
    ColumnDropped(String),
    #[error("column '{column}' cannot promote from {from:?} to {to:?}")]
    TypeTransitionRejected {
        column: String,
        from: ColumnType,
        to: ColumnType,
    },
    #[error("column '{0}' cannot become nullable")]
    NewlyNullable(String),
}

/// Whether an existing column's type may promote to a new observed
/// type, per the lattice in §4.7.
fn type_promotes(from: ColumnType, to: ColumnType) -> bool {
    use ColumnType::*;
    if from == to {
        return true;
    }
    match (from, to) {
        (Int, Float) => true,
        (String, _) => true,
        (Datetime, String) => true,
        _ => false,
    }
}

/// New schema is compatible with existing iff every rule in §4.7 holds.
/// Returns the first violation found.
pub fn check_compatible(
    existing: &SchemaInfo,
    new: &SchemaInfo,
) -> Result<(), CompatibilityError> {
    if existing.storage_class != new.storage_class {
        return Err(CompatibilityError::StorageClassMismatch);
    }

    for existing_col in &existing.columns {
        let Some(new_col) = new.column(&existing_col.name) else {
            return Err(CompatibilityError::ColumnDropped(existing_col.name.clone()));
        };

        if !type_promotes(existing_col.ty, new_col.ty) {
            return Err(CompatibilityError::TypeTransitionRejected {
                column: existing_col.name.clone(),
                from: existing_col.ty,
                to: new_col.ty,
            });
        }

        if !existing_col.is_nullable && new_col.is_nullable {
            return Err(CompatibilityError::NewlyNullable(existing_col.name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::StorageClass;
    use crate::schema::ColumnSchema;

    fn schema(cols: &[(&str, ColumnType, bool)]) -> SchemaInfo {
        SchemaInfo {
            storage_class: StorageClass::Tabular,
            columns: cols
                .iter()
                .map(|(name, ty, nullable)| ColumnSchema {
                    name: name.to_string(),
                    ty: *ty,
                    is_nullable: *nullable,
                })
                .collect(),
        }
    }

    #[test]
    fn int_to_float_is_allowed() {
        let existing = schema(&[("amount", ColumnType::Int, false)]);
        let new = schema(&[("amount", ColumnType::Float, false)]);
        assert!(check_compatible(&existing, &new).is_ok());
    }

    #[test]
    fn datetime_to_float_is_rejected() {
        let existing = schema(&[("ts", ColumnType::Datetime, false)]);
        let new = schema(&[("ts", ColumnType::Float, false)]);
        assert!(check_compatible(&existing, &new).is_err());
    }

    #[test]
    fn dropping_a_column_is_rejected() {
        let existing = schema(&[
            ("year", ColumnType::Int, false),
            ("currency", ColumnType::String, false),
        ]);
        let new = schema(&[("year", ColumnType::Int, false)]);
        assert!(matches!(
            check_compatible(&existing, &new),
            Err(CompatibilityError::ColumnDropped(col)) if col == "currency"
        ));
    }

    #[test]
    fn becoming_nullable_is_rejected() {
        let existing = schema(&[("year", ColumnType::Int, false)]);
        let new = schema(&[("year", ColumnType::Int, true)]);
        assert!(matches!(
            check_compatible(&existing, &new),
            Err(CompatibilityError::NewlyNullable(_))
        ));
    }

    #[test]
    fn string_accepts_any_new_type() {
        let existing = schema(&[("note", ColumnType::String, false)]);
        let new = schema(&[("note", ColumnType::Bool, false)]);
        assert!(check_compatible(&existing, &new).is_ok());
    }
}
