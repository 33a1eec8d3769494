//! Identifier sanitization for the relational layer (§3).
//!
//! A deterministic, idempotent transform applied to every user-supplied
//! identifier before it reaches SQL: lowercase, replace anything outside
//! `[a-z0-9_]` with `_`, and prefix with `_` if the result starts with a
//! digit.

pub fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            let lower = c.to_ascii_lowercase();
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '_' {
                lower
            } else {
                '_'
            }
        })
        .collect();

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}

/// Backing table name for a tabular attribute: `attr_{entity_id}_{attribute_name}`.
pub fn backing_table_name(entity_id: &str, attribute_name: &str) -> String {
    format!(
        "attr_{}_{}",
        sanitize_identifier(entity_id),
        sanitize_identifier(attribute_name)
    )
}

/// The graph-side attribute lookup id: `{entity_id}_attr_{attribute_name}`.
///
/// Deliberately unsanitized — lookup ids live in the graph store, which
/// stores attribute names verbatim (§6 "Identifier constraints on the
/// wire"); sanitization is only required inside the relational layer.
pub fn attribute_lookup_id(entity_id: &str, attribute_name: &str) -> String {
    format!("{entity_id}_attr_{attribute_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_invalid_chars() {
        assert_eq!(sanitize_identifier("Salary-History!"), "salary_history_");
    }

    #[test]
    fn prefixes_leading_digit() {
        assert_eq!(sanitize_identifier("2025_report"), "_2025_report");
    }

    #[test]
    fn is_idempotent() {
        let once = sanitize_identifier("Weird Name/123");
        let twice = sanitize_identifier(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn backing_table_name_joins_sanitized_parts() {
        assert_eq!(
            backing_table_name("e-1", "Salary History"),
            "attr_e_1_salary_history"
        );
    }
}
