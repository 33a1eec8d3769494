//! C1: per-column type inference over row cells (§4.1).

use serde::{Deserialize, Serialize};

use crate::model::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    String,
    Bool,
    Date,
    Datetime,
}

/// `(type, nullable)` — a column's running inference state. Starts as
/// `(String, false)`; `nullable` latches true the moment any
/// type-mixing observation widens the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningColumnType {
    pub ty: ColumnType,
    pub nullable: bool,
}

impl Default for RunningColumnType {
    fn default() -> Self {
        Self {
            ty: ColumnType::String,
            nullable: false,
        }
    }
}

/// Apply one observation to a column's running state, per the
/// promotion lattice of §4.1.
pub fn observe(running: &mut RunningColumnType, value: &ScalarValue) {
    use ColumnType::*;

    match value {
        ScalarValue::Null => {
            // Null observations only ever widen nullability, never type.
            running.nullable = true;
        }
        ScalarValue::Int(_) => match running.ty {
            String => running.ty = Int,
            Int => {}
            Float => {}
            _ => {
                running.ty = String;
                running.nullable = true;
            }
        },
        ScalarValue::Float(f) => {
            if f.fract() == 0.0 {
                match running.ty {
                    String => running.ty = Int,
                    Int => {}
                    Float => {}
                    _ => {
                        running.ty = String;
                        running.nullable = true;
                    }
                }
            } else {
                match running.ty {
                    String => running.ty = Float,
                    Int => running.ty = Float,
                    Float => {}
                    _ => {
                        running.ty = String;
                        running.nullable = true;
                    }
                }
            }
        }
        ScalarValue::Bool(_) => match running.ty {
            String => running.ty = Bool,
            Bool => {}
            _ => {
                running.ty = String;
                running.nullable = true;
            }
        },
        ScalarValue::String(s) => {
            if let Some(_dt) = parse_datetime(s) {
                match running.ty {
                    String => running.ty = Datetime,
                    Datetime => {}
                    _ => {
                        running.ty = String;
                        running.nullable = true;
                    }
                }
            } else {
                match running.ty {
                    String => {}
                    Datetime => {
                        running.ty = String;
                        running.nullable = true;
                    }
                    _ => {
                        running.ty = String;
                        running.nullable = true;
                    }
                }
            }
        }
    }
}

/// Run C1 across a whole column of cells, in order.
pub fn infer_column(values: &[ScalarValue]) -> RunningColumnType {
    let mut running = RunningColumnType::default();
    for v in values {
        observe(&mut running, v);
    }
    running
}

/// Accept any string matching one of the fixed datetime formats of
/// §4.1, tried in that order; no locale-dependent parsing is used.
pub fn parse_datetime(s: &str) -> Option<DatetimeKind> {
    if chrono::DateTime::parse_from_rfc3339(s).is_ok() {
        return Some(DatetimeKind::Full);
    }
    if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        return Some(DatetimeKind::Date);
    }
    if chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok() {
        return Some(DatetimeKind::DateTimeNoTz);
    }
    if chrono::NaiveDate::parse_from_str(s, "%Y/%m/%d").is_ok() {
        return Some(DatetimeKind::SlashYmd);
    }
    if chrono::NaiveDate::parse_from_str(s, "%d/%m/%Y").is_ok() {
        return Some(DatetimeKind::SlashDmy);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatetimeKind {
    Full,
    Date,
    DateTimeNoTz,
    SlashYmd,
    SlashDmy,
}

/// Whether a cell's value satisfies the stored column type, per §4.7
/// row validation rules.
pub fn satisfies(ty: ColumnType, value: &ScalarValue) -> bool {
    match (ty, value) {
        (_, ScalarValue::Null) => true,
        (ColumnType::Int, ScalarValue::Int(_)) => true,
        (ColumnType::Int, ScalarValue::Float(f)) => f.fract() == 0.0,
        (ColumnType::Float, ScalarValue::Int(_)) => true,
        (ColumnType::Float, ScalarValue::Float(_)) => true,
        (ColumnType::Bool, ScalarValue::Bool(_)) => true,
        (ColumnType::String, _) => true,
        (ColumnType::Date, ScalarValue::String(s)) => parse_datetime(s).is_some(),
        (ColumnType::Datetime, ScalarValue::String(s)) => parse_datetime(s).is_some(),
        _ => false,
    }
}
