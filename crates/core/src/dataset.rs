//! Turning query rows into a chart-ready `{label, value}` dataset.
//!
//! Columns are classified by their declared SQL type (see
//! [`classify_data_type`](crate::columns::classify_data_type)). Pairing is
//! keyed per row: a row's label and value always come from that same row.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::columns::{spans_tables, ColumnRef, ColumnRole};
use crate::types::Row;

/// Separator used when a row carries more than one label column.
pub const LABEL_SEPARATOR: &str = " / ";

/// One plotted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// How numeric cells are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericMode {
    /// Keep full `f64` precision.
    #[default]
    Precise,
    /// Drop the fractional part, matching dashboards saved by older clients.
    Truncate,
}

impl std::str::FromStr for NumericMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "precise" => Ok(Self::Precise),
            "truncate" => Ok(Self::Truncate),
            other => Err(format!(
                "Unknown numeric mode '{other}'. Must be one of: precise, truncate"
            )),
        }
    }
}

/// Parse a numeric cell. Accepts JSON numbers and numeric strings.
pub fn parse_numeric(value: &Value, mode: NumericMode) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if !parsed.is_finite() {
        return None;
    }
    Some(match mode {
        NumericMode::Precise => parsed,
        NumericMode::Truncate => parsed.trunc(),
    })
}

/// Render a label cell. `null` and nested values do not produce labels.
fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Build the dataset for `bound` columns from the query's `rows`.
///
/// Cells are looked up by [`ColumnRef::result_key`], matching the aliases
/// [`synthesize`](crate::query::synthesize) emits for joined selects.
///
/// For each row, the label is every label-bearing bound column present in
/// the row joined with [`LABEL_SEPARATOR`], in bound order; the value is the
/// first numeric-bearing bound column that parses. Rows lacking either are
/// skipped. Columns with uncharted types are ignored. Returns an empty
/// dataset unless at least one label and one numeric column are bound.
pub fn build_dataset(bound: &[ColumnRef], rows: &[Row], mode: NumericMode) -> Vec<DataPoint> {
    let labels: Vec<&ColumnRef> = bound
        .iter()
        .filter(|c| c.role() == Some(ColumnRole::Label))
        .collect();
    let numerics: Vec<&ColumnRef> = bound
        .iter()
        .filter(|c| c.role() == Some(ColumnRole::Numeric))
        .collect();

    if labels.is_empty() || numerics.is_empty() {
        return Vec::new();
    }

    let joined = spans_tables(bound);
    let label_keys: Vec<String> = labels.iter().map(|c| c.result_key(joined)).collect();
    let numeric_keys: Vec<String> = numerics.iter().map(|c| c.result_key(joined)).collect();

    rows.iter()
        .filter_map(|row| {
            let parts: Vec<String> = label_keys
                .iter()
                .filter_map(|key| row.get(key).and_then(label_text))
                .collect();
            if parts.is_empty() {
                return None;
            }
            let value = numeric_keys
                .iter()
                .find_map(|key| row.get(key).and_then(|v| parse_numeric(v, mode)))?;
            Some(DataPoint::new(parts.join(LABEL_SEPARATOR), value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
