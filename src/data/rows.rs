//! Shared row preparation: validation, custom fields, display filters

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use super::error::DataError;
use crate::engine::RawResult;
use crate::result_spec::ResultSpec;

/// One validated row with custom fields computed
#[derive(Debug, Clone)]
pub(crate) struct PreparedRow {
    pub dimensions: BTreeMap<String, Option<String>>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl PreparedRow {
    /// Cell as JSON, for evaluating display filters
    fn cell(&self, column: &str) -> Option<Value> {
        if let Some(label) = self.dimensions.get(column) {
            return Some(label.clone().map(Value::String).unwrap_or(Value::Null));
        }
        self.values.get(column).map(|v| {
            v.and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        })
    }
}

/// Value columns: metrics followed by custom fields
pub(crate) fn value_columns(raw: &RawResult, spec: &ResultSpec) -> Vec<String> {
    raw.metrics
        .iter()
        .cloned()
        .chain(spec.custom_fields.iter().map(|f| f.id.clone()))
        .collect()
}

/// Validate rows, evaluate custom fields, then drop rows failing display filters
pub(crate) fn prepare_rows(
    raw: &RawResult,
    spec: &ResultSpec,
) -> Result<Vec<PreparedRow>, DataError> {
    check_custom_fields(raw, spec)?;

    let mut prepared = Vec::with_capacity(raw.rows.len());
    for (index, row) in raw.rows.iter().enumerate() {
        let mut dimensions = BTreeMap::new();
        for column in &raw.dimensions {
            let cell = row.get(column).ok_or_else(|| DataError::MissingColumn {
                row: index,
                column: column.clone(),
            })?;
            dimensions.insert(column.clone(), dimension_label(cell, index, column)?);
        }

        let mut values = BTreeMap::new();
        for column in &raw.metrics {
            let cell = row.get(column).ok_or_else(|| DataError::MissingColumn {
                row: index,
                column: column.clone(),
            })?;
            let value = match cell {
                Value::Null => None,
                Value::Number(n) => n.as_f64(),
                _ => {
                    return Err(DataError::NonNumericMetric {
                        row: index,
                        column: column.clone(),
                    })
                }
            };
            values.insert(column.clone(), value);
        }

        // Custom fields may reference earlier custom fields
        for field in &spec.custom_fields {
            let value = field.formula.evaluate(&values);
            values.insert(field.id.clone(), value);
        }

        prepared.push(PreparedRow { dimensions, values });
    }

    Ok(apply_data_filters(prepared, spec))
}

fn check_custom_fields(raw: &RawResult, spec: &ResultSpec) -> Result<(), DataError> {
    let mut known: Vec<&str> = raw.metrics.iter().map(String::as_str).collect();
    for field in &spec.custom_fields {
        if known.contains(&field.id.as_str()) || raw.dimensions.contains(&field.id) {
            return Err(DataError::DuplicateColumn {
                custom_field: field.id.clone(),
            });
        }
        for referenced in field.formula.referenced_fields() {
            if !known.contains(&referenced.as_str()) {
                return Err(DataError::UnknownField {
                    custom_field: field.id.clone(),
                    field: referenced,
                });
            }
        }
        known.push(&field.id);
    }
    Ok(())
}

fn dimension_label(cell: &Value, row: usize, column: &str) -> Result<Option<String>, DataError> {
    match cell {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(DataError::InvalidDimensionValue {
            row,
            column: column.to_string(),
        }),
    }
}

/// Filters on columns the result does not have are skipped
fn apply_data_filters(rows: Vec<PreparedRow>, spec: &ResultSpec) -> Vec<PreparedRow> {
    if spec.data_filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            spec.data_filters.iter().all(|filter| match row.cell(&filter.field) {
                Some(cell) => filter.matches(&cell),
                None => {
                    tracing::debug!(
                        field = %filter.field,
                        "display filter on unknown column ignored"
                    );
                    true
                }
            })
        })
        .collect()
}
