//! Tabular result data (tables, bar graphs, box plots, ...)

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::DataError;
use super::rows::{prepare_rows, value_columns};
use crate::engine::RawResult;
use crate::result_spec::{NullValueDisplay, ResultSpec};
use crate::visualization::VisualizationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Dimension,
    Metric,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub dimensions: BTreeMap<String, Option<String>>,
    pub values: BTreeMap<String, Option<f64>>,
}

/// Rows of dimension labels and numeric values, in result order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    columns: Vec<TableColumn>,
    rows: Vec<TableRow>,
}

impl TableData {
    /// Build table data for a visualization type from a raw result and spec
    pub fn from_raw(
        raw: &RawResult,
        spec: &ResultSpec,
        viz: VisualizationType,
    ) -> Result<Self, DataError> {
        let value_columns = value_columns(raw, spec);
        let mut columns: Vec<TableColumn> = raw
            .dimensions
            .iter()
            .map(|d| TableColumn { id: d.clone(), label: None, kind: ColumnKind::Dimension })
            .collect();
        columns.extend(raw.metrics.iter().map(|m| TableColumn {
            id: m.clone(),
            label: None,
            kind: ColumnKind::Metric,
        }));
        columns.extend(spec.custom_fields.iter().map(|f| TableColumn {
            id: f.id.clone(),
            label: f.label.clone(),
            kind: ColumnKind::Custom,
        }));

        let null_display = spec.null_value_display(viz);
        let rows = prepare_rows(raw, spec)?
            .into_iter()
            .filter_map(|row| {
                let mut values = row.values;
                match null_display {
                    NullValueDisplay::Show => {}
                    NullValueDisplay::Zero => {
                        for value in values.values_mut() {
                            value.get_or_insert(0.0);
                        }
                    }
                    NullValueDisplay::Hide => {
                        let has_null = value_columns
                            .iter()
                            .any(|c| values.get(c).copied().flatten().is_none());
                        if has_null {
                            return None;
                        }
                    }
                }
                Some(TableRow { dimensions: row.dimensions, values })
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get_column(&self, id: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// All values of one value column, in row order
    pub fn column_values(&self, id: &str) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.values.get(id).copied().flatten())
            .collect()
    }

    /// Sum of the non-null values of a column, `None` when it has none
    pub fn total(&self, id: &str) -> Option<f64> {
        self.column_values(id)
            .into_iter()
            .flatten()
            .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
    }
}
