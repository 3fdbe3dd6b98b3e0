//! Result spec types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::formula::FieldExpr;
use crate::query::{DataFilter, TimeGranularity};
use crate::visualization::VisualizationType;

/// How null values are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullValueDisplay {
    /// Keep nulls as gaps / empty cells
    #[default]
    Show,
    /// Replace nulls with zero
    Zero,
    /// Drop rows or points containing nulls
    Hide,
}

/// A computed column derived from other result columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub formula: FieldExpr,
}

/// Styling for one series; render-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self { label: None, color: None, visible: true }
    }
}

/// Settings scoped to one visualization type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSettings {
    #[serde(default)]
    pub null_value_display: NullValueDisplay,
    /// Time bucket applied to time-based groupings (line graphs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_type: Option<TimeGranularity>,
    #[serde(default)]
    pub series: BTreeMap<String, SeriesSettings>,
}

/// Presentation configuration of a query result
///
/// Immutable; the `with_*` methods return a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    /// Display-level filters applied after the query
    #[serde(default)]
    pub data_filters: Vec<DataFilter>,
    #[serde(default)]
    pub visualizations: BTreeMap<VisualizationType, VisualizationSettings>,
}

impl ResultSpec {
    /// Settings for a visualization type, or the defaults when none are configured
    pub fn settings(&self, viz: VisualizationType) -> VisualizationSettings {
        self.visualizations.get(&viz).cloned().unwrap_or_default()
    }

    pub fn null_value_display(&self, viz: VisualizationType) -> NullValueDisplay {
        self.visualizations
            .get(&viz)
            .map(|s| s.null_value_display)
            .unwrap_or_default()
    }

    pub fn bucket_type(&self, viz: VisualizationType) -> Option<TimeGranularity> {
        self.visualizations.get(&viz).and_then(|s| s.bucket_type)
    }

    pub fn get_custom_field(&self, id: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|f| f.id == id)
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..self.clone() }
    }

    pub fn with_custom_fields(&self, custom_fields: Vec<CustomField>) -> Self {
        Self { custom_fields, ..self.clone() }
    }

    pub fn with_data_filters(&self, data_filters: Vec<DataFilter>) -> Self {
        Self { data_filters, ..self.clone() }
    }

    pub fn with_null_value_display(&self, viz: VisualizationType, mode: NullValueDisplay) -> Self {
        self.with_settings(viz, |s| s.null_value_display = mode)
    }

    pub fn with_bucket_type(
        &self,
        viz: VisualizationType,
        bucket: Option<TimeGranularity>,
    ) -> Self {
        self.with_settings(viz, |s| s.bucket_type = bucket)
    }

    pub fn with_series_settings(
        &self,
        viz: VisualizationType,
        series_id: impl Into<String>,
        settings: SeriesSettings,
    ) -> Self {
        let series_id = series_id.into();
        self.with_settings(viz, |s| {
            s.series.insert(series_id, settings);
        })
    }

    fn with_settings(
        &self,
        viz: VisualizationType,
        edit: impl FnOnce(&mut VisualizationSettings),
    ) -> Self {
        let mut next = self.clone();
        edit(next.visualizations.entry(viz).or_default());
        next
    }
}
