//! Time series result data (line graphs, bump charts)

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::error::DataError;
use super::rows::{prepare_rows, value_columns};
use crate::engine::RawResult;
use crate::result_spec::{NullValueDisplay, ResultSpec};
use crate::visualization::VisualizationType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub bucket: String,
    pub value: Option<f64>,
}

/// One line: a value column for one combination of non-time dimensions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// `field` or `field|label|label...`
    pub key: String,
    pub field: String,
    pub group: Vec<Option<String>>,
    pub points: Vec<SeriesPoint>,
}

/// Rank of every series of one field within a time bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRanking {
    pub bucket: String,
    /// (series key, rank starting at 1), best first
    pub ranks: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    time_dimension: String,
    buckets: Vec<String>,
    series: Vec<Series>,
}

impl SeriesData {
    pub fn from_raw(
        raw: &RawResult,
        spec: &ResultSpec,
        viz: VisualizationType,
    ) -> Result<Self, DataError> {
        let time_dimension = raw
            .time_dimension
            .clone()
            .filter(|t| raw.dimensions.contains(t))
            .ok_or(DataError::MissingTimeDimension)?;
        let group_dimensions: Vec<&String> =
            raw.dimensions.iter().filter(|d| **d != time_dimension).collect();
        let fields = value_columns(raw, spec);
        let rows = prepare_rows(raw, spec)?;

        let buckets: Vec<String> = rows
            .iter()
            .filter_map(|r| r.dimensions.get(&time_dimension).cloned().flatten())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // (field, group labels) -> bucket -> value
        let mut cells: BTreeMap<(String, Vec<Option<String>>), BTreeMap<String, Option<f64>>> =
            BTreeMap::new();
        for row in &rows {
            let Some(bucket) = row.dimensions.get(&time_dimension).cloned().flatten() else {
                continue;
            };
            let group: Vec<Option<String>> = group_dimensions
                .iter()
                .map(|d| row.dimensions.get(*d).cloned().flatten())
                .collect();
            for field in &fields {
                let value = row.values.get(field).copied().flatten();
                cells
                    .entry((field.clone(), group.clone()))
                    .or_default()
                    .insert(bucket.clone(), value);
            }
        }

        let null_display = spec.null_value_display(viz);
        let mut series: Vec<Series> = cells
            .into_iter()
            .map(|((field, group), by_bucket)| {
                let points = buckets
                    .iter()
                    .filter_map(|bucket| {
                        let value = by_bucket.get(bucket).copied().flatten();
                        let value = match (value, null_display) {
                            (None, NullValueDisplay::Hide) => return None,
                            (None, NullValueDisplay::Zero) => Some(0.0),
                            (value, _) => value,
                        };
                        Some(SeriesPoint { bucket: bucket.clone(), value })
                    })
                    .collect();
                Series { key: series_key(&field, &group), field, group, points }
            })
            .collect();
        // Field order follows the result columns, not alphabetical order
        series.sort_by_key(|s| fields.iter().position(|f| *f == s.field));

        Ok(Self { time_dimension, buckets, series })
    }

    pub fn time_dimension(&self) -> &str {
        &self.time_dimension
    }

    pub fn buckets(&self) -> &[String] {
        &self.buckets
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn get_series(&self, key: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.key == key)
    }

    /// Per-bucket ranks of the series of `field`, highest value first.
    ///
    /// Series without a value in a bucket are unranked there. Ties are broken by series key.
    pub fn rankings(&self, field: &str) -> Vec<BucketRanking> {
        self.buckets
            .iter()
            .map(|bucket| {
                let mut entries: Vec<(&str, f64)> = self
                    .series
                    .iter()
                    .filter(|s| s.field == field)
                    .filter_map(|s| {
                        let point = s.points.iter().find(|p| &p.bucket == bucket)?;
                        Some((s.key.as_str(), point.value?))
                    })
                    .collect();
                entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                BucketRanking {
                    bucket: bucket.clone(),
                    ranks: entries
                        .into_iter()
                        .enumerate()
                        .map(|(i, (key, _))| (key.to_string(), i + 1))
                        .collect(),
                }
            })
            .collect()
    }
}

fn series_key(field: &str, group: &[Option<String>]) -> String {
    let mut key = field.to_string();
    for label in group {
        key.push('|');
        key.push_str(label.as_deref().unwrap_or("null"));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> RawResult {
        serde_json::from_value(json!({
            "dimensions": ["dates.month", "region"],
            "metrics": ["revenue"],
            "time_dimension": "dates.month",
            "rows": [
                {"dates.month": "2024-01", "region": "East", "revenue": 10.0},
                {"dates.month": "2024-01", "region": "West", "revenue": 20.0},
                {"dates.month": "2024-02", "region": "East", "revenue": 30.0},
                {"dates.month": "2024-02", "region": "West", "revenue": null}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_series_per_group() {
        let data =
            SeriesData::from_raw(&raw(), &ResultSpec::default(), VisualizationType::LineGraph)
                .unwrap();
        assert_eq!(data.buckets(), &["2024-01".to_string(), "2024-02".to_string()]);
        assert_eq!(data.series().len(), 2);
        let west = data.get_series("revenue|West").unwrap();
        assert_eq!(west.points[1].value, None);
    }

    #[test]
    fn test_null_display_on_points() {
        let zero = ResultSpec::default()
            .with_null_value_display(VisualizationType::LineGraph, NullValueDisplay::Zero);
        let data = SeriesData::from_raw(&raw(), &zero, VisualizationType::LineGraph).unwrap();
        assert_eq!(data.get_series("revenue|West").unwrap().points[1].value, Some(0.0));

        let hide = ResultSpec::default()
            .with_null_value_display(VisualizationType::LineGraph, NullValueDisplay::Hide);
        let data = SeriesData::from_raw(&raw(), &hide, VisualizationType::LineGraph).unwrap();
        assert_eq!(data.get_series("revenue|West").unwrap().points.len(), 1);
    }

    #[test]
    fn test_rankings() {
        let data =
            SeriesData::from_raw(&raw(), &ResultSpec::default(), VisualizationType::BumpChart)
                .unwrap();
        let ranks = data.rankings("revenue");
        assert_eq!(
            ranks[0].ranks,
            vec![("revenue|West".to_string(), 1), ("revenue|East".to_string(), 2)]
        );
        assert_eq!(ranks[1].ranks, vec![("revenue|East".to_string(), 1)]);
    }

    #[test]
    fn test_requires_time_dimension() {
        let mut raw = raw();
        raw.time_dimension = None;
        assert_eq!(
            SeriesData::from_raw(&raw, &ResultSpec::default(), VisualizationType::LineGraph),
            Err(DataError::MissingTimeDimension)
        );
    }
}
