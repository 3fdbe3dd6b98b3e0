//! Selections - the query request of one visualization

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::DataFilter;

/// Time bucket size for time-based groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
            Self::Year => write!(f, "year"),
        }
    }
}

/// A grouping dimension ("dimension.attribute")
///
/// Groupings carrying a granularity are time-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grouping {
    pub attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<TimeGranularity>,
}

impl Grouping {
    pub fn dimension(attribute: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), granularity: None }
    }

    pub fn time(attribute: impl Into<String>, granularity: TimeGranularity) -> Self {
        Self { attribute: attribute.into(), granularity: Some(granularity) }
    }

    pub fn is_time_based(&self) -> bool {
        self.granularity.is_some()
    }
}

/// Closed date range a query is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// What to query: fields, groupings, filters and time interval
///
/// Selections are never mutated in place; the `with_*` methods return a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    /// Field ids to fetch, in column order
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub groups: Vec<Grouping>,
    #[serde(default)]
    pub filters: Vec<DataFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<TimeInterval>,
}

impl Selections {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_fields<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    pub fn with_groups(&self, groups: Vec<Grouping>) -> Self {
        Self { groups, ..self.clone() }
    }

    pub fn with_filters(&self, filters: Vec<DataFilter>) -> Self {
        Self { filters, ..self.clone() }
    }

    pub fn with_time_interval(&self, time_interval: Option<TimeInterval>) -> Self {
        Self { time_interval, ..self.clone() }
    }

    /// Time-based groupings, in grouping order
    pub fn time_groups(&self) -> impl Iterator<Item = &Grouping> {
        self.groups.iter().filter(|g| g.is_time_based())
    }

    /// Filter keys sorted, so filter order does not affect comparison
    fn sorted_filter_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.filters.iter().map(DataFilter::canonical_key).collect();
        keys.sort();
        keys
    }

    /// Stable textual key of the query content, used for result caching.
    ///
    /// Two selections produce the same key exactly when [`is_query_equal`] holds.
    pub fn cache_key(&self) -> String {
        serde_json::json!({
            "fields": self.fields,
            "groups": self.groups,
            "filters": self.sorted_filter_keys(),
            "time_interval": self.time_interval,
        })
        .to_string()
    }
}

/// Structural query equality
///
/// Fields and groupings compare in order. Filters compare as a multiset after
/// operator normalization, so selections rebuilt with the same semantic content
/// compare equal even when they are not `==`.
pub fn is_query_equal(a: &Selections, b: &Selections) -> bool {
    a.fields == b.fields
        && a.groups == b.groups
        && a.time_interval == b.time_interval
        && a.sorted_filter_keys() == b.sorted_filter_keys()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_order_is_ignored() {
        let base = Selections::new(["revenue"]);
        let a = base.with_filters(vec![
            DataFilter::new("region", "in", json!(["East", "West"])),
            DataFilter::new("year", "=", json!(2024)),
        ]);
        let b = base.with_filters(vec![
            DataFilter::new("year", "eq", json!(2024)),
            DataFilter { field: "region".into(), operator: None, value: json!(["West", "East"]) },
        ]);
        assert_ne!(a, b);
        assert!(is_query_equal(&a, &b));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_field_order_matters() {
        let a = Selections::new(["revenue", "cost"]);
        let b = Selections::new(["cost", "revenue"]);
        assert!(!is_query_equal(&a, &b));
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let a = Selections::new(["revenue"]);
        let b = a.with_groups(vec![Grouping::time("dates.date", TimeGranularity::Month)]);
        assert!(a.groups.is_empty());
        assert_eq!(b.time_groups().count(), 1);
        assert!(!is_query_equal(&a, &b));
    }

    #[test]
    fn test_granularity_distinguishes_queries() {
        let base = Selections::new(["revenue"]);
        let monthly = base.with_groups(vec![Grouping::time("dates.date", TimeGranularity::Month)]);
        let yearly = base.with_groups(vec![Grouping::time("dates.date", TimeGranularity::Year)]);
        assert!(!is_query_equal(&monthly, &yearly));
        assert_ne!(monthly.cache_key(), yearly.cache_key());
    }

    #[test]
    fn test_cache_key_separates_names_containing_delimiters() {
        let joined = Selections::new(["a,b"]);
        let split = Selections::new(["a", "b"]);
        assert!(!is_query_equal(&joined, &split));
        assert_ne!(joined.cache_key(), split.cache_key());

        let base = Selections::new(["revenue"]);
        let one = base.with_filters(vec![DataFilter::new("region", "eq", json!("East|eq|West"))]);
        let two = base.with_filters(vec![DataFilter::new("region|eq|East", "eq", json!("West"))]);
        assert!(!is_query_equal(&one, &two));
        assert_ne!(one.cache_key(), two.cache_key());

        let in_one = DataFilter::new("region", "in", json!(["East,West"]));
        let in_two = DataFilter::new("region", "in", json!(["East", "West"]));
        let in_one = base.with_filters(vec![in_one]);
        let in_two = base.with_filters(vec![in_two]);
        assert!(!is_query_equal(&in_one, &in_two));
        assert_ne!(in_one.cache_key(), in_two.cache_key());
    }
}
