//! Raw query response payload

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw rows returned by a query endpoint
///
/// ```json
/// { "dimensions": ["region"], "metrics": ["revenue"],
///   "rows": [ { "region": "East", "revenue": 10.5 } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Grouping columns, in grouping order
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Numeric columns, in field order
    #[serde(default)]
    pub metrics: Vec<String>,
    /// The dimension holding time buckets, if the query grouped by time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_dimension: Option<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

impl RawResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.dimensions.iter().any(|d| d == name) || self.metrics.iter().any(|m| m == name)
    }
}
