//! Data filters shared by query selections and display-level result filters

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a [`DataFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterOperator {
    In,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl FilterOperator {
    /// Parse an operator string, accepting symbol aliases.
    ///
    /// Unknown operators fall back to `eq`.
    pub fn parse(op: &str) -> Self {
        match op {
            "in" => Self::In,
            "eq" | "=" => Self::Eq,
            "neq" | "!=" => Self::NotEq,
            "lt" | "<" => Self::Lt,
            "lte" | "<=" => Self::LtEq,
            "gt" | ">" => Self::Gt,
            "gte" | ">=" => Self::GtEq,
            _ => Self::Eq,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Eq => write!(f, "eq"),
            Self::NotEq => write!(f, "neq"),
            Self::Lt => write!(f, "lt"),
            Self::LtEq => write!(f, "lte"),
            Self::Gt => write!(f, "gt"),
            Self::GtEq => write!(f, "gte"),
        }
    }
}

/// Filter on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFilter {
    pub field: String,
    /// Optional operator, defaults to "in" for array values or "eq" for single values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub value: Value,
}

impl DataFilter {
    pub fn new(field: impl Into<String>, operator: &str, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator.to_string()),
            value,
        }
    }

    /// The effective operator after applying the default
    pub fn operator(&self) -> FilterOperator {
        match &self.operator {
            Some(op) => FilterOperator::parse(op),
            None if self.value.is_array() => FilterOperator::In,
            None => FilterOperator::Eq,
        }
    }

    /// Canonical key used for order-insensitive comparison of filter lists.
    ///
    /// `in` value lists are sorted so `[a, b]` and `[b, a]` produce the same key.
    pub fn canonical_key(&self) -> String {
        let op = self.operator();
        let value = match (&self.value, op) {
            (Value::Array(values), FilterOperator::In) => {
                let mut values = values.clone();
                values.sort_by_cached_key(Value::to_string);
                values.dedup();
                Value::Array(values)
            }
            (v, _) => v.clone(),
        };
        serde_json::json!([self.field, op.to_string(), value]).to_string()
    }

    /// Evaluate this filter against a single cell value
    pub fn matches(&self, cell: &Value) -> bool {
        match self.operator() {
            FilterOperator::In => match &self.value {
                Value::Array(values) => values.iter().any(|v| values_equal(cell, v)),
                v => values_equal(cell, v),
            },
            FilterOperator::Eq => values_equal(cell, &self.value),
            FilterOperator::NotEq => !values_equal(cell, &self.value),
            FilterOperator::Lt => compare(cell, &self.value) == Some(Ordering::Less),
            FilterOperator::LtEq => matches!(
                compare(cell, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Gt => compare(cell, &self.value) == Some(Ordering::Greater),
            FilterOperator::GtEq => matches!(
                compare(cell, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two scalar cells. Null and mixed types are unordered.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_operator() {
        let single = DataFilter { field: "region".into(), operator: None, value: json!("East") };
        let many = DataFilter {
            field: "region".into(),
            operator: None,
            value: json!(["East", "West"]),
        };
        assert_eq!(single.operator(), FilterOperator::Eq);
        assert_eq!(many.operator(), FilterOperator::In);
    }

    #[test]
    fn test_symbol_aliases() {
        assert_eq!(FilterOperator::parse(">="), FilterOperator::GtEq);
        assert_eq!(FilterOperator::parse("!="), FilterOperator::NotEq);
        assert_eq!(FilterOperator::parse("between"), FilterOperator::Eq);
    }

    #[test]
    fn test_canonical_key_ignores_in_order() {
        let a = DataFilter::new("region", "in", json!(["East", "West"]));
        let b = DataFilter {
            field: "region".into(),
            operator: None,
            value: json!(["West", "East"]),
        };
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_matches() {
        let gt = DataFilter::new("revenue", ">", json!(10));
        assert!(gt.matches(&json!(10.5)));
        assert!(!gt.matches(&json!(10)));
        assert!(!gt.matches(&Value::Null));

        let within = DataFilter::new("region", "in", json!(["East", "North"]));
        assert!(within.matches(&json!("North")));
        assert!(!within.matches(&json!("West")));

        let not_null = DataFilter::new("revenue", "neq", Value::Null);
        assert!(not_null.matches(&json!(3)));
        assert!(!not_null.matches(&Value::Null));
    }
}
