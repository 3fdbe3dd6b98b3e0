//! Custom field formulas - arithmetic over result columns

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Custom field formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldExpr {
    /// Simple column reference: "revenue"
    FieldRef(String),
    /// Structured expression
    Structured(FieldExprNode),
}

/// Expression node for custom field calculations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldExprNode {
    /// Reference a column: { field: "revenue" }
    Field(String),
    /// Literal number
    Literal(f64),
    Add(Vec<FieldExprArg>),
    Subtract(Vec<FieldExprArg>),
    Multiply(Vec<FieldExprArg>),
    Divide(Vec<FieldExprArg>),
}

/// Argument in a field expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldExprArg {
    /// Shorthand: column name as string
    FieldName(String),
    LiteralNumber(f64),
    Node(FieldExprNode),
}

impl FieldExpr {
    /// Evaluate against one row of values.
    ///
    /// Returns `None` when an operand is missing or null, or on division by zero.
    pub fn evaluate(&self, row: &BTreeMap<String, Option<f64>>) -> Option<f64> {
        match self {
            FieldExpr::FieldRef(name) => row.get(name).copied().flatten(),
            FieldExpr::Structured(node) => node.evaluate(row),
        }
    }

    /// All column names referenced by this formula
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            FieldExpr::FieldRef(name) => out.push(name.clone()),
            FieldExpr::Structured(node) => node.collect_fields(&mut out),
        }
        out
    }
}

impl FieldExprNode {
    fn evaluate(&self, row: &BTreeMap<String, Option<f64>>) -> Option<f64> {
        match self {
            FieldExprNode::Field(name) => row.get(name).copied().flatten(),
            FieldExprNode::Literal(value) => Some(*value),
            FieldExprNode::Add(args) => fold(args, row, |a, b| Some(a + b)),
            FieldExprNode::Subtract(args) => fold(args, row, |a, b| Some(a - b)),
            FieldExprNode::Multiply(args) => fold(args, row, |a, b| Some(a * b)),
            FieldExprNode::Divide(args) => {
                fold(args, row, |a, b| if b == 0.0 { None } else { Some(a / b) })
            }
        }
    }

    fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            FieldExprNode::Field(name) => out.push(name.clone()),
            FieldExprNode::Literal(_) => {}
            FieldExprNode::Add(args)
            | FieldExprNode::Subtract(args)
            | FieldExprNode::Multiply(args)
            | FieldExprNode::Divide(args) => {
                for arg in args {
                    arg.collect_fields(out);
                }
            }
        }
    }
}

impl FieldExprArg {
    fn evaluate(&self, row: &BTreeMap<String, Option<f64>>) -> Option<f64> {
        match self {
            FieldExprArg::FieldName(name) => row.get(name).copied().flatten(),
            FieldExprArg::LiteralNumber(value) => Some(*value),
            FieldExprArg::Node(node) => node.evaluate(row),
        }
    }

    fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            FieldExprArg::FieldName(name) => out.push(name.clone()),
            FieldExprArg::LiteralNumber(_) => {}
            FieldExprArg::Node(node) => node.collect_fields(out),
        }
    }
}

/// Left fold of the operands; an empty operand list evaluates to `None`
fn fold(
    args: &[FieldExprArg],
    row: &BTreeMap<String, Option<f64>>,
    op: impl Fn(f64, f64) -> Option<f64>,
) -> Option<f64> {
    let (first, rest) = args.split_first()?;
    let mut acc = first.evaluate(row)?;
    for arg in rest {
        acc = op(acc, arg.evaluate(row)?)?;
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[(&str, Option<f64>)]) -> BTreeMap<String, Option<f64>> {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_and_evaluate_margin() {
        // margin = (revenue - cost) / revenue
        let expr: FieldExpr = serde_yaml::from_str(
            "divide:\n  - subtract: [revenue, cost]\n  - revenue\n",
        )
        .unwrap();
        let value = expr.evaluate(&row(&[("revenue", Some(200.0)), ("cost", Some(150.0))]));
        assert_eq!(value, Some(0.25));
        assert_eq!(expr.referenced_fields(), vec!["revenue", "cost", "revenue"]);
    }

    #[test]
    fn test_null_and_division_by_zero() {
        let expr = FieldExpr::Structured(FieldExprNode::Divide(vec![
            FieldExprArg::FieldName("revenue".into()),
            FieldExprArg::FieldName("quantity".into()),
        ]));
        assert_eq!(expr.evaluate(&row(&[("revenue", Some(5.0)), ("quantity", Some(0.0))])), None);
        assert_eq!(expr.evaluate(&row(&[("revenue", None), ("quantity", Some(2.0))])), None);
        let values = row(&[("revenue", Some(5.0)), ("quantity", Some(2.0))]);
        assert_eq!(expr.evaluate(&values), Some(2.5));
    }

    #[test]
    fn test_plain_field_reference() {
        let expr: FieldExpr = serde_yaml::from_str("revenue").unwrap();
        assert!(matches!(&expr, FieldExpr::FieldRef(name) if name == "revenue"));
        assert_eq!(expr.evaluate(&row(&[("revenue", Some(3.0))])), Some(3.0));
    }
}
