//! Result data errors

use std::fmt;

/// Errors converting a raw result into result data
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// A row lacks a declared column
    MissingColumn {
        row: usize,
        column: String,
    },
    /// A metric cell is neither a number nor null
    NonNumericMetric {
        row: usize,
        column: String,
    },
    /// A dimension cell is not a scalar
    InvalidDimensionValue {
        row: usize,
        column: String,
    },
    /// A custom field formula references a column the result does not have
    UnknownField {
        custom_field: String,
        field: String,
    },
    /// A custom field id collides with a result column or an earlier custom field
    DuplicateColumn {
        custom_field: String,
    },
    /// Time series data requires a time dimension
    MissingTimeDimension,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { row, column } => {
                write!(f, "Row {} is missing column '{}'", row, column)
            }
            Self::NonNumericMetric { row, column } => {
                write!(f, "Row {} has a non-numeric value in metric '{}'", row, column)
            }
            Self::InvalidDimensionValue { row, column } => {
                write!(f, "Row {} has a non-scalar value in dimension '{}'", row, column)
            }
            Self::UnknownField { custom_field, field } => {
                write!(
                    f,
                    "Custom field '{}' references unknown field '{}'",
                    custom_field, field
                )
            }
            Self::DuplicateColumn { custom_field } => {
                write!(f, "Custom field '{}' reuses the id of an existing column", custom_field)
            }
            Self::MissingTimeDimension => {
                write!(f, "Result has no time dimension to plot over")
            }
        }
    }
}

impl std::error::Error for DataError {}
