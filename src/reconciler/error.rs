//! Reconciliation errors

use std::fmt;

use crate::data::DataError;
use crate::engine::QueryError;

/// Why a reconciler is in the errored state
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// The query engine failed
    Query(QueryError),
    /// The raw result could not be turned into result data
    Data(DataError),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Query(e) => write!(f, "Query failed: {}", e),
            ReconcileError::Data(e) => write!(f, "Invalid result data: {}", e),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Query(e) => Some(e),
            ReconcileError::Data(e) => Some(e),
        }
    }
}

impl From<QueryError> for ReconcileError {
    fn from(err: QueryError) -> Self {
        ReconcileError::Query(err)
    }
}

impl From<DataError> for ReconcileError {
    fn from(err: DataError) -> Self {
        ReconcileError::Data(err)
    }
}
