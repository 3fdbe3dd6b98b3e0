//! Reconciliation state

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::ReconcileError;
use crate::engine::RawResult;
use crate::query::Selections;
use crate::result_spec::ResultSpec;

/// Lifecycle status of a visualization's result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Loaded,
    Errored(ReconcileError),
}

impl QueryStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryStatus::Loading)
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        match self {
            QueryStatus::Errored(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Idle => write!(f, "idle"),
            QueryStatus::Loading => write!(f, "loading"),
            QueryStatus::Loaded => write!(f, "loaded"),
            QueryStatus::Errored(e) => write!(f, "errored ({})", e),
        }
    }
}

/// What the rendering layer sees
///
/// `data` is the last successfully derived result data, kept while loading
/// or errored. It is the same `Arc` until it is actually replaced.
#[derive(Debug)]
pub struct Snapshot<D> {
    pub status: QueryStatus,
    pub data: Option<Arc<D>>,
    pub generation: u64,
    pub pending: bool,
}

impl<D> Clone for Snapshot<D> {
    fn clone(&self) -> Self {
        Self {
            status: self.status.clone(),
            data: self.data.clone(),
            generation: self.generation,
            pending: self.pending,
        }
    }
}

impl<D> Snapshot<D> {
    /// Whether both snapshots hold the very same result data
    pub fn same_data(&self, other: &Snapshot<D>) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// The in-flight request
pub(crate) struct Pending {
    pub generation: u64,
    pub cancel: CancellationToken,
    /// Status to restore if the request is abandoned without a replacement
    pub prior_status: QueryStatus,
    /// Inputs requested before this request, restored along with the status
    pub prior_selections: Option<Selections>,
    pub prior_result_spec: Option<ResultSpec>,
}

pub(crate) struct State<D> {
    /// Inputs of the latest update, including ones still loading
    pub selections: Option<Selections>,
    pub result_spec: Option<ResultSpec>,
    /// Raw result of the latest successful query
    pub raw: Option<Arc<RawResult>>,
    pub data: Option<Arc<D>>,
    pub status: QueryStatus,
    /// Request token, incremented for every issued query
    pub generation: u64,
    pub pending: Option<Pending>,
}

impl<D> State<D> {
    pub fn new() -> Self {
        Self {
            selections: None,
            result_spec: None,
            raw: None,
            data: None,
            status: QueryStatus::Idle,
            generation: 0,
            pending: None,
        }
    }

    pub fn snapshot(&self) -> Snapshot<D> {
        Snapshot {
            status: self.status.clone(),
            data: self.data.clone(),
            generation: self.generation,
            pending: self.pending.is_some(),
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.pending.as_ref().map(|p| p.generation) == Some(generation)
    }
}
