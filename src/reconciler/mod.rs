//! Reconciliation engine (verb module)
//!
//! (Selections, ResultSpec) → no-op | local rebuild | new query.
//!
//! One [`Reconciler`] lives as long as the visualization it serves. It keeps
//! the inputs that produced the current result data, so every update can be
//! diffed against them through the visualization's policy.

mod error;
mod reconcile;
mod state;

pub use error::ReconcileError;
pub use reconcile::{QueryOutcome, QueryTask, Reconciler, Reconciliation};
pub use state::{QueryStatus, Snapshot};
