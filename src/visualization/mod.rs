//! Visualization types and their reconciliation policies
//!
//! Each visualization type decides for itself when a new query is needed,
//! when a local rebuild is enough, how selections are adjusted before
//! querying, and how a raw result becomes result data.

mod kind;
mod policy;

pub use kind::{ParseVisualizationTypeError, VisualizationType};
pub use policy::{
    display_inputs_changed, query_inputs_changed, BumpChartPolicy, LineGraphPolicy,
    StandardPolicy, VisualizationPolicy,
};
