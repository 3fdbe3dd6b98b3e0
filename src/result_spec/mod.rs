//! Result spec (noun module)
//!
//! Presentation configuration layered on top of a query result:
//! custom computed fields, display filters, null-value handling and
//! per-visualization settings.

mod changes;
mod formula;
mod spec;

pub use formula::{FieldExpr, FieldExprArg, FieldExprNode};
pub use spec::{CustomField, NullValueDisplay, ResultSpec, SeriesSettings, VisualizationSettings};
