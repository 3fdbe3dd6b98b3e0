//! Query selections (noun module)
//!
//! Immutable description of what data a visualization asks the backend for.

mod filter;
mod selections;

pub use filter::{DataFilter, FilterOperator};
pub use selections::{is_query_equal, Grouping, Selections, TimeGranularity, TimeInterval};
