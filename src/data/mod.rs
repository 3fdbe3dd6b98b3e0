//! Result data (noun module)
//!
//! Display-level values derived from a raw result and a result spec.
//! Always reconstructible from those two inputs, never mutated.

mod error;
mod rows;
mod series;
mod table;

pub use error::DataError;
pub use series::{BucketRanking, Series, SeriesData, SeriesPoint};
pub use table::{ColumnKind, TableColumn, TableData, TableRow};
