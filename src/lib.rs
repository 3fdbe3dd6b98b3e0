//! vizrecon - Reconcile BI visualization queries with their results
//!
//! Every visualization on a dashboard is driven by two immutable inputs:
//! *selections* (what to query) and a *result spec* (how to present it).
//! When either changes, this library decides whether to:
//! - do nothing and keep the current result data,
//! - rebuild the result data locally from the raw result already fetched, or
//! - issue a new query, discarding any response still in flight.
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `query/` - selections (fields, groupings, filters, time interval)
//! - `result_spec/` - presentation settings and their change predicates
//! - `data/` - result data derived from a raw result (TableData, SeriesData)
//! - `config` - endpoints and caching
//!
//! **Verb modules** (transformations):
//! - `visualization/` - per-type policies: requery? rebuild? how to deserialize?
//! - `engine/` - Selections → RawResult over the network, with explicit caching
//! - `reconciler/` - (Selections, ResultSpec) → no-op | rebuild | query
//! - `parser/` - YAML → configuration, selections, result specs
//!
//! # Example
//!
//! ```ignore
//! use vizrecon::{parser, Reconciler, StandardPolicy, VisualizationType};
//!
//! let config = parser::parse_config_file("vizrecon.yaml")?;
//! let cache = config.build_cache();
//! let engine = config.query_engine(VisualizationType::Table, transport, cache.as_ref());
//! let reconciler = Reconciler::new(StandardPolicy::new(VisualizationType::Table), engine);
//!
//! let snapshot = reconciler.update(selections, result_spec).settle().await;
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod parser;
pub mod query;
pub mod reconciler;
pub mod result_spec;
pub mod visualization;

// Re-export commonly used types
pub use config::{CacheConfig, EngineConfig};
pub use data::{DataError, SeriesData, TableData};
pub use engine::{
    CachingQueryEngine, EndpointQueryEngine, QueryEngine, QueryError, RawResult, ResultCache,
    Transport,
};
pub use error::ParseError;
pub use query::{is_query_equal, DataFilter, Grouping, Selections, TimeGranularity, TimeInterval};
pub use reconciler::{
    QueryOutcome, QueryStatus, QueryTask, ReconcileError, Reconciler, Reconciliation, Snapshot,
};
pub use result_spec::{
    CustomField, NullValueDisplay, ResultSpec, SeriesSettings, VisualizationSettings,
};
pub use visualization::{
    BumpChartPolicy, LineGraphPolicy, StandardPolicy, VisualizationPolicy, VisualizationType,
};
