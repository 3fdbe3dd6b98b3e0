//! Query engines (verb module)
//!
//! Selections → raw result, over the network.
//!
//! - [`QueryEngine`] is the async fetch contract every visualization type uses.
//! - [`EndpointQueryEngine`] posts selections to a visualization endpoint via a [`Transport`].
//! - [`CachingQueryEngine`] memoizes raw results in an explicit, shareable [`ResultCache`].

mod cache;
mod endpoint;
mod error;
#[cfg(feature = "http")]
mod http;
mod raw;

pub use cache::{CachingQueryEngine, ResultCache};
pub use endpoint::{EndpointQueryEngine, QueryRequestBody, Transport};
pub use error::QueryError;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use raw::RawResult;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::query::Selections;
use crate::result_spec::ResultSpec;

/// Async fetch of raw result data for one visualization type
///
/// Implementations must be a pure function of their inputs apart from the
/// network call itself. `cancel` is triggered when the reconciler supersedes
/// the request; honouring it is optional.
pub trait QueryEngine: Send + Sync {
    fn run(
        &self,
        selections: &Selections,
        result_spec: Option<&ResultSpec>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<RawResult, QueryError>>;
}
