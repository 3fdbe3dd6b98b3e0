//! Endpoint-backed query engine

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::error::QueryError;
use super::raw::RawResult;
use super::QueryEngine;
use crate::query::Selections;
use crate::result_spec::ResultSpec;

/// Moves a JSON request body to a backend endpoint and returns the JSON response
///
/// Transports that can abort in-flight requests should do so when `cancel` fires.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        endpoint: &str,
        body: Value,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Value, QueryError>>;
}

/// Request body posted to a visualization endpoint
#[derive(Debug, Serialize)]
pub struct QueryRequestBody<'a> {
    pub selections: &'a Selections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_spec: Option<&'a ResultSpec>,
}

/// Query engine for one visualization endpoint (e.g. `query/bar_graph`)
#[derive(Clone)]
pub struct EndpointQueryEngine {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl EndpointQueryEngine {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl QueryEngine for EndpointQueryEngine {
    fn run(
        &self,
        selections: &Selections,
        result_spec: Option<&ResultSpec>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<RawResult, QueryError>> {
        let endpoint = self.endpoint.clone();
        let body = match serde_json::to_value(QueryRequestBody { selections, result_spec }) {
            Ok(body) => body,
            Err(e) => {
                let err = QueryError::Transport {
                    endpoint,
                    message: format!("could not encode request: {}", e),
                };
                return futures::future::ready(Err(err)).boxed();
            }
        };
        let response = self.transport.post(&endpoint, body, cancel);
        async move {
            let value = response.await?;
            serde_json::from_value::<RawResult>(value).map_err(|e| QueryError::MalformedResponse {
                endpoint,
                message: e.to_string(),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct RecordingTransport {
        response: Value,
        seen: Mutex<Vec<(String, Value)>>,
    }

    impl Transport for RecordingTransport {
        fn post(
            &self,
            endpoint: &str,
            body: Value,
            _cancel: CancellationToken,
        ) -> BoxFuture<'static, Result<Value, QueryError>> {
            self.seen.lock().push((endpoint.to_string(), body));
            futures::future::ready(Ok(self.response.clone())).boxed()
        }
    }

    #[tokio::test]
    async fn test_posts_selections_and_decodes_rows() {
        let transport = Arc::new(RecordingTransport {
            response: json!({
                "dimensions": ["region"],
                "metrics": ["revenue"],
                "rows": [{"region": "East", "revenue": 4.0}]
            }),
            seen: Mutex::new(vec![]),
        });
        let engine = EndpointQueryEngine::new(transport.clone(), "query/table");

        let raw = engine
            .run(&Selections::new(["revenue"]), None, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(raw.row_count(), 1);

        let seen = transport.seen.lock();
        assert_eq!(seen[0].0, "query/table");
        assert_eq!(seen[0].1["selections"]["fields"], json!(["revenue"]));
        assert!(seen[0].1.get("result_spec").is_none());
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let transport = Arc::new(RecordingTransport {
            response: json!({"rows": "not a list"}),
            seen: Mutex::new(vec![]),
        });
        let engine = EndpointQueryEngine::new(transport, "query/table");
        let err = engine
            .run(&Selections::new(["revenue"]), None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse { .. }));
    }
}
