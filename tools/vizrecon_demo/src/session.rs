use std::path::Path;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use vizrecon::{parser, QueryError, RawResult, ResultSpec, Selections, Transport, VisualizationType};

/// A scripted sequence of input changes for one visualization
#[derive(Debug, Deserialize)]
pub struct Session {
    pub visualization: VisualizationType,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub label: Option<String>,
    /// Defaults to the previous step's selections
    #[serde(default)]
    pub selections: Option<Selections>,
    /// Defaults to the previous step's result spec
    #[serde(default)]
    pub result_spec: Option<ResultSpec>,
    /// Wait for an issued query before the next step. When false the query
    /// keeps running in the background and may be superseded.
    #[serde(default = "default_wait")]
    pub wait: bool,
    /// Re-issue the last query instead of updating inputs
    #[serde(default)]
    pub retry: bool,
}

fn default_wait() -> bool {
    true
}

/// Canned backend answers, matched by the queried fields
#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    pub responses: Vec<FixtureResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureResponse {
    pub fields: Vec<String>,
    #[serde(default)]
    pub delay_ms: u64,
    /// Answer with this HTTP status instead of a result
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub raw: Option<RawResult>,
}

pub fn load_session(path: &Path) -> anyhow::Result<Session> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parser::parse_yaml(&contents)?)
}

pub fn load_backend(path: &Path) -> anyhow::Result<Backend> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parser::parse_yaml(&contents)?)
}

/// Transport serving [`Backend`] fixtures with simulated latency
pub struct FixtureTransport {
    backend: Backend,
}

impl FixtureTransport {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    fn lookup(&self, endpoint: &str, body: &Value) -> Result<FixtureResponse, QueryError> {
        let selections: Selections = serde_json::from_value(body["selections"].clone())
            .map_err(|e| QueryError::Transport {
                endpoint: endpoint.to_string(),
                message: format!("bad request body: {}", e),
            })?;
        self.backend
            .responses
            .iter()
            .find(|r| r.fields == selections.fields)
            .cloned()
            .ok_or_else(|| QueryError::Status {
                endpoint: endpoint.to_string(),
                status: 404,
            })
    }
}

impl Transport for FixtureTransport {
    fn post(
        &self,
        endpoint: &str,
        body: Value,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Value, QueryError>> {
        let endpoint = endpoint.to_string();
        let response = self.lookup(&endpoint, &body);
        async move {
            let response = response?;
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%endpoint, "fixture request aborted");
                    return Err(QueryError::Cancelled);
                }
                _ = tokio::time::sleep(Duration::from_millis(response.delay_ms)) => {}
            }
            if let Some(status) = response.status {
                return Err(QueryError::Status { endpoint, status });
            }
            let raw = response.raw.unwrap_or_default();
            serde_json::to_value(raw).map_err(|e| QueryError::MalformedResponse {
                endpoint,
                message: e.to_string(),
            })
        }
        .boxed()
    }
}
