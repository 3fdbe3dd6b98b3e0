//! HTTP transport (feature `http`)

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::endpoint::Transport;
use super::error::QueryError;

/// Posts JSON bodies to `<base_url>/<endpoint>` with reqwest
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, QueryError> {
        let base_url = base_url.into();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| QueryError::Transport {
            endpoint: base_url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { client, base_url })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        endpoint: &str,
        body: Value,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Value, QueryError>> {
        let endpoint = endpoint.to_string();
        let request = self.client.post(self.url(&endpoint)).json(&body);
        async move {
            let send = async {
                let response = request.send().await.map_err(|e| QueryError::Transport {
                    endpoint: endpoint.clone(),
                    message: e.to_string(),
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(QueryError::Status {
                        endpoint: endpoint.clone(),
                        status: status.as_u16(),
                    });
                }
                response.json::<Value>().await.map_err(|e| QueryError::MalformedResponse {
                    endpoint: endpoint.clone(),
                    message: e.to_string(),
                })
            };
            // Dropping the request future aborts the connection.
            tokio::select! {
                _ = cancel.cancelled() => Err(QueryError::Cancelled),
                result = send => result,
            }
        }
        .boxed()
    }
}
