//! Engine configuration
//!
//! ```yaml
//! base_url: https://bi.example.com/api
//! endpoint_prefix: query
//! endpoints:
//!   line_graph: query/time_series
//! cache:
//!   enabled: true
//!   capacity: 128
//! request_timeout_ms: 30000
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{CachingQueryEngine, EndpointQueryEngine, QueryEngine, ResultCache, Transport};
use crate::error::ParseError;
use crate::visualization::VisualizationType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    64
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
        }
    }
}

/// Where each visualization type queries, and how results are cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Backend root, used by the HTTP transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default endpoints are `<endpoint_prefix>/<visualization type>`
    #[serde(default = "default_endpoint_prefix")]
    pub endpoint_prefix: String,
    /// Per-type endpoint overrides
    #[serde(default)]
    pub endpoints: BTreeMap<VisualizationType, String>,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Transport timeout; the reconciler itself never times out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn default_endpoint_prefix() -> String {
    "query".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoint_prefix: default_endpoint_prefix(),
            endpoints: BTreeMap::new(),
            cache: CacheConfig::default(),
            request_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(ParseError::Invalid(
                "cache.capacity must be positive when the cache is enabled".to_string(),
            ));
        }
        if let Some((viz, _)) = self.endpoints.iter().find(|(_, e)| e.trim().is_empty()) {
            return Err(ParseError::Invalid(format!("endpoint for '{}' is empty", viz)));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ParseError::Invalid("request_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn endpoint(&self, viz: VisualizationType) -> String {
        match self.endpoints.get(&viz) {
            Some(endpoint) => endpoint.clone(),
            None => format!("{}/{}", self.endpoint_prefix.trim_end_matches('/'), viz),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// A fresh result cache, if caching is enabled
    pub fn build_cache(&self) -> Option<Arc<ResultCache>> {
        self.cache
            .enabled
            .then(|| Arc::new(ResultCache::new(self.cache.capacity)))
    }

    /// Query engine for one visualization type, wrapped with `cache` when given
    pub fn query_engine(
        &self,
        viz: VisualizationType,
        transport: Arc<dyn Transport>,
        cache: Option<&Arc<ResultCache>>,
    ) -> Arc<dyn QueryEngine> {
        let endpoint = self.endpoint(viz);
        let engine: Arc<dyn QueryEngine> =
            Arc::new(EndpointQueryEngine::new(transport, endpoint.clone()));
        let Some(cache) = cache else {
            return engine;
        };
        Arc::new(CachingQueryEngine::new(engine, Arc::clone(cache), endpoint))
    }

    #[cfg(feature = "http")]
    pub fn http_transport(&self) -> Result<crate::engine::HttpTransport, ParseError> {
        let base_url = self
            .base_url
            .clone()
            .ok_or_else(|| {
                ParseError::Invalid("base_url is required for HTTP queries".to_string())
            })?;
        crate::engine::HttpTransport::new(base_url, self.request_timeout())
            .map_err(|e| ParseError::Invalid(e.to_string()))
    }
}
