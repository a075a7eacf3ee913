//! RPC transports
//!
//! [`RpcTransport`] is the seam between the typed client and the wire. The
//! HTTPS implementation talks to the provider; tests substitute in-memory
//! doubles.

use crate::codec::{decode_response, encode_call, CodecOptions};
use crate::value::Value;
use async_trait::async_trait;
use gandi_core::{GandiError, Result};
use std::time::Duration;
use tracing::{debug, error};

/// Provider endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "https://rpc.gandi.net/xmlrpc/";

/// Trait for RPC transport abstraction
///
/// One call is one blocking round trip. Implementations never retry.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `method` with positional `params` and return the decoded result
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value>;
}

/// XML-RPC over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    options: CodecOptions,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the XML-RPC endpoint
    /// * `timeout` - Per-request timeout
    /// * `options` - Codec switches, typically [`CodecOptions::nil_tolerant`]
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        options: CodecOptions,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gandictl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GandiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            options,
        })
    }

    /// Endpoint URL this transport posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let body = encode_call(method, &params, self.options)?;
        debug!("RPC call {} ({} params)", method, params.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", self.endpoint, e);
                GandiError::Transport(format!("Failed to reach {}: {}", self.endpoint, e))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            GandiError::Transport(format!("Failed to read response body for {}: {}", method, e))
        })?;

        if !status.is_success() {
            return Err(GandiError::Transport(format!(
                "HTTP {} from {} for {}",
                status, self.endpoint, method
            )));
        }

        let value = decode_response(&text, self.options)?;
        debug!("RPC call {} succeeded", method);
        Ok(value)
    }
}
