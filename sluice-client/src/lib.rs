//! Sluice HTTP Client
//!
//! Typed client for the Sluice monitor's control API, and the best-effort
//! reporter the pipeline engine uses to announce progress.
//!
//! `MonitorClient` is strict: every call returns a `Result`. `HttpReporter`
//! wraps it and swallows every failure, because monitoring must never change
//! the outcome of a pipeline run.
//!
//! # Example
//!
//! ```no_run
//! use sluice_client::MonitorClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = MonitorClient::new("http://localhost:8765");
//!
//!     for execution in client.list_executions().await? {
//!         println!("{} {} {}", execution.id, execution.pipeline_name, execution.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod executions;
pub mod reporter;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use reporter::{DisabledReporter, HttpReporter, Reporter};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the Sluice monitor API
#[derive(Debug, Clone)]
pub struct MonitorClient {
    /// Base URL of the monitor (e.g., "http://localhost:8765")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl MonitorClient {
    /// Create a new monitor client with no request timeout
    ///
    /// # Example
    /// ```
    /// use sluice_client::MonitorClient;
    ///
    /// let client = MonitorClient::new("http://localhost:8765");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new monitor client whose requests give up after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a new monitor client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the monitor
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become `ClientError::ApiError` carrying the
    /// monitor's `error` message when the body has one.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<serde_json::Value>(&error_text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(error_text);
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
