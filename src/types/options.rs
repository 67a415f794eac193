//! Stream options and configuration
//!
//! This module contains the transport configuration for the chat stream,
//! including a builder pattern for easy configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ChatStreamError, Result};

/// Default maximum size of a single frame (1MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Default `User-Agent` sent with the handshake
pub const DEFAULT_USER_AGENT: &str = concat!("agent-chat-stream/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Stream Options
// ============================================================================

/// Options for connecting to the orchestrator
///
/// No idle timeout is applied to an open stream: agent turns may run for
/// minutes. Callers that need a deadline cancel the exchange themselves.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// URL the exchange request is POSTed to
    pub endpoint: String,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
    /// Limit on establishing the TCP/TLS connection
    pub connect_timeout: Option<Duration>,
    /// Frames larger than this are dropped (default: 1MB). This filters
    /// frames after decoding; it does not cap memory while one is buffered.
    pub max_frame_size: Option<usize>,
    /// `User-Agent` header value
    pub user_agent: Option<String>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/api/chat/stream".to_string(),
            headers: HashMap::new(),
            connect_timeout: Some(Duration::from_secs(10)),
            max_frame_size: None,
            user_agent: None,
        }
    }
}

impl StreamOptions {
    /// Create a new builder for `StreamOptions`
    #[must_use]
    pub fn builder() -> StreamOptionsBuilder {
        StreamOptionsBuilder::default()
    }

    /// Effective frame size limit
    #[must_use]
    pub fn frame_limit(&self) -> usize {
        self.max_frame_size.unwrap_or(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Effective `User-Agent`
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Check the options for values the transport cannot use
    ///
    /// # Errors
    /// Returns `ChatStreamError::InvalidConfig` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ChatStreamError::invalid_config("endpoint must not be empty"));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ChatStreamError::invalid_config(format!(
                "endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if self.max_frame_size == Some(0) {
            return Err(ChatStreamError::invalid_config(
                "max_frame_size must be greater than zero",
            ));
        }
        if let Some(name) = self.headers.keys().find(|name| name.trim().is_empty()) {
            return Err(ChatStreamError::invalid_config(format!(
                "header name must not be blank: '{name}'"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Builder for StreamOptions
// ============================================================================

/// Builder for `StreamOptions`
#[derive(Debug, Default)]
pub struct StreamOptionsBuilder {
    options: StreamOptions,
}

impl StreamOptionsBuilder {
    /// Set the endpoint URL
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.options.endpoint = url.into();
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = Some(timeout);
        self
    }

    /// Remove the connect timeout
    #[must_use]
    pub const fn no_connect_timeout(mut self) -> Self {
        self.options.connect_timeout = None;
        self
    }

    /// Set the maximum frame size in bytes
    #[must_use]
    pub const fn max_frame_size(mut self, bytes: usize) -> Self {
        self.options.max_frame_size = Some(bytes);
        self
    }

    /// Set the `User-Agent` header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(agent.into());
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> StreamOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let options = StreamOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.frame_limit(), DEFAULT_MAX_FRAME_SIZE);
        assert!(options.user_agent().starts_with("agent-chat-stream/"));
    }

    #[test]
    fn builder_sets_fields() {
        let options = StreamOptions::builder()
            .endpoint("https://orchestrator.internal/chat")
            .header("X-Client", "web")
            .max_frame_size(4096)
            .no_connect_timeout()
            .user_agent("tests")
            .build();

        assert_eq!(options.endpoint, "https://orchestrator.internal/chat");
        assert_eq!(options.headers.get("X-Client").map(String::as_str), Some("web"));
        assert_eq!(options.frame_limit(), 4096);
        assert!(options.connect_timeout.is_none());
        assert_eq!(options.user_agent(), "tests");
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let options = StreamOptions::builder().endpoint("ws://localhost/chat").build();
        assert!(matches!(
            options.validate(),
            Err(ChatStreamError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_frame_size() {
        let options = StreamOptions::builder().max_frame_size(0).build();
        assert!(options.validate().is_err());
    }

    #[test]
    fn rejects_empty_endpoint() {
        let options = StreamOptions::builder().endpoint("  ").build();
        assert!(options.validate().is_err());
    }
}
