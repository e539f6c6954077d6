//! Per-session configuration supplied by the hosting view.

use inkwell_core::RetryPolicy;
use inkwell_proto::DEFAULT_PLATFORM;

/// What a session talks to and on whose behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket base URL, e.g. `wss://api.example.com`.
    pub ws_base: String,
    /// Article the conversation is about.
    pub article_id: String,
    /// Brand whose voice the assistant should use.
    pub brand_id: String,
    /// Platform label sent with every request.
    pub platform: String,
    /// Reconnect policy.
    pub retry: RetryPolicy,
}

impl SessionConfig {
    /// Configuration with the default platform and retry policy.
    pub fn new(
        ws_base: impl Into<String>,
        article_id: impl Into<String>,
        brand_id: impl Into<String>,
    ) -> Self {
        Self {
            ws_base: ws_base.into(),
            article_id: article_id.into(),
            brand_id: brand_id.into(),
            platform: DEFAULT_PLATFORM.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the platform label.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Override the reconnect policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
