//! Host-supplied client configuration.
//!
//! Values arrive from flags or the environment as plain strings and are
//! validated once here before a session is built.

use std::time::Duration;

use inkwell_app::SessionConfig;
use inkwell_core::RetryPolicy;
use inkwell_proto::DEFAULT_PLATFORM;
use url::Url;

use crate::ConfigError;

/// Validated client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    ws_base: String,
    article_id: String,
    brand_id: String,
    platform: String,
    retry: RetryPolicy,
}

impl ClientConfig {
    /// Validate raw settings.
    ///
    /// `ws_base` must be an absolute `ws://` or `wss://` URL without a query
    /// or fragment. Article and brand identifiers must be non-empty after
    /// trimming.
    pub fn new(
        ws_base: &str,
        article_id: &str,
        brand_id: &str,
    ) -> Result<Self, ConfigError> {
        let ws_base = validate_base(ws_base)?;

        let article_id = article_id.trim();
        if article_id.is_empty() {
            return Err(ConfigError::Missing("article id"));
        }
        let brand_id = brand_id.trim();
        if brand_id.is_empty() {
            return Err(ConfigError::Missing("brand id"));
        }

        Ok(Self {
            ws_base,
            article_id: article_id.to_string(),
            brand_id: brand_id.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the platform label. A blank label keeps the default.
    #[must_use]
    pub fn with_platform(mut self, platform: &str) -> Self {
        let platform = platform.trim();
        if !platform.is_empty() {
            self.platform = platform.to_string();
        }
        self
    }

    /// Override the automatic reconnect ceiling.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = self.retry.with_max_attempts(max_retries);
        self
    }

    /// Override the backoff base delay.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry = self.retry.with_base_delay(base_delay);
        self
    }

    /// Normalized WebSocket base, without a trailing slash.
    pub fn ws_base(&self) -> &str {
        &self.ws_base
    }

    /// Reconnect policy.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Session configuration for these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.ws_base, &self.article_id, &self.brand_id)
            .with_platform(&self.platform)
            .with_retry(self.retry)
    }
}

fn validate_base(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBase {
        base: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid("scheme must be ws or wss"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use inkwell_core::retry::DEFAULT_MAX_ATTEMPTS;

    use super::*;

    #[test]
    fn accepts_ws_and_wss() {
        let config = ClientConfig::new("wss://chat.example.com/", "a-1", "b-1").unwrap();
        assert_eq!(config.ws_base(), "wss://chat.example.com");

        let config = ClientConfig::new("ws://localhost:8000", "a-1", "b-1").unwrap();
        assert_eq!(config.ws_base(), "ws://localhost:8000");
    }

    #[test]
    fn keeps_base_path() {
        let config = ClientConfig::new("wss://example.com/chat/", "a", "b").unwrap();
        assert_eq!(config.ws_base(), "wss://example.com/chat");
    }

    #[test]
    fn rejects_http_scheme() {
        let err = ClientConfig::new("https://example.com", "a", "b").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBase { .. }));
    }

    #[test]
    fn rejects_garbage_and_query() {
        assert!(ClientConfig::new("not a url", "a", "b").is_err());
        assert!(ClientConfig::new("wss://example.com/?x=1", "a", "b").is_err());
    }

    #[test]
    fn requires_article_and_brand() {
        assert_eq!(
            ClientConfig::new("wss://example.com", " ", "b"),
            Err(ConfigError::Missing("article id"))
        );
        assert_eq!(
            ClientConfig::new("wss://example.com", "a", ""),
            Err(ConfigError::Missing("brand id"))
        );
    }

    #[test]
    fn session_config_carries_settings() {
        let config = ClientConfig::new("wss://example.com", " a-1 ", "b-1")
            .unwrap()
            .with_platform("LinkedIn")
            .with_max_retries(5);
        let session = config.session_config();

        assert_eq!(session.ws_base, "wss://example.com");
        assert_eq!(session.article_id, "a-1");
        assert_eq!(session.platform, "LinkedIn");
        assert_eq!(session.retry.max_attempts, 5);
    }

    #[test]
    fn blank_platform_keeps_default() {
        let config = ClientConfig::new("wss://example.com", "a", "b").unwrap().with_platform("  ");
        assert_eq!(config.session_config().platform, DEFAULT_PLATFORM);
        assert_eq!(config.retry().max_attempts, DEFAULT_MAX_ATTEMPTS);
    }
}
