use std::time::Duration;

use crate::error::{ProbeError, Result};

/// Default address of the design service dev server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Configuration for a probe run.
///
/// Use [`ProbeConfig::builder()`] for ergonomic construction, or
/// [`ProbeConfig::default()`] for the stock smoke-test settings.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Base address of the design service.
    pub base_url: String,

    /// How long to wait for each new artifact.
    pub artifact_timeout: Duration,

    /// Fixed delay between artifact polls.
    pub poll_interval: Duration,

    /// Per-request HTTP timeout.
    pub request_timeout: Duration,

    /// Pause between the generation and modification phases.
    pub settle_delay: Duration,

    /// Author name attached to every message sent.
    pub author_name: String,

    /// Description used when creating the session.
    pub vibe_description: String,

    /// Message that should produce the first artifact.
    pub generate_prompt: String,

    /// Message that should produce an artifact derived from the first.
    pub modify_prompt: String,

    /// Fail the run when the modified artifact is not linked to the original.
    pub strict_lineage: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            artifact_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            author_name: "TestUser".to_string(),
            vibe_description: "simple geometric pattern".to_string(),
            generate_prompt: "create a simple blue circle on the shirt".to_string(),
            modify_prompt: "make the circle red instead of blue".to_string(),
            strict_lineage: false,
        }
    }
}

impl ProbeConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> ProbeConfigBuilder {
        ProbeConfigBuilder::default()
    }

    /// Reject settings the probe cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ProbeError::InvalidConfig("base URL is empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProbeError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.artifact_timeout.is_zero() {
            return Err(ProbeError::InvalidConfig("artifact timeout must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ProbeError::InvalidConfig("poll interval must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for [`ProbeConfig`].
#[derive(Default)]
pub struct ProbeConfigBuilder {
    config: ProbeConfig,
}

impl ProbeConfigBuilder {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set how long to wait for each new artifact.
    pub fn with_artifact_timeout(mut self, timeout: Duration) -> Self {
        self.config.artifact_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the pause between the generation and modification phases.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.config.author_name = name.into();
        self
    }

    pub fn with_vibe_description(mut self, vibe: impl Into<String>) -> Self {
        self.config.vibe_description = vibe.into();
        self
    }

    pub fn with_generate_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.generate_prompt = prompt.into();
        self
    }

    pub fn with_modify_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.modify_prompt = prompt.into();
        self
    }

    /// Treat a missing or mismatched source link as a failure.
    pub fn with_strict_lineage(mut self, strict: bool) -> Self {
        self.config.strict_lineage = strict;
        self
    }

    /// Build the final [`ProbeConfig`].
    pub fn build(self) -> ProbeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.artifact_timeout, Duration::from_secs(90));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.author_name, "TestUser");
        assert!(!config.strict_lineage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ProbeConfig::builder()
            .with_base_url("http://127.0.0.1:9000")
            .with_artifact_timeout(Duration::from_secs(10))
            .with_poll_interval(Duration::from_millis(100))
            .with_author_name("Bot")
            .with_strict_lineage(true)
            .build();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.artifact_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.author_name, "Bot");
        assert!(config.strict_lineage);
        // untouched fields keep their defaults
        assert_eq!(config.vibe_description, "simple geometric pattern");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = ProbeConfig::builder().with_base_url("localhost:3000").build();
        assert!(matches!(bad_url.validate(), Err(ProbeError::InvalidConfig(_))));

        let zero_interval = ProbeConfig::builder()
            .with_poll_interval(Duration::ZERO)
            .build();
        assert!(zero_interval.validate().is_err());

        let zero_timeout = ProbeConfig::builder()
            .with_artifact_timeout(Duration::ZERO)
            .build();
        assert!(zero_timeout.validate().is_err());
    }
}
