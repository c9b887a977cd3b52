use rustzw_core::serial_api::DEFAULT_TRANSMIT_OPTIONS;
use std::time::Duration;

/// What to do with a node that does not implement the Version command class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VersionFallback {
    /// Treat every handler as version 1 and let the node become operational.
    #[default]
    AssumeVersionOne,
    /// Move the node to `Failed`.
    Fail,
}

/// Controller tuning.
///
/// ```
/// use rustzw_controller::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::default()
///     .with_response_timeout(Duration::from_secs(2))
///     .with_retry_budget(1);
/// assert_eq!(config.retry_budget, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    /// Window for one attempt: ACK, SendData response, callback and, for
    /// Get traffic, the node's report.
    pub response_timeout: Duration,
    /// Re-sends allowed after the first attempt.
    pub retry_budget: u8,
    /// A re-queued entry waits `retry_backoff * attempts` before it is eligible again.
    pub retry_backoff: Duration,
    pub version_fallback: VersionFallback,
    pub transmit_options: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            retry_budget: 3,
            retry_backoff: Duration::from_millis(250),
            version_fallback: VersionFallback::default(),
            transmit_options: DEFAULT_TRANSMIT_OPTIONS,
        }
    }
}

impl ControllerConfig {
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_retry_budget(mut self, retries: u8) -> Self {
        self.retry_budget = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_version_fallback(mut self, fallback: VersionFallback) -> Self {
        self.version_fallback = fallback;
        self
    }

    pub fn with_transmit_options(mut self, options: u8) -> Self {
        self.transmit_options = options;
        self
    }
}
