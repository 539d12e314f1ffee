//! Pipeline configuration.
//!
//! [`NovelryConfig`] controls timeouts, retry bounds, the proxy list endpoint
//! and the randomness used for identity rotation. Build one with
//! [`NovelryConfig::builder`] or start from [`NovelryConfig::default`].
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use novelry_core::NovelryConfig;
//!
//! let config = NovelryConfig::builder()
//!     .render_timeout(Duration::from_secs(15))
//!     .use_proxies(false)
//!     .seed(7)
//!     .build();
//! assert_eq!(config.chapter_attempts, 5);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// ProxyScrape free proxy list, one `protocol://host:port` entry per line.
pub const DEFAULT_PROXY_LIST_URL: &str =
    "https://api.proxyscrape.com/v4/free-proxy-list/get?request=display_proxies&proxy_format=protocolipport&format=text";

/// Configuration for the acquisition pipeline.
#[derive(Debug, Clone)]
pub struct NovelryConfig {
    /// Per-request timeout for plain and proxied HTTP (default: 10s).
    pub http_timeout: Duration,

    /// Page load timeout for headless rendering (default: 10s).
    pub render_timeout: Duration,

    /// Proxy/identity rotations before the proxied transport gives up (default: 5).
    pub proxy_attempts: usize,

    /// Attempts per chapter source, including the succeeding one (default: 5).
    pub chapter_attempts: usize,

    /// Delay before the second chapter attempt; doubles per attempt (default: 250ms).
    pub retry_backoff: Duration,

    /// Upper bound for retry delays (default: 4s).
    pub max_retry_backoff: Duration,

    /// Overall bound for one orchestrator operation (default: 90s).
    pub deadline: Duration,

    /// Endpoint returning newline-delimited proxies.
    pub proxy_list_url: String,

    /// Whether the proxy pool is loaded at all (default: true).
    pub use_proxies: bool,

    /// Fixed User-Agent; a random browser identity is used per attempt when unset.
    pub user_agent: Option<String>,

    /// Seed for proxy and identity selection; entropy when unset.
    pub seed: Option<u64>,

    /// Chromium executable for the render transport.
    pub chromium_path: Option<PathBuf>,
}

impl Default for NovelryConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(10),
            proxy_attempts: 5,
            chapter_attempts: 5,
            retry_backoff: Duration::from_millis(250),
            max_retry_backoff: Duration::from_secs(4),
            deadline: Duration::from_secs(90),
            proxy_list_url: DEFAULT_PROXY_LIST_URL.to_string(),
            use_proxies: true,
            user_agent: None,
            seed: None,
            chromium_path: None,
        }
    }
}

impl NovelryConfig {
    /// Creates a new builder for NovelryConfig.
    pub fn builder() -> NovelryConfigBuilder {
        NovelryConfigBuilder::new()
    }

    /// Random number generator for identity rotation, seeded when a seed is configured.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Delay to wait after the given zero-based failed attempt.
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16) as u32);
        self.retry_backoff.saturating_mul(factor).min(self.max_retry_backoff)
    }
}

/// Builder for NovelryConfig.
pub struct NovelryConfigBuilder {
    config: NovelryConfig,
}

impl NovelryConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: NovelryConfig::default() }
    }

    /// Sets the HTTP timeout.
    pub fn http_timeout(mut self, value: Duration) -> Self {
        self.config.http_timeout = value;
        self
    }

    /// Sets the render timeout.
    pub fn render_timeout(mut self, value: Duration) -> Self {
        self.config.render_timeout = value;
        self
    }

    /// Sets the number of proxy rotations.
    pub fn proxy_attempts(mut self, value: usize) -> Self {
        self.config.proxy_attempts = value.max(1);
        self
    }

    /// Sets the number of attempts per chapter source.
    pub fn chapter_attempts(mut self, value: usize) -> Self {
        self.config.chapter_attempts = value.max(1);
        self
    }

    /// Sets the initial retry backoff. Zero disables waiting.
    pub fn retry_backoff(mut self, value: Duration) -> Self {
        self.config.retry_backoff = value;
        self
    }

    /// Sets the overall operation deadline.
    pub fn deadline(mut self, value: Duration) -> Self {
        self.config.deadline = value;
        self
    }

    /// Sets the proxy list endpoint.
    pub fn proxy_list_url(mut self, value: impl Into<String>) -> Self {
        self.config.proxy_list_url = value.into();
        self
    }

    /// Sets whether the proxy pool is loaded.
    pub fn use_proxies(mut self, value: bool) -> Self {
        self.config.use_proxies = value;
        self
    }

    /// Pins the User-Agent instead of rotating it.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = Some(value.into());
        self
    }

    /// Seeds proxy and identity selection.
    pub fn seed(mut self, value: u64) -> Self {
        self.config.seed = Some(value);
        self
    }

    /// Sets the Chromium executable path.
    pub fn chromium_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.config.chromium_path = Some(value.into());
        self
    }

    /// Builds the config.
    pub fn build(self) -> NovelryConfig {
        self.config
    }
}

impl Default for NovelryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_config_default() {
        let config = NovelryConfig::default();
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.render_timeout, Duration::from_secs(10));
        assert_eq!(config.proxy_attempts, 5);
        assert_eq!(config.chapter_attempts, 5);
        assert!(config.use_proxies);
        assert!(config.proxy_list_url.contains("proxyscrape"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = NovelryConfig::builder()
            .chapter_attempts(3)
            .proxy_attempts(0)
            .use_proxies(false)
            .user_agent("test-agent")
            .build();

        assert_eq!(config.chapter_attempts, 3);
        assert_eq!(config.proxy_attempts, 1);
        assert!(!config.use_proxies);
        assert_eq!(config.user_agent.as_deref(), Some("test-agent"));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = NovelryConfig::default();
        assert_eq!(config.backoff_for(0), Duration::from_millis(250));
        assert_eq!(config.backoff_for(1), Duration::from_millis(500));
        assert_eq!(config.backoff_for(2), Duration::from_secs(1));
        assert_eq!(config.backoff_for(10), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_backoff() {
        let config = NovelryConfig::builder().retry_backoff(Duration::ZERO).build();
        assert_eq!(config.backoff_for(3), Duration::ZERO);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let config = NovelryConfig::builder().seed(42).build();
        let a: u64 = config.rng().r#gen();
        let b: u64 = config.rng().r#gen();
        assert_eq!(a, b);
    }
}
