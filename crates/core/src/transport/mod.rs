//! Page transports.
//!
//! A [`Transport`] turns a URL into a [`FetchAttempt`] whose outcome is one of
//! success, not-found, blocked or failure. Transports never return raw
//! network errors; everything is classified before it leaves this module.
//!
//! Three strategies exist:
//!
//! - [`HttpTransport`]: one plain HTTP request.
//! - [`ProxiedTransport`]: rotates proxies and identities until a page is served.
//! - [`RenderTransport`]: loads the page in an isolated headless browser.

pub mod http;
pub mod proxied;
pub mod render;

#[cfg(feature = "render")]
pub mod chromium;

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::NovelryConfig;
use crate::proxy::ProxyPool;

pub use http::HttpTransport;
pub use proxied::ProxiedTransport;
pub use render::{Navigation, NoopRenderer, RenderContext, RenderTransport, Renderer};

/// Browser identities rotated between attempts.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Statuses anti-bot layers answer with.
pub(crate) fn is_blocking_status(status: u16) -> bool {
    matches!(status, 403 | 429 | 503)
}

/// The configured User-Agent, or a random browser identity.
pub(crate) fn pick_user_agent<R: Rng + ?Sized>(fixed: Option<&str>, rng: &mut R) -> String {
    match fixed {
        Some(ua) => ua.to_string(),
        None => USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]).to_string(),
    }
}

/// How a descriptor wants its pages fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Direct,
    Proxied,
    Rendered,
}

/// Classified result of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with the raw body.
    Success(String),
    /// The server answered 404.
    NotFound,
    /// An anti-bot layer rejected every identity that was tried.
    Blocked,
    /// Network failure, timeout or unexpected status.
    TransportError(String),
}

/// A fetch together with what was requested and the last status seen.
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    pub url: String,
    pub status: Option<u16>,
    pub outcome: FetchOutcome,
}

impl FetchAttempt {
    pub fn new(url: &str, status: Option<u16>, outcome: FetchOutcome) -> Self {
        Self { url: url.to_string(), status, outcome }
    }

    pub fn failed(url: &str, detail: impl Into<String>) -> Self {
        Self::new(url, None, FetchOutcome::TransportError(detail.into()))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchAttempt;
}

/// One transport per [`TransportKind`].
#[derive(Clone)]
pub struct Transports {
    direct: Arc<dyn Transport>,
    proxied: Arc<dyn Transport>,
    rendered: Arc<dyn Transport>,
}

impl Transports {
    pub fn new(direct: Arc<dyn Transport>, proxied: Arc<dyn Transport>, rendered: Arc<dyn Transport>) -> Self {
        Self { direct, proxied, rendered }
    }

    /// Uses one transport for every kind.
    pub fn uniform(transport: Arc<dyn Transport>) -> Self {
        Self { direct: transport.clone(), proxied: transport.clone(), rendered: transport }
    }

    /// Builds the production transports.
    ///
    /// Nothing is fetched or launched here: the proxy list is loaded on the
    /// first proxied fetch and browsers are started per render.
    pub fn from_config(config: &NovelryConfig) -> crate::Result<Self> {
        let direct = Arc::new(HttpTransport::new(config)?);
        let proxied = Arc::new(ProxiedTransport::new(config));

        #[cfg(feature = "render")]
        let renderer: Arc<dyn Renderer> = Arc::new(chromium::ChromiumRenderer::new(config));
        #[cfg(not(feature = "render"))]
        let renderer: Arc<dyn Renderer> = Arc::new(NoopRenderer);

        let rendered = Arc::new(RenderTransport::new(renderer, config));
        Ok(Self::new(direct, proxied, rendered))
    }

    /// Like [`Transports::from_config`] with an already loaded proxy pool.
    pub fn with_proxy_pool(config: &NovelryConfig, pool: Arc<ProxyPool>) -> crate::Result<Self> {
        let mut transports = Self::from_config(config)?;
        transports.proxied = Arc::new(ProxiedTransport::with_pool(config, pool));
        Ok(transports)
    }

    pub fn get(&self, kind: TransportKind) -> &Arc<dyn Transport> {
        match kind {
            TransportKind::Direct => &self.direct,
            TransportKind::Proxied => &self.proxied,
            TransportKind::Rendered => &self.rendered,
        }
    }
}
