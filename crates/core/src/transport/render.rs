//! Headless render transport.
//!
//! [`Renderer`] and [`RenderContext`] abstract over the browser engine. The
//! transport opens one context per fetch, bounds navigation with the render
//! timeout and closes the context on every exit path. A context dropped
//! mid-navigation (caller cancelled) must release its browser in `Drop`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use super::{FetchAttempt, FetchOutcome, Transport, pick_user_agent};
use crate::{NovelryConfig, NovelryError, Result};

/// Outcome of a navigation as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    /// Status of the main document response, `None` when the browser saw none.
    pub status: Option<u16>,
}

/// A browser engine that can open isolated contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh context presenting the given User-Agent.
    async fn new_context(&self, user_agent: &str) -> Result<Box<dyn RenderContext>>;
}

/// One isolated browsing context.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigates and waits for the document to load.
    async fn navigate(&mut self, url: &str) -> Result<Navigation>;
    /// Serialized DOM of the current page.
    async fn html(&self) -> Result<String>;
    /// Releases the context and everything it owns.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Renderer used when headless rendering is not compiled in.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self, _user_agent: &str) -> Result<Box<dyn RenderContext>> {
        Err(NovelryError::Browser("headless rendering is not available in this build".to_string()))
    }
}

pub struct RenderTransport {
    renderer: Arc<dyn Renderer>,
    timeout: Duration,
    user_agent: Option<String>,
    rng: Mutex<StdRng>,
}

impl RenderTransport {
    pub fn new(renderer: Arc<dyn Renderer>, config: &NovelryConfig) -> Self {
        Self {
            renderer,
            timeout: config.render_timeout,
            user_agent: config.user_agent.clone(),
            rng: Mutex::new(config.rng()),
        }
    }

    fn user_agent(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        pick_user_agent(self.user_agent.as_deref(), &mut *rng)
    }
}

async fn load(context: &mut Box<dyn RenderContext>, url: &str) -> Result<(Navigation, String)> {
    let navigation = context.navigate(url).await?;
    let html = context.html().await?;
    Ok((navigation, html))
}

#[async_trait]
impl Transport for RenderTransport {
    async fn fetch(&self, url: &str) -> FetchAttempt {
        let user_agent = self.user_agent();

        let mut context = match tokio::time::timeout(self.timeout, self.renderer.new_context(&user_agent)).await {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => {
                warn!(url, error = %e, "failed to open browser context");
                return FetchAttempt::failed(url, e.to_string());
            }
            Err(_) => return FetchAttempt::failed(url, "browser did not start in time"),
        };

        let loaded = tokio::time::timeout(self.timeout, load(&mut context, url)).await;

        if let Err(e) = context.close().await {
            debug!(url, error = %e, "failed to close browser context");
        }

        let (navigation, html) = match loaded {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(e)) => {
                debug!(url, error = %e, "render failed");
                return FetchAttempt::failed(url, e.to_string());
            }
            Err(_) => {
                debug!(url, timeout = ?self.timeout, "render timed out");
                return FetchAttempt::failed(url, format!("page load timed out after {}s", self.timeout.as_secs()));
            }
        };

        let outcome = match navigation.status {
            None => FetchOutcome::TransportError("no response from page".to_string()),
            Some(404) => FetchOutcome::NotFound,
            Some(200) => FetchOutcome::Success(html),
            Some(status) => FetchOutcome::TransportError(format!("HTTP {}", status)),
        };
        debug!(url, status = ?navigation.status, "rendered");

        FetchAttempt::new(url, navigation.status, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
        dropped: AtomicUsize,
    }

    struct FakeRenderer {
        status: Option<u16>,
        delay: Duration,
        fail_navigation: bool,
        counters: Arc<Counters>,
    }

    impl FakeRenderer {
        fn new(status: Option<u16>) -> Self {
            Self { status, delay: Duration::ZERO, fail_navigation: false, counters: Arc::default() }
        }
    }

    struct FakeContext {
        status: Option<u16>,
        delay: Duration,
        fail_navigation: bool,
        user_agent: String,
        counters: Arc<Counters>,
    }

    impl Drop for FakeContext {
        fn drop(&mut self) {
            self.counters.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self, user_agent: &str) -> Result<Box<dyn RenderContext>> {
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeContext {
                status: self.status,
                delay: self.delay,
                fail_navigation: self.fail_navigation,
                user_agent: user_agent.to_string(),
                counters: self.counters.clone(),
            }))
        }
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, _url: &str) -> Result<Navigation> {
            tokio::time::sleep(self.delay).await;
            if self.fail_navigation {
                return Err(NovelryError::Browser("net::ERR_CONNECTION_RESET".into()));
            }
            Ok(Navigation { status: self.status })
        }

        async fn html(&self) -> Result<String> {
            Ok(format!("<html><body data-ua=\"{}\">rendered</body></html>", self.user_agent))
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make(renderer: FakeRenderer, timeout: Duration) -> (RenderTransport, Arc<Counters>) {
        let counters = renderer.counters.clone();
        let config = NovelryConfig::builder().render_timeout(timeout).user_agent("render-test").build();
        (RenderTransport::new(Arc::new(renderer), &config), counters)
    }

    #[tokio::test]
    async fn test_success_closes_context() {
        let (transport, counters) = make(FakeRenderer::new(Some(200)), Duration::from_secs(5));

        let attempt = transport.fetch("https://novtales.com/novel/shadow-slave").await;
        match attempt.outcome {
            FetchOutcome::Success(html) => assert!(html.contains("data-ua=\"render-test\"")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_classification() {
        let (transport, _) = make(FakeRenderer::new(Some(404)), Duration::from_secs(5));
        assert_eq!(transport.fetch("https://x/").await.outcome, FetchOutcome::NotFound);

        let (transport, _) = make(FakeRenderer::new(Some(403)), Duration::from_secs(5));
        assert!(matches!(transport.fetch("https://x/").await.outcome, FetchOutcome::TransportError(_)));

        let (transport, _) = make(FakeRenderer::new(None), Duration::from_secs(5));
        assert!(matches!(transport.fetch("https://x/").await.outcome, FetchOutcome::TransportError(_)));
    }

    #[tokio::test]
    async fn test_timeout_still_closes_context() {
        let mut renderer = FakeRenderer::new(Some(200));
        renderer.delay = Duration::from_secs(30);
        let (transport, counters) = make(renderer, Duration::from_millis(50));

        let attempt = transport.fetch("https://x/").await;
        assert!(matches!(attempt.outcome, FetchOutcome::TransportError(ref d) if d.contains("timed out")));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_error_still_closes_context() {
        let mut renderer = FakeRenderer::new(Some(200));
        renderer.fail_navigation = true;
        let (transport, counters) = make(renderer, Duration::from_secs(5));

        assert!(matches!(transport.fetch("https://x/").await.outcome, FetchOutcome::TransportError(_)));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_drops_context() {
        let mut renderer = FakeRenderer::new(Some(200));
        renderer.delay = Duration::from_secs(30);
        let (transport, counters) = make(renderer, Duration::from_secs(60));

        let cancelled = tokio::time::timeout(Duration::from_millis(50), transport.fetch("https://x/")).await;
        assert!(cancelled.is_err());
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_noop_renderer_fails_cleanly() {
        let config = NovelryConfig::default();
        let transport = RenderTransport::new(Arc::new(NoopRenderer), &config);
        assert!(matches!(transport.fetch("https://x/").await.outcome, FetchOutcome::TransportError(_)));
    }
}
