//! Chromium renderer using chromiumoxide.
//!
//! Every context is its own headless browser process with a throwaway
//! profile directory, so no cookies or storage leak between fetches.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::debug;

use super::render::{Navigation, RenderContext, Renderer};
use crate::{NovelryConfig, NovelryError, Result};

/// Environment variable overriding the Chromium executable.
pub const CHROMIUM_PATH_ENV: &str = "NOVELRY_CHROMIUM_PATH";

fn browser_err(e: impl std::fmt::Display) -> NovelryError {
    NovelryError::Browser(e.to_string())
}

/// Finds a Chromium executable.
///
/// Lookup order: the configured path, `NOVELRY_CHROMIUM_PATH`, a browser
/// installed under `~/.novelry/chromium`, then `PATH`.
pub fn find_chromium(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".novelry/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".novelry/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".novelry/chromium/chrome"),
            ]
        } else {
            vec![home.join(".novelry/chromium/chrome-linux64/chrome"), home.join(".novelry/chromium/chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    ["google-chrome", "chromium", "chromium-browser"].iter().find_map(|name| which::which(name).ok())
}

pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl ChromiumRenderer {
    /// Resolves the executable now; the browser itself is launched per context.
    pub fn new(config: &NovelryConfig) -> Self {
        let executable = find_chromium(config.chromium_path.as_deref());
        if executable.is_none() {
            debug!("no Chromium executable found");
        }
        Self { executable, request_timeout: config.render_timeout }
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self, user_agent: &str) -> Result<Box<dyn RenderContext>> {
        let executable = self.executable.as_ref().ok_or_else(|| {
            NovelryError::Browser(format!("Chromium not found; set {} or install Chromium", CHROMIUM_PATH_ENV))
        })?;
        let profile = TempDir::new().map_err(browser_err)?;

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(profile.path())
            .request_timeout(self.request_timeout)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={}", user_agent))
            .build()
            .map_err(browser_err)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(browser_err(e));
            }
        };

        Ok(Box::new(ChromiumContext { browser, page, handler, _profile: profile }))
    }
}

/// One headless browser with a single page.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    _profile: TempDir,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str) -> Result<Navigation> {
        self.page.goto(url).await.map_err(browser_err)?;

        let request = self.page.wait_for_navigation_response().await.map_err(browser_err)?;
        let status = request
            .as_ref()
            .and_then(|req| req.response.as_ref())
            .and_then(|response| u16::try_from(response.status).ok());

        Ok(Navigation { status })
    }

    async fn html(&self) -> Result<String> {
        self.page.content().await.map_err(browser_err)
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        log_teardown("close page", self.page.clone().close().await);
        let closed = self.browser.close().await.map_err(browser_err);
        log_teardown("wait for browser exit", self.browser.wait().await);
        self.handler.abort();
        closed.map(|_| ())
    }
}

/// Logs a failed teardown step. Teardown carries on either way.
fn log_teardown<T, E: std::fmt::Display>(step: &'static str, result: std::result::Result<T, E>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            debug!(step, error = %e, "browser teardown step failed");
            false
        }
    }
}

impl Drop for ChromiumContext {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
