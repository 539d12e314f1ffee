//! Proxy-rotated transport.
//!
//! Every attempt uses a fresh proxy from the shared [`ProxyPool`] and a fresh
//! User-Agent. Proxies that get blocked or fail to connect are excluded from
//! the pool. With an empty pool each attempt connects directly.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::http::ACCEPT_HTML;
use super::{FetchAttempt, FetchOutcome, Transport, is_blocking_status, pick_user_agent};
use crate::NovelryConfig;
use crate::proxy::{ProxyEntry, ProxyPool};

pub struct ProxiedTransport {
    config: NovelryConfig,
    pool: OnceCell<Arc<ProxyPool>>,
    rng: Mutex<StdRng>,
}

impl ProxiedTransport {
    /// Loads the proxy list from the configured endpoint on first use.
    pub fn new(config: &NovelryConfig) -> Self {
        Self { config: config.clone(), pool: OnceCell::new(), rng: Mutex::new(config.rng()) }
    }

    pub fn with_pool(config: &NovelryConfig, pool: Arc<ProxyPool>) -> Self {
        Self { config: config.clone(), pool: OnceCell::new_with(Some(pool)), rng: Mutex::new(config.rng()) }
    }

    async fn pool(&self) -> &Arc<ProxyPool> {
        self.pool.get_or_init(|| async { Arc::new(ProxyPool::load(&self.config).await) }).await
    }

    /// Chooses the proxy and identity for one attempt.
    fn pick(&self, pool: &ProxyPool) -> (Option<ProxyEntry>, String) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let proxy = pool.next(&mut *rng);
        let user_agent = pick_user_agent(self.config.user_agent.as_deref(), &mut *rng);
        (proxy, user_agent)
    }

    fn client(&self, proxy: Option<&ProxyEntry>) -> crate::Result<Client> {
        let mut builder = Client::builder().timeout(self.config.http_timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy.to_proxy()?);
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl Transport for ProxiedTransport {
    async fn fetch(&self, url: &str) -> FetchAttempt {
        let pool = self.pool().await;
        let mut last_status = None;

        for attempt in 1..=self.config.proxy_attempts {
            let (proxy, user_agent) = self.pick(pool);
            let via = proxy.as_ref().map(ProxyEntry::to_url).unwrap_or_else(|| "direct".to_string());

            let client = match self.client(proxy.as_ref()) {
                Ok(client) => client,
                Err(e) => {
                    debug!(url, attempt, via, error = %e, "unusable proxy");
                    if let Some(proxy) = &proxy {
                        pool.exclude(proxy);
                    }
                    continue;
                }
            };

            let response = client
                .get(url)
                .header("User-Agent", user_agent)
                .header("Accept", ACCEPT_HTML)
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    debug!(url, attempt, via, error = %e, "request failed, rotating");
                    if let Some(proxy) = &proxy {
                        pool.exclude(proxy);
                    }
                    continue;
                }
            };

            let status = response.status().as_u16();
            last_status = Some(status);

            if is_blocking_status(status) {
                warn!(url, attempt, via, status, "blocked, rotating");
                if let Some(proxy) = &proxy {
                    pool.exclude(proxy);
                }
                continue;
            }

            if status == 404 {
                return FetchAttempt::new(url, Some(status), FetchOutcome::NotFound);
            }

            if !response.status().is_success() {
                return FetchAttempt::new(url, Some(status), FetchOutcome::TransportError(format!("HTTP {}", status)));
            }

            match response.text().await {
                Ok(body) => {
                    debug!(url, attempt, via, "served");
                    return FetchAttempt::new(url, Some(status), FetchOutcome::Success(body));
                }
                Err(e) => {
                    debug!(url, attempt, via, error = %e, "failed to read body, rotating");
                    continue;
                }
            }
        }

        FetchAttempt::new(url, last_status, FetchOutcome::TransportError("all proxies failed".to_string()))
    }
}
