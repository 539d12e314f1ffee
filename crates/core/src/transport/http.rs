//! Plain HTTP transport: one request, no retries.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use reqwest::Client;
use tracing::debug;

use super::{FetchAttempt, FetchOutcome, Transport, pick_user_agent};
use crate::{NovelryConfig, Result};

pub(crate) const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

pub struct HttpTransport {
    client: Client,
    user_agent: Option<String>,
    rng: Mutex<StdRng>,
}

impl HttpTransport {
    pub fn new(config: &NovelryConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self { client, user_agent: config.user_agent.clone(), rng: Mutex::new(config.rng()) })
    }

    fn user_agent(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        pick_user_agent(self.user_agent.as_deref(), &mut *rng)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> FetchAttempt {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent())
            .header("Accept", ACCEPT_HTML)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "request failed");
                return FetchAttempt::failed(url, e.to_string());
            }
        };

        let status = response.status();
        debug!(url, status = status.as_u16(), "response");

        let outcome = if status.as_u16() == 404 {
            FetchOutcome::NotFound
        } else if status.is_success() {
            match response.text().await {
                Ok(body) => FetchOutcome::Success(body),
                Err(e) => FetchOutcome::TransportError(format!("failed to read body: {}", e)),
            }
        } else {
            FetchOutcome::TransportError(format!("HTTP {}", status))
        };

        FetchAttempt::new(url, Some(status.as_u16()), outcome)
    }
}
