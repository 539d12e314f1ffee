//! Shared pool of public proxies for the proxied transport.
//!
//! The pool is loaded once from a newline-delimited `protocol://host:port`
//! list. Entries that get blocked or refuse connections are excluded for the
//! rest of the process. An empty pool is valid: the proxied transport then
//! connects directly.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use rand::Rng;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{NovelryConfig, NovelryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

impl FromStr for ProxyProtocol {
    type Err = NovelryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ProxyProtocol::Http),
            "https" => Ok(ProxyProtocol::Https),
            "socks4" => Ok(ProxyProtocol::Socks4),
            "socks5" => Ok(ProxyProtocol::Socks5),
            other => Err(NovelryError::InvalidUrl(format!("unsupported proxy protocol: {}", other))),
        }
    }
}

/// One `protocol://host:port` proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEntry {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
}

impl ProxyEntry {
    pub fn new(protocol: ProxyProtocol, host: impl Into<String>, port: u16) -> Self {
        Self { protocol, host: host.into(), port }
    }

    pub fn to_url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Proxy configuration routing all schemes through this entry.
    pub fn to_proxy(&self) -> Result<reqwest::Proxy> {
        Ok(reqwest::Proxy::all(self.to_url())?)
    }
}

impl fmt::Display for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl FromStr for ProxyEntry {
    type Err = NovelryError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NovelryError::InvalidUrl(format!("invalid proxy entry: {}", s));

        let (scheme, rest) = s.trim().split_once("://").ok_or_else(invalid)?;
        let protocol = scheme.parse()?;
        let (host, port) = rest.trim_end_matches('/').rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self::new(protocol, host, port))
    }
}

/// Process-wide proxy list, shared by `Arc` between transports.
#[derive(Debug, Default)]
pub struct ProxyPool {
    entries: Mutex<Vec<ProxyEntry>>,
}

impl ProxyPool {
    /// A pool with no proxies; callers connect directly.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ProxyEntry>) -> Self {
        Self { entries: Mutex::new(entries) }
    }

    /// Parses a newline-delimited list, skipping blank and malformed lines.
    pub fn parse_list(text: &str) -> Self {
        let entries: Vec<ProxyEntry> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match line.parse::<ProxyEntry>() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(line, error = %e, "skipping proxy list line");
                    None
                }
            })
            .collect();

        Self::from_entries(entries)
    }

    /// Loads the pool from the configured endpoint.
    ///
    /// Never fails: an unreachable endpoint, a non-2xx answer or an empty list
    /// all produce an empty pool.
    pub async fn load(config: &NovelryConfig) -> Self {
        if !config.use_proxies {
            debug!("proxies disabled");
            return Self::empty();
        }

        match Self::fetch_list(config).await {
            Ok(text) => {
                let pool = Self::parse_list(&text);
                if pool.is_empty() {
                    warn!(url = %config.proxy_list_url, "proxy list is empty, using direct connections");
                } else {
                    info!(count = pool.len(), "loaded proxy list");
                }
                pool
            }
            Err(e) => {
                warn!(url = %config.proxy_list_url, error = %e, "failed to load proxy list, using direct connections");
                Self::empty()
            }
        }
    }

    async fn fetch_list(config: &NovelryConfig) -> Result<String> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        let response = client.get(&config.proxy_list_url).send().await?;

        if !response.status().is_success() {
            return Err(NovelryError::Transport(format!("proxy list returned {}", response.status())));
        }

        Ok(response.text().await?)
    }

    /// Picks a remaining entry uniformly at random.
    pub fn next<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ProxyEntry> {
        let entries = self.lock();
        if entries.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..entries.len());
        entries.get(index).cloned()
    }

    /// Removes an entry for the rest of the process. Returns whether it was present.
    pub fn exclude(&self, entry: &ProxyEntry) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|e| e != entry);
        let removed = entries.len() < before;
        if removed {
            debug!(proxy = %entry, remaining = entries.len(), "excluded proxy");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProxyEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
