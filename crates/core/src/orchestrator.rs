//! Fetch orchestration across sources.
//!
//! The [`Orchestrator`] walks the registry's sources for an operation in
//! priority order, applies the per-operation fallback policy and returns one
//! record or one classified error. Every public operation is bounded by the
//! configured deadline; when it expires the in-flight fetch is dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use novelry_core::{NovelryConfig, Orchestrator, SeriesId};
//!
//! # async fn run() -> novelry_core::Result<()> {
//! let orchestrator = Orchestrator::from_config(NovelryConfig::default())?;
//! let record = orchestrator.get_series_info(&SeriesId::parse("shadow-slave")?).await?;
//! println!("{:?}", record.latest_chapter);
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use tracing::{debug, info, warn};

use crate::ids::SeriesId;
use crate::merge::{merge, normalize};
use crate::model::{ChapterNo, ChapterRecord, FeedEntry, MetadataRecord, SearchResult};
use crate::sources::{SourceDescriptor, SourceRegistry, UrlParams};
use crate::transport::{FetchOutcome, Transports};
use crate::{NovelryConfig, NovelryError, Result};

const SERIES_NOT_FOUND: &str = "Series not found";
const FETCH_FAILED: &str = "Failed to fetch the page";
const CHAPTER_NOT_FOUND: &str = "Chapter not found";
const CHAPTER_RETRIEVAL_FAILED: &str = "Failed to retrieve chapter";
const EMPTY_CHAPTER: &str = "Empty chapter";

/// What a single fetch of one source produced.
enum Page {
    Body(String),
    Missing,
    Failed(String),
}

pub struct Orchestrator {
    registry: SourceRegistry,
    transports: Transports,
    config: NovelryConfig,
}

impl Orchestrator {
    pub fn new(registry: SourceRegistry, transports: Transports, config: NovelryConfig) -> Self {
        Self { registry, transports, config }
    }

    /// Default registry with production transports.
    pub fn from_config(config: NovelryConfig) -> Result<Self> {
        let transports = Transports::from_config(&config)?;
        Ok(Self::new(SourceRegistry::default(), transports, config))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &NovelryConfig {
        &self.config
    }

    /// Series metadata from the reference source merged with the first
    /// secondary source that serves the series.
    ///
    /// # Errors
    ///
    /// - [`NovelryError::NotFound`] as soon as any source reports the series missing.
    /// - A 503-class error when the reference source fails or every other source fails.
    pub async fn get_series_info(&self, id: &SeriesId) -> Result<MetadataRecord> {
        self.bounded(self.series_info(id)).await
    }

    /// Chapter content from the first chapter source that serves a non-empty body.
    ///
    /// # Errors
    ///
    /// The error recorded for the last source tried: 404, 204, 500 or 503.
    pub async fn get_chapter(&self, id: &SeriesId, chapter_no: &ChapterNo) -> Result<ChapterRecord> {
        self.bounded(self.chapter(id, chapter_no)).await
    }

    /// Series-finder results for a free-text query.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NovelryError::BadInput("No search query provided".to_string()));
        }

        let params = UrlParams { query: Some(query), ..Default::default() };
        self.bounded(self.first_served(self.registry.search_sources(), params, "Search page not found"))
            .await
    }

    /// The latest-releases feed.
    pub async fn latest_releases(&self) -> Result<Vec<FeedEntry>> {
        self.bounded(self.first_served(self.registry.feed_sources(), UrlParams::default(), "Feed not found"))
            .await
    }

    async fn bounded<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.deadline, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline = ?self.config.deadline, "operation deadline elapsed");
                Err(NovelryError::Timeout { timeout: self.config.deadline.as_secs() })
            }
        }
    }

    async fn fetch<T>(&self, descriptor: &SourceDescriptor<T>, url: &str) -> Page {
        debug!(source = %descriptor.source, url, transport = ?descriptor.transport, "fetching");
        let attempt = self.transports.get(descriptor.transport).fetch(url).await;

        match attempt.outcome {
            FetchOutcome::Success(body) if descriptor.is_not_found_page(&body) => {
                debug!(source = %descriptor.source, url, "not-found page served");
                Page::Missing
            }
            FetchOutcome::Success(body) => Page::Body(body),
            FetchOutcome::NotFound => Page::Missing,
            FetchOutcome::Blocked => Page::Failed("blocked".to_string()),
            FetchOutcome::TransportError(detail) => Page::Failed(detail),
        }
    }

    async fn series_info(&self, id: &SeriesId) -> Result<MetadataRecord> {
        let params = UrlParams { id: Some(id.as_str()), ..Default::default() };

        let reference = self.registry.series_reference();
        let url = reference.url(params);
        let baseline = match self.fetch(reference, &url).await {
            Page::Body(body) => reference.extract_from(&body)?.baseline(),
            Page::Missing => return Err(NovelryError::NotFound(SERIES_NOT_FOUND.to_string())),
            Page::Failed(detail) => {
                warn!(source = %reference.source, url, detail, "reference source failed");
                return Err(NovelryError::Transport(FETCH_FAILED.to_string()));
            }
        };
        debug!(source = %reference.source, latest = ?baseline.latest_chapter, "reference baseline");

        let mut last_error = None;
        for descriptor in self.registry.series_sources() {
            let url = descriptor.url(params);
            let body = match self.fetch(descriptor, &url).await {
                Page::Body(body) => body,
                Page::Missing => {
                    info!(source = %descriptor.source, url, "series not found");
                    return Err(NovelryError::NotFound(SERIES_NOT_FOUND.to_string()));
                }
                Page::Failed(detail) => {
                    warn!(source = %descriptor.source, url, detail, "source failed, trying next");
                    last_error = Some(NovelryError::Transport(FETCH_FAILED.to_string()));
                    continue;
                }
            };

            match descriptor.extract_from(&body) {
                Ok(partial) => {
                    info!(source = %descriptor.source, url, "series served");
                    return Ok(normalize(merge(baseline, partial)));
                }
                Err(e) => {
                    warn!(source = %descriptor.source, url, error = %e, "extraction failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(normalize(baseline)),
        }
    }

    async fn chapter(&self, id: &SeriesId, chapter_no: &ChapterNo) -> Result<ChapterRecord> {
        let chapter = chapter_no.to_string();
        let params = UrlParams { id: Some(id.as_str()), chapter: Some(&chapter), ..Default::default() };
        let attempts = self.config.chapter_attempts;

        let mut last_error = NovelryError::Retrieval(CHAPTER_RETRIEVAL_FAILED.to_string());
        'sources: for descriptor in self.registry.chapter_sources() {
            let url = descriptor.url(params);

            for attempt in 1..=attempts {
                let body = match self.fetch(descriptor, &url).await {
                    Page::Body(body) => body,
                    Page::Missing => {
                        debug!(source = %descriptor.source, url, "chapter not found");
                        last_error = NovelryError::NotFound(CHAPTER_NOT_FOUND.to_string());
                        continue 'sources;
                    }
                    Page::Failed(detail) => {
                        debug!(source = %descriptor.source, url, attempt, detail, "chapter attempt failed");
                        if attempt < attempts {
                            let backoff = self.config.backoff_for(attempt - 1);
                            if !backoff.is_zero() {
                                tokio::time::sleep(backoff).await;
                            }
                        }
                        continue;
                    }
                };

                match descriptor.extract_from(&body) {
                    Ok(content) if content.is_empty() => {
                        warn!(source = %descriptor.source, url, "empty chapter, trying next source");
                        last_error = NovelryError::EmptyContent(EMPTY_CHAPTER.to_string());
                    }
                    Ok(content) => {
                        info!(source = %descriptor.source, url, attempt, "chapter served");
                        return Ok(ChapterRecord {
                            status: 200,
                            chapter_no: chapter_no.clone(),
                            title: content.title,
                            url,
                            body: content.body,
                        });
                    }
                    Err(e) => {
                        warn!(source = %descriptor.source, url, error = %e, "extraction failed, trying next source");
                        last_error = e;
                    }
                }
                continue 'sources;
            }

            warn!(source = %descriptor.source, url, attempts, "chapter retries exhausted");
            last_error = NovelryError::Retrieval(CHAPTER_RETRIEVAL_FAILED.to_string());
        }

        Err(last_error)
    }

    /// Returns the first source's extraction, falling through on failures.
    async fn first_served<T>(
        &self, descriptors: &[SourceDescriptor<T>], params: UrlParams<'_>, not_found: &str,
    ) -> Result<T> {
        let mut last_error = NovelryError::Transport(FETCH_FAILED.to_string());

        for descriptor in descriptors {
            let url = descriptor.url(params);
            match self.fetch(descriptor, &url).await {
                Page::Body(body) => match descriptor.extract_from(&body) {
                    Ok(value) => {
                        info!(source = %descriptor.source, url, "served");
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!(source = %descriptor.source, url, error = %e, "extraction failed");
                        last_error = e;
                    }
                },
                Page::Missing => return Err(NovelryError::NotFound(not_found.to_string())),
                Page::Failed(detail) => {
                    warn!(source = %descriptor.source, url, detail, "source failed");
                    last_error = NovelryError::Transport(FETCH_FAILED.to_string());
                }
            }
        }

        Err(last_error)
    }
}
