//! Source registry: which sites serve which operation, in which order.
//!
//! Every site is a [`Source`] variant. A [`SourceDescriptor`] binds a source to
//! a URL template, the transport it is fetched with and the pure extractor that
//! turns its pages into records. Adding a site means adding one variant, one
//! extractor and one row to the default table; the orchestrator never changes.

use std::fmt;

use url::Url;

use crate::extractors::{lightnovelworld, novelbin, novelupdates, novtales, wuxiabox};
use crate::model::{ChapterContent, FeedEntry, MetadataRecord, SearchResult};
use crate::parse::Document;
use crate::transport::TransportKind;
use crate::{NovelryError, Result};

/// Sites the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Novtales,
    NovelBin,
    LightNovelWorld,
    WuxiaBox,
    NovelUpdates,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Novtales => "Novtales",
            Source::NovelBin => "NovelBin",
            Source::LightNovelWorld => "LightNovelWorld",
            Source::WuxiaBox => "WuxiaBox",
            Source::NovelUpdates => "NovelUpdates",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical operations served by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SeriesInfo,
    Chapter,
    Search,
    Feed,
}

/// Pure extraction function for one source.
pub type Extractor<T> = fn(&Document) -> Result<T>;

/// Values substituted into a URL template.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlParams<'a> {
    pub id: Option<&'a str>,
    pub chapter: Option<&'a str>,
    pub query: Option<&'a str>,
}

/// An immutable description of how one source serves one operation.
#[derive(Debug, Clone)]
pub struct SourceDescriptor<T> {
    pub source: Source,
    /// Template with `{id}`, `{chapter}` and `{query}` placeholders.
    pub url_template: String,
    pub transport: TransportKind,
    /// Text whose presence in a successful body means the page does not exist.
    pub not_found_marker: Option<&'static str>,
    pub extract: Extractor<T>,
}

impl<T> SourceDescriptor<T> {
    pub fn new(source: Source, url_template: &str, transport: TransportKind, extract: Extractor<T>) -> Self {
        Self { source, url_template: url_template.to_string(), transport, not_found_marker: None, extract }
    }

    pub fn with_not_found_marker(mut self, marker: &'static str) -> Self {
        self.not_found_marker = Some(marker);
        self
    }

    /// Renders the URL template. The query is form-encoded, the rest is used verbatim.
    pub fn url(&self, params: UrlParams<'_>) -> String {
        let mut url = self.url_template.clone();
        if let Some(id) = params.id {
            url = url.replace("{id}", id);
        }
        if let Some(chapter) = params.chapter {
            url = url.replace("{chapter}", chapter);
        }
        if let Some(query) = params.query {
            let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
            url = url.replace("{query}", &encoded);
        }
        url
    }

    /// Parses a fetched body and runs this source's extractor.
    pub fn extract_from(&self, body: &str) -> Result<T> {
        let doc = Document::parse(body);
        (self.extract)(&doc)
    }

    /// Whether a successful body is actually the site's not-found page.
    pub fn is_not_found_page(&self, body: &str) -> bool {
        self.not_found_marker.is_some_and(|marker| body.contains(marker))
    }

    /// Replaces scheme, host and port of the template, keeping path and query.
    fn rebase(&mut self, origin: &Url) {
        if let Some(rest) = self.url_template.split_once("://").and_then(|(_, r)| r.find('/').map(|i| &r[i..])) {
            self.url_template = format!("{}{}", origin.as_str().trim_end_matches('/'), rest);
        }
    }
}

const NOT_FOUND_PAGE: &str = "Page not found";

/// Ordered sources per operation.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    series_reference: SourceDescriptor<MetadataRecord>,
    series: Vec<SourceDescriptor<MetadataRecord>>,
    chapters: Vec<SourceDescriptor<ChapterContent>>,
    search: Vec<SourceDescriptor<Vec<SearchResult>>>,
    feed: Vec<SourceDescriptor<Vec<FeedEntry>>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            series_reference: SourceDescriptor::new(
                Source::Novtales,
                "https://novtales.com/novel/{id}",
                TransportKind::Rendered,
                novtales::extract_series,
            )
            .with_not_found_marker(NOT_FOUND_PAGE),
            series: vec![
                SourceDescriptor::new(
                    Source::NovelBin,
                    "https://novelbin.com/b/{id}",
                    TransportKind::Rendered,
                    novelbin::extract_series,
                )
                .with_not_found_marker(NOT_FOUND_PAGE),
                SourceDescriptor::new(
                    Source::LightNovelWorld,
                    "https://www.lightnovelworld.co/novel/{id}",
                    TransportKind::Rendered,
                    lightnovelworld::extract_series,
                )
                .with_not_found_marker(NOT_FOUND_PAGE),
            ],
            chapters: vec![
                SourceDescriptor::new(
                    Source::WuxiaBox,
                    "https://www.wuxiabox.com/novel/{id}_{chapter}.html",
                    TransportKind::Direct,
                    wuxiabox::extract_chapter,
                ),
                SourceDescriptor::new(
                    Source::Novtales,
                    "https://novtales.com/chapter/{id}-{chapter}",
                    TransportKind::Direct,
                    novtales::extract_chapter,
                ),
            ],
            search: vec![SourceDescriptor::new(
                Source::NovelUpdates,
                "https://www.novelupdates.com/series-finder/?sf=1&sh={query}&sort=sdate&order=desc",
                TransportKind::Proxied,
                novelupdates::extract_search,
            )],
            feed: vec![SourceDescriptor::new(
                Source::NovelUpdates,
                "https://www.novelupdates.com/",
                TransportKind::Proxied,
                novelupdates::extract_feed,
            )],
        }
    }
}

impl SourceRegistry {
    /// Builds a registry from explicit descriptor lists.
    pub fn new(
        series_reference: SourceDescriptor<MetadataRecord>,
        series: Vec<SourceDescriptor<MetadataRecord>>,
        chapters: Vec<SourceDescriptor<ChapterContent>>,
        search: Vec<SourceDescriptor<Vec<SearchResult>>>,
        feed: Vec<SourceDescriptor<Vec<FeedEntry>>>,
    ) -> Self {
        Self { series_reference, series, chapters, search, feed }
    }

    /// Sources serving an operation, in priority order.
    ///
    /// For [`Operation::SeriesInfo`] the reference source comes first.
    pub fn sources_for(&self, operation: Operation) -> Vec<Source> {
        match operation {
            Operation::SeriesInfo => std::iter::once(&self.series_reference)
                .chain(&self.series)
                .map(|d| d.source)
                .collect(),
            Operation::Chapter => self.chapters.iter().map(|d| d.source).collect(),
            Operation::Search => self.search.iter().map(|d| d.source).collect(),
            Operation::Feed => self.feed.iter().map(|d| d.source).collect(),
        }
    }

    /// Transport kinds an operation needs, deduplicated.
    pub fn transports_for(&self, operation: Operation) -> Vec<TransportKind> {
        let kinds: Vec<TransportKind> = match operation {
            Operation::SeriesInfo => {
                std::iter::once(&self.series_reference).chain(&self.series).map(|d| d.transport).collect()
            }
            Operation::Chapter => self.chapters.iter().map(|d| d.transport).collect(),
            Operation::Search => self.search.iter().map(|d| d.transport).collect(),
            Operation::Feed => self.feed.iter().map(|d| d.transport).collect(),
        };

        let mut unique = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        unique
    }

    /// The source trusted for latest-chapter and description baselines.
    pub fn series_reference(&self) -> &SourceDescriptor<MetadataRecord> {
        &self.series_reference
    }

    /// Series sources after the reference, in priority order.
    pub fn series_sources(&self) -> &[SourceDescriptor<MetadataRecord>] {
        &self.series
    }

    pub fn chapter_sources(&self) -> &[SourceDescriptor<ChapterContent>] {
        &self.chapters
    }

    pub fn search_sources(&self) -> &[SourceDescriptor<Vec<SearchResult>>] {
        &self.search
    }

    pub fn feed_sources(&self) -> &[SourceDescriptor<Vec<FeedEntry>>] {
        &self.feed
    }

    /// Points every descriptor of `source` at another origin, e.g. a mirror.
    ///
    /// # Errors
    ///
    /// Returns [`NovelryError::InvalidUrl`] if `origin` is not an absolute URL.
    pub fn with_origin(mut self, source: Source, origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).map_err(|e| NovelryError::InvalidUrl(e.to_string()))?;

        if self.series_reference.source == source {
            self.series_reference.rebase(&origin);
        }
        self.series.iter_mut().filter(|d| d.source == source).for_each(|d| d.rebase(&origin));
        self.chapters.iter_mut().filter(|d| d.source == source).for_each(|d| d.rebase(&origin));
        self.search.iter_mut().filter(|d| d.source == source).for_each(|d| d.rebase(&origin));
        self.feed.iter_mut().filter(|d| d.source == source).for_each(|d| d.rebase(&origin));

        Ok(self)
    }

    /// Fetches every source of the registry with the given transport kind.
    pub fn with_transport(mut self, kind: TransportKind) -> Self {
        self.series_reference.transport = kind;
        self.series.iter_mut().for_each(|d| d.transport = kind);
        self.chapters.iter_mut().for_each(|d| d.transport = kind);
        self.search.iter_mut().for_each(|d| d.transport = kind);
        self.feed.iter_mut().for_each(|d| d.transport = kind);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_priority_order() {
        let registry = SourceRegistry::default();
        assert_eq!(
            registry.sources_for(Operation::SeriesInfo),
            vec![Source::Novtales, Source::NovelBin, Source::LightNovelWorld]
        );
        assert_eq!(registry.series_reference().source, Source::Novtales);
    }

    #[test]
    fn test_chapter_priority_order() {
        let registry = SourceRegistry::default();
        assert_eq!(registry.sources_for(Operation::Chapter), vec![Source::WuxiaBox, Source::Novtales]);
        assert_eq!(registry.transports_for(Operation::Chapter), vec![TransportKind::Direct]);
    }

    #[test]
    fn test_url_templates() {
        let registry = SourceRegistry::default();
        let params = UrlParams { id: Some("shadow-slave"), chapter: Some("12"), query: None };

        assert_eq!(registry.chapter_sources()[0].url(params), "https://www.wuxiabox.com/novel/shadow-slave_12.html");
        assert_eq!(registry.chapter_sources()[1].url(params), "https://novtales.com/chapter/shadow-slave-12");
        assert_eq!(registry.series_sources()[0].url(params), "https://novelbin.com/b/shadow-slave");
    }

    #[test]
    fn test_search_query_is_encoded() {
        let registry = SourceRegistry::default();
        let url = registry.search_sources()[0].url(UrlParams { query: Some("lord of mysteries&x"), ..Default::default() });

        assert!(url.contains("sh=lord+of+mysteries%26x"));
    }

    #[test]
    fn test_not_found_marker() {
        let registry = SourceRegistry::default();
        let reference = registry.series_reference();

        assert!(reference.is_not_found_page("<h1>Page not found</h1>"));
        assert!(!reference.is_not_found_page("<h1>Shadow Slave</h1>"));
        assert!(!registry.chapter_sources()[0].is_not_found_page("<h1>Page not found</h1>"));
    }

    #[test]
    fn test_with_origin_rebases_all_descriptors_of_source() {
        let registry = SourceRegistry::default().with_origin(Source::Novtales, "http://127.0.0.1:8080").unwrap();
        let params = UrlParams { id: Some("abc"), chapter: Some("3"), query: None };

        assert_eq!(registry.series_reference().url(params), "http://127.0.0.1:8080/novel/abc");
        assert_eq!(registry.chapter_sources()[1].url(params), "http://127.0.0.1:8080/chapter/abc-3");
        assert_eq!(registry.chapter_sources()[0].url(params), "https://www.wuxiabox.com/novel/abc_3.html");
    }

    #[test]
    fn test_with_origin_rejects_relative() {
        let result = SourceRegistry::default().with_origin(Source::NovelBin, "not a url");
        assert!(matches!(result, Err(NovelryError::InvalidUrl(_))));
    }

    #[test]
    fn test_with_transport_overrides_everything() {
        let registry = SourceRegistry::default().with_transport(TransportKind::Direct);
        assert_eq!(registry.transports_for(Operation::SeriesInfo), vec![TransportKind::Direct]);
        assert_eq!(registry.transports_for(Operation::Search), vec![TransportKind::Direct]);
    }
}
