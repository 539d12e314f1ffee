//! JSON envelopes written to callers.
//!
//! Successful series lookups are the bare [`MetadataRecord`](crate::MetadataRecord); chapters carry
//! their own `status`. Search and feed results are wrapped with a status, and
//! every failure becomes an [`ErrorReport`].

use serde::Serialize;

use crate::model::{ChapterNo, FeedEntry, SearchResult};
use crate::{NovelryError, Result};

/// `{"status": <code>, "error": <message>}`, with the chapter echoed for chapter lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_no: Option<ChapterNo>,
    pub error: String,
}

impl ErrorReport {
    pub fn new(status: u16, error: impl Into<String>) -> Self {
        Self { status, chapter_no: None, error: error.into() }
    }

    pub fn with_chapter(mut self, chapter_no: ChapterNo) -> Self {
        self.chapter_no = Some(chapter_no);
        self
    }
}

impl From<&NovelryError> for ErrorReport {
    fn from(err: &NovelryError) -> Self {
        Self::new(err.status(), err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub status: u16,
    pub results: Vec<SearchResult>,
}

impl From<Vec<SearchResult>> for SearchReport {
    fn from(results: Vec<SearchResult>) -> Self {
        Self { status: 200, results }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
    pub status: u16,
    pub releases: Vec<FeedEntry>,
}

impl From<Vec<FeedEntry>> for FeedReport {
    fn from(releases: Vec<FeedEntry>) -> Self {
        Self { status: 200, releases }
    }
}

/// Serializes any report, compact by default.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}
