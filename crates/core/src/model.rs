//! Canonical records produced by the pipeline.
//!
//! [`MetadataRecord`] doubles as the partial metadata a single source yields:
//! every field is optional, and absence means the source did not provide it.
//! Field names follow the JSON schema consumed downstream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named reference such as a genre, tag, author or language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Named {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), link: None, description: None }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A rating as published by a source, either a score or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Score(f64),
    Text(String),
}

impl Rating {
    /// Parses a rating string, keeping it as text when it is not a plain number.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(score) if score.is_finite() => Rating::Score(score),
            _ => Rating::Text(trimmed.to_string()),
        }
    }
}

/// Series metadata, complete or partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<Named>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Named>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Named>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Named>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_freq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_chapter: Option<u32>,
}

impl MetadataRecord {
    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        self == &MetadataRecord::default()
    }

    /// Keeps only the fields a reference source is trusted for.
    pub fn baseline(self) -> Self {
        Self { description: self.description, latest_chapter: self.latest_chapter, ..Default::default() }
    }
}

/// A chapter identifier, echoed back exactly as the caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChapterNo {
    Number(u64),
    Text(String),
}

impl fmt::Display for ChapterNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChapterNo::Number(n) => write!(f, "{}", n),
            ChapterNo::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ChapterNo {
    fn from(value: u64) -> Self {
        ChapterNo::Number(value)
    }
}

/// Title and body as extracted from a chapter page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterContent {
    pub title: String,
    /// Inner HTML of the chapter container.
    pub body: String,
}

impl ChapterContent {
    /// Whether the body is empty after trimming whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// A chapter successfully retrieved from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub status: u16,
    pub chapter_no: ChapterNo,
    pub title: String,
    /// The source URL the chapter was read from.
    pub url: String,
    pub body: String,
}

/// One row of series-finder search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub search_rating: String,
    pub description: String,
    pub releases: String,
    pub update_freq: String,
    pub nu_readers: String,
    pub nu_reviews: String,
    pub last_updated: String,
    pub genres: Vec<Named>,
}

/// A name with an optional link, as used by feed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub name: Option<String>,
    pub link: Option<String>,
}

/// One entry of the latest-releases feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: Option<String>,
    #[serde(rename = "nuLink")]
    pub nu_link: Option<String>,
    pub group: LinkRef,
    pub release: LinkRef,
}
