//! Validated identifiers accepted from callers.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ChapterNo;
use crate::{NovelryError, Result};

static SERIES_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid series id regex"));

static CHAPTER_NO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").expect("valid chapter number regex"));

const MAX_SERIES_ID_LEN: usize = 255;

/// A series slug shared by every registered source, e.g. `shadow-slave`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId(String);

impl SeriesId {
    /// Normalizes and validates a raw series identifier.
    ///
    /// The input is lowercased and spaces become dashes before validation.
    ///
    /// # Errors
    ///
    /// Returns [`NovelryError::BadInput`] when the identifier is empty, longer
    /// than 255 characters, or not a dash-separated alphanumeric slug.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase().replace(' ', "-");

        if normalized.is_empty() || normalized.len() > MAX_SERIES_ID_LEN {
            return Err(NovelryError::BadInput(format!(
                "series ID must be 1 to {} characters long",
                MAX_SERIES_ID_LEN
            )));
        }
        if !SERIES_ID_RE.is_match(&normalized) {
            return Err(NovelryError::BadInput(format!("Invalid series ID: {}", raw)));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ChapterNo {
    /// Validates a chapter number given on the command line, keeping its text form.
    ///
    /// # Errors
    ///
    /// Returns [`NovelryError::BadInput`] unless the input is an integer or a
    /// decimal such as `12.5`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if CHAPTER_NO_RE.is_match(trimmed) {
            Ok(ChapterNo::Text(trimmed.to_string()))
        } else {
            Err(NovelryError::BadInput(format!("Invalid chapter number: {}", raw)))
        }
    }
}
