//! Per-site extractors.
//!
//! Each submodule exposes pure functions from a parsed [`Document`](crate::parse::Document)
//! to a record. A page whose expected structure is missing yields
//! [`NovelryError::Extraction`], never a panic. Optional fields a page simply
//! does not carry are left as `None`.

pub mod lightnovelworld;
pub mod novelbin;
pub mod novelupdates;
pub mod novtales;
pub mod wuxiabox;

use std::sync::LazyLock;

use regex::Regex;

use crate::NovelryError;
use crate::model::Named;
use crate::parse::Element;
use crate::sources::Source;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("valid number regex"));

pub(crate) fn mismatch(site: Source, detail: impl Into<String>) -> NovelryError {
    NovelryError::Extraction { site, detail: detail.into() }
}

/// First integer in a text such as `"Chapter 1,234: The End"`.
pub(crate) fn first_number(text: &str) -> Option<u32> {
    NUMBER_RE.find(text).and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Builds a named entry from an anchor, using its text, `href` and `title`.
pub(crate) fn named_from_anchor(anchor: &Element<'_>) -> Option<Named> {
    let name = anchor.trimmed_text()?;
    let mut named = Named::new(name);
    named.link = anchor.attr("href").map(str::to_string);
    named.description = anchor.attr("title").map(str::to_string).filter(|t| !t.trim().is_empty());
    Some(named)
}
