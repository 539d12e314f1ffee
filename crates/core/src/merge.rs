//! Field reconciliation across sources.
//!
//! [`merge`] folds a secondary partial record into a primary one. The primary
//! record is privileged: it wins every field it populates, except for the two
//! cross-reference rules below.
//!
//! - `latest_chapter` is the maximum of both observations, so it never regresses.
//! - A `description` equal to [`BOILERPLATE_DESCRIPTION`] yields to the
//!   secondary description.
//!
//! [`normalize`] cleans a merged record before it is handed to callers.

use crate::model::{MetadataRecord, Named};

/// Site-wide meta description Novtales serves on pages without a real synopsis.
pub const BOILERPLATE_DESCRIPTION: &str = "Read the best web novels on Novtales, featuring Xianxia, Korean, cultivation, and fantasy novels. Enjoy high-quality translations and explore legendary stories today!";

/// Placeholder values sources print instead of leaving a field out.
const PLACEHOLDERS: &[&str] = &["n/a", "na", "-", "unknown", "none"];

/// Whether a description is a known boilerplate sentinel rather than a synopsis.
pub fn is_boilerplate(description: &str) -> bool {
    description.trim() == BOILERPLATE_DESCRIPTION
}

/// Merges `secondary` into `primary`.
///
/// Deterministic and not commutative. `merge(p, MetadataRecord::default()) == p`
/// holds for every `p`.
pub fn merge(primary: MetadataRecord, secondary: MetadataRecord) -> MetadataRecord {
    let latest_chapter = match (primary.latest_chapter, secondary.latest_chapter) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0).max(b.unwrap_or(0))),
    };

    let description = match primary.description {
        Some(desc) if !is_boilerplate(&desc) => Some(desc),
        boilerplate_or_missing => secondary.description.or(boilerplate_or_missing),
    };

    MetadataRecord {
        title: primary.title.or(secondary.title),
        image: primary.image.or(secondary.image),
        genre: primary.genre.or(secondary.genre),
        tags: primary.tags.or(secondary.tags),
        rating: primary.rating.or(secondary.rating),
        language: primary.language.or(secondary.language),
        authors: primary.authors.or(secondary.authors),
        year: primary.year.or(secondary.year),
        status: primary.status.or(secondary.status),
        release_freq: primary.release_freq.or(secondary.release_freq),
        description,
        latest_chapter,
    }
}

/// Cleans a record for output.
///
/// Trims and collapses whitespace, drops empty and placeholder values,
/// canonicalizes the publication status and de-duplicates named lists.
pub fn normalize(record: MetadataRecord) -> MetadataRecord {
    MetadataRecord {
        title: clean_text(record.title),
        image: clean_text(record.image),
        genre: clean_names(record.genre),
        tags: clean_names(record.tags),
        rating: record.rating,
        language: record.language.and_then(clean_name),
        authors: clean_names(record.authors),
        year: clean_text(record.year),
        status: clean_text(record.status).map(|s| canonical_status(&s)),
        release_freq: clean_text(record.release_freq),
        description: record.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        latest_chapter: record.latest_chapter,
    }
}

/// Maps the spellings sources use onto one status vocabulary.
pub fn canonical_status(status: &str) -> String {
    match status.trim().to_lowercase().as_str() {
        "completed" | "complete" | "finished" => "Completed".to_string(),
        "ongoing" | "on-going" | "on going" | "publishing" => "Ongoing".to_string(),
        "hiatus" | "on hiatus" => "Hiatus".to_string(),
        "dropped" | "cancelled" | "canceled" => "Dropped".to_string(),
        _ => status.trim().to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_text(value: Option<String>) -> Option<String> {
    let text = collapse_whitespace(&value?);
    if text.is_empty() || PLACEHOLDERS.contains(&text.to_lowercase().as_str()) { None } else { Some(text) }
}

fn clean_name(named: Named) -> Option<Named> {
    let name = clean_text(Some(named.name))?;
    Some(Named { name, link: clean_text(named.link), description: clean_text(named.description) })
}

fn clean_names(names: Option<Vec<Named>>) -> Option<Vec<Named>> {
    let mut seen = Vec::new();
    let mut cleaned = Vec::new();

    for named in names?.into_iter().filter_map(clean_name) {
        let key = named.name.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            cleaned.push(named);
        }
    }

    if cleaned.is_empty() { None } else { Some(cleaned) }
}
