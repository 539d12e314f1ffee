//! NovelBin series pages.
//!
//! The info block is a list of `<li><h3>Label:</h3> ...</li>` rows; rows are
//! matched by label so reordering on the site does not shift fields.

use super::{first_number, mismatch, named_from_anchor};
use crate::Result;
use crate::model::{MetadataRecord, Named, Rating};
use crate::parse::{Document, Element};
use crate::sources::Source;

pub fn extract_series(doc: &Document) -> Result<MetadataRecord> {
    let title = doc
        .first_text("h3.title")?
        .ok_or_else(|| mismatch(Source::NovelBin, "missing h3.title"))?;

    let image = doc
        .select_first("div.book img")?
        .and_then(|img| img.attr("data-src").or(img.attr("src")).map(str::to_string));

    let mut record = MetadataRecord {
        title: Some(title),
        image,
        language: Some(Named::new("English")),
        ..Default::default()
    };

    for row in doc.select("ul.info-meta > li")? {
        let Some(label) = row.first_text("h3")? else { continue };
        match label.trim_end_matches(':').to_lowercase().as_str() {
            "author" | "authors" => record.authors = anchors(&row)?,
            "genre" | "genres" => record.genre = anchors(&row)?,
            "tag" | "tags" => record.tags = anchors(&row)?,
            "status" => record.status = row_value(&row, &label),
            "year of publishing" | "year" => record.year = row_value(&row, &label),
            _ => {}
        }
    }

    record.rating = doc.first_text(r#"[itemprop="ratingValue"]"#)?.map(|r| Rating::parse(&r));
    record.description = doc.first_text("div.desc-text")?;
    record.latest_chapter = doc
        .first_text("div.l-chapter a.chapter-title")?
        .as_deref()
        .and_then(first_number);

    Ok(record)
}

fn anchors(row: &Element<'_>) -> Result<Option<Vec<Named>>> {
    let names: Vec<Named> = row.select("a")?.iter().filter_map(named_from_anchor).collect();
    Ok(if names.is_empty() { None } else { Some(names) })
}

fn row_value(row: &Element<'_>, label: &str) -> Option<String> {
    let text = row.text();
    let value = text.trim().trim_start_matches(label).trim();
    if value.is_empty() { None } else { Some(value.to_string()) }
}
