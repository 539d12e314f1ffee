//! LightNovelWorld series pages.

use super::{first_number, mismatch, named_from_anchor};
use crate::Result;
use crate::model::{MetadataRecord, Named, Rating};
use crate::parse::Document;
use crate::sources::Source;

pub fn extract_series(doc: &Document) -> Result<MetadataRecord> {
    let header = doc
        .select_first("header.novel-header")?
        .ok_or_else(|| mismatch(Source::LightNovelWorld, "missing header.novel-header"))?;
    let info = header
        .select_first("div.novel-info")?
        .ok_or_else(|| mismatch(Source::LightNovelWorld, "missing div.novel-info"))?;

    let title = info
        .first_text("h1")?
        .ok_or_else(|| mismatch(Source::LightNovelWorld, "missing title"))?;

    let image = header
        .select_first("figure.cover img")?
        .and_then(|img| img.attr("data-src").or(img.attr("src")).map(str::to_string));

    let authors: Vec<Named> = info
        .select("div.author a")?
        .iter()
        .filter_map(|a| {
            let name = a.first_text("span").ok().flatten().or_else(|| a.trimmed_text())?;
            let mut named = Named::new(name);
            named.link = a.attr("href").map(str::to_string);
            Some(named)
        })
        .collect();

    let genre: Vec<Named> = info.select("div.categories ul li a")?.iter().filter_map(named_from_anchor).collect();

    // Stat order: chapters, views, bookmarks, status.
    let stats: Vec<Option<String>> = info
        .select("div.header-stats > span")?
        .iter()
        .map(|span| span.first_text("strong").ok().flatten())
        .collect();
    let latest_chapter = stats.first().cloned().flatten().as_deref().and_then(first_number);
    let status = stats.get(3).cloned().flatten();

    let tags: Vec<Named> = doc
        .select("section#info div.tags div.expand-wrapper ul li a")?
        .iter()
        .filter_map(named_from_anchor)
        .collect();

    Ok(MetadataRecord {
        title: Some(title),
        image,
        genre: non_empty(genre),
        tags: non_empty(tags),
        rating: info.first_text("div.rating div.rating-star strong")?.map(|r| Rating::parse(&r)),
        language: Some(Named::new("English")),
        authors: non_empty(authors),
        year: None,
        status,
        release_freq: None,
        description: doc.first_text("section#info div.summary div.content p")?,
        latest_chapter,
    })
}

fn non_empty(names: Vec<Named>) -> Option<Vec<Named>> {
    if names.is_empty() { None } else { Some(names) }
}
