//! NovelUpdates series-finder results and the latest-releases table.

use super::mismatch;
use crate::Result;
use crate::model::{FeedEntry, LinkRef, Named, SearchResult};
use crate::parse::{Document, Element};
use crate::sources::Source;

const NO_IMAGE_SUFFIX: &str = "noimagemid.jpg";

/// Present on every series-finder page, with or without results.
const FINDER_MARKER: &str = r#"div.search_main_box_nu, form[action*="series-finder"]"#;

/// Reads every result box of a series-finder page.
///
/// A finder page without matches yields an empty list. A page that is not the
/// series finder at all (challenge page, login wall, redesign) is a mismatch.
pub fn extract_search(doc: &Document) -> Result<Vec<SearchResult>> {
    if doc.select_first(FINDER_MARKER)?.is_none() {
        return Err(mismatch(Source::NovelUpdates, "not a series-finder page"));
    }

    let mut results = Vec::new();

    for entry in doc.select("div.search_main_box_nu")? {
        let Some(body) = entry.select_first("div.search_body_nu")? else { continue };
        let Some(anchor) = body.select_first("div.search_title a")? else { continue };

        let image_body = entry.select_first("div.search_img_nu")?;
        let image = match &image_body {
            Some(el) => el
                .select_first("img")?
                .and_then(|img| img.attr("src").map(str::to_string))
                .filter(|src| !src.ends_with(NO_IMAGE_SUFFIX)),
            None => None,
        };
        let search_rating = match &image_body {
            Some(el) => el
                .select_first("div.search_ratings")?
                .map(|r| r.own_text().trim().trim_matches(|c| c == '(' || c == ')').to_string())
                .unwrap_or_default(),
            None => String::new(),
        };

        let stats: Vec<String> = body
            .select("div.search_stats span.ss_desk")?
            .iter()
            .map(|s| s.text().trim().to_string())
            .collect();
        let stat = |i: usize| stats.get(i).cloned().unwrap_or_default();

        let genres = body
            .select("div.search_genre a")?
            .iter()
            .filter_map(|a| {
                let name = a.trimmed_text()?;
                let mut named = Named::new(name);
                named.link = a.attr("href").map(str::to_string);
                Some(named)
            })
            .collect();

        results.push(SearchResult {
            title: anchor.text().trim().to_string(),
            link: anchor.attr("href").unwrap_or_default().to_string(),
            image,
            search_rating,
            description: description(&body)?,
            releases: stat(0),
            update_freq: stat(1),
            nu_readers: stat(2),
            nu_reviews: stat(3),
            last_updated: stat(4),
            genres,
        });
    }

    Ok(results)
}

/// Lead text plus the collapsed "more" section, without the toggle links.
fn description(body: &Element<'_>) -> Result<String> {
    let lead = body.own_text().trim().to_string();
    let Some(more) = body.select_first("span.testhide")? else { return Ok(lead) };

    let mut rest = more.text();
    for noise in more.select("p, span.morelink")? {
        rest = rest.replacen(&noise.text(), "", 1);
    }

    Ok(format!("{}{}", lead, rest).trim().to_string())
}

/// Reads the latest-releases table.
pub fn extract_feed(doc: &Document) -> Result<Vec<FeedEntry>> {
    let tables = doc.select("table#myTable.tablesorter")?;
    if tables.is_empty() {
        return Err(mismatch(Source::NovelUpdates, "missing table#myTable"));
    }

    let mut feed = Vec::new();
    for table in &tables {
        for row in table.select("tbody tr")? {
            let cells = row.select("td")?;
            let anchor_in = |i: usize| -> Result<Option<Element<'_>>> {
                match cells.get(i) {
                    Some(cell) => cell.select_first("a"),
                    None => Ok(None),
                }
            };

            let series = anchor_in(0)?;
            let release = match cells.get(1) {
                Some(cell) => cell.select_first("span")?,
                None => None,
            };
            let group = anchor_in(2)?;

            feed.push(FeedEntry {
                title: series.as_ref().and_then(|a| a.attr("title").map(str::to_string)),
                nu_link: series.as_ref().and_then(|a| a.attr("href").map(str::to_string)),
                group: LinkRef {
                    name: group.as_ref().and_then(|a| a.attr("title").map(str::to_string)),
                    link: group.as_ref().and_then(|a| a.attr("href").map(str::to_string)),
                },
                release: LinkRef { name: release.as_ref().and_then(|s| s.attr("title").map(str::to_string)), link: None },
            });
        }
    }

    Ok(feed)
}
