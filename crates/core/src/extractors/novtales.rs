//! Novtales: series reference pages and chapter pages.
//!
//! Series pages are only trusted for the synopsis and the latest chapter, so
//! that is all [`extract_series`] reads.

use std::sync::LazyLock;

use regex::Regex;

use super::{first_number, mismatch};
use crate::Result;
use crate::model::{ChapterContent, MetadataRecord};
use crate::parse::Document;
use crate::sources::Source;

static CHAPTER_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/chapter/[^/?#]*?-(\d+)/?(?:[?#]|$)").expect("valid chapter href regex"));

/// Reads the synopsis and the highest chapter number linked from a series page.
pub fn extract_series(doc: &Document) -> Result<MetadataRecord> {
    let description = doc
        .first_text(".novel-summary .content")?
        .or_else(|| doc.meta_content("description"));

    let linked = doc
        .select(r#"a[href*="/chapter/"]"#)?
        .iter()
        .filter_map(|a| a.attr("href"))
        .filter_map(|href| CHAPTER_HREF_RE.captures(href))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max();
    let labelled = doc.first_text(".latest-chapter")?.as_deref().and_then(first_number);
    let latest_chapter = linked.max(labelled);

    if description.is_none() && latest_chapter.is_none() {
        return Err(mismatch(Source::Novtales, "no synopsis or chapter links"));
    }

    Ok(MetadataRecord { description, latest_chapter, ..Default::default() })
}

/// Reads the title and body of a chapter page.
pub fn extract_chapter(doc: &Document) -> Result<ChapterContent> {
    let container = doc
        .select_first("div.chapter-content")?
        .ok_or_else(|| mismatch(Source::Novtales, "missing div.chapter-content"))?;

    let title = doc
        .first_text("h1.chapter-title")?
        .or(doc.first_text("h1")?)
        .or_else(|| doc.title())
        .unwrap_or_default();

    Ok(ChapterContent { title, body: container.inner_html().trim().to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NovelryError;
    use crate::merge::BOILERPLATE_DESCRIPTION;

    #[test]
    fn test_series_reads_summary_and_max_chapter() {
        let html = r#"
            <div class="novel-summary"><div class="content"> Sunny was born in the outskirts. </div></div>
            <ul class="chapter-list">
                <li><a href="/chapter/shadow-slave-1">Chapter 1</a></li>
                <li><a href="/chapter/shadow-slave-1802/">Chapter 1802</a></li>
                <li><a href="/chapter/shadow-slave-99">Chapter 99</a></li>
            </ul>"#;

        let record = extract_series(&Document::parse(html)).unwrap();
        assert_eq!(record.description.as_deref(), Some("Sunny was born in the outskirts."));
        assert_eq!(record.latest_chapter, Some(1802));
        assert!(record.title.is_none());
    }

    #[test]
    fn test_series_falls_back_to_meta_description() {
        let html = format!(
            r#"<html><head><meta name="description" content="{}"></head>
               <body><span class="latest-chapter">Chapter 57</span></body></html>"#,
            BOILERPLATE_DESCRIPTION
        );

        let record = extract_series(&Document::parse(&html)).unwrap();
        assert_eq!(record.description.as_deref(), Some(BOILERPLATE_DESCRIPTION));
        assert_eq!(record.latest_chapter, Some(57));
    }

    #[test]
    fn test_series_without_structure_is_mismatch() {
        let result = extract_series(&Document::parse("<html><body><p>maintenance</p></body></html>"));
        assert!(matches!(result, Err(NovelryError::Extraction { site: Source::Novtales, .. })));
    }

    #[test]
    fn test_chapter() {
        let html = r#"
            <h1 class="chapter-title">Chapter 3: Nightmare Begins</h1>
            <div class="chapter-content">
                <p>The trial had begun.</p>
            </div>"#;

        let chapter = extract_chapter(&Document::parse(html)).unwrap();
        assert_eq!(chapter.title, "Chapter 3: Nightmare Begins");
        assert_eq!(chapter.body, "<p>The trial had begun.</p>");
    }

    #[test]
    fn test_chapter_empty_container_is_not_an_error() {
        let html = r#"<h1>Chapter 4</h1><div class="chapter-content">   </div>"#;

        let chapter = extract_chapter(&Document::parse(html)).unwrap();
        assert!(chapter.is_empty());
    }

    #[test]
    fn test_chapter_missing_container() {
        let result = extract_chapter(&Document::parse("<h1>Chapter 4</h1>"));
        assert!(matches!(result, Err(NovelryError::Extraction { .. })));
    }
}
