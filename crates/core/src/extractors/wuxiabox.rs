//! WuxiaBox chapter pages.

use super::mismatch;
use crate::Result;
use crate::model::ChapterContent;
use crate::parse::Document;
use crate::sources::Source;

pub fn extract_chapter(doc: &Document) -> Result<ChapterContent> {
    let section = doc
        .select_first("article#chapter-article section.page-in.content-wrap")?
        .ok_or_else(|| mismatch(Source::WuxiaBox, "missing chapter article"))?;

    let title = section.first_text("h1 span.chapter-title")?.unwrap_or_default();
    let body = section
        .select_first("div#chapter-container")?
        .ok_or_else(|| mismatch(Source::WuxiaBox, "missing div#chapter-container"))?;

    Ok(ChapterContent { title, body: body.inner_html().trim().to_string() })
}
