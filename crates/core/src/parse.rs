//! HTML parsing and DOM querying for extractors.
//!
//! This module provides the [`Document`] and [`Element`] types extractors use
//! to read fetched pages with CSS selectors.
//!
//! A `Document` is not `Send`. Parse, extract and drop it without holding it
//! across an `.await`.
//!
//! # Example
//!
//! ```rust
//! use novelry_core::parse::Document;
//!
//! let html = r#"<div class="novel-info"><h1> Shadow Slave </h1></div>"#;
//! let doc = Document::parse(html);
//! assert_eq!(doc.first_text(".novel-info h1").unwrap(), Some("Shadow Slave".to_string()));
//! ```

use scraper::{Html, Selector};

use crate::{NovelryError, Result};

fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| NovelryError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string. Malformed markup is repaired, never rejected.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`NovelryError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use novelry_core::parse::Document;
    ///
    /// let html = r#"<ul><li>Fantasy</li><li>Action</li></ul>"#;
    /// let doc = Document::parse(html);
    /// assert_eq!(doc.select("li").unwrap().len(), 2);
    /// ```
    pub fn select(&'_ self, selector_str: &str) -> Result<Vec<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector_str: &str) -> Result<Option<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Trimmed text of the first matching element, `None` when absent or blank.
    pub fn first_text(&self, selector_str: &str) -> Result<Option<String>> {
        Ok(self.select_first(selector_str)?.and_then(|el| el.trimmed_text()))
    }

    /// Gets the `content` attribute of `<meta name=...>` or `<meta property=...>`.
    pub fn meta_content(&self, name: &str) -> Option<String> {
        let query = format!(r#"meta[name="{name}"], meta[property="{name}"]"#);
        self.select_first(&query)
            .ok()
            .flatten()
            .and_then(|el| el.attr("content").map(|c| c.trim().to_string()))
            .filter(|c| !c.is_empty())
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        self.first_text("title").ok().flatten()
    }
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Text with surrounding whitespace removed, `None` when blank.
    pub fn trimmed_text(&self) -> Option<String> {
        let text = self.text();
        let trimmed = text.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }

    /// Text of the element's own text nodes, ignoring descendants.
    pub fn own_text(&self) -> String {
        self.element
            .children()
            .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
            .collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`NovelryError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector_str: &str) -> Result<Vec<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first descendant matching a CSS selector.
    pub fn select_first(&'_ self, selector_str: &str) -> Result<Option<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.element.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Trimmed text of the first matching descendant.
    pub fn first_text(&self, selector_str: &str) -> Result<Option<String>> {
        Ok(self.select_first(selector_str)?.and_then(|el| el.trimmed_text()))
    }
}
