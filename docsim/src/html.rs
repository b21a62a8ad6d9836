//! Paragraph text of HTML pages.

use scraper::{Html, Selector};

use crate::error::{DocSimError, Result};

/// Text of every `<p>` element in `html`, one paragraph per line.
///
/// Headings, navigation, scripts and any other content outside `<p>` are
/// ignored. Whitespace inside a paragraph is collapsed to single spaces.
pub fn paragraph_text(html: &str) -> Result<String> {
    let selector = Selector::parse("p").map_err(|e| DocSimError::Html(e.to_string()))?;
    let document = Html::parse_document(html);

    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(|p| p.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .collect();
    tracing::debug!(paragraphs = paragraphs.len(), "extracted paragraph text");
    Ok(paragraphs.join("\n"))
}
