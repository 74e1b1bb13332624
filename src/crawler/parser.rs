//! HTML parser for extracting anchors from listing pages

use crate::url::{is_followable_href, resolve_href};
use scraper::{Html, Selector};
use url::Url;

/// A hyperlink found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// The `href` attribute as written, trimmed
    pub href: String,

    /// URL of the page the anchor was found on
    pub request_url: Url,

    /// The href resolved against the request URL
    pub absolute_url: Url,
}

/// Extracts every followable anchor from a listing page, in document order
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - Empty hrefs, fragments (`#...`) and sort links (`?...`)
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Hrefs that do not resolve to an HTTP(S) URL
///
/// # Example
///
/// ```
/// use url::Url;
/// use wfind::crawler::extract_anchors;
///
/// let html = r#"<html><body><a href="../">Parent</a><a href="repomd.xml">repomd.xml</a></body></html>"#;
/// let page = Url::parse("https://example.com/repodata/").unwrap();
/// let anchors = extract_anchors(html, &page);
/// assert_eq!(anchors.len(), 2);
/// assert_eq!(anchors[1].absolute_url.as_str(), "https://example.com/repodata/repomd.xml");
/// ```
pub fn extract_anchors(html: &str, request_url: &Url) -> Vec<Anchor> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable_href(href))
        .filter_map(|href| {
            let absolute_url = resolve_href(request_url, href)?;
            Some(Anchor {
                href: href.to_string(),
                request_url: request_url.clone(),
                absolute_url,
            })
        })
        .collect()
}
