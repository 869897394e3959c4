//! Department link discovery
//!
//! Scans a resolved site's root page for same-site links whose URL path or
//! anchor text matches the category's department keywords. Order of first
//! appearance in the document is preserved; the caller applies the
//! per-site cap.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::domain_utils::same_registered_domain;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Extract candidate department-page URLs from a page.
///
/// Links are resolved against `page_url`, restricted to http/https on the
/// same registered domain, matched case-insensitively against `keywords`,
/// stripped of fragments, and deduplicated keeping first appearance.
pub fn discover_department_links(html: &str, page_url: &str, keywords: &[String]) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!(page_url, error = %e, "unparseable page URL");
            return Vec::new();
        }
    };
    let base_host = match base.host_str() {
        Some(h) => h.to_string(),
        None => return Vec::new(),
    };

    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    let document = Html::parse_document(html);
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let href = match anchor.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }

        let mut resolved = match base.join(href) {
            Ok(u) => u,
            Err(_) => continue,
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        let host = match resolved.host_str() {
            Some(h) => h,
            None => continue,
        };
        if !same_registered_domain(host, &base_host) {
            continue;
        }

        let path = resolved.path().to_lowercase();
        let text = anchor.text().collect::<String>().to_lowercase();
        if !keywords.iter().any(|k| path.contains(k) || text.contains(k)) {
            continue;
        }

        resolved.set_fragment(None);
        let url = resolved.to_string();
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}
