//! Email and contact extraction
//!
//! Best-effort pattern extraction over fetched HTML. Emails come from both
//! visible text and `mailto:` links; contacts come from a proximity
//! heuristic pairing capitalized name candidates with nearby job-title
//! keywords. Precision over recall throughout: a missed contact costs a
//! manual lookup, a fabricated one pollutes the report.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::entity::{ExtractedContact, ExtractedEmail};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
});

/// Two or three capitalized words, the shape of a person's name
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,2})\b").expect("valid regex"));

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("valid regex")
});

static MAILTO_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href^="mailto:"]"#).expect("valid selector"));

/// Characters scanned on each side of a title keyword when looking for
/// the associated person name
const PROXIMITY_WINDOW: usize = 80;

/// Capitalized words that look like name parts but never are on these pages
const NAME_STOPWORDS: &[&str] = &[
    "About", "Aging", "Agency", "Board", "Center", "Chamber", "City", "Commerce", "Community",
    "Contact", "County", "Department", "Development", "Directory", "Division", "Health", "Home",
    "Hospital", "Human", "Office", "Our", "Public", "Resources", "Senior", "Services", "Staff",
    "The", "Welcome", "Workforce",
];

/// Extract the visible text of a page: script and style bodies removed,
/// then the document's text nodes joined with spaces.
pub fn visible_text(html: &str) -> String {
    let cleaned = SCRIPT_RE.replace_all(html, " ");
    let document = Html::parse_document(&cleaned);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract emails from a page, tagged with the page URL they came from.
///
/// Pulls from visible text and `mailto:` hrefs (query parts dropped),
/// lowercases, and filters blacklisted substrings and addresses that are
/// really image filenames matched by the pattern.
pub fn extract_emails(html: &str, source_url: &str, blacklist: &[String]) -> BTreeSet<ExtractedEmail> {
    let mut raw: Vec<String> = Vec::new();

    let text = visible_text(html);
    for m in EMAIL_RE.find_iter(&text) {
        raw.push(m.as_str().to_string());
    }

    let document = Html::parse_document(html);
    for anchor in document.select(&MAILTO_SELECTOR) {
        if let Some(href) = anchor.value().attr("href") {
            let address = href.trim_start_matches("mailto:");
            let address = address.split('?').next().unwrap_or("");
            raw.push(address.to_string());
        }
    }

    let blacklist: Vec<String> = blacklist.iter().map(|b| b.to_lowercase()).collect();

    raw.into_iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| is_plausible_email(e, &blacklist))
        .map(|email| ExtractedEmail {
            email,
            source_url: source_url.to_string(),
        })
        .collect()
}

fn is_plausible_email(email: &str, blacklist: &[String]) -> bool {
    if email.len() <= 5 || !email.contains('@') {
        return false;
    }
    // The text regex happily matches "logo@2x.png" style asset names
    const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico"];
    if IMAGE_EXTENSIONS.iter().any(|ext| email.ends_with(ext)) {
        return false;
    }
    !blacklist.iter().any(|b| email.contains(b.as_str()))
}

/// Extract name/title contact pairs from a page.
///
/// For each occurrence of a title keyword in the visible text, capitalized
/// name candidates within [`PROXIMITY_WINDOW`] characters are considered;
/// candidates containing stopwords or title keywords are rejected, and the
/// nearest surviving candidate wins, preferring one before the title on a
/// distance tie ("Jane Smith, Director" over "Director Jane Smith").
pub fn extract_contacts(
    html: &str,
    source_url: &str,
    title_keywords: &[String],
) -> BTreeSet<ExtractedContact> {
    let mut contacts = BTreeSet::new();
    if title_keywords.is_empty() {
        return contacts;
    }

    let text = visible_text(html);

    let alternation = title_keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    let title_re = match Regex::new(&format!(r"(?i)\b({})\b", alternation)) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!(error = %e, "unusable title keyword set");
            return contacts;
        }
    };

    let lowered_keywords: Vec<String> = title_keywords.iter().map(|k| k.to_lowercase()).collect();

    for title_match in title_re.find_iter(&text) {
        let window_start = clamp_to_char_boundary(&text, title_match.start().saturating_sub(PROXIMITY_WINDOW));
        let window_end = clamp_to_char_boundary(
            &text,
            (title_match.end() + PROXIMITY_WINDOW).min(text.len()),
        );
        let window = &text[window_start..window_end];
        let title_offset = title_match.start() - window_start;

        let mut best: Option<(usize, bool, &str)> = None;
        for name_match in NAME_RE.find_iter(window) {
            let candidate = name_match.as_str();
            if !looks_like_name(candidate, &lowered_keywords) {
                continue;
            }
            let precedes = name_match.start() < title_offset;
            let distance = if precedes {
                title_offset - name_match.end().min(title_offset)
            } else {
                name_match.start().saturating_sub(title_offset)
            };
            let better = match best {
                None => true,
                Some((best_distance, best_precedes, _)) => {
                    distance < best_distance || (distance == best_distance && precedes && !best_precedes)
                }
            };
            if better {
                best = Some((distance, precedes, candidate));
            }
        }

        if let Some((_, _, name)) = best {
            contacts.insert(ExtractedContact {
                name: name.to_string(),
                title: capitalize(title_match.as_str()),
                source_url: source_url.to_string(),
            });
        }
    }

    contacts
}

/// Reject name candidates whose words are organizational vocabulary
/// rather than person names
fn looks_like_name(candidate: &str, lowered_title_keywords: &[String]) -> bool {
    candidate.split_whitespace().all(|word| {
        !NAME_STOPWORDS.contains(&word) && !lowered_title_keywords.contains(&word.to_lowercase())
    })
}

fn clamp_to_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
