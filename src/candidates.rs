//! Candidate URL generation
//!
//! Produces an ordered, finite sequence of plausible site URLs for an entity
//! by substituting its normalized name and state into per-category pattern
//! templates from configuration. Pure string transformation, no network
//! access, deterministic for a given input.

use crate::entity::Entity;

/// A generated site guess, ephemeral to the probe phase of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateUrl {
    /// Absolute URL to probe
    pub url: String,
    /// The pattern template that produced this candidate
    pub pattern: String,
    /// Priority rank, 0 = highest
    pub rank: usize,
}

/// Normalize an entity name into a single host-safe token: lowercase,
/// trailing "county"/"city" words dropped, everything except letters,
/// digits, and hyphens removed.
///
/// Multi-word names collapse to one token ("Prince George's County" ->
/// "princegeorges"); no word-separator variant is generated. Known
/// coverage gap carried over from the original pattern list.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = lowered
        .strip_suffix(" county")
        .or_else(|| lowered.strip_suffix(" city"))
        .unwrap_or(&lowered);

    stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Generate the ordered candidate sequence for an entity.
///
/// `patterns` is the category's template list, highest priority first, with
/// `{name}` and `{state}` placeholders. Duplicate URLs (templates that
/// collapse to the same string) keep their first, highest-priority slot.
pub fn generate(entity: &Entity, patterns: &[String]) -> Vec<CandidateUrl> {
    let name = normalize_name(&entity.name);
    let state = entity.state.to_lowercase();

    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();

    for pattern in patterns {
        let url = pattern.replace("{name}", &name).replace("{state}", &state);
        if seen.insert(url.clone()) {
            candidates.push(CandidateUrl {
                url,
                pattern: pattern.clone(),
                rank: candidates.len(),
            });
        }
    }

    candidates
}
