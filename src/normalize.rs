use regex::Regex;
use std::sync::LazyLock;

use crate::classify::is_remote;
use crate::models::{Job, RawPosting, UNKNOWN_COMPANY};
use crate::rules::FilterRules;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Trim and collapse runs of whitespace (markup text carries newlines and indentation).
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Build the canonical [`Job`] for a raw posting.
///
/// Returns `None` for malformed postings (blank title or no link). These are
/// dropped without being counted as errors. The score is left unset.
pub fn normalize(rules: &FilterRules, raw: RawPosting) -> Option<Job> {
    let title = clean_text(&raw.title);
    let link = raw.link.as_deref().map(str::trim).unwrap_or_default().to_string();

    if title.is_empty() || link.is_empty() {
        tracing::debug!(source = %raw.source, title = %title, "Dropping malformed posting");
        return None;
    }

    let company = raw
        .company
        .as_deref()
        .map(clean_text)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
    let location = clean_text(&raw.location);
    let snippet = raw.snippet.as_deref().map(clean_text).filter(|s| !s.is_empty());
    let remote = raw.remote_hint || is_remote(rules, &location, snippet.as_deref());

    Some(Job {
        company,
        title,
        location,
        link,
        source: raw.source,
        snippet,
        remote,
        score: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Research\n      Engineer\t(AI) "), "Research Engineer (AI)");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_normalize_fills_unknown_company() {
        let raw = RawPosting::new("Research Engineer", "Test").link("https://example.com/1");
        let job = normalize(&FilterRules::default(), raw).unwrap();
        assert_eq!(job.company, UNKNOWN_COMPANY);
        assert_eq!(job.score, None);

        let raw = RawPosting::new("Research Engineer", "Test")
            .company("  ")
            .link("https://example.com/1");
        let job = normalize(&FilterRules::default(), raw).unwrap();
        assert_eq!(job.company, UNKNOWN_COMPANY);
    }

    #[test]
    fn test_normalize_drops_malformed_postings() {
        let rules = FilterRules::default();
        assert!(normalize(&rules, RawPosting::new("Research Engineer", "Test")).is_none());
        assert!(normalize(&rules, RawPosting::new("Research Engineer", "Test").link("  ")).is_none());
        assert!(normalize(&rules, RawPosting::new(" \n ", "Test").link("https://example.com/1")).is_none());
    }

    #[test]
    fn test_normalize_derives_remote() {
        let rules = FilterRules::default();
        let raw = RawPosting::new("ML Engineer", "Test")
            .location("Remote - EU")
            .link("https://example.com/1");
        assert!(normalize(&rules, raw).unwrap().remote);

        let raw = RawPosting::new("ML Engineer", "Test")
            .location("Zurich")
            .snippet("Flexible working hours")
            .link("https://example.com/2");
        assert!(normalize(&rules, raw).unwrap().remote);

        let raw = RawPosting::new("ML Engineer", "Test")
            .location("Zurich")
            .link("https://example.com/3");
        assert!(!normalize(&rules, raw).unwrap().remote);
    }

    #[test]
    fn test_remote_hint_forces_remote() {
        let raw = RawPosting::new("ML Engineer", "Board")
            .location("Anywhere")
            .link("https://example.com/1")
            .remote_hint(true);
        assert!(normalize(&FilterRules::default(), raw).unwrap().remote);
    }
}
