use crate::rules::{contains_any, FilterRules};

/// Decide whether a posting belongs in the results.
///
/// The checks run in a fixed order and short-circuit:
/// hard exclusions, then the include vocabulary, then role exclusions, then
/// company/location exclusions. A hard exclusion cannot be rescued by an
/// include term.
pub fn is_relevant(
    rules: &FilterRules,
    title: &str,
    company: &str,
    location: &str,
    snippet: Option<&str>,
) -> bool {
    let text = [title, company, location, snippet.unwrap_or("")]
        .join(" ")
        .to_lowercase();

    if contains_any(&text, &rules.hard_exclude) {
        return false;
    }

    if !contains_any(&text, &rules.include) {
        return false;
    }

    if contains_any(&text, &rules.role_exclude) {
        return false;
    }

    if contains_any(&text, &rules.company_exclude) {
        return false;
    }

    true
}

pub fn is_remote(rules: &FilterRules, location: &str, snippet: Option<&str>) -> bool {
    let text = [location, snippet.unwrap_or("")].join(" ").to_lowercase();
    contains_any(&text, &rules.remote)
}
