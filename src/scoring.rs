use crate::models::Job;
use crate::rules::{contains_any, ScoringRules, WeightedTerms};

/// Weighted heuristic score for a job.
///
/// A blacklisted employer short-circuits to `rules.blacklist_score` before any
/// additive rule is considered. Otherwise every matching rule contributes; the
/// total is not clamped.
pub fn score(rules: &ScoringRules, job: &Job) -> i64 {
    let title = job.title.to_lowercase();
    let snippet = job.snippet.as_deref().unwrap_or("").to_lowercase();
    let company = job.company.to_lowercase();
    let location = job.location.to_lowercase();

    if contains_any(&company, &rules.blacklist) {
        return rules.blacklist_score;
    }

    let mut total = 0;

    // Keyword tables: title or snippet
    for table in [&rules.capability, &rules.robotics] {
        total += sum_matching(table, |kw| title.contains(kw) || snippet.contains(kw));
    }

    // Role titles
    total += sum_matching(&rules.title_bonuses, |phrase| title.contains(phrase));
    let (generic, bonus) = &rules.generic_title;
    if title.contains(generic.as_str()) {
        total += bonus;
    }

    // Location
    let (remote, bonus) = &rules.remote_location;
    if location.contains(remote.as_str()) {
        total += bonus;
    }
    if contains_any(&location, &rules.preferred_countries) {
        total += rules.preferred_country_bonus;
    }
    let (region, bonus) = &rules.preferred_region;
    if location.contains(region.as_str()) {
        total += bonus;
    }
    let (penalized, penalty) = &rules.penalized_location;
    if location.contains(penalized.as_str()) {
        total += penalty;
    }

    // Employer preferences
    total += sum_matching(&rules.employers, |name| company.contains(name));

    total
}

fn sum_matching(table: &WeightedTerms, matches: impl Fn(&str) -> bool) -> i64 {
    table
        .iter()
        .filter(|(term, _)| matches(term))
        .map(|(_, weight)| weight)
        .sum()
}

/// Assign each job its score. Scores are set once; already scored jobs are left alone.
pub fn score_all(rules: &ScoringRules, jobs: &mut [Job]) {
    for job in jobs.iter_mut().filter(|j| j.score.is_none()) {
        job.score = Some(score(rules, job));
    }
}

/// Stable sort by score, highest first. Equal scores keep their input order.
pub fn rank(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by(|a, b| b.score_or_zero().cmp(&a.score_or_zero()));
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, company: &str, location: &str) -> Job {
        Job {
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            link: format!("https://example.com/{}", title.replace(' ', "-")),
            source: "test".to_string(),
            ..Default::default()
        }
    }

    fn rules() -> ScoringRules {
        ScoringRules::default()
    }

    #[test]
    fn test_blacklist_dominates() {
        let j = job("Research Engineer, Multimodal LLM", "ByteDance", "Remote, Singapore");
        assert_eq!(score(&rules(), &j), -100);

        let mut j = job("Research Scientist", "Huawei Technologies", "Germany");
        j.snippet = Some("multimodal foundation agent robot".to_string());
        assert_eq!(score(&rules(), &j), -100);
    }

    #[test]
    fn test_additive_scoring() {
        let r = rules();
        // Neutral company and location isolate the title terms.
        let only_multimodal = score(&r, &job("Multimodal", "Acme", ""));
        let only_role = score(&r, &job("Research Engineer", "Acme", ""));
        let both = score(&r, &job("Multimodal Research Engineer", "Acme", ""));

        assert_eq!(only_multimodal, 10);
        // "research engineer" (10) plus the generic "engineer" bonus (3)
        assert_eq!(only_role, 13);
        assert_eq!(both, only_multimodal + only_role);
        assert_eq!(both - 3, 20);
    }

    #[test]
    fn test_title_bonuses_accumulate() {
        let r = rules();
        let j = job("Research Engineer / Research Scientist", "Acme", "");
        // 10 + 8 + generic 3
        assert_eq!(score(&r, &j), 21);
    }

    #[test]
    fn test_snippet_contributes_and_absent_snippet_is_empty() {
        let r = rules();
        let mut j = job("Scientist", "Acme", "");
        assert_eq!(score(&r, &j), 0);
        j.snippet = Some("Embodied agents in simulation".to_string());
        // embodied 6 + agent 8 + simulation 5
        assert_eq!(score(&r, &j), 19);
    }

    #[test]
    fn test_location_bonuses_and_penalty() {
        let r = rules();
        assert_eq!(score(&r, &job("Scientist", "Acme", "Remote")), 10);
        assert_eq!(score(&r, &job("Scientist", "Acme", "Remote, Netherlands")), 17);
        assert_eq!(score(&r, &job("Scientist", "Acme", "Singapore")), 5);
        assert_eq!(score(&r, &job("Scientist", "Acme", "Austin, US")), -1);
    }

    #[test]
    fn test_employer_preferences_all_apply() {
        let r = rules();
        // "tno" and "eth" both match inside this made-up name
        assert_eq!(score(&r, &job("Scientist", "TNO Ethics Lab", "")), 15);
        assert_eq!(score(&r, &job("Scientist", "Mistral AI", "")), 9);
    }

    #[test]
    fn test_score_is_deterministic() {
        let r = rules();
        let j = job("Research Engineer, Robot Learning", "Fraunhofer", "Germany");
        let first = score(&r, &j);
        assert!((0..10).all(|_| score(&r, &j) == first));
    }

    #[test]
    fn test_score_all_assigns_once() {
        let r = rules();
        let mut jobs = vec![job("Research Engineer", "Acme", ""), job("Scientist", "Acme", "")];
        jobs[1].score = Some(42);
        score_all(&r, &mut jobs);
        assert_eq!(jobs[0].score, Some(13));
        assert_eq!(jobs[1].score, Some(42));
    }

    #[test]
    fn test_rank_is_stable() {
        let mut a = job("A", "Acme", "");
        let mut b = job("B", "Acme", "");
        let mut c = job("C", "Acme", "");
        let mut d = job("D", "Acme", "");
        a.score = Some(5);
        b.score = Some(9);
        c.score = Some(5);
        d.score = Some(-100);

        let ranked = rank(vec![d, a, b, c]);
        let titles: Vec<_> = ranked.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C", "D"]);
    }
}
