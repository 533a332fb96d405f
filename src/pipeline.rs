use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classify::is_relevant;
use crate::models::{Job, RawPosting};
use crate::normalize::normalize;
use crate::rules::Rules;
use crate::scoring::{rank, score_all};
use crate::sources::{FetchContext, JobSource, SourceError};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Ok { raw: usize, relevant: usize },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub name: String,
    pub status: SourceStatus,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Ranked, scored, unique by link.
    pub jobs: Vec<Job>,
    pub sources: Vec<SourceOutcome>,
    pub duplicates: usize,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Ok { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.sources.len() - self.succeeded()
    }

    pub fn total_raw(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s.status {
                SourceStatus::Ok { raw, .. } => raw,
                SourceStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn total_relevant(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s.status {
                SourceStatus::Ok { relevant, .. } => relevant,
                SourceStatus::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Keep the first job seen for each link, in encounter order. Later
/// duplicates are dropped outright; no fields are merged.
pub fn dedupe(jobs: Vec<Job>) -> Vec<Job> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(job.link.clone()))
        .collect()
}

type Fetched = (Result<Vec<RawPosting>, SourceError>, Duration);

pub struct Pipeline<'a> {
    rules: &'a Rules,
    parallel: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self { rules, parallel: false }
    }

    /// Fetch every source on its own blocking task. Results are still
    /// consumed in source order, so dedup and tie order match a sequential run.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fetch, normalize and classify every source, then dedupe, score and rank.
    ///
    /// A failing source contributes nothing and is recorded in the report; the
    /// run itself fails only when there is no source to run.
    pub fn run(&self, ctx: Arc<FetchContext>, sources: &[Arc<dyn JobSource>]) -> Result<RunReport> {
        if sources.is_empty() {
            bail!("No sources selected. Run 'jobscout sources' to list them.");
        }

        let fetched = if self.parallel {
            fetch_parallel(ctx, sources)?
        } else {
            sources.iter().map(|s| fetch_one(s.as_ref(), &ctx)).collect()
        };

        let mut report = RunReport::default();
        let mut candidates = Vec::new();

        for (source, (result, elapsed)) in sources.iter().zip(fetched) {
            let name = source.name().to_string();
            let status = match result {
                Ok(raw) => {
                    let raw_count = raw.len();
                    let relevant = self.relevant_jobs(raw);
                    tracing::info!(source = %name, raw = raw_count, relevant = relevant.len(), "Fetched");
                    let status = SourceStatus::Ok {
                        raw: raw_count,
                        relevant: relevant.len(),
                    };
                    candidates.extend(relevant);
                    status
                }
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "Source unavailable, skipping");
                    SourceStatus::Failed { error: e.to_string() }
                }
            };
            report.sources.push(SourceOutcome { name, status, elapsed });
        }

        let total = candidates.len();
        let mut unique = dedupe(candidates);
        report.duplicates = total - unique.len();

        score_all(&self.rules.scoring, &mut unique);
        report.jobs = rank(unique);

        tracing::info!(
            jobs = report.jobs.len(),
            duplicates = report.duplicates,
            sources_ok = report.succeeded(),
            sources_failed = report.failed(),
            "Run complete"
        );
        Ok(report)
    }

    fn relevant_jobs(&self, raw: Vec<RawPosting>) -> Vec<Job> {
        let filter = &self.rules.filter;
        raw.into_iter()
            .filter_map(|posting| normalize(filter, posting))
            .filter(|job| {
                is_relevant(
                    filter,
                    &job.title,
                    &job.company,
                    &job.location,
                    job.snippet.as_deref(),
                )
            })
            .collect()
    }
}

fn fetch_one(source: &dyn JobSource, ctx: &FetchContext) -> Fetched {
    tracing::info!(source = source.name(), "Fetching");
    let started = Instant::now();
    let result = source.fetch(ctx);
    (result, started.elapsed())
}

fn fetch_parallel(ctx: Arc<FetchContext>, sources: &[Arc<dyn JobSource>]) -> Result<Vec<Fetched>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start fetch runtime")?;

    let fetched = runtime.block_on(async {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let ctx = Arc::clone(&ctx);
                tokio::task::spawn_blocking(move || fetch_one(source.as_ref(), &ctx))
            })
            .collect();

        // Await in source order, not completion order.
        let mut fetched = Vec::with_capacity(handles.len());
        for handle in handles {
            fetched.push(handle.await.unwrap_or_else(|e| {
                (Err(SourceError::Task(e.to_string())), Duration::ZERO)
            }));
        }
        fetched
    });

    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FetchConfig;
    use std::thread;

    struct StubSource {
        name: &'static str,
        postings: Vec<RawPosting>,
        delay: Duration,
    }

    impl StubSource {
        fn new(name: &'static str, postings: Vec<RawPosting>) -> Arc<dyn JobSource> {
            Arc::new(Self { name, postings, delay: Duration::ZERO })
        }

        fn slow(name: &'static str, postings: Vec<RawPosting>, millis: u64) -> Arc<dyn JobSource> {
            Arc::new(Self { name, postings, delay: Duration::from_millis(millis) })
        }
    }

    impl JobSource for StubSource {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
            thread::sleep(self.delay);
            Ok(self.postings.clone())
        }
    }

    struct DownSource;

    impl JobSource for DownSource {
        fn name(&self) -> &str {
            "Down"
        }

        fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
            Err(SourceError::Status {
                url: "https://down.example.com".to_string(),
                status: 503,
            })
        }
    }

    struct PanickingSource;

    impl JobSource for PanickingSource {
        fn name(&self) -> &str {
            "Panics"
        }

        fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
            panic!("adapter bug");
        }
    }

    fn ctx() -> Arc<FetchContext> {
        Arc::new(FetchContext::new(&FetchConfig::default()).unwrap())
    }

    fn posting(title: &str, company: &str, location: &str, link: &str) -> RawPosting {
        RawPosting::new(title, "stub").company(company).location(location).link(link)
    }

    fn scenario() -> Vec<Arc<dyn JobSource>> {
        let first = StubSource::new(
            "One",
            vec![
                posting("Research Engineer, Multimodal", "A*STAR", "Singapore", "https://l1"),
                posting("Postdoc Research Fellow - Machine Learning", "NUS", "Singapore", "https://l3"),
            ],
        );
        let second = StubSource::new(
            "Two",
            vec![
                posting("Research Engineer, Multimodal", "A*STAR", "Singapore", "https://l1"),
                posting(
                    "Research Scientist, Multimodal Foundation Models",
                    "TNO",
                    "Remote, Netherlands",
                    "https://l2",
                ),
            ],
        );
        vec![first, second]
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let job = |title: &str, link: &str, source: &str| Job {
            title: title.to_string(),
            link: link.to_string(),
            source: source.to_string(),
            ..Default::default()
        };
        let jobs = vec![job("A", "l1", "one"), job("B", "l2", "one"), job("A again", "l1", "two")];

        let unique = dedupe(jobs);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title, "A");
        assert_eq!(unique[0].source, "one");
        assert_eq!(unique[1].title, "B");
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let job = |link: &str| Job { title: link.to_string(), link: link.to_string(), ..Default::default() };
        let once = dedupe(vec![job("a"), job("b"), job("a"), job("c"), job("b")]);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let rules = Rules::default();
        let report = Pipeline::new(&rules).run(ctx(), &scenario()).unwrap();

        assert_eq!(report.jobs.len(), 2);
        assert!(report.jobs.iter().all(|j| j.score.is_some()));
        assert_eq!(report.duplicates, 1);

        // L2 outranks L1 on remote, preferred country and preferred employer.
        assert_eq!(report.jobs[0].link, "https://l2");
        assert_eq!(report.jobs[1].link, "https://l1");
        assert!(report.jobs[0].score > report.jobs[1].score);
        assert_eq!(report.jobs[0].score, Some(51));
        assert_eq!(report.jobs[1].score, Some(28));
        assert!(report.jobs[0].remote);
        assert!(!report.jobs[1].remote);

        // The surviving L1 is the one from the first source.
        assert_eq!(report.sources[0].status, SourceStatus::Ok { raw: 2, relevant: 1 });
        assert_eq!(report.sources[1].status, SourceStatus::Ok { raw: 2, relevant: 2 });
        assert_eq!(report.total_raw(), 4);
        assert_eq!(report.total_relevant(), 3);
    }

    #[test]
    fn test_failing_source_does_not_abort_run() {
        let rules = Rules::default();
        let mut sources = scenario();
        sources.insert(1, Arc::new(DownSource));

        let report = Pipeline::new(&rules).run(ctx(), &sources).unwrap();
        assert_eq!(report.jobs.len(), 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.sources[1].status, SourceStatus::Failed { .. }));
    }

    #[test]
    fn test_all_sources_failing_yields_empty_result() {
        let rules = Rules::default();
        let sources: Vec<Arc<dyn JobSource>> = vec![Arc::new(DownSource)];
        let report = Pipeline::new(&rules).run(ctx(), &sources).unwrap();
        assert!(report.jobs.is_empty());
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_no_sources_is_an_error() {
        let rules = Rules::default();
        assert!(Pipeline::new(&rules).run(ctx(), &[]).is_err());
    }

    #[test]
    fn test_malformed_postings_are_dropped() {
        let rules = Rules::default();
        let sources = vec![StubSource::new(
            "One",
            vec![
                RawPosting::new("Research Scientist", "stub").company("Acme"),
                posting("Research Scientist", "Acme", "Oslo", "https://ok"),
            ],
        )];
        let report = Pipeline::new(&rules).run(ctx(), &sources).unwrap();
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn test_ties_keep_source_order() {
        let rules = Rules::default();
        let sources = vec![
            StubSource::new("One", vec![posting("Research Scientist", "Acme", "", "https://a")]),
            StubSource::new("Two", vec![posting("Research Scientist", "Acme", "", "https://b")]),
        ];
        let report = Pipeline::new(&rules).run(ctx(), &sources).unwrap();
        let links: Vec<_> = report.jobs.iter().map(|j| j.link.as_str()).collect();
        assert_eq!(links, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_parallel_run_matches_sequential_order() {
        let rules = Rules::default();
        // The first source finishes last; its copy of the shared link must still win.
        let sources = vec![
            StubSource::slow(
                "Slow",
                vec![
                    posting("Research Scientist", "Acme", "", "https://shared"),
                    posting("Research Scientist", "Acme", "", "https://a"),
                ],
                150,
            ),
            StubSource::new(
                "Fast",
                vec![
                    RawPosting::new("Research Scientist", "fast").company("Acme").link("https://shared"),
                    posting("Research Scientist", "Acme", "", "https://b"),
                ],
            ),
        ];

        let sequential = Pipeline::new(&rules).run(ctx(), &sources).unwrap();
        let parallel = Pipeline::new(&rules).parallel(true).run(ctx(), &sources).unwrap();

        assert_eq!(sequential.jobs, parallel.jobs);
        assert_eq!(parallel.jobs[0].link, "https://shared");
        assert_eq!(parallel.jobs[0].source, "stub");
        let names: Vec<_> = parallel.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Slow", "Fast"]);
    }

    #[test]
    fn test_parallel_run_isolates_failures_and_panics() {
        let rules = Rules::default();
        let mut healthy = scenario();
        healthy.insert(1, Arc::new(DownSource));

        let mut sources = healthy.clone();
        sources.push(Arc::new(PanickingSource));

        let sequential = Pipeline::new(&rules).run(ctx(), &healthy).unwrap();
        let parallel = Pipeline::new(&rules).parallel(true).run(ctx(), &sources).unwrap();

        assert_eq!(parallel.jobs, sequential.jobs);
        assert_eq!(parallel.jobs.len(), 2);
        assert_eq!(parallel.succeeded(), 2);
        assert_eq!(parallel.failed(), 2);

        let names: Vec<_> = parallel.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Down", "Two", "Panics"]);
        assert!(matches!(parallel.sources[1].status, SourceStatus::Failed { .. }));
        match &parallel.sources[3].status {
            SourceStatus::Failed { error } => assert!(error.starts_with("Fetch task failed")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
