mod fraunhofer;
mod jobscentral;
mod lever;
mod listing;
mod mycareersfuture;
mod remoterocketship;

pub use fraunhofer::FraunhoferSource;
pub use jobscentral::JobsCentralSource;
pub use lever::LeverSource;
pub use mycareersfuture::MyCareersFutureSource;
pub use remoterocketship::RemoteRocketshipSource;

use scraper::{ElementRef, Selector};
use std::sync::Arc;
use std::time::Duration;

use crate::models::RawPosting;
use crate::normalize::clean_text;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("All {count} queries failed, last error: {last}")]
    AllQueriesFailed { count: usize, last: Box<SourceError> },

    #[error("Fetch task failed: {0}")]
    Task(String),
}

/// A site-specific fetcher of raw postings.
///
/// Implementations extract postings only; classification, normalization and
/// scoring happen in the pipeline.
pub trait JobSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout: Duration::from_secs(15),
            max_redirects: 5,
        }
    }
}

/// Per-run HTTP context handed to every source. Each run builds its own.
pub struct FetchContext {
    client: reqwest::blocking::Client,
}

impl FetchContext {
    pub fn new(config: &FetchConfig) -> Result<Self, SourceError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&config.accept_language) {
            headers.insert(reqwest::header::ACCEPT_LANGUAGE, value);
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }

    pub fn get_html(&self, url: &str) -> Result<String, SourceError> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}

/// Every shipped source, in the fixed order the pipeline runs them.
pub fn registry() -> Vec<Arc<dyn JobSource>> {
    let mut sources: Vec<Arc<dyn JobSource>> = Vec::new();

    sources.push(Arc::new(listing::TNO.clone()));
    sources.push(Arc::new(FraunhoferSource::default()));
    for listing in listing::EUROPE {
        sources.push(Arc::new(listing.clone()));
    }
    sources.push(Arc::new(LeverSource::new("Mistral", "https://jobs.lever.co/mistral", "Mistral AI")));
    for listing in listing::GENERATIVE {
        sources.push(Arc::new(listing.clone()));
    }
    for listing in listing::SINGAPORE {
        sources.push(Arc::new(listing.clone()));
    }
    sources.push(Arc::new(MyCareersFutureSource::default()));
    sources.push(Arc::new(JobsCentralSource::default()));
    sources.push(Arc::new(RemoteRocketshipSource::default()));
    sources.push(Arc::new(listing::MBZUAI.clone()));

    sources
}

/// Keep sources whose name matches one of `names` (case-insensitive), in registry order.
pub fn select_sources(sources: Vec<Arc<dyn JobSource>>, names: &[String]) -> Vec<Arc<dyn JobSource>> {
    if names.is_empty() {
        return sources;
    }
    sources
        .into_iter()
        .filter(|s| names.iter().any(|n| n.eq_ignore_ascii_case(s.name())))
        .collect()
}

pub(crate) fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Selector(format!("{css}: {e}")))
}

/// Resolve a possibly relative href against the page it was found on.
pub(crate) fn resolve_link(base: &str, href: &str) -> Result<String, SourceError> {
    Ok(url::Url::parse(base)?.join(href.trim())?.to_string())
}

pub(crate) fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the nearest enclosing element, used as a snippet.
pub(crate) fn parent_text(element: ElementRef) -> Option<String> {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Nearest ancestor `div`, the usual card container on job boards.
pub(crate) fn enclosing_div(element: ElementRef) -> Option<ElementRef> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "div")
}
