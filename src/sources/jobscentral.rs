use scraper::Html;
use std::collections::HashSet;

use super::{element_text, resolve_link, selector, FetchContext, JobSource, SourceError};
use crate::models::RawPosting;

const LIST_URL: &str = "https://jobscentral.com.sg/jobs";

/// JobsCentral Singapore. Each query's result list is scanned for job links,
/// then every new link's detail page supplies the title and the snippet.
#[derive(Debug, Clone)]
pub struct JobsCentralSource {
    list_url: String,
    queries: Vec<String>,
}

impl Default for JobsCentralSource {
    fn default() -> Self {
        let queries = [
            "research engineer",
            "research scientist",
            "machine learning",
            "deep learning",
            "ai engineer",
            "ml engineer",
            "data scientist",
            "computer vision",
            "nlp",
            "generative",
        ];
        Self {
            list_url: LIST_URL.to_string(),
            queries: queries.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl JobsCentralSource {
    fn search_url(&self, query: &str) -> String {
        format!("{}?title={}&location=Singapore", self.list_url, query.replace(' ', "+"))
    }

    /// Detail links on a result page as `(link, anchor text)`, skipping
    /// navigation links such as `/jobs` and links already in `seen`.
    pub fn parse_listing(
        &self,
        html: &str,
        page_url: &str,
        seen: &mut HashSet<String>,
    ) -> Result<Vec<(String, String)>, SourceError> {
        let document = Html::parse_document(html);
        let job_sel = selector("a[href*='/jobs/']")?;

        let mut found = Vec::new();
        for a in document.select(&job_sel) {
            let Some(href) = a.value().attr("href") else { continue };
            if href.matches('/').count() <= 2 {
                continue;
            }
            let Ok(link) = resolve_link(page_url, href) else {
                tracing::debug!(source = self.name(), href, "Skipping unresolvable link");
                continue;
            };
            if seen.insert(link.clone()) {
                found.push((link, element_text(a)));
            }
        }

        Ok(found)
    }

    /// Title from the first `h1`, then `h2`, then `<title>`, then the list anchor.
    pub fn parse_detail(&self, html: &str, link: &str, anchor_text: &str) -> Result<RawPosting, SourceError> {
        let document = Html::parse_document(html);

        let mut title = None;
        for css in ["h1", "h2", "title"] {
            let sel = selector(css)?;
            if let Some(text) = document
                .select(&sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
            {
                title = Some(text);
                break;
            }
        }
        let title = title.unwrap_or_else(|| anchor_text.to_string());

        Ok(RawPosting::new(title, self.name())
            .company("JobsCentral listing")
            .location("Singapore")
            .link(link)
            .snippet(element_text(document.root_element())))
    }
}

impl JobSource for JobsCentralSource {
    fn name(&self) -> &str {
        "JobsCentral"
    }

    /// A failed query or detail page is skipped; the source fails only when every query does.
    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
        let mut seen = HashSet::new();
        let mut postings = Vec::new();
        let mut failures = 0;
        let mut last_error = None;

        for query in &self.queries {
            let url = self.search_url(query);
            let links = match ctx.get_html(&url).and_then(|html| self.parse_listing(&html, &url, &mut seen)) {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(source = self.name(), query = %query, error = %e, "Query failed");
                    failures += 1;
                    last_error = Some(e);
                    continue;
                }
            };

            for (link, anchor_text) in links {
                match ctx.get_html(&link).and_then(|html| self.parse_detail(&html, &link, &anchor_text)) {
                    Ok(posting) => postings.push(posting),
                    Err(e) => tracing::debug!(source = self.name(), link = %link, error = %e, "Detail page failed"),
                }
            }
        }

        match last_error {
            Some(last) if failures == self.queries.len() => Err(SourceError::AllQueriesFailed {
                count: failures,
                last: Box::new(last),
            }),
            _ => Ok(postings),
        }
    }
}
