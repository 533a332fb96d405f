use scraper::Html;
use std::collections::HashSet;

use super::{
    element_text, enclosing_div, resolve_link, selector, FetchContext, JobSource, SourceError,
};
use crate::models::{RawPosting, UNKNOWN_COMPANY};

const SEARCH_URL: &str = "https://www.mycareersfuture.gov.sg/search";

/// Singapore's government job portal, searched once per query term.
#[derive(Debug, Clone)]
pub struct MyCareersFutureSource {
    base_url: String,
    queries: Vec<String>,
}

impl Default for MyCareersFutureSource {
    fn default() -> Self {
        let queries = [
            "research engineer",
            "research scientist",
            "machine learning",
            "deep learning",
            "ai engineer",
            "ml engineer",
            "data scientist",
            "nlp",
            "computer vision",
            "generative",
        ];
        Self {
            base_url: SEARCH_URL.to_string(),
            queries: queries.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl MyCareersFutureSource {
    fn search_url(&self, query: &str) -> String {
        format!(
            "{}?search={}&sortBy=new_posting_date",
            self.base_url,
            query.replace(' ', "%20")
        )
    }

    /// Extract job cards, skipping links already in `seen`.
    pub fn parse(
        &self,
        html: &str,
        page_url: &str,
        seen: &mut HashSet<String>,
    ) -> Result<Vec<RawPosting>, SourceError> {
        let document = Html::parse_document(html);
        let card_sel = selector("a[data-testid='job-card-link']")?;
        let company_sel = selector("[data-testid='company-hire-info']")?;
        let location_sel = selector("[data-testid='job-location']")?;

        let mut postings = Vec::new();
        for card in document.select(&card_sel) {
            let Some(href) = card.value().attr("href") else { continue };
            let Ok(link) = resolve_link(page_url, href) else {
                tracing::debug!(source = self.name(), href, "Skipping unresolvable link");
                continue;
            };
            if !seen.insert(link.clone()) {
                continue;
            }

            let container = enclosing_div(card).unwrap_or(card);
            let company = container
                .select(&company_sel)
                .next()
                .map(element_text)
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
            let location = container
                .select(&location_sel)
                .next()
                .map(element_text)
                .unwrap_or_else(|| "Singapore".to_string());

            postings.push(
                RawPosting::new(element_text(card), self.name())
                    .company(company)
                    .location(location)
                    .link(link)
                    .snippet(element_text(container)),
            );
        }

        Ok(postings)
    }
}

impl JobSource for MyCareersFutureSource {
    fn name(&self) -> &str {
        "MyCareersFuture"
    }

    /// A failed query is skipped; the source fails only when every query does.
    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
        let mut seen = HashSet::new();
        let mut postings = Vec::new();
        let mut failures = 0;
        let mut last_error = None;

        for query in &self.queries {
            let url = self.search_url(query);
            match ctx.get_html(&url).and_then(|html| self.parse(&html, &url, &mut seen)) {
                Ok(found) => postings.extend(found),
                Err(e) => {
                    tracing::warn!(source = self.name(), query = %query, error = %e, "Query failed");
                    failures += 1;
                    last_error = Some(e);
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
