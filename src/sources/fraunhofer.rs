use scraper::Html;

use super::{element_text, resolve_link, selector, FetchContext, JobSource, SourceError};
use crate::models::RawPosting;

const SEARCH_URL: &str = "https://jobs.fraunhofer.de/search/";

/// Fraunhofer's job search, crawled page by page through `startrow`.
///
/// A page with fewer than `page_size` job links is the last one.
#[derive(Debug, Clone)]
pub struct FraunhoferSource {
    search_url: String,
    query: String,
    page_size: usize,
    max_pages: usize,
}

impl Default for FraunhoferSource {
    fn default() -> Self {
        Self {
            search_url: SEARCH_URL.to_string(),
            query: "ai".to_string(),
            page_size: 25,
            max_pages: 40,
        }
    }
}

impl FraunhoferSource {
    fn page_url(&self, startrow: usize) -> String {
        format!("{}?q={}&startrow={}", self.search_url, self.query, startrow)
    }

    /// Postings on one result page, plus the number of job links seen there
    /// (which drives pagination, whatever was kept).
    pub fn parse(&self, html: &str, page_url: &str) -> Result<(Vec<RawPosting>, usize), SourceError> {
        let document = Html::parse_document(html);
        let job_sel = selector("a[href*='/job/']")?;

        let mut anchors = 0;
        let mut postings = Vec::new();
        for a in document.select(&job_sel) {
            anchors += 1;
            let Some(href) = a.value().attr("href") else { continue };
            let title = element_text(a);
            if title.is_empty() {
                continue;
            }
            let Ok(link) = resolve_link(page_url, href) else {
                tracing::debug!(source = self.name(), href, "Skipping unresolvable link");
                continue;
            };

            postings.push(
                RawPosting::new(title.clone(), self.name())
                    .company("Fraunhofer")
                    .location("Germany")
                    .link(link)
                    .snippet(title),
            );
        }

        Ok((postings, anchors))
    }
}

impl JobSource for FraunhoferSource {
    fn name(&self) -> &str {
        "Fraunhofer"
    }

    /// The first page failing fails the source; a later page failing ends the crawl early.
    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
        let mut postings = Vec::new();

        for page in 0..self.max_pages {
            let url = self.page_url(page * self.page_size);
            let (found, anchors) = match ctx.get_html(&url).and_then(|html| self.parse(&html, &url)) {
                Ok(parsed) => parsed,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(source = self.name(), url = %url, error = %e, "Page failed, stopping");
                    break;
                }
            };
            tracing::debug!(source = self.name(), page, anchors, kept = found.len(), "Page parsed");

            postings.extend(found);
            if anchors < self.page_size {
                break;
            }
        }

        Ok(postings)
    }
}
