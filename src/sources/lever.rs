use scraper::Html;

use super::{element_text, resolve_link, selector, FetchContext, JobSource, SourceError};
use crate::models::RawPosting;

/// A company board hosted on Lever (`jobs.lever.co/<company>`).
#[derive(Debug, Clone)]
pub struct LeverSource {
    name: String,
    url: String,
    company: String,
}

impl LeverSource {
    pub fn new(name: &str, url: &str, company: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            company: company.to_string(),
        }
    }

    pub fn parse(&self, html: &str) -> Result<Vec<RawPosting>, SourceError> {
        let document = Html::parse_document(html);
        let posting_sel = selector("div.posting")?;
        let title_sel = selector("h5")?;
        let location_sel = selector("span.sort-by-location")?;
        let link_sel = selector("a.posting-btn-submit")?;

        let mut postings = Vec::new();
        for posting in document.select(&posting_sel) {
            let Some(title) = posting.select(&title_sel).next().map(element_text) else {
                continue;
            };
            let Some(href) = posting
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };
            let Ok(link) = resolve_link(&self.url, href) else {
                tracing::debug!(source = %self.name, href, "Skipping unresolvable link");
                continue;
            };
            let location = posting
                .select(&location_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();

            postings.push(
                RawPosting::new(title, &self.name)
                    .company(&self.company)
                    .location(location)
                    .link(link),
            );
        }

        Ok(postings)
    }
}

impl JobSource for LeverSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
        let html = ctx.get_html(&self.url)?;
        self.parse(&html)
    }
}
