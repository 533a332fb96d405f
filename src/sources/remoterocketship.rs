use scraper::Html;

use super::{element_text, enclosing_div, resolve_link, selector, FetchContext, JobSource, SourceError};
use crate::models::RawPosting;
use crate::normalize::clean_text;

/// Remote-only job board; every posting it returns is remote.
#[derive(Debug, Clone)]
pub struct RemoteRocketshipSource {
    pages: Vec<String>,
}

impl Default for RemoteRocketshipSource {
    fn default() -> Self {
        Self {
            pages: vec![
                "https://www.remoterocketship.com/jobs/ai-researcher/".to_string(),
                "https://www.remoterocketship.com/jobs/ai-research-scientist/".to_string(),
            ],
        }
    }
}

impl RemoteRocketshipSource {
    pub fn parse(&self, html: &str, page_url: &str) -> Result<Vec<RawPosting>, SourceError> {
        let document = Html::parse_document(html);
        let anchor_sel = selector("a")?;
        let title_sel = selector("h3, h2, strong")?;
        let company_sel = selector("h4")?;

        let mut postings = Vec::new();
        for apply in document.select(&anchor_sel) {
            if !element_text(apply).contains("Apply") {
                continue;
            }
            let Some(card) = enclosing_div(apply) else { continue };

            let title = card
                .select(&title_sel)
                .next()
                .map(element_text)
                .unwrap_or_else(|| "AI role".to_string());
            let company = card
                .select(&company_sel)
                .next()
                .map(element_text)
                .unwrap_or_else(|| "Remote company".to_string());
            let location = card
                .text()
                .map(clean_text)
                .find(|t| t.contains("Remote"))
                .unwrap_or_else(|| "Remote".to_string());
            let link = match apply.value().attr("href") {
                Some(href) if !href.trim().is_empty() => match resolve_link(page_url, href) {
                    Ok(link) => link,
                    Err(e) => {
                        tracing::debug!(source = self.name(), href, error = %e, "Skipping unresolvable link");
                        continue;
                    }
                },
                _ => page_url.to_string(),
            };

            postings.push(
                RawPosting::new(title, self.name())
                    .company(company)
                    .location(location)
                    .link(link)
                    .snippet(element_text(card))
                    .remote_hint(true),
            );
        }

        Ok(postings)
    }
}

impl JobSource for RemoteRocketshipSource {
    fn name(&self) -> &str {
        "RemoteRocketship"
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
        let mut postings = Vec::new();
        let mut failures = 0;
        let mut last_error = None;

        for page in &self.pages {
            match ctx.get_html(page).and_then(|html| self.parse(&html, page)) {
                Ok(found) => postings.extend(found),
                Err(e) => {
                    tracing::warn!(source = self.name(), page = %page, error = %e, "Page failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) if failures == self.pages.len() => Err(SourceError::AllQueriesFailed {
                count: failures,
                last: Box::new(last),
            }),
            _ => Ok(postings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FetchConfig;

    const PAGE: &str = r#"
        <div class="job">
          <h3>Research Scientist, Generative Models</h3>
          <h4>Hugging Face</h4>
          <span>Remote - Europe</span>
          <a href="/company/hf/jobs/42">Apply</a>
        </div>
        <div class="job">
          <span>Worldwide</span>
          <a href="">Apply now</a>
        </div>
        <div><a href="/about">About us</a></div>
    "#;

    #[test]
    fn test_parse_cards() {
        let source = RemoteRocketshipSource::default();
        let page = "https://www.remoterocketship.com/jobs/ai-researcher/";
        let postings = source.parse(PAGE, page).unwrap();
        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(first.title, "Research Scientist, Generative Models");
        assert_eq!(first.company.as_deref(), Some("Hugging Face"));
        assert_eq!(first.location, "Remote - Europe");
        assert_eq!(
            first.link.as_deref(),
            Some("https://www.remoterocketship.com/company/hf/jobs/42")
        );
        assert!(first.remote_hint);

        let second = &postings[1];
        assert_eq!(second.title, "AI role");
        assert_eq!(second.company.as_deref(), Some("Remote company"));
        assert_eq!(second.location, "Remote");
        assert_eq!(second.link.as_deref(), Some(page));
    }

    #[test]
    fn test_parse_skips_card_with_bad_link() {
        let page = r#"
            <div><h3>Research Scientist</h3><a href="http://bad host/jobs/1">Apply</a></div>
            <div><h3>ML Engineer</h3><a href="/jobs/2">Apply</a></div>
        "#;
        let source = RemoteRocketshipSource::default();
        let postings = source.parse(page, "https://www.remoterocketship.com/jobs/ai-researcher/").unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].title, "ML Engineer");
        assert_eq!(postings[0].link.as_deref(), Some("https://www.remoterocketship.com/jobs/2"));
    }

    #[test]
    fn test_fetch_fails_only_when_every_page_fails() {
        let mut server = mockito::Server::new();
        let _down = server.mock("GET", "/down").with_status(500).create();
        let _empty = server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("<html><body>No openings</body></html>")
            .create();

        let ctx = FetchContext::new(&FetchConfig::default()).unwrap();

        let partial = RemoteRocketshipSource {
            pages: vec![format!("{}/down", server.url()), format!("{}/empty", server.url())],
        };
        assert!(partial.fetch(&ctx).unwrap().is_empty());

        let all_down = RemoteRocketshipSource {
            pages: vec![format!("{}/down", server.url()), format!("{}/down", server.url())],
        };
        assert!(matches!(
            all_down.fetch(&ctx),
            Err(SourceError::AllQueriesFailed { count: 2, .. })
        ));
    }
}
