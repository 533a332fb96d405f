use scraper::Html;

use super::{element_text, parent_text, resolve_link, selector, FetchContext, JobSource, SourceError};
use crate::models::RawPosting;

/// A career page whose postings are plain anchors.
///
/// Most institutional career sites need nothing more than one CSS selector plus
/// a fixed company and location, so they are described as data here rather
/// than given one adapter each.
#[derive(Debug, Clone)]
pub struct ListingSource {
    pub name: &'static str,
    pub url: &'static str,
    pub selector: &'static str,
    pub company: &'static str,
    pub location: &'static str,
    /// When non-empty, the lowercase title must contain one of these.
    pub title_hints: &'static [&'static str],
    pub link_contains: Option<&'static str>,
    /// Use the anchor's parent text as the snippet.
    pub parent_snippet: bool,
}

impl ListingSource {
    const fn new(
        name: &'static str,
        url: &'static str,
        selector: &'static str,
        company: &'static str,
        location: &'static str,
    ) -> Self {
        Self {
            name,
            url,
            selector,
            company,
            location,
            title_hints: &[],
            link_contains: None,
            parent_snippet: false,
        }
    }

    const fn hints(mut self, hints: &'static [&'static str]) -> Self {
        self.title_hints = hints;
        self
    }

    const fn link_contains(mut self, fragment: &'static str) -> Self {
        self.link_contains = Some(fragment);
        self
    }

    const fn parent_snippet(mut self) -> Self {
        self.parent_snippet = true;
        self
    }

    pub fn parse(&self, html: &str) -> Result<Vec<RawPosting>, SourceError> {
        let document = Html::parse_document(html);
        let anchors = selector(self.selector)?;
        let mut postings = Vec::new();

        for a in document.select(&anchors) {
            let Some(href) = a.value().attr("href") else { continue };
            let title = element_text(a);
            if title.is_empty() {
                continue;
            }

            if !self.title_hints.is_empty() {
                let lower = title.to_lowercase();
                if !self.title_hints.iter().any(|h| lower.contains(h)) {
                    continue;
                }
            }

            let Ok(link) = resolve_link(self.url, href) else {
                tracing::debug!(source = self.name, href, "Skipping unresolvable link");
                continue;
            };
            if let Some(fragment) = self.link_contains {
                if !link.contains(fragment) {
                    continue;
                }
            }

            let mut posting = RawPosting::new(title, self.name)
                .company(self.company)
                .location(self.location)
                .link(link);
            if self.parent_snippet {
                posting.snippet = parent_text(a);
            }
            postings.push(posting);
        }

        Ok(postings)
    }
}

impl JobSource for ListingSource {
    fn name(&self) -> &str {
        self.name
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<RawPosting>, SourceError> {
        let html = ctx.get_html(self.url)?;
        self.parse(&html)
    }
}

const RESEARCH_HINTS: &[&str] = &["research", "engineer", "scientist", "machine", "ai", "deep"];

pub(super) const TNO: ListingSource = ListingSource::new(
    "TNO",
    "https://www.tno.nl/en/career/vacancies/?q=machine%20learning",
    "a[href*='/en/career/vacancies/']",
    "TNO",
    "Netherlands",
)
.hints(&["research", "machine", "ai", "ml", "engineer", "data", "scientist"]);

pub(super) const EUROPE: &[ListingSource] = &[
    ListingSource::new(
        "SINTEF",
        "https://www.sintef.no/en/sintef-group/career/vacant-positions/",
        "a[href*='delta.hr-manager.net']",
        "SINTEF",
        "Norway",
    )
    .hints(&["research", "engineer", "scientist", "ai", "ml", "deep", "data", "robot"]),
    ListingSource::new("ETH", "https://jobs.ethz.ch", "a[href*='/job/view/']", "ETH Zürich", "Switzerland")
        .hints(RESEARCH_HINTS),
    ListingSource::new(
        "EPFL",
        "https://careers.epfl.ch/job-search/?keyword=research",
        "a[href]",
        "EPFL",
        "Switzerland",
    )
    .hints(&["research", "engineer", "ml", "ai", "deep"]),
    ListingSource::new(
        "VTT",
        "https://www.vttresearch.com/en/working-vtt",
        "a[href*='/en/careers/open-positions/']",
        "VTT",
        "Finland",
    ),
    ListingSource::new(
        "TU Delft",
        "https://www.tudelft.nl/en/about-tu-delft/working-at-tu-delft/search-jobs",
        "a[href*='/vacature'], a[href*='/job']",
        "TU Delft",
        "Netherlands",
    ),
    ListingSource::new("KTH", "https://www.kth.se/lediga-jobb", "a[href*='/jobb'], a[href*='/positions']", "KTH", "Sweden"),
    ListingSource::new(
        "DTU",
        "https://www.dtu.dk/english/About/JOB-and-CAREER/vacant-positions",
        "a[href*='/About/JOB-and-CAREER/vacant-positions']",
        "DTU",
        "Denmark",
    ),
];

pub(super) const GENERATIVE: &[ListingSource] = &[
    ListingSource::new(
        "Stability",
        "https://stability.ai/careers",
        "a[href*='/careers/']",
        "Stability AI",
        "Europe / Remote",
    ),
    ListingSource::new(
        "Runway",
        "https://runwayml.com/careers",
        "a[href*='/careers/']",
        "Runway",
        "Europe / Remote",
    ),
    ListingSource::new(
        "ElevenLabs",
        "https://elevenlabs.io/careers",
        "a[href*='/careers/']",
        "ElevenLabs",
        "Europe / Remote",
    ),
];

pub(super) const SINGAPORE: &[ListingSource] = &[
    ListingSource::new(
        "AI Singapore",
        "https://aisingapore.org/home/careers/",
        "h2 a[href]",
        "AI Singapore / NUS",
        "Singapore",
    )
    .link_contains("careers.nus.edu.sg"),
    ListingSource::new(
        "A*STAR",
        "https://careers.a-star.edu.sg/JobListing.aspx",
        "a[href*='JobDetails.aspx']",
        "A*STAR",
        "Singapore",
    )
    .parent_snippet(),
    ListingSource::new(
        "NUS Careers",
        "https://careers.nus.edu.sg/careers",
        "a.job-title, a[data-automation-id='jobTitle']",
        "NUS",
        "Singapore",
    )
    .hints(&[
        "research",
        "scientist",
        "ai",
        "machine",
        "deep",
        "learning",
        "nlp",
        "intelligence",
        "computer vision",
        "engineer",
    ]),
    ListingSource::new(
        "NTU Careers",
        "https://ntu.wd3.myworkdayjobs.com/en-US/Careers",
        "a[data-automation-id='jobTitle']",
        "NTU",
        "Singapore",
    )
    .parent_snippet(),
    ListingSource::new(
        "SIT",
        "https://careers.singaporetech.edu.sg/search/?createNewAlert=false&q=Research+Engineer&locationsearch=",
        "a.jobTitle-link",
        "Singapore Institute of Technology",
        "Singapore",
    ),
];

pub(super) const MBZUAI: ListingSource = ListingSource::new(
    "MBZUAI",
    "https://mbzuai.ac.ae/careers/",
    "a[href]",
    "MBZUAI",
    "Abu Dhabi",
)
.hints(&["research", "engineer", "scientist", "ai", "machine", "assistant"]);
