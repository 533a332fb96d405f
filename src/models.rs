use serde::{Deserialize, Serialize};

pub const UNKNOWN_COMPANY: &str = "(Unknown company)";

/// A posting as an adapter extracted it, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawPosting {
    pub title: String,
    pub company: Option<String>,
    pub location: String,
    pub link: Option<String>,
    pub source: String,
    pub snippet: Option<String>,
    pub remote_hint: bool, // set by remote-only boards
}

impl RawPosting {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn remote_hint(mut self, remote: bool) -> Self {
        self.remote_hint = remote;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub company: String,
    pub title: String,
    pub location: String,
    pub link: String,
    pub source: String,
    #[serde(skip)]
    pub snippet: Option<String>, // classification/scoring context only, never persisted
    pub remote: bool,
    #[serde(serialize_with = "serialize_score")]
    pub score: Option<i64>,
}

impl Job {
    pub fn score_or_zero(&self) -> i64 {
        self.score.unwrap_or(0)
    }
}

// Persisted files always carry an integer score.
fn serialize_score<S: serde::Serializer>(score: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(score.unwrap_or(0))
}
