use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `(term, weight)` pairs. Order is kept for display only; scoring sums every match.
pub type WeightedTerms = Vec<(String, i64)>;

/// Every keyword list and weight table used by the classifier and the scorer.
///
/// Terms are matched as lowercase substrings (not whole words), so "head" also
/// rejects "headless" and "intern" also rejects "international". The weights
/// were tuned against that behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub filter: FilterRules,
    pub scoring: ScoringRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Checked first; a hit rejects even when an include term also matches.
    pub hard_exclude: Vec<String>,
    pub include: Vec<String>,
    /// Management, leadership and consulting titles.
    pub role_exclude: Vec<String>,
    /// Disallowed geographies and employers.
    pub company_exclude: Vec<String>,
    pub remote: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub blacklist: Vec<String>,
    pub blacklist_score: i64,
    pub capability: WeightedTerms,
    pub robotics: WeightedTerms,
    /// Not mutually exclusive: a title matching two phrases gets both.
    pub title_bonuses: WeightedTerms,
    pub generic_title: (String, i64),
    pub remote_location: (String, i64),
    pub preferred_countries: Vec<String>,
    pub preferred_country_bonus: i64,
    pub preferred_region: (String, i64),
    pub penalized_location: (String, i64),
    pub employers: WeightedTerms,
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn weighted(list: &[(&str, i64)]) -> WeightedTerms {
    list.iter().map(|(t, w)| (t.to_string(), *w)).collect()
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            hard_exclude: terms(&[
                "postdoc",
                "post-doctoral",
                "post doctoral",
                "phd only",
                "requires phd",
                "phd required",
                "assistant professor",
                "associate professor",
                "professor",
                "faculty",
                "audio",
                "speech recognition",
                "tts",
                "biomedical",
                "molecular",
                "diagnostics",
                "clinical",
                "healthcare",
                "intern",
                "internship",
            ]),
            include: terms(&[
                "research",
                "researcher",
                "scientist",
                "machine learning",
                "deep learning",
                "ai engineer",
                "ml engineer",
                "research engineer",
                "nlp",
                "natural language",
                "llm",
                "multimodal",
                "generative",
                "diffusion",
                "reinforcement learning",
                "rlhf",
                "preference learning",
                "tokenization",
                "foundation model",
                "computer vision",
            ]),
            role_exclude: terms(&[
                "lead",
                "manager",
                "head",
                "principal",
                "director",
                "architect",
                "vp",
                "senior vice",
                "consultant",
                "intern",
                "internship",
                "student",
            ]),
            company_exclude: terms(&[
                "china",
                "beijing",
                "shanghai",
                "shenzhen",
                "alibaba",
                "tencent",
                "bytedance",
                "huawei",
                "byte dance",
            ]),
            remote: terms(&[
                "remote",
                "hybrid",
                "flexible",
                "work from home",
                "wfh",
                "remote-friendly",
                "remote friendly",
            ]),
        }
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            blacklist: terms(&["huawei", "alibaba", "tencent", "bytedance", "sensetime"]),
            blacklist_score: -100,
            capability: weighted(&[
                ("multimodal", 10),
                ("multi-modal", 10),
                ("large language model", 9),
                ("foundation", 8),
                ("agent", 8),
                ("rlhf", 8),
                ("reinforcement", 8),
                ("generative", 8),
                ("diffusion", 7),
                ("vae", 6),
                ("vq", 6),
                ("token", 6),
                ("tokenization", 6),
                ("motion", 6),
                ("bvh", 5),
                ("3d", 5),
            ]),
            robotics: weighted(&[
                ("robot", 6),
                ("embodied", 6),
                ("simulation", 5),
                ("control", 5),
                ("autonomous", 4),
            ]),
            title_bonuses: weighted(&[
                ("research engineer", 10),
                ("research scientist", 8),
                ("applied scientist", 8),
            ]),
            generic_title: ("engineer".to_string(), 3),
            remote_location: ("remote".to_string(), 10),
            preferred_countries: terms(&[
                "netherlands",
                "norway",
                "finland",
                "sweden",
                "germany",
                "switzerland",
            ]),
            preferred_country_bonus: 7,
            preferred_region: ("singapore".to_string(), 5),
            penalized_location: ("us".to_string(), -1),
            employers: weighted(&[
                ("tno", 8),
                ("fraunhofer", 7),
                ("sintef", 7),
                ("eth", 7),
                ("epfl", 6),
                ("mistral", 9),
                ("runway", 8),
                ("stability", 8),
                ("deepmind", 7),
                ("microsoft research", 6),
                ("aisingapore", 5),
                ("astar", 5),
            ]),
        }
    }
}

impl Rules {
    /// `<config dir>/jobscout/rules.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jobscout")
            .map(|dirs| dirs.config_dir().join("rules.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        let rules: Rules = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rules file: {}", path.display()))?;
        Ok(rules.lowercased())
    }

    /// An explicit path must exist; otherwise the per-user file is used when
    /// present, and the built-in tables when not.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!(path = %path.display(), "Loading rules");
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "Loading rules");
                Self::load(&path)
            }
            _ => {
                tracing::debug!("Using built-in rules");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write rules file: {}", path.display()))
    }

    // Matching lowercases the text, so hand-edited terms must be lowercase too.
    fn lowercased(mut self) -> Self {
        let lower_all = |list: &mut Vec<String>| list.iter_mut().for_each(|t| *t = t.to_lowercase());
        let lower_weighted = |list: &mut WeightedTerms| {
            list.iter_mut().for_each(|(t, _)| *t = t.to_lowercase())
        };

        let f = &mut self.filter;
        lower_all(&mut f.hard_exclude);
        lower_all(&mut f.include);
        lower_all(&mut f.role_exclude);
        lower_all(&mut f.company_exclude);
        lower_all(&mut f.remote);

        let s = &mut self.scoring;
        lower_all(&mut s.blacklist);
        lower_all(&mut s.preferred_countries);
        lower_weighted(&mut s.capability);
        lower_weighted(&mut s.robotics);
        lower_weighted(&mut s.title_bonuses);
        lower_weighted(&mut s.employers);
        for (t, _) in [
            &mut s.generic_title,
            &mut s.remote_location,
            &mut s.preferred_region,
            &mut s.penalized_location,
        ] {
            *t = t.to_lowercase();
        }
        self
    }
}

/// True if any term is a substring of `text` (already lowercase).
pub fn contains_any(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| text.contains(t.as_str()))
}
