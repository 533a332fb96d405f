use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Job, UNKNOWN_COMPANY};

const STYLE: &str = r#"<style>
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, -apple-system, "Helvetica Neue", Arial, sans-serif; background: #f5f7fb; color: #111827; }
header { background: linear-gradient(135deg, #1e3a8a, #4f46e5); color: #f9fafb; padding: 1.6rem 2rem; position: sticky; top: 0; z-index: 10; }
header h1 { margin: 0; font-size: 1.6rem; }
main { padding: 1.5rem 2rem; max-width: 1100px; margin: 0 auto; }
.filter-bar { display: flex; flex-wrap: wrap; gap: 0.5rem; margin-bottom: 1rem; }
.company-chip { border-radius: 999px; border: 1px solid #9ca3af; padding: 0.3rem 0.9rem; background: #fff; cursor: pointer; }
.company-chip.active { background: #4f46e5; color: #fff; border-color: #4f46e5; }
.jobs-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 1rem; }
.job-card { border: 1px solid #e5e7eb; padding: 0.75rem; border-radius: 10px; background: #fafafa; }
.job-title { margin: 0 0 0.3rem 0; font-size: 1rem; }
.job-meta { font-size: 0.85rem; display: flex; flex-wrap: wrap; gap: 0.3rem; }
.job-meta span { padding: 0.2rem 0.4rem; border-radius: 6px; }
.job-location { background: #eff6ff; }
.job-score { background: #ecfdf5; }
.job-source { background: #fef3c7; }
.remote-yes { background: #dcfce7; }
.remote-onsite { background: #f3f4f6; }
</style>"#;

const SCRIPT: &str = r#"<script>
function filterByCompany(companyId) {
  const sections = document.querySelectorAll('.company-section');
  const chips = document.querySelectorAll('.company-chip');
  sections.forEach(s => {
    s.style.display = (!companyId || s.getAttribute('data-company') === companyId) ? '' : 'none';
  });
  chips.forEach(c => {
    c.classList.toggle('active', !!companyId && c.getAttribute('data-company') === companyId);
  });
}
</script>"#;

/// Jobs grouped by company (sorted by name), each group ordered by score,
/// highest first. Equal scores keep their input order.
pub fn group_by_company(jobs: &[Job]) -> BTreeMap<String, Vec<&Job>> {
    let mut groups: BTreeMap<String, Vec<&Job>> = BTreeMap::new();
    for job in jobs {
        let company = if job.company.trim().is_empty() {
            UNKNOWN_COMPANY.to_string()
        } else {
            job.company.clone()
        };
        groups.entry(company).or_default().push(job);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| b.score_or_zero().cmp(&a.score_or_zero()));
    }
    groups
}

pub fn render(jobs: &[Job]) -> String {
    let groups = group_by_company(jobs);

    let mut chips = String::from(
        "<button class='company-chip' onclick=\"filterByCompany('')\">All</button>",
    );
    let mut sections = String::new();

    for (company, group) in &groups {
        let id = company_id(company);
        let name = escape_html(company);
        chips.push_str(&format!(
            "<button class='company-chip' data-company='{id}' onclick=\"filterByCompany('{id}')\">{name}</button>"
        ));

        let cards: String = group.iter().map(|job| render_card(job)).collect();
        sections.push_str(&format!(
            "<section class='company-section' id='company-{id}' data-company='{id}'>\
             <h2 class='company-title'>{name} <small>({count})</small></h2>\
             <div class='jobs-grid'>{cards}</div></section>",
            count = group.len()
        ));
    }

    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'><title>Job Dashboard</title>{style}{script}</head>\
         <body><header><h1>Job Opportunities Dashboard</h1><p>{total} jobs from {companies} companies</p></header>\
         <main><div class='filter-bar'>{chips}</div>{sections}</main></body></html>",
        style = STYLE,
        script = SCRIPT,
        total = jobs.len(),
        companies = groups.len()
    )
}

fn render_card(job: &Job) -> String {
    let title = if job.title.is_empty() { "(no title)" } else { job.title.as_str() };
    let link = if job.link.is_empty() { "#" } else { job.link.as_str() };
    let (remote_class, remote_label) = if job.remote {
        ("remote-yes", "Remote possible")
    } else {
        ("remote-onsite", "Onsite / Hybrid")
    };

    format!(
        "<div class='job-card'>\
         <h3 class='job-title'><a href='{link}' target='_blank' rel='noopener'>{title}</a></h3>\
         <div class='job-meta'>\
         <span class='job-location'>{location}</span>\
         <span class='job-score'>Score: {score}</span>\
         <span class='job-source'>Source: {source}</span>\
         <span class='job-remote {remote_class}'>{remote_label}</span>\
         </div></div>",
        link = escape_html(link),
        title = escape_html(title),
        location = escape_html(&job.location),
        score = job.score_or_zero(),
        source = escape_html(&job.source),
    )
}

/// Attribute-safe id for a company: escaped, then spaces, `&` and `/` folded to `_`.
fn company_id(company: &str) -> String {
    escape_html(company)
        .chars()
        .map(|c| match c {
            ' ' | '&' | '/' | ';' | '#' => '_',
            c => c,
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Input path with an `.html` extension.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("html")
}

pub fn write_dashboard(jobs: &[Job], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    fs::write(path, render(jobs))
        .with_context(|| format!("Failed to write dashboard to {}", path.display()))
}
