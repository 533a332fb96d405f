use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Job;
use crate::pipeline::{RunReport, SourceStatus};

const WIDTH: usize = 72;

pub fn print_jobs(jobs: &[Job], limit: Option<usize>) {
    if jobs.is_empty() {
        println!("No matching jobs found.");
        return;
    }

    let shown = limit.unwrap_or(jobs.len()).min(jobs.len());
    for (i, job) in jobs.iter().take(shown).enumerate() {
        let remote = if job.remote { " [REMOTE]" } else { "" };
        let heading = format!("#{} {} — {}{}", i + 1, job.company, job.title, remote);
        for line in textwrap::wrap(&heading, textwrap::Options::new(WIDTH).subsequent_indent("   ")) {
            println!("{}", line);
        }
        println!("   Score: {}", job.score_or_zero());
        println!("   Location: {} | Source: {}", display_or_dash(&job.location), job.source);
        println!("   {}", job.link);
        println!("{}", "-".repeat(60));
    }

    if shown < jobs.len() {
        println!("({} more not shown)", jobs.len() - shown);
    }
}

pub fn print_summary(report: &RunReport) {
    println!("\nSources:");
    for outcome in &report.sources {
        match &outcome.status {
            SourceStatus::Ok { raw, relevant } => println!(
                "  {:<20} ok     {:>4} found {:>4} relevant  ({} ms)",
                outcome.name,
                raw,
                relevant,
                outcome.elapsed.as_millis()
            ),
            SourceStatus::Failed { error } => {
                println!("  {:<20} FAILED {}", outcome.name, truncate(error, 60))
            }
        }
    }
    println!("\nResults:");
    println!("  Sources ok:       {}", report.succeeded());
    println!("  Sources failed:   {}", report.failed());
    println!("  Postings found:   {}", report.total_raw());
    println!("  Relevant:         {}", report.total_relevant());
    println!("  Duplicates:       {}", report.duplicates);
    println!("  Ranked jobs:      {}", report.jobs.len());
}

pub fn save_jobs(jobs: &[Job], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(jobs)?;
    fs::write(path, json).with_context(|| format!("Failed to write results to {}", path.display()))
}

pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results file: {}", path.display()))
}

/// `job_results_YYYYmmdd_HHMMSS.json` inside `dir`, stamped with local time.
pub fn timestamped_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("job_results_{}.json", stamp))
}

fn display_or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
