mod classify;
mod dashboard;
mod models;
mod normalize;
mod pipeline;
mod report;
mod rules;
mod scoring;
mod sources;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use pipeline::Pipeline;
use rules::Rules;
use sources::{FetchConfig, FetchContext};

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Aggregate, filter and rank research job postings from many career sites")]
struct Cli {
    /// Verbose logging (debug level for jobscout)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all sources, then filter, dedupe, score and rank
    Run {
        /// Rules file (defaults to the per-user rules.json, then built-in rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Only run these sources (repeatable, case-insensitive)
        #[arg(long = "only")]
        only: Vec<String>,

        /// Fetch sources concurrently
        #[arg(long)]
        parallel: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,

        /// Write the ranked list as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the ranked list as job_results_<timestamp>.json into this directory
        #[arg(long)]
        json_auto: Option<PathBuf>,

        /// Write an HTML dashboard to this file
        #[arg(long)]
        html: Option<PathBuf>,

        /// Number of jobs to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List the available sources in run order
    Sources,

    /// Print a saved result file
    Show {
        /// JSON file written by `run`
        #[arg(long)]
        in_json: PathBuf,

        /// Number of jobs to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Re-score and re-rank a saved result file with the current rules
    Rescore {
        /// JSON file written by `run`
        #[arg(long)]
        in_json: PathBuf,

        /// Output file (defaults to overwriting the input)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Rules file
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Number of jobs to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Build an HTML dashboard from a saved result file
    Dashboard {
        /// JSON file written by `run`
        #[arg(long)]
        in_json: PathBuf,

        /// Output file (defaults to the input path with .html)
        #[arg(long)]
        out_html: Option<PathBuf>,
    },

    /// Write the built-in rules to a file for editing
    Rules {
        /// Destination (defaults to the per-user rules.json)
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,jobscout=debug" } else { "info,jobscout=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stderr, so stdout carries only the report
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            rules,
            only,
            parallel,
            timeout,
            json,
            json_auto,
            html,
            limit,
        } => {
            let rules = Rules::resolve(rules.as_deref())?;

            let selected = sources::select_sources(sources::registry(), &only);
            if selected.is_empty() {
                return Err(anyhow!(
                    "No source matches {:?}. Run 'jobscout sources' to list them.",
                    only
                ));
            }

            let config = FetchConfig {
                timeout: Duration::from_secs(timeout),
                ..FetchConfig::default()
            };
            let ctx = Arc::new(FetchContext::new(&config).context("Failed to build HTTP client")?);

            let report = Pipeline::new(&rules).parallel(parallel).run(ctx, &selected)?;

            report::print_jobs(&report.jobs, limit);
            report::print_summary(&report);

            if let Some(path) = json {
                report::save_jobs(&report.jobs, &path)?;
                println!("\nSaved {} jobs to {}", report.jobs.len(), path.display());
            }
            if let Some(dir) = json_auto {
                let path = report::timestamped_path(&dir);
                report::save_jobs(&report.jobs, &path)?;
                println!("\nSaved {} jobs to {}", report.jobs.len(), path.display());
            }
            if let Some(path) = html {
                dashboard::write_dashboard(&report.jobs, &path)?;
                println!("Dashboard saved to {}", path.display());
            }
        }

        Commands::Sources => {
            for (i, source) in sources::registry().iter().enumerate() {
                println!("{:>3}  {}", i + 1, source.name());
            }
        }

        Commands::Show { in_json, limit } => {
            let jobs = report::load_jobs(&in_json)?;
            report::print_jobs(&jobs, limit);
        }

        Commands::Rescore {
            in_json,
            out,
            rules,
            limit,
        } => {
            let rules = Rules::resolve(rules.as_deref())?;
            let mut jobs = report::load_jobs(&in_json)?;
            for job in &mut jobs {
                job.score = None;
            }
            scoring::score_all(&rules.scoring, &mut jobs);
            let jobs = scoring::rank(jobs);

            report::print_jobs(&jobs, limit);
            let out = out.unwrap_or(in_json);
            report::save_jobs(&jobs, &out)?;
            println!("\nSaved {} jobs to {}", jobs.len(), out.display());
        }

        Commands::Dashboard { in_json, out_html } => {
            let jobs = report::load_jobs(&in_json)?;
            let out = out_html.unwrap_or_else(|| dashboard::default_output(&in_json));
            dashboard::write_dashboard(&jobs, &out)?;
            println!("Dashboard saved to {}", out.display());
        }

        Commands::Rules { write } => {
            let path = match write {
                Some(path) => path,
                None => Rules::default_path()
                    .ok_or_else(|| anyhow!("No config directory found; pass --write PATH"))?,
            };
            Rules::default().save(&path)?;
            println!("Wrote default rules to {}", path.display());
        }
    }

    Ok(())
}
