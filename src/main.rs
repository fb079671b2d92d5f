use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod confidence;
mod engine;
mod error;
mod evm;
mod health;
mod ingest;
mod models;
mod normalize;
mod report;
mod thresholds;
mod trend;
mod weights;

use models::{ProjectSeries, ScoreResult};
use thresholds::ThresholdSet;

#[derive(Parser)]
#[command(name = "portfolio-health")]
#[command(about = "Weekly health and confidence scoring for a project portfolio", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every project-week and print the at-risk ranking
    Score {
        #[arg(long)]
        csv: PathBuf,
        /// Restrict to one project id
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Threshold override, `key=value`; may be repeated
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Emit the full summaries + series payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Threshold override, `key=value`; may be repeated
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// List the threshold knobs and their defaults
    Thresholds,
}

/// Latest week per project alongside the full per-week series, the shape
/// the presentation layer consumes.
#[derive(serde::Serialize)]
struct Payload<'a> {
    summaries: Vec<&'a ScoreResult>,
    series: &'a [ProjectSeries],
}

fn score_csv(
    csv: &PathBuf,
    project: Option<&str>,
    overrides: &[String],
) -> anyhow::Result<Vec<ProjectSeries>> {
    let thresholds =
        ThresholdSet::with_overrides(overrides).context("invalid threshold override")?;
    let mut records = ingest::load_csv(csv)?;
    if let Some(id) = project {
        records.retain(|r| r.project_id == id);
    }
    Ok(engine::score_portfolio(&records, &thresholds))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            csv,
            project,
            limit,
            set,
            json,
        } => {
            let portfolio = score_csv(&csv, project.as_deref(), &set)?;
            if portfolio.is_empty() {
                println!("No scorable records found.");
                return Ok(());
            }

            if json {
                let summaries: Vec<&ScoreResult> =
                    portfolio.iter().filter_map(|s| s.latest()).collect();
                let payload = Payload {
                    summaries,
                    series: &portfolio,
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            let mut ranked: Vec<(&ProjectSeries, &ScoreResult)> = portfolio
                .iter()
                .filter_map(|s| s.latest().map(|latest| (s, latest)))
                .collect();
            ranked.sort_by(|(_, a), (_, b)| {
                a.health_score
                    .partial_cmp(&b.health_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            println!("Projects by health (lowest first):");
            for (series, latest) in ranked.iter().take(limit) {
                let drag = latest
                    .biggest_drag()
                    .map(|d| format!("{} (-{:.1} pts)", d.metric, d.gap()))
                    .unwrap_or_else(|| "none".to_string());
                println!(
                    "- {} ({}) health {:.1} ({:+.1}), confidence {:.1}, biggest drag: {}",
                    series.project_name,
                    series.project_id,
                    latest.health_score,
                    series.latest_trend(),
                    latest.confidence_score,
                    drag,
                );
            }
        }
        Commands::Report {
            csv,
            project,
            out,
            set,
        } => {
            let portfolio = score_csv(&csv, project.as_deref(), &set)?;
            let report = report::build_report(&portfolio);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Thresholds => {
            println!("Threshold knobs (override with --set key=value):");
            for (key, value) in ThresholdSet::default().entries() {
                println!("- {key} = {value}");
            }
        }
    }

    Ok(())
}
