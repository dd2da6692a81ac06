use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

use sso_metrics::aggregator::Aggregator;
use sso_metrics::logging;
use sso_metrics::models::UsageSummary;
use sso_metrics::parser::LogParser;
use sso_metrics::query::{filter_applications, filter_users, AppSelector, FilterCriteria};
use sso_metrics::reports::{progress_meter, ReportRenderer};
use sso_metrics::timestamp_parser::TimestampParser;

#[derive(Parser)]
#[command(name = "sso-metrics")]
#[command(about = "Fast aggregation and reporting for SSO authentication event logs")]
#[command(version)]
struct Cli {
    /// Log file to analyze (JSON array or newline-delimited JSON)
    file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dataset totals and top applications
    Summary {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Restrict to one application label
        #[arg(long)]
        app: Option<String>,
    },
    /// Show per-user application usage
    Users {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Restrict to one application label
        #[arg(long)]
        app: Option<String>,
        /// Keep users whose username contains this (case-insensitive)
        #[arg(long)]
        user: Option<String>,
        /// Show at most N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show applications ranked by unique users
    Apps {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Restrict to one application label
        #[arg(long)]
        app: Option<String>,
        /// Show at most N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging();

    let command = cli.command.unwrap_or(Commands::Summary {
        json: false,
        since: None,
        until: None,
        app: None,
    });

    match command {
        Commands::Summary {
            json,
            since,
            until,
            app,
        } => {
            let criteria = parse_criteria(json, since, until, app, None);
            match run_summary(&cli.file, &criteria, json).await {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
        Commands::Users {
            json,
            since,
            until,
            app,
            user,
            limit,
        } => {
            let criteria = parse_criteria(json, since, until, app, user);
            match run_users(&cli.file, &criteria, limit, json).await {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
        Commands::Apps {
            json,
            since,
            until,
            app,
            limit,
        } => {
            let criteria = parse_criteria(json, since, until, app, None);
            match run_apps(&cli.file, &criteria, limit, json).await {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
    }
}

async fn run_summary(file: &Path, criteria: &FilterCriteria, json: bool) -> Result<()> {
    let summary = load_summary(file, !json).await?;
    let users = filter_users(&summary, criteria);
    let apps = filter_applications(&summary, criteria);
    ReportRenderer::new().display_summary(&summary, &users, &apps, json);
    Ok(())
}

async fn run_users(
    file: &Path,
    criteria: &FilterCriteria,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let summary = load_summary(file, !json).await?;
    let users = filter_users(&summary, criteria);
    ReportRenderer::new().display_users(&users, limit, json);
    Ok(())
}

async fn run_apps(
    file: &Path,
    criteria: &FilterCriteria,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let summary = load_summary(file, !json).await?;
    let apps = filter_applications(&summary, criteria);
    ReportRenderer::new().display_applications(&summary, &apps, limit, json);
    Ok(())
}

/// Read, parse, and aggregate one log file. A read failure or an input that
/// yields no records at all is fatal; individual undecodable lines are not.
async fn load_summary(file: &Path, show_progress: bool) -> Result<UsageSummary> {
    let run_id = logging::new_run_id();

    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    info!(%run_id, file = %file.display(), "ingesting authentication log");

    let records = LogParser::new()
        .parse_with_progress(&raw, progress_meter("Parsing...", show_progress))
        .await;

    if records.is_empty() {
        anyhow::bail!(
            "No authentication records found in {} (expected a JSON array or one JSON object per line)",
            file.display()
        );
    }

    let summary = Aggregator::new()
        .build(&records, progress_meter("Aggregating...", show_progress))
        .await;

    info!(
        %run_id,
        records = summary.record_count,
        users = summary.total_users,
        applications = summary.app_count(),
        "aggregation complete"
    );

    Ok(summary)
}

fn parse_criteria(
    json: bool,
    since: Option<String>,
    until: Option<String>,
    app: Option<String>,
    user: Option<String>,
) -> FilterCriteria {
    let start_date = since.map(|s| parse_day_flag(&s, json));
    let end_date = until.map(|s| parse_day_flag(&s, json));

    FilterCriteria {
        start_date,
        end_date,
        application: AppSelector::from_flag(app),
        username_contains: user.filter(|u| !u.is_empty()),
    }
}

fn parse_day_flag(raw: &str, json: bool) -> chrono::NaiveDate {
    match TimestampParser::parse_day(raw) {
        Ok(day) => day,
        Err(e) => {
            if !json {
                eprintln!("❌ {}", e);
            }
            process::exit(1);
        }
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({"error": e.to_string()}));
    } else {
        eprintln!("Error: {}", e);
    }
    process::exit(1);
}
