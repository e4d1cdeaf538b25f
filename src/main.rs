use std::path::PathBuf;

use chrono::{Duration, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

mod analytics;
mod calendar;
mod models;
mod report;
mod store;
mod validation;

use models::{HealthEntry, HealthMetricType};

#[derive(Parser)]
#[command(name = "healthpulse")]
#[command(about = "Personal health metric tracker with weekly analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Record a single observation
    Add {
        #[arg(value_enum)]
        metric: HealthMetricType,
        value: f64,
        #[arg(long, default_value = "")]
        unit: String,
        /// Day of the observation (YYYY-MM-DD, midnight UTC); defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove an observation by id
    Delete {
        id: String,
    },
    /// Modify an observation in place
    Update {
        id: String,
        #[arg(long)]
        value: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        /// New day for the observation (YYYY-MM-DD, midnight UTC)
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete every stored observation (goals are kept)
    ClearAll,
    /// Import observations from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Set the goal for a metric
    SetGoal {
        #[arg(value_enum)]
        metric: HealthMetricType,
        target: f64,
    },
    /// Remove the goal for a metric
    ClearGoal {
        #[arg(value_enum)]
        metric: HealthMetricType,
    },
    /// List configured goals
    Goals,
    /// Show aggregates for one day
    Day {
        date: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show aggregates for the week starting at a day
    Week {
        start: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show the per-day series for a metric across a week
    Trend {
        start: String,
        #[arg(value_enum)]
        metric: HealthMetricType,
    },
    /// Show consecutive goal-hitting weeks ending at a week
    Streak {
        start: String,
        #[arg(value_enum)]
        metric: HealthMetricType,
        #[arg(long, default_value_t = 52)]
        max_weeks: u32,
    },
    /// Generate a markdown weekly report
    Report {
        start: String,
        #[arg(long, default_value_t = 52)]
        max_weeks: u32,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let db_path = std::env::var("HEALTHPULSE_DB").unwrap_or_else(|_| "healthpulse.db".to_string());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    match cli.command {
        Commands::InitDb => {
            store::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            store::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Add {
            metric,
            value,
            unit,
            date,
        } => {
            let timestamp_ms = match date {
                Some(day) => calendar::parse_day_key(&day)?
                    .and_time(NaiveTime::MIN)
                    .and_utc()
                    .timestamp_millis(),
                None => Utc::now().timestamp_millis(),
            };

            let entry = HealthEntry {
                id: Uuid::new_v4().to_string(),
                metric,
                value,
                unit,
                timestamp_ms,
            };

            validation::validate_entry(&entry)?;
            store::insert_entry(&pool, &entry).await?;
            println!("Recorded {} {} as {}.", entry.value, entry.metric, entry.id);
        }
        Commands::Delete { id } => {
            if store::delete_entry(&pool, &id).await? {
                println!("Deleted {id}.");
            } else {
                println!("No entry with id {id}.");
            }
        }
        Commands::Update {
            id,
            value,
            unit,
            date,
        } => {
            let recorded_on = match date {
                Some(day) => Some(calendar::parse_day_key(&day)?),
                None => None,
            };

            if store::update_entry(&pool, &id, value, unit.as_deref(), recorded_on).await? {
                println!("Updated {id}.");
            } else {
                println!("No entry with id {id}.");
            }
        }
        Commands::ClearAll => {
            let removed = store::clear_all(&pool).await?;
            println!("Removed {removed} entries.");
        }
        Commands::Import { csv } => {
            let (inserted, skipped) = store::import_csv(&pool, &csv).await?;
            println!(
                "Inserted {inserted} entries from {} ({skipped} rejected).",
                csv.display()
            );
        }
        Commands::SetGoal { metric, target } => {
            store::set_goal(&pool, metric, target).await?;
            println!("Goal for {metric} set to {target}.");
        }
        Commands::ClearGoal { metric } => {
            if store::clear_goal(&pool, metric).await? {
                println!("Goal for {metric} cleared.");
            } else {
                println!("No goal configured for {metric}.");
            }
        }
        Commands::Goals => {
            let goals = store::fetch_goals(&pool).await?;
            if goals.is_empty() {
                println!("No goals configured.");
            } else {
                for (metric, target) in goals {
                    println!("- {metric}: {target}");
                }
            }
        }
        Commands::Day { date, json } => {
            let day = calendar::parse_day_key(&date)?;
            let entries = store::fetch_entries(&pool, None, Some(day)).await?;
            let summary = analytics::daily_summary(&entries, &date);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.metrics.is_empty() {
                println!("No observations on {date}.");
            } else {
                println!("Summary for {date}:");
                for (metric, stats) in &summary.metrics {
                    println!(
                        "- {}: total {:.1}, min {:.1}, max {:.1}, avg {:.1}",
                        metric, stats.total, stats.min, stats.max, stats.average
                    );
                }
            }
        }
        Commands::Week { start, json } => {
            let since = calendar::parse_day_key(&start)?;
            let entries = store::fetch_entries(&pool, None, Some(since)).await?;
            let summary = analytics::weekly_summary(&entries, &start)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.metrics.is_empty() {
                println!(
                    "No observations between {} and {}.",
                    summary.week_start, summary.week_end
                );
            } else {
                println!("Week {} to {}:", summary.week_start, summary.week_end);
                for (metric, stats) in &summary.metrics {
                    println!(
                        "- {}: total {:.1}, min {:.1}, max {:.1}, avg {:.1} across {} day(s)",
                        metric, stats.total, stats.min, stats.max, stats.average, stats.day_count
                    );
                }
            }
        }
        Commands::Trend { start, metric } => {
            let since = calendar::parse_day_key(&start)?;
            let entries = store::fetch_entries(&pool, Some(metric), Some(since)).await?;
            let trend = analytics::weekly_trend(&entries, &start, metric)?;

            if trend.is_empty() {
                println!("No {metric} observations in the week starting {start}.");
            } else {
                println!("{metric} for the week starting {start}:");
                for point in trend {
                    println!("- {}: {:.1}", point.date, point.value);
                }
            }
        }
        Commands::Streak {
            start,
            metric,
            max_weeks,
        } => match store::fetch_goal(&pool, metric).await? {
            Some(target) => {
                let start_day = calendar::parse_day_key(&start)?;
                let since = start_day - Duration::days(7 * i64::from(max_weeks));
                let entries = store::fetch_entries(&pool, Some(metric), Some(since)).await?;
                let streak =
                    analytics::weekly_streak(&entries, metric, Some(target), &start, max_weeks)?;
                println!(
                    "{metric} streak ending {start}: {streak} consecutive week(s) at goal {target}."
                );
            }
            None => println!("No goal configured for {metric}, streak is 0."),
        },
        Commands::Report {
            start,
            max_weeks,
            out,
        } => {
            let entries = store::fetch_entries(&pool, None, None).await?;
            let goals = store::fetch_goals(&pool).await?;
            let report = report::build_report(&entries, &start, &goals, max_weeks)?;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
