use anyhow::{bail, Result};
use chrono::{Duration, Local, NaiveDate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod models;
mod pipeline;
mod scraper;
mod services;

use config::AppConfig;
use models::EnrichedMovie;

/// Today's date in ISO format without hyphens (YYYYMMDD).
fn today() -> String {
    Local::now().date_naive().format("%Y%m%d").to_string()
}

/// Tomorrow's date in ISO format without hyphens.
fn tomorrow() -> String {
    (Local::now().date_naive() + Duration::days(1))
        .format("%Y%m%d")
        .to_string()
}

/// Target date from the command line: today by default, `--tomorrow`, or
/// `--date YYYYMMDD`.
fn target_date(args: &[String]) -> Result<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tomorrow" => return Ok(tomorrow()),
            "--date" => {
                let Some(value) = iter.next() else {
                    bail!("--date requires a value (YYYYMMDD)");
                };
                if NaiveDate::parse_from_str(value, "%Y%m%d").is_err() {
                    bail!("invalid date '{}', expected YYYYMMDD", value);
                }
                return Ok(value.clone());
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(today())
}

fn print_schedule(date: &str, schedule: &[EnrichedMovie]) {
    println!("Schedule for {} ({} films)", date, schedule.len());
    println!("{:-<72}", "");
    for movie in schedule {
        let rating = movie
            .details
            .as_ref()
            .map(|d| format!("{:.1}", d.rating))
            .unwrap_or_else(|| "unavailable".to_string());
        let url = movie
            .details
            .as_ref()
            .map(|d| d.url.as_str())
            .unwrap_or("unavailable");
        println!(
            "{:<6} {:<40} {}",
            rating,
            movie.title,
            movie.showtimes.join(", ")
        );
        println!("       {}", url);
    }

    let top: Vec<_> = schedule
        .iter()
        .filter_map(|m| m.details.as_ref().map(|d| (m, d)))
        .take(3)
        .collect();
    if !top.is_empty() {
        println!();
        println!("Top picks:");
        for (movie, details) in top {
            println!(
                "  {} ({:.1}) - {}",
                movie.title, details.rating, details.description
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load();
    config.log_config();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let date = target_date(&args)?;

    let schedule = pipeline::fetch_schedule(&config, &date).await?;
    print_schedule(&date, &schedule);

    Ok(())
}
