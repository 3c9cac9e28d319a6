use clap::Parser;
use slog::debug;
use time::{Duration, OffsetDateTime};
use weather_etl::{open_store, setup_logger, Cli, Settings};

/// Prints what the pipeline has collected so far.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let logger = setup_logger(&cli);
    let settings = Settings::load(cli.config.as_deref())?;
    let store = open_store(&settings.database)?;
    debug!(logger, "inspecting {:?}", settings.database);

    let now = OffsetDateTime::now_utc();

    println!("\nLatest Weather Data (last hour):");
    println!(
        "{:<20} {:<22} {:>11} {:>8}  description",
        "city", "observed_at", "temperature", "humidity"
    );
    for reading in store.recent_readings(now - Duration::hours(1)).await? {
        println!(
            "{:<20} {:<22} {:>11.2} {:>8}  {}",
            reading.city,
            reading.observed_at.to_string(),
            reading.temperature,
            reading.humidity,
            reading.description
        );
    }

    println!("\nDaily Aggregates (last 24 hours):");
    println!(
        "{:<20} {:<12} {:>8} {:>8} {:>8}",
        "city", "date", "avg", "min", "max"
    );
    for day in store.recent_aggregates((now - Duration::hours(24)).date()).await? {
        println!(
            "{:<20} {:<12} {:>8.2} {:>8.2} {:>8.2}",
            day.city,
            day.date.to_string(),
            day.avg_temperature,
            day.min_temperature,
            day.max_temperature
        );
    }

    let counts = store.row_counts().await?;
    println!("\nTotal Records:");
    println!("Weather Data: {} records", counts.readings);
    println!("Daily Aggregates: {} records", counts.daily_aggregates);
    Ok(())
}
