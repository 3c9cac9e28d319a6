use clap::Parser;
use slog::info;
use std::sync::Arc;
use weather_etl::{
    open_store, setup_logger, shutdown_signal, Cli, Extractor, Loader, OpenWeatherClient,
    Pipeline, Scheduler, Settings, Transformer,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let logger = setup_logger(&cli);
    let settings = Settings::load(cli.config.as_deref())?;

    info!(
        logger,
        "weather data etl pipeline, {} cities, units {}",
        settings.cities.len(),
        settings.api.units
    );

    let fetcher = Arc::new(OpenWeatherClient::new(logger.clone(), &settings.api)?);
    let store = open_store(&settings.database)?;

    let pipeline = Pipeline::new(
        logger.clone(),
        Extractor::new(logger.clone(), fetcher, settings.cities.clone()),
        Transformer::new(settings.api.units),
        Loader::new(logger.clone(), store),
    );

    Scheduler::new(logger, pipeline, settings.schedule.every())
        .run_until(shutdown_signal())
        .await;
    Ok(())
}
