use async_trait::async_trait;
use mockall::mock;
use slog::{o, Discard, Logger};
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use weather_etl::{
    CleanedReading, CloudsBlock, CurrentWeatherResponse, DailyAggregate, Extractor, FetchError,
    Loader, MainBlock, Pipeline, ReadingSnapshot, RowCounts, StoreError, Transformer, UnitSystem,
    WeatherCondition, WeatherFetcher, WeatherStore, WindBlock, AGGREGATES_TABLE,
    AGGREGATE_COLUMNS, READING_COLUMNS,
};

pub fn test_logger() -> Logger {
    Logger::root(Discard, o!())
}

pub fn cities(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// 2024-05-01 12:00:00 UTC
pub const OBSERVED_AT: i64 = 1714564800;

pub fn weather_response(temp: f64, deg: Option<f64>, description: &str) -> CurrentWeatherResponse {
    CurrentWeatherResponse {
        dt: OBSERVED_AT,
        main: MainBlock {
            temp,
            feels_like: temp - 0.7,
            humidity: 80.0,
            pressure: 1013.25,
        },
        wind: WindBlock { speed: 5.7, deg },
        weather: vec![WeatherCondition {
            id: Some(802),
            main: Some(String::from("Clouds")),
            description: description.to_string(),
        }],
        clouds: CloudsBlock { all: 75.0 },
        name: None,
    }
}

pub fn server_error() -> FetchError {
    FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn decode_error() -> FetchError {
    FetchError::Decode(serde_json::from_str::<CurrentWeatherResponse>("{}").unwrap_err())
}

/// Columns as a freshly provisioned table reports them.
pub fn stored_columns(table: &str) -> Vec<String> {
    let columns: &[&str] = if table == AGGREGATES_TABLE {
        &AGGREGATE_COLUMNS
    } else {
        &READING_COLUMNS
    };
    std::iter::once("id")
        .chain(columns.iter().copied())
        .map(String::from)
        .collect()
}

pub fn build_pipeline(
    fetcher: Arc<dyn WeatherFetcher>,
    store: Arc<dyn WeatherStore>,
    city_names: &[&str],
) -> Pipeline {
    let logger = test_logger();
    Pipeline::new(
        logger.clone(),
        Extractor::new(logger.clone(), fetcher, cities(city_names)),
        Transformer::new(UnitSystem::Metric),
        Loader::new(logger, store),
    )
}

mock! {
    pub Fetcher {}
    #[async_trait]
    impl WeatherFetcher for Fetcher {
        async fn current_weather(&self, city: &str) -> Result<CurrentWeatherResponse, FetchError>;
    }
}

mock! {
    pub Store {}
    #[async_trait]
    impl WeatherStore for Store {
        async fn ensure_schema(&self) -> Result<(), StoreError>;
        async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError>;
        async fn insert_readings(&self, readings: &[CleanedReading]) -> Result<u64, StoreError>;
        async fn insert_aggregates(&self, aggregates: &[DailyAggregate]) -> Result<u64, StoreError>;
        async fn row_counts(&self) -> Result<RowCounts, StoreError>;
        async fn recent_readings(
            &self,
            since: OffsetDateTime,
        ) -> Result<Vec<ReadingSnapshot>, StoreError>;
        async fn recent_aggregates(&self, since: Date) -> Result<Vec<DailyAggregate>, StoreError>;
    }
}
