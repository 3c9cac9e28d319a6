pub mod duckdb_store;
pub mod postgres_store;

pub use duckdb_store::DuckDbStore;
pub use postgres_store::PostgresStore;

use crate::{
    CleanedReading, DailyAggregate, DatabaseSettings, ReadingSnapshot, RowCounts, StoreBackend,
};
use async_trait::async_trait;
use std::sync::Arc;
use time::{Date, OffsetDateTime};

pub const READINGS_TABLE: &str = "readings";
pub const AGGREGATES_TABLE: &str = "daily_aggregates";

/// Columns of `readings` after the generated `id`, in table order.
pub const READING_COLUMNS: [&str; 13] = [
    "city",
    "observed_at",
    "temperature",
    "feels_like",
    "humidity",
    "pressure",
    "wind_speed",
    "wind_direction_degrees",
    "wind_direction_cardinal",
    "description",
    "cloud_cover",
    "temperature_celsius",
    "ingested_at",
];

/// Columns of `daily_aggregates` after the generated `id`, in table order.
pub const AGGREGATE_COLUMNS: [&str; 8] = [
    "city",
    "date",
    "avg_temperature",
    "min_temperature",
    "max_temperature",
    "avg_humidity",
    "avg_pressure",
    "avg_wind_speed",
];

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to query postgres: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("Failed to query duckdb: {0}")]
    DuckDb(#[from] duckdb::Error),
    #[error("Failed to format time: {0}")]
    TimeFormat(#[from] time::error::Format),
    #[error("Failed to parse time: {0}")]
    TimeParse(#[from] time::error::Parse),
    #[error("Table {table} has columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Append-only access to the `readings` and `daily_aggregates` tables.
#[async_trait]
pub trait WeatherStore: Sync + Send {
    /// Creates both tables when missing, leaves existing tables and rows alone.
    async fn ensure_schema(&self) -> Result<(), StoreError>;
    /// Column names of `table` in ordinal order, empty when the table doesn't exist.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError>;
    async fn insert_readings(&self, readings: &[CleanedReading]) -> Result<u64, StoreError>;
    async fn insert_aggregates(&self, aggregates: &[DailyAggregate]) -> Result<u64, StoreError>;
    async fn row_counts(&self) -> Result<RowCounts, StoreError>;
    /// Readings observed at or after `since`, newest first.
    async fn recent_readings(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ReadingSnapshot>, StoreError>;
    /// Aggregates dated on or after `since`, newest first.
    async fn recent_aggregates(&self, since: Date) -> Result<Vec<DailyAggregate>, StoreError>;
}

pub fn open_store(settings: &DatabaseSettings) -> Result<Arc<dyn WeatherStore>, StoreError> {
    match settings.backend {
        StoreBackend::Postgres => Ok(Arc::new(PostgresStore::connect_lazy(settings)?)),
        StoreBackend::DuckDb => {
            let store = match settings.duckdb_path.as_deref() {
                Some(path) => DuckDbStore::open(path)?,
                None => DuckDbStore::open_in_memory()?,
            };
            Ok(Arc::new(store))
        }
    }
}
