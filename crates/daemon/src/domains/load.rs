use crate::{
    CleanedReading, DailyAggregate, StoreError, WeatherStore, AGGREGATES_TABLE,
    AGGREGATE_COLUMNS, READINGS_TABLE, READING_COLUMNS,
};
use slog::{error, info, Logger};
use std::{fmt, sync::Arc};

/// Outcome of one append; failures are already logged when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded { rows: u64 },
    Failed { reason: String },
}

impl LoadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. })
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loaded { rows } => write!(f, "loaded {} rows", rows),
            LoadStatus::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

pub struct Loader {
    logger: Logger,
    store: Arc<dyn WeatherStore>,
}

impl Loader {
    pub fn new(logger: Logger, store: Arc<dyn WeatherStore>) -> Self {
        Loader { logger, store }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.store.ensure_schema().await
    }

    /// Makes sure the schema exists, then appends the readings.
    pub async fn append_readings(&self, readings: &[CleanedReading]) -> LoadStatus {
        let result = async {
            self.ensure_schema().await?;
            self.verify_columns(READINGS_TABLE, &READING_COLUMNS).await?;
            self.store.insert_readings(readings).await
        }
        .await;
        self.report(READINGS_TABLE, result)
    }

    pub async fn append_aggregates(&self, aggregates: &[DailyAggregate]) -> LoadStatus {
        let result = async {
            self.verify_columns(AGGREGATES_TABLE, &AGGREGATE_COLUMNS)
                .await?;
            self.store.insert_aggregates(aggregates).await
        }
        .await;
        self.report(AGGREGATES_TABLE, result)
    }

    /// Compares the stored column order (ignoring the generated `id`) with what gets inserted.
    async fn verify_columns(&self, table: &str, expected: &[&str]) -> Result<(), StoreError> {
        let found: Vec<String> = self
            .store
            .table_columns(table)
            .await?
            .into_iter()
            .filter(|column| column != "id")
            .collect();
        if found.iter().map(String::as_str).eq(expected.iter().copied()) {
            Ok(())
        } else {
            Err(StoreError::SchemaMismatch {
                table: table.to_string(),
                expected: expected.iter().map(|c| c.to_string()).collect(),
                found,
            })
        }
    }

    fn report(&self, table: &str, result: Result<u64, StoreError>) -> LoadStatus {
        match result {
            Ok(rows) => {
                info!(self.logger, "loaded {} rows into {}", rows, table);
                LoadStatus::Loaded { rows }
            }
            Err(e) => {
                error!(self.logger, "error loading data into {}: {}", table, e);
                LoadStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
