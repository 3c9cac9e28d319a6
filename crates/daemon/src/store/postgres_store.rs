use super::{
    StoreError, WeatherStore, AGGREGATES_TABLE, AGGREGATE_COLUMNS, READINGS_TABLE,
    READING_COLUMNS,
};
use crate::{CleanedReading, DailyAggregate, DatabaseSettings, ReadingSnapshot, RowCounts};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use time::{Date, OffsetDateTime};

// postgres allows 65535 bind parameters per statement
const INSERT_BATCH_ROWS: usize = 1000;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Builds the pool without connecting, the first query opens the connection.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(&settings.connection_url())?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WeatherStore for PostgresStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id                      BIGSERIAL PRIMARY KEY,
                city                    TEXT             NOT NULL,
                observed_at             TIMESTAMPTZ      NOT NULL,
                temperature             DOUBLE PRECISION NOT NULL,
                feels_like              DOUBLE PRECISION NOT NULL,
                humidity                INTEGER          NOT NULL,
                pressure                DOUBLE PRECISION NOT NULL,
                wind_speed              DOUBLE PRECISION NOT NULL,
                wind_direction_degrees  DOUBLE PRECISION,
                wind_direction_cardinal TEXT,
                description             TEXT             NOT NULL,
                cloud_cover             INTEGER          NOT NULL,
                temperature_celsius     DOUBLE PRECISION NOT NULL,
                ingested_at             TIMESTAMPTZ      NOT NULL
            );
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_aggregates (
                id              BIGSERIAL PRIMARY KEY,
                city            TEXT             NOT NULL,
                date            DATE             NOT NULL,
                avg_temperature DOUBLE PRECISION NOT NULL,
                min_temperature DOUBLE PRECISION NOT NULL,
                max_temperature DOUBLE PRECISION NOT NULL,
                avg_humidity    DOUBLE PRECISION NOT NULL,
                avg_pressure    DOUBLE PRECISION NOT NULL,
                avg_wind_speed  DOUBLE PRECISION NOT NULL
            );
            "#,
        )
        .execute(&mut *tx)
        .await?;

        // dashboards read by time window per city
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_readings_city_observed_at
                ON readings (city, observed_at);
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_daily_aggregates_city_date
                ON daily_aggregates (city, date);
            "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let columns = sqlx::query_scalar::<_, String>(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(columns)
    }

    async fn insert_readings(&self, readings: &[CleanedReading]) -> Result<u64, StoreError> {
        if readings.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in readings.chunks(INSERT_BATCH_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                READINGS_TABLE,
                READING_COLUMNS.join(", ")
            ));
            builder.push_values(chunk, |mut row, reading| {
                row.push_bind(reading.city.clone())
                    .push_bind(reading.observed_at)
                    .push_bind(reading.temperature)
                    .push_bind(reading.feels_like)
                    .push_bind(reading.humidity)
                    .push_bind(reading.pressure)
                    .push_bind(reading.wind_speed)
                    .push_bind(reading.wind_direction_degrees)
                    .push_bind(reading.wind_direction_cardinal.map(|c| c.as_str()))
                    .push_bind(reading.description.clone())
                    .push_bind(reading.cloud_cover)
                    .push_bind(reading.temperature_celsius)
                    .push_bind(reading.ingested_at);
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn insert_aggregates(&self, aggregates: &[DailyAggregate]) -> Result<u64, StoreError> {
        if aggregates.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in aggregates.chunks(INSERT_BATCH_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                AGGREGATES_TABLE,
                AGGREGATE_COLUMNS.join(", ")
            ));
            builder.push_values(chunk, |mut row, aggregate| {
                row.push_bind(aggregate.city.clone())
                    .push_bind(aggregate.date)
                    .push_bind(aggregate.avg_temperature)
                    .push_bind(aggregate.min_temperature)
                    .push_bind(aggregate.max_temperature)
                    .push_bind(aggregate.avg_humidity)
                    .push_bind(aggregate.avg_pressure)
                    .push_bind(aggregate.avg_wind_speed);
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn row_counts(&self) -> Result<RowCounts, StoreError> {
        let readings = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM readings")
            .fetch_one(&self.pool)
            .await?;
        let daily_aggregates = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM daily_aggregates")
            .fetch_one(&self.pool)
            .await?;
        Ok(RowCounts {
            readings,
            daily_aggregates,
        })
    }

    async fn recent_readings(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ReadingSnapshot>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT city, observed_at, temperature, humidity, description
            FROM readings
            WHERE observed_at >= $1
            ORDER BY observed_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            readings.push(ReadingSnapshot {
                city: row.try_get("city")?,
                observed_at: row.try_get("observed_at")?,
                temperature: row.try_get("temperature")?,
                humidity: row.try_get("humidity")?,
                description: row.try_get("description")?,
            });
        }
        Ok(readings)
    }

    async fn recent_aggregates(&self, since: Date) -> Result<Vec<DailyAggregate>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT city, date, avg_temperature, min_temperature, max_temperature,
                   avg_humidity, avg_pressure, avg_wind_speed
            FROM daily_aggregates
            WHERE date >= $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut aggregates = Vec::with_capacity(rows.len());
        for row in rows {
            aggregates.push(DailyAggregate {
                city: row.try_get("city")?,
                date: row.try_get("date")?,
                avg_temperature: row.try_get("avg_temperature")?,
                min_temperature: row.try_get("min_temperature")?,
                max_temperature: row.try_get("max_temperature")?,
                avg_humidity: row.try_get("avg_humidity")?,
                avg_pressure: row.try_get("avg_pressure")?,
                avg_wind_speed: row.try_get("avg_wind_speed")?,
            });
        }
        Ok(aggregates)
    }
}
