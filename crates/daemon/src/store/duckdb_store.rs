use super::{
    StoreError, WeatherStore, AGGREGATES_TABLE, AGGREGATE_COLUMNS, READINGS_TABLE,
    READING_COLUMNS,
};
use crate::{CleanedReading, DailyAggregate, ReadingSnapshot, RowCounts};
use async_trait::async_trait;
use duckdb::{params, Connection};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    UtcOffset,
};
use tokio::sync::Mutex;

/// Embedded store, timestamps are kept as UTC `TIMESTAMP` columns.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    pub fn open(path: &str) -> Result<Self, duckdb::Error> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, duckdb::Error> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs raw sql against the underlying connection.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

fn format_timestamp(value: OffsetDateTime) -> Result<String, StoreError> {
    let description =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
    Ok(value.to_offset(UtcOffset::UTC).format(description)?)
}

fn format_date(value: Date) -> Result<String, StoreError> {
    Ok(value.format(format_description!("[year]-[month]-[day]"))?)
}

fn parse_date(value: &str) -> Result<Date, StoreError> {
    Ok(Date::parse(value, format_description!("[year]-[month]-[day]"))?)
}

fn insert_statement(table: &str, columns: &[&str], casts: &[(&str, &str)]) -> String {
    let placeholders: Vec<String> = columns
        .iter()
        .map(|column| match casts.iter().find(|(name, _)| name == column) {
            Some((_, sql_type)) => format!("CAST(? AS {})", sql_type),
            None => String::from("?"),
        })
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

#[async_trait]
impl WeatherStore for DuckDbStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let schema = r#"
        CREATE SEQUENCE IF NOT EXISTS readings_id_sequence START 1;
        CREATE TABLE IF NOT EXISTS readings
        (
            id BIGINT DEFAULT nextval('readings_id_sequence') PRIMARY KEY,
            city TEXT NOT NULL,
            observed_at TIMESTAMP NOT NULL,
            temperature DOUBLE NOT NULL,
            feels_like DOUBLE NOT NULL,
            humidity INTEGER NOT NULL,
            pressure DOUBLE NOT NULL,
            wind_speed DOUBLE NOT NULL,
            wind_direction_degrees DOUBLE,
            wind_direction_cardinal TEXT,
            description TEXT NOT NULL,
            cloud_cover INTEGER NOT NULL,
            temperature_celsius DOUBLE NOT NULL,
            ingested_at TIMESTAMP NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS daily_aggregates_id_sequence START 1;
        CREATE TABLE IF NOT EXISTS daily_aggregates
        (
            id BIGINT DEFAULT nextval('daily_aggregates_id_sequence') PRIMARY KEY,
            city TEXT NOT NULL,
            date DATE NOT NULL,
            avg_temperature DOUBLE NOT NULL,
            min_temperature DOUBLE NOT NULL,
            max_temperature DOUBLE NOT NULL,
            avg_humidity DOUBLE NOT NULL,
            avg_pressure DOUBLE NOT NULL,
            avg_wind_speed DOUBLE NOT NULL
        );
        "#;
        let conn = self.conn.lock().await;
        conn.execute_batch(schema)?;
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = ? \
             ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map(params![table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, duckdb::Error>>()?;
        Ok(columns)
    }

    async fn insert_readings(&self, readings: &[CleanedReading]) -> Result<u64, StoreError> {
        if readings.is_empty() {
            return Ok(0);
        }
        let query = insert_statement(
            READINGS_TABLE,
            &READING_COLUMNS,
            &[("observed_at", "TIMESTAMP"), ("ingested_at", "TIMESTAMP")],
        );
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&query)?;
            for reading in readings {
                inserted += stmt.execute(params![
                    reading.city,
                    format_timestamp(reading.observed_at)?,
                    reading.temperature,
                    reading.feels_like,
                    reading.humidity,
                    reading.pressure,
                    reading.wind_speed,
                    reading.wind_direction_degrees,
                    reading.wind_direction_cardinal.map(|c| c.as_str()),
                    reading.description,
                    reading.cloud_cover,
                    reading.temperature_celsius,
                    format_timestamp(reading.ingested_at)?,
                ])? as u64;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    async fn insert_aggregates(&self, aggregates: &[DailyAggregate]) -> Result<u64, StoreError> {
        if aggregates.is_empty() {
            return Ok(0);
        }
        let query = insert_statement(AGGREGATES_TABLE, &AGGREGATE_COLUMNS, &[("date", "DATE")]);
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&query)?;
            for aggregate in aggregates {
                inserted += stmt.execute(params![
                    aggregate.city,
                    format_date(aggregate.date)?,
                    aggregate.avg_temperature,
                    aggregate.min_temperature,
                    aggregate.max_temperature,
                    aggregate.avg_humidity,
                    aggregate.avg_pressure,
                    aggregate.avg_wind_speed,
                ])? as u64;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    async fn row_counts(&self) -> Result<RowCounts, StoreError> {
        let conn = self.conn.lock().await;
        let readings: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
        let daily_aggregates: i64 =
            conn.query_row("SELECT COUNT(*) FROM daily_aggregates", [], |row| row.get(0))?;
        Ok(RowCounts {
            readings,
            daily_aggregates,
        })
    }

    async fn recent_readings(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<ReadingSnapshot>, StoreError> {
        let since = format_timestamp(since)?;
        let rows: Vec<(String, String, f64, i32, String)> = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "SELECT city, strftime(observed_at, '%Y-%m-%dT%H:%M:%SZ'), temperature, humidity, description \
                 FROM readings \
                 WHERE observed_at >= CAST(? AS TIMESTAMP) \
                 ORDER BY observed_at DESC",
            )?;
            let rows = stmt
                .query_map(params![since], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                })?
                .collect::<Result<Vec<_>, duckdb::Error>>()?;
            rows
        };

        rows.into_iter()
            .map(|(city, observed_at, temperature, humidity, description)| {
                Ok(ReadingSnapshot {
                    city,
                    observed_at: OffsetDateTime::parse(&observed_at, &Rfc3339)?,
                    temperature,
                    humidity,
                    description,
                })
            })
            .collect()
    }

    async fn recent_aggregates(&self, since: Date) -> Result<Vec<DailyAggregate>, StoreError> {
        let since = format_date(since)?;
        let rows: Vec<(String, String, f64, f64, f64, f64, f64, f64)> = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "SELECT city, CAST(date AS VARCHAR), avg_temperature, min_temperature, max_temperature, \
                        avg_humidity, avg_pressure, avg_wind_speed \
                 FROM daily_aggregates \
                 WHERE date >= CAST(? AS DATE) \
                 ORDER BY date DESC, id DESC",
            )?;
            let rows = stmt
                .query_map(params![since], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                    ))
                })?
                .collect::<Result<Vec<_>, duckdb::Error>>()?;
            rows
        };

        rows.into_iter()
            .map(|(city, date, avg_t, min_t, max_t, avg_h, avg_p, avg_w)| {
                Ok(DailyAggregate {
                    city,
                    date: parse_date(&date)?,
                    avg_temperature: avg_t,
                    min_temperature: min_t,
                    max_temperature: max_t,
                    avg_humidity: avg_h,
                    avg_pressure: avg_p,
                    avg_wind_speed: avg_w,
                })
            })
            .collect()
    }
}
