use crate::helpers::test_logger;
use std::sync::Arc;
use time::macros::{date, datetime};
use weather_etl::{
    aggregate, CardinalDirection, CleanedReading, DuckDbStore, LoadStatus, Loader, RowCounts,
    WeatherStore,
};

fn reading(city: &str, observed_at: time::OffsetDateTime, temperature: f64) -> CleanedReading {
    CleanedReading {
        city: city.to_string(),
        observed_at,
        temperature,
        feels_like: temperature - 0.5,
        humidity: 80,
        pressure: 1013.25,
        wind_speed: 5.7,
        wind_direction_degrees: Some(180.0),
        wind_direction_cardinal: Some(CardinalDirection::S),
        description: String::from("partly cloudy"),
        cloud_cover: 75,
        temperature_celsius: temperature,
        ingested_at: datetime!(2024-05-01 12:05 UTC),
    }
}

fn readings() -> Vec<CleanedReading> {
    vec![
        reading("London,UK", datetime!(2024-05-01 12:00 UTC), 20.5),
        reading("Paris,FR", datetime!(2024-05-01 12:00 UTC), 22.25),
    ]
}

fn duckdb_loader() -> (Arc<DuckDbStore>, Loader) {
    let store = Arc::new(DuckDbStore::open_in_memory().unwrap());
    let loader = Loader::new(test_logger(), store.clone());
    (store, loader)
}

#[tokio::test]
async fn ensure_schema_twice_keeps_rows() {
    let (store, loader) = duckdb_loader();
    loader.ensure_schema().await.unwrap();
    store.insert_readings(&readings()).await.unwrap();
    let before = store.row_counts().await.unwrap();

    loader.ensure_schema().await.unwrap();
    loader.ensure_schema().await.unwrap();

    assert_eq!(store.row_counts().await.unwrap(), before);
    assert_eq!(before.readings, 2);
}

#[tokio::test]
async fn can_append_readings_into_fresh_store() {
    let (store, loader) = duckdb_loader();

    let status = loader.append_readings(&readings()).await;

    assert_eq!(status, LoadStatus::Loaded { rows: 2 });
    assert_eq!(
        store.row_counts().await.unwrap(),
        RowCounts {
            readings: 2,
            daily_aggregates: 0
        }
    );
}

#[tokio::test]
async fn appending_empty_batch_is_a_no_op() {
    let (store, loader) = duckdb_loader();
    assert_eq!(loader.append_readings(&[]).await, LoadStatus::Loaded { rows: 0 });
    assert_eq!(store.row_counts().await.unwrap().readings, 0);
}

#[tokio::test]
async fn aggregates_accumulate_across_runs() {
    let (store, loader) = duckdb_loader();
    let cleaned = readings();
    let daily = aggregate(&cleaned);

    for _ in 0..2 {
        assert!(loader.append_readings(&cleaned).await.is_success());
        assert_eq!(
            loader.append_aggregates(&daily).await,
            LoadStatus::Loaded { rows: 2 }
        );
    }

    let counts = store.row_counts().await.unwrap();
    assert_eq!(counts.readings, 4);
    assert_eq!(counts.daily_aggregates, 4);
}

#[tokio::test]
async fn column_mismatch_fails_only_that_table() {
    let (store, loader) = duckdb_loader();
    store
        .execute_batch(
            "CREATE TABLE readings (id BIGINT, city TEXT, observed_at TIMESTAMP, temperature DOUBLE);",
        )
        .await
        .unwrap();

    let cleaned = readings();
    let status = loader.append_readings(&cleaned).await;
    match status {
        LoadStatus::Failed { reason } => assert!(reason.contains("readings")),
        other => panic!("expected a failed load, got {:?}", other),
    }

    let daily = aggregate(&cleaned);
    assert_eq!(
        loader.append_aggregates(&daily).await,
        LoadStatus::Loaded { rows: 2 }
    );
}

#[tokio::test]
async fn aggregates_without_schema_fail() {
    let (_store, loader) = duckdb_loader();
    let daily = aggregate(&readings());
    assert!(!loader.append_aggregates(&daily).await.is_success());
}

#[tokio::test]
async fn can_read_back_recent_rows() {
    let (store, loader) = duckdb_loader();
    let mut cleaned = readings();
    cleaned.push(reading("London,UK", datetime!(2024-04-28 09:00 UTC), 11.0));
    loader.append_readings(&cleaned).await;
    loader.append_aggregates(&aggregate(&cleaned)).await;

    let recent = store
        .recent_readings(datetime!(2024-05-01 11:00 UTC))
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|r| r.observed_at == datetime!(2024-05-01 12:00 UTC)));
    assert!(recent.iter().any(|r| r.city == "Paris,FR" && r.temperature == 22.25));

    let days = store.recent_aggregates(date!(2024 - 04 - 30)).await.unwrap();
    assert_eq!(days.len(), 2);
    assert!(days.iter().all(|d| d.date == date!(2024 - 05 - 01)));
    let london = days.iter().find(|d| d.city == "London,UK").unwrap();
    assert_eq!(london.avg_temperature, 20.5);
}
