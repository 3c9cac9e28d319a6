use crate::helpers::{
    build_pipeline, decode_error, server_error, test_logger, MockFetcher, MockStore,
};
use async_trait::async_trait;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use weather_etl::{CurrentWeatherResponse, CycleReport, FetchError, Scheduler, WeatherFetcher};

const EVERY: Duration = Duration::from_secs(30 * 60);

fn quiet_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_ensure_schema().never();
    store.expect_insert_readings().never();
    store.expect_insert_aggregates().never();
    store
}

/// Panics on the first call, then behaves like an unavailable api.
struct PanickingFetcher {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl WeatherFetcher for PanickingFetcher {
    async fn current_weather(&self, _city: &str) -> Result<CurrentWeatherResponse, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first fetch blew up");
        }
        Err(server_error())
    }
}

#[tokio::test(start_paused = true)]
async fn runs_immediately_then_every_period() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_current_weather()
        .times(3)
        .returning(|_| Err(server_error()));

    let pipeline = build_pipeline(Arc::new(fetcher), Arc::new(quiet_store()), &["London,UK"]);
    let scheduler = Scheduler::new(test_logger(), pipeline, EVERY);

    // ticks at 0, 30 and 60 minutes
    scheduler
        .run_until(tokio::time::sleep(Duration::from_secs(61 * 60)))
        .await;
}

#[tokio::test(start_paused = true)]
async fn keeps_running_after_failed_cycle() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_current_weather()
        .times(2)
        .returning(|_| Err(decode_error()));

    let pipeline = build_pipeline(Arc::new(fetcher), Arc::new(quiet_store()), &["London,UK"]);
    let scheduler = Scheduler::new(test_logger(), pipeline, EVERY);

    scheduler
        .run_until(tokio::time::sleep(Duration::from_secs(31 * 60)))
        .await;
}

#[tokio::test(start_paused = true)]
async fn survives_panicking_cycle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = PanickingFetcher {
        calls: calls.clone(),
    };

    let pipeline = build_pipeline(Arc::new(fetcher), Arc::new(quiet_store()), &["London,UK"]);
    let scheduler = Scheduler::new(test_logger(), pipeline, EVERY);

    assert_eq!(scheduler.run_once().await, None);
    scheduler
        .run_until(tokio::time::sleep(Duration::from_secs(31 * 60)))
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn run_once_reports_cycle() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_current_weather()
        .times(1)
        .returning(|_| Err(server_error()));

    let pipeline = build_pipeline(Arc::new(fetcher), Arc::new(quiet_store()), &["London,UK"]);
    let scheduler = Scheduler::new(test_logger(), pipeline, EVERY);

    assert_eq!(scheduler.run_once().await, Some(CycleReport::NoData));
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_first_tick_runs_nothing() {
    let mut fetcher = MockFetcher::new();
    fetcher.expect_current_weather().never();

    let pipeline = build_pipeline(Arc::new(fetcher), Arc::new(quiet_store()), &["London,UK"]);
    let scheduler = Scheduler::new(test_logger(), pipeline, EVERY);

    scheduler.run_until(std::future::ready(())).await;
}
