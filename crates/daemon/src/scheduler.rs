use crate::{CycleReport, Pipeline};
use slog::{error, info, Logger};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};

/// Runs the pipeline right away and then once per period, never two cycles at a time.
pub struct Scheduler {
    logger: Logger,
    pipeline: Arc<Pipeline>,
    every: Duration,
}

impl Scheduler {
    pub fn new(logger: Logger, pipeline: Pipeline, every: Duration) -> Self {
        Scheduler {
            logger,
            pipeline: Arc::new(pipeline),
            every,
        }
    }

    pub async fn run_forever(&self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Ticks until `shutdown` resolves. A running cycle is always finished first.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            self.logger,
            "scheduled to run every {} minutes",
            self.every.as_secs() / 60
        );
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(self.logger, "shutting down scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// Runs one cycle in its own task so that neither an error nor a panic reaches the loop.
    pub async fn run_once(&self) -> Option<CycleReport> {
        let pipeline = Arc::clone(&self.pipeline);
        match tokio::spawn(async move { pipeline.run_cycle().await }).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                error!(self.logger, "error in etl pipeline: {}", e);
                None
            }
            Err(e) => {
                error!(self.logger, "etl pipeline task aborted: {}", e);
                None
            }
        }
    }
}
