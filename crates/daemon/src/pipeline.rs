use crate::{aggregate, ExtractError, Extractor, LoadStatus, Loader, Transformer};
use slog::{debug, info, Logger};

#[derive(thiserror::Error, Debug)]
pub enum CycleError {
    #[error("Failed to extract weather data: {0}")]
    Extract(#[from] ExtractError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// No city produced a reading, nothing was transformed or loaded
    NoData,
    Completed {
        extracted: usize,
        readings: LoadStatus,
        aggregates: LoadStatus,
    },
}

/// One extract, transform, load pass.
pub struct Pipeline {
    logger: Logger,
    extractor: Extractor,
    transformer: Transformer,
    loader: Loader,
}

impl Pipeline {
    pub fn new(
        logger: Logger,
        extractor: Extractor,
        transformer: Transformer,
        loader: Loader,
    ) -> Self {
        Pipeline {
            logger,
            extractor,
            transformer,
            loader,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        info!(self.logger, "starting etl cycle");

        let raw = self.extractor.extract().await?;
        if raw.is_empty() {
            info!(self.logger, "no data extracted, skipping remaining steps");
            return Ok(CycleReport::NoData);
        }

        let cleaned = self.transformer.clean(&raw);
        let daily = aggregate(&cleaned);
        debug!(
            self.logger,
            "transformed {} readings into {} daily aggregates",
            cleaned.len(),
            daily.len()
        );

        // the aggregates are appended even when the readings failed to load
        let readings = self.loader.append_readings(&cleaned).await;
        let aggregates = self.loader.append_aggregates(&daily).await;

        info!(
            self.logger,
            "etl cycle completed, readings {}, daily aggregates {}", readings, aggregates
        );
        Ok(CycleReport::Completed {
            extracted: raw.len(),
            readings,
            aggregates,
        })
    }
}
