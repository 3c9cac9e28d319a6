use crate::{ApiSettings, CurrentWeatherResponse, InvalidReading, RawReading, UnitSystem};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use slog::{debug, info, warn, Logger};
use std::{sync::Arc, time::Duration};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("error sending request: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("error response from request: {0}")]
    Status(StatusCode),
    #[error("error reading body of request: {0}")]
    Body(#[from] reqwest::Error),
    #[error("error decoding body of request: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Network and http status failures only cost the city its reading for this cycle,
    /// a body that no longer matches the expected payload is surfaced.
    pub fn skips_city(&self) -> bool {
        !matches!(self, FetchError::Decode(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("malformed response for {city}: {source}")]
    Malformed { city: String, source: FetchError },
    #[error("invalid reading for {city}: {source}")]
    Invalid { city: String, source: InvalidReading },
}

#[async_trait]
pub trait WeatherFetcher: Sync + Send {
    async fn current_weather(&self, city: &str) -> Result<CurrentWeatherResponse, FetchError>;
}

pub struct OpenWeatherClient {
    logger: Logger,
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    units: UnitSystem,
}

impl OpenWeatherClient {
    pub fn new(logger: Logger, settings: &ApiSettings) -> Result<Self, reqwest::Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);
        let client = ClientBuilder::new(
            Client::builder()
                .user_agent(concat!("weather-etl/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()?,
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Ok(Self {
            logger,
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            units: settings.units,
        })
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn current_weather(&self, city: &str) -> Result<CurrentWeatherResponse, FetchError> {
        // the url carries the api key, only the city is logged
        debug!(self.logger, "requesting current weather: {}", city);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

pub struct Extractor {
    logger: Logger,
    fetcher: Arc<dyn WeatherFetcher>,
    cities: Vec<String>,
}

impl Extractor {
    pub fn new(logger: Logger, fetcher: Arc<dyn WeatherFetcher>, cities: Vec<String>) -> Self {
        Extractor {
            logger,
            fetcher,
            cities,
        }
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Fetches one reading per configured city, in order.
    ///
    /// Cities whose request fails at the transport or http level are logged and left out,
    /// so the result may be shorter than the city list or empty. A response that can't be
    /// turned into a reading is returned as an error for the whole batch.
    pub async fn extract(&self) -> Result<Vec<RawReading>, ExtractError> {
        let mut readings = Vec::with_capacity(self.cities.len());
        for city in &self.cities {
            match self.fetcher.current_weather(city).await {
                Ok(response) => {
                    let reading = RawReading::from_response(city, response).map_err(|source| {
                        ExtractError::Invalid {
                            city: city.clone(),
                            source,
                        }
                    })?;
                    readings.push(reading);
                }
                Err(err) if err.skips_city() => {
                    warn!(self.logger, "error fetching data for {}, skipping: {}", city, err);
                }
                Err(source) => {
                    return Err(ExtractError::Malformed {
                        city: city.clone(),
                        source,
                    })
                }
            }
        }
        info!(
            self.logger,
            "extracted {} of {} cities",
            readings.len(),
            self.cities.len()
        );
        Ok(readings)
    }
}
