use crate::{CardinalDirection, CurrentWeatherResponse};
use time::{Date, OffsetDateTime};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum InvalidReading {
    #[error("observation timestamp {0} is out of range")]
    Timestamp(i64),
    #[error("{field} of {value} is outside [0, 100]")]
    Percentage { field: &'static str, value: f64 },
    #[error("wind direction of {0} degrees is outside [0, 360]")]
    WindDirection(f64),
    #[error("weather conditions are empty, no description available")]
    MissingDescription,
}

/// One reading per city per successful extraction, as reported by the api.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub city: String,
    pub observed_at: OffsetDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction_degrees: Option<f64>,
    pub description: String,
    pub cloud_cover: f64,
}

impl RawReading {
    pub fn from_response(
        city: &str,
        response: CurrentWeatherResponse,
    ) -> Result<Self, InvalidReading> {
        let observed_at = OffsetDateTime::from_unix_timestamp(response.dt)
            .map_err(|_| InvalidReading::Timestamp(response.dt))?;
        check_percentage("humidity", response.main.humidity)?;
        check_percentage("cloud cover", response.clouds.all)?;
        if let Some(degrees) = response.wind.deg {
            if !(0.0..=360.0).contains(&degrees) {
                return Err(InvalidReading::WindDirection(degrees));
            }
        }
        let description = response
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or(InvalidReading::MissingDescription)?;

        Ok(RawReading {
            city: city.to_string(),
            observed_at,
            temperature: response.main.temp,
            feels_like: response.main.feels_like,
            humidity: response.main.humidity,
            pressure: response.main.pressure,
            wind_speed: response.wind.speed,
            wind_direction_degrees: response.wind.deg,
            description,
            cloud_cover: response.clouds.all,
        })
    }
}

fn check_percentage(field: &'static str, value: f64) -> Result<(), InvalidReading> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(InvalidReading::Percentage { field, value })
    }
}

/// A raw reading after cleaning, the shape of a row in the `readings` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedReading {
    pub city: String,
    pub observed_at: OffsetDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction_degrees: Option<f64>,
    pub wind_direction_cardinal: Option<CardinalDirection>,
    pub description: String,
    pub cloud_cover: i32,
    pub temperature_celsius: f64,
    /// When the pipeline processed the reading, not when it was observed
    pub ingested_at: OffsetDateTime,
}

impl CleanedReading {
    pub fn observed_on(&self) -> Date {
        self.observed_at.to_offset(time::UtcOffset::UTC).date()
    }
}

impl From<&CleanedReading> for RawReading {
    fn from(value: &CleanedReading) -> Self {
        RawReading {
            city: value.city.clone(),
            observed_at: value.observed_at,
            temperature: value.temperature,
            feels_like: value.feels_like,
            humidity: f64::from(value.humidity),
            pressure: value.pressure,
            wind_speed: value.wind_speed,
            wind_direction_degrees: value.wind_direction_degrees,
            description: value.description.clone(),
            cloud_cover: f64::from(value.cloud_cover),
        }
    }
}

/// Per city, per UTC calendar day summary of cleaned readings.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub city: String,
    pub date: Date,
    pub avg_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub avg_humidity: f64,
    pub avg_pressure: f64,
    pub avg_wind_speed: f64,
}

/// Short view of a stored reading, used by the inspection tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSnapshot {
    pub city: String,
    pub observed_at: OffsetDateTime,
    pub temperature: f64,
    pub humidity: i32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub readings: i64,
    pub daily_aggregates: i64,
}
