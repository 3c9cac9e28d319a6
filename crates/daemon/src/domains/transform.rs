use crate::{CardinalDirection, CleanedReading, DailyAggregate, RawReading, UnitSystem};
use std::collections::BTreeMap;
use time::{Date, OffsetDateTime};

/// Rounds to 2 decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub struct Transformer {
    units: UnitSystem,
}

impl Transformer {
    pub fn new(units: UnitSystem) -> Self {
        Transformer { units }
    }

    pub fn clean(&self, raw: &[RawReading]) -> Vec<CleanedReading> {
        self.clean_at(raw, OffsetDateTime::now_utc())
    }

    /// Cleans every reading, stamping all of them with the same `ingested_at`.
    pub fn clean_at(&self, raw: &[RawReading], ingested_at: OffsetDateTime) -> Vec<CleanedReading> {
        raw.iter()
            .map(|reading| {
                let temperature = round2(reading.temperature);
                CleanedReading {
                    city: reading.city.clone(),
                    observed_at: reading.observed_at,
                    temperature,
                    feels_like: round2(reading.feels_like),
                    humidity: reading.humidity as i32,
                    pressure: round2(reading.pressure),
                    wind_speed: round2(reading.wind_speed),
                    wind_direction_degrees: reading.wind_direction_degrees,
                    wind_direction_cardinal: reading
                        .wind_direction_degrees
                        .map(CardinalDirection::from_degrees),
                    description: reading.description.to_lowercase(),
                    cloud_cover: reading.cloud_cover as i32,
                    temperature_celsius: round2(self.units.to_celsius(temperature)),
                    ingested_at,
                }
            })
            .collect()
    }
}

#[derive(Default)]
struct DayTotals {
    count: usize,
    temperature_sum: f64,
    temperature_min: f64,
    temperature_max: f64,
    humidity_sum: f64,
    pressure_sum: f64,
    wind_speed_sum: f64,
}

impl DayTotals {
    fn add(&mut self, reading: &CleanedReading) {
        if self.count == 0 {
            self.temperature_min = reading.temperature;
            self.temperature_max = reading.temperature;
        } else {
            self.temperature_min = self.temperature_min.min(reading.temperature);
            self.temperature_max = self.temperature_max.max(reading.temperature);
        }
        self.count += 1;
        self.temperature_sum += reading.temperature;
        self.humidity_sum += f64::from(reading.humidity);
        self.pressure_sum += reading.pressure;
        self.wind_speed_sum += reading.wind_speed;
    }

    fn into_aggregate(self, city: String, date: Date) -> DailyAggregate {
        let count = self.count as f64;
        DailyAggregate {
            city,
            date,
            avg_temperature: round2(self.temperature_sum / count),
            min_temperature: round2(self.temperature_min),
            max_temperature: round2(self.temperature_max),
            avg_humidity: round2(self.humidity_sum / count),
            avg_pressure: round2(self.pressure_sum / count),
            avg_wind_speed: round2(self.wind_speed_sum / count),
        }
    }
}

/// Groups readings by city and UTC calendar day of `observed_at`, one aggregate per group,
/// ordered by city then date.
pub fn aggregate(cleaned: &[CleanedReading]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<(String, Date), DayTotals> = BTreeMap::new();
    for reading in cleaned {
        groups
            .entry((reading.city.clone(), reading.observed_on()))
            .or_default()
            .add(reading);
    }
    groups
        .into_iter()
        .map(|((city, date), totals)| totals.into_aggregate(city, date))
        .collect()
}
