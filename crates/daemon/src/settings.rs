use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::{env, fmt, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

pub const DEFAULT_CITIES: [&str; 6] = [
    "London,UK",
    "New York,US",
    "Tokyo,JP",
    "Paris,FR",
    "Sydney,AU",
    "Kuala Lumpur,MY",
];

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Unit system requested from the weather api, sent verbatim as the `units` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Celsius, meter/sec
    #[default]
    Metric,
    /// Fahrenheit, miles/hour
    Imperial,
    /// Kelvin, meter/sec
    Standard,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Standard => "standard",
        }
    }

    /// Converts a temperature reported in this unit system to degrees Celsius.
    pub fn to_celsius(&self, temperature: f64) -> f64 {
        match self {
            UnitSystem::Metric => temperature,
            UnitSystem::Imperial => (temperature - 32.0) * 5.0 / 9.0,
            UnitSystem::Standard => temperature - 273.15,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Deserialize)]
pub struct ApiSettings {
    pub api_key: String,
    pub base_url: String,
    pub units: UnitSystem,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    pub update_frequency_minutes: u64,
}

impl ScheduleSettings {
    pub fn every(&self) -> Duration {
        Duration::from_secs(self.update_frequency_minutes * 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    DuckDb,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    pub backend: StoreBackend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Database file used by the duckdb backend, in-memory when absent
    pub duckdb_path: Option<String>,
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("duckdb_path", &self.duckdb_path)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub cities: Vec<String>,
    pub api: ApiSettings,
    pub schedule: ScheduleSettings,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Builds the settings from defaults, an optional toml file, `WEATHER_ETL__*`
    /// variables and finally the conventional `OPENWEATHERMAP_API_KEY`/`DB_*` variables.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("cities", DEFAULT_CITIES.to_vec())?
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.units", UnitSystem::Metric.as_str())?
            .set_default("api.timeout_secs", 10)?
            .set_default("api.max_retries", 0)?
            .set_default("schedule.update_frequency_minutes", 30)?
            .set_default("database.backend", "postgres")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "")?
            .set_default("database.database", "weather_data")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("WEATHER_ETL")
                    .separator("__")
                    .list_separator(";")
                    .with_list_parse_key("cities")
                    .try_parsing(true),
            )
            .set_override_option("api.api_key", env::var("OPENWEATHERMAP_API_KEY").ok())?
            .set_override_option("database.host", env::var("DB_HOST").ok())?
            .set_override_option("database.port", env::var("DB_PORT").ok())?
            .set_override_option("database.database", env::var("DB_NAME").ok())?
            .set_override_option("database.user", env::var("DB_USER").ok())?
            .set_override_option("database.password", env::var("DB_PASSWORD").ok())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from("api.api_key must not be empty")));
        }
        if self.schedule.update_frequency_minutes == 0 {
            return Err(ConfigError::Invalid(String::from(
                "schedule.update_frequency_minutes must be greater than zero",
            )));
        }
        Ok(())
    }
}
