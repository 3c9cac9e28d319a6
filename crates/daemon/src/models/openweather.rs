use serde::{Deserialize, Serialize};

// current weather for one city
// http://api.openweathermap.org/data/2.5/weather?q=London,UK&appid=...&units=metric
// only the fields the pipeline reads are modelled, everything else is ignored

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    /// Observation time, unix epoch seconds (UTC)
    pub dt: i64,
    pub main: MainBlock,
    pub wind: WindBlock,
    pub weather: Vec<WeatherCondition>,
    pub clouds: CloudsBlock,
    pub name: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindBlock {
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudsBlock {
    pub all: f64,
}
