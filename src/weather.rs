use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

const WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub city: String,
    pub temperature: i32,
    pub conditions: String,
    pub rain_probability: Vec<u8>,
    pub forecast_hours: usize,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    name: String,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    #[serde(default)]
    pop: Option<f64>,
}

/// Builds [`WeatherData`] from the raw `weather` and `forecast` response bodies.
pub fn parse_weather(current: &str, forecast: &str, hours: usize) -> Result<WeatherData> {
    let current: CurrentResponse =
        serde_json::from_str(current).context("invalid current weather json")?;
    let forecast: ForecastResponse =
        serde_json::from_str(forecast).context("invalid forecast json")?;

    let conditions = current
        .weather
        .first()
        .map(|w| w.main.clone())
        .ok_or_else(|| anyhow!("current weather has no conditions"))?;
    let rain_probability = forecast
        .list
        .iter()
        .take(hours)
        .map(|slot| (slot.pop.unwrap_or(0.0).clamp(0.0, 1.0) * 100.0).round() as u8)
        .collect();

    Ok(WeatherData {
        city: current.name,
        temperature: current.main.temp.round() as i32,
        conditions,
        rain_probability,
        forecast_hours: hours,
    })
}

fn endpoint(path: &str, city: &str, key: &str) -> Result<Url> {
    Url::parse_with_params(
        &format!("{WEATHER_API_URL}/{path}"),
        &[("q", city), ("units", "metric"), ("appid", key)],
    )
    .context("build weather url")
}

/// Current conditions plus rain probability for the next `hours` forecast slots.
pub fn fetch_weather(config: &AppConfig, city: &str, hours: usize) -> Result<WeatherData> {
    let key = config
        .weather_api_key
        .as_deref()
        .ok_or_else(|| anyhow!("weather API key not configured"))?;
    let city = city.trim();
    if city.is_empty() {
        return Err(anyhow!("city is required"));
    }
    let client = http_client()?;
    let max_age = config.weather_cache_max_age;

    let current_url = endpoint("weather", city, key)?;
    let current = fetch_json_cached(
        client,
        current_url.as_str(),
        &format!("weather:current:{}", city.to_lowercase()),
        max_age,
    )
    .with_context(|| format!("weather request for {city}"))?;

    let forecast_url = endpoint("forecast", city, key)?;
    let forecast = fetch_json_cached(
        client,
        forecast_url.as_str(),
        &format!("weather:forecast:{}", city.to_lowercase()),
        max_age,
    )
    .with_context(|| format!("forecast request for {city}"))?;

    let data = parse_weather(&current, &forecast, hours)?;
    info!(city, temperature = data.temperature, conditions = data.conditions.as_str(), "weather fetched");
    Ok(data)
}
