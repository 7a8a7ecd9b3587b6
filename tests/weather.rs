use std::fs;
use std::path::PathBuf;

use cricket_oracle::config::AppConfig;
use cricket_oracle::weather::{fetch_weather, parse_weather};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_current_and_forecast_fixtures() {
    let current = read_fixture("weather_current.json");
    let forecast = read_fixture("weather_forecast.json");
    let weather = parse_weather(&current, &forecast, 4).expect("fixture should parse");
    assert_eq!(weather.city, "Mumbai");
    assert_eq!(weather.temperature, 32);
    assert_eq!(weather.conditions, "Clouds");
    assert_eq!(weather.rain_probability, vec![0, 25, 73, 0]);
    assert_eq!(weather.forecast_hours, 4);
}

#[test]
fn rain_probability_is_clamped() {
    let current = read_fixture("weather_current.json");
    let forecast = read_fixture("weather_forecast.json");
    let weather = parse_weather(&current, &forecast, 40).unwrap();
    assert_eq!(weather.rain_probability.len(), 5);
    assert_eq!(weather.rain_probability[4], 100);
}

#[test]
fn current_weather_needs_conditions() {
    let current = r#"{"name":"Mumbai","main":{"temp":30.0},"weather":[]}"#;
    let forecast = read_fixture("weather_forecast.json");
    assert!(parse_weather(current, &forecast, 4).is_err());
    assert!(parse_weather("not json", &forecast, 4).is_err());
}

#[test]
fn fetch_requires_api_key_and_city() {
    let config = AppConfig {
        weather_api_key: None,
        ..AppConfig::default()
    };
    assert!(fetch_weather(&config, "Mumbai", 4).is_err());

    let config = AppConfig {
        weather_api_key: Some("test-key".to_string()),
        ..AppConfig::default()
    };
    assert!(fetch_weather(&config, "   ", 4).is_err());
}
