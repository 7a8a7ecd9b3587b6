use std::path::PathBuf;
use std::time::Duration;

pub const APP_DIR: &str = "cricket_oracle";
const DB_FILE: &str = "cricket_oracle.sqlite";

/// Runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub weather_api_key: Option<String>,
    pub weather_forecast_hours: usize,
    pub weather_cache_max_age: Duration,
    pub session_ttl: Duration,
    pub admin_username: String,
    pub admin_password: String,
    pub password_hash_rounds: u32,
    pub log_reveal_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            db_path: default_db_path(),
            weather_api_key: None,
            weather_forecast_hours: 4,
            weather_cache_max_age: Duration::from_secs(600),
            session_ttl: Duration::from_secs(24 * 3600),
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            password_hash_rounds: 100_000,
            log_reveal_interval: Duration::from_millis(60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };
        let number = |key: &str| get(key).and_then(|val| val.parse::<u64>().ok());
        let defaults = Self::default();

        Self {
            data_dir: get("CRICKET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            db_path: get("CRICKET_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            weather_api_key: get("OPENWEATHER_API_KEY").or_else(|| get("WEATHER_API_KEY")),
            weather_forecast_hours: number("WEATHER_FORECAST_HOURS")
                .map(|hours| hours.clamp(1, 40) as usize)
                .unwrap_or(defaults.weather_forecast_hours),
            weather_cache_max_age: number("WEATHER_CACHE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.weather_cache_max_age),
            session_ttl: number("SESSION_TTL_HOURS")
                .map(|hours| Duration::from_secs(hours.max(1) * 3600))
                .unwrap_or(defaults.session_ttl),
            admin_username: get("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: get("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            password_hash_rounds: number("PASSWORD_HASH_ROUNDS")
                .map(|rounds| rounds.clamp(1_000, u64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.password_hash_rounds),
            log_reveal_interval: number("LOG_REVEAL_MS")
                .map(|ms| Duration::from_millis(ms.max(10)))
                .unwrap_or(defaults.log_reveal_interval),
        }
    }
}

/// Loads `.env.local` then `.env`; missing files are ignored.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// `$XDG_CACHE_HOME/cricket_oracle`, else `$HOME/.cache/cricket_oracle`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> PathBuf {
    app_cache_dir()
        .map(|dir| dir.join(DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.weather_api_key, None);
        assert_eq!(cfg.weather_forecast_hours, 4);
        assert_eq!(cfg.admin_username, "admin");
    }

    #[test]
    fn values_are_clamped() {
        let cfg = config(&[
            ("WEATHER_FORECAST_HOURS", "99"),
            ("PASSWORD_HASH_ROUNDS", "5"),
            ("LOG_REVEAL_MS", "1"),
            ("WEATHER_API_KEY", " abc "),
        ]);
        assert_eq!(cfg.weather_forecast_hours, 40);
        assert_eq!(cfg.password_hash_rounds, 1_000);
        assert_eq!(cfg.log_reveal_interval, Duration::from_millis(10));
        assert_eq!(cfg.weather_api_key.as_deref(), Some("abc"));
    }
}
