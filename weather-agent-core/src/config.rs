use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const WEATHER_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
pub const LLM_KEY_ENV: &str = "GROQ_API_KEY";

/// OpenWeather access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Lifetime of memoised lookups; `0` disables caching.
    pub cache_ttl_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            cache_ttl_secs: 600,
        }
    }
}

/// OpenAI-compatible chat completions endpoint used by the LLM router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    /// Upper bound on model round-trips per user turn.
    pub max_steps: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-70b-8192".to_string(),
            temperature: 0.5,
            max_steps: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub ip_echo_url: String,
    pub geo_base_url: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            ip_echo_url: "https://api.ipify.org".to_string(),
            geo_base_url: "https://ipinfo.io".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [weather]
/// api_key = "..."
///
/// [llm]
/// api_key = "..."
/// model = "llama3-70b-8192"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub llm: LlmConfig,
    pub geo: GeoConfig,
    /// Fixed "current date" for the assistant; today (UTC) when unset.
    pub anchor_date: Option<NaiveDate>,
    /// Maximum chat turns kept in memory; `0` keeps everything.
    pub history_limit: usize,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            llm: LlmConfig::default(),
            geo: GeoConfig::default(),
            anchor_date: None,
            history_limit: 50,
            http_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-agent", "weather-agent")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Secrets from the environment take precedence over the file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(WEATHER_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.weather.api_key = Some(key);
        }
        if let Some(key) = lookup(LLM_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        self
    }

    pub fn weather_api_key(&self) -> Result<&str> {
        self.weather
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `weather-agent configure` or set {WEATHER_KEY_ENV}."
                )
            })
    }

    /// `None` means the assistant should fall back to the offline router.
    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn anchor_date(&self) -> NaiveDate {
        self.anchor_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.weather.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.weather_api_key().unwrap_err();

        assert!(err.to_string().contains("No OpenWeather API key configured"));
        assert!(err.to_string().contains("weather-agent configure"));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("   ".into());
        cfg.llm.api_key = Some(String::new());

        assert!(cfg.weather_api_key().is_err());
        assert_eq!(cfg.llm_api_key(), None);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("FILE_KEY".into());

        let cfg = cfg.with_overrides_from(|name| match name {
            WEATHER_KEY_ENV => Some("ENV_WEATHER".into()),
            LLM_KEY_ENV => Some("ENV_LLM".into()),
            _ => None,
        });

        assert_eq!(cfg.weather_api_key().unwrap(), "ENV_WEATHER");
        assert_eq!(cfg.llm_api_key(), Some("ENV_LLM"));
    }

    #[test]
    fn missing_env_keeps_file_values() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("FILE_KEY".into());

        let cfg = cfg.with_overrides_from(|_| None);
        assert_eq!(cfg.weather_api_key().unwrap(), "FILE_KEY");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            anchor_date = "2025-05-23"

            [weather]
            api_key = "OPEN_KEY"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(cfg.weather_api_key().unwrap(), "OPEN_KEY");
        assert_eq!(cfg.weather.cache_ttl_secs, 600);
        assert_eq!(cfg.llm.model, "llama3-70b-8192");
        assert_eq!(cfg.anchor_date(), NaiveDate::from_ymd_opt(2025, 5, 23).unwrap());
        assert_eq!(cfg.history_limit, 50);
    }

    #[test]
    fn toml_roundtrip_keeps_settings() {
        let mut cfg = Config::default();
        cfg.llm.model = "llama-3.3-70b-versatile".into();
        cfg.weather.cache_ttl_secs = 0;

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();

        assert_eq!(back.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(back.cache_ttl(), Duration::ZERO);
    }
}
