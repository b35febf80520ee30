use crate::{
    Config, WeatherError, WeatherRecord, cache::TtlCache,
    provider::openweather::OpenWeatherProvider,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// `None` asks for current conditions, `Some` for the forecast slot on that date.
    async fn fetch(
        &self,
        location: &str,
        date: Option<NaiveDate>,
    ) -> Result<WeatherRecord, WeatherError>;
}

/// Memoises successful lookups per `(location, date)`.
#[derive(Debug)]
pub struct CachedProvider {
    inner: Arc<dyn WeatherProvider>,
    cache: TtlCache<(String, Option<NaiveDate>), WeatherRecord>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn WeatherProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl WeatherProvider for CachedProvider {
    async fn fetch(
        &self,
        location: &str,
        date: Option<NaiveDate>,
    ) -> Result<WeatherRecord, WeatherError> {
        let key = (location.trim().to_lowercase(), date);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(location, ?date, "weather cache hit");
            return Ok(hit);
        }

        let record = self.inner.fetch(location, date).await?;
        self.cache.insert(key, record.clone());
        Ok(record)
    }
}

/// Shared HTTP client with the configured request timeout.
pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Construct the OpenWeather provider, wrapped in the TTL cache.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.weather_api_key()?;
    let http = http_client(config.http_timeout())?;

    let provider = OpenWeatherProvider::with_client(
        api_key.to_owned(),
        config.weather.base_url.clone(),
        http,
    );

    Ok(Arc::new(CachedProvider::new(Arc::new(provider), config.cache_ttl())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn fetch(
            &self,
            location: &str,
            date: Option<NaiveDate>,
        ) -> Result<WeatherRecord, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WeatherError::UpstreamStatus(500));
            }
            Ok(WeatherRecord {
                location: location.to_string(),
                temperature: 18.5,
                description: "clear sky".into(),
                icon: "01d".into(),
                humidity: 40,
                pressure: 1015,
                wind_speed: 3.0,
                date: date.unwrap_or_else(|| NaiveDate::from_ymd_opt(2025, 5, 23).unwrap()),
                condition_id: Some(800),
            })
        }
    }

    #[tokio::test]
    async fn cached_provider_reuses_successful_lookups() {
        let inner = Arc::new(CountingProvider::default());
        let cached = CachedProvider::new(inner.clone(), Duration::from_secs(600));

        let a = cached.fetch("Paris", None).await.unwrap();
        let b = cached.fetch("paris ", None).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cached_provider_keys_on_date() {
        let inner = Arc::new(CountingProvider::default());
        let cached = CachedProvider::new(inner.clone(), Duration::from_secs(600));

        cached.fetch("Paris", None).await.unwrap();
        cached
            .fetch("Paris", NaiveDate::from_ymd_opt(2025, 5, 24))
            .await
            .unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cached_provider_does_not_cache_errors() {
        let inner = Arc::new(CountingProvider { fail: true, ..Default::default() });
        let cached = CachedProvider::new(inner.clone(), Duration::from_secs(600));

        assert!(cached.fetch("Paris", None).await.is_err());
        assert!(cached.fetch("Paris", None).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("KEY".into());

        assert!(provider_from_config(&cfg).is_ok());
    }
}
