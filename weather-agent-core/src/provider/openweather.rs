use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{WeatherError, WeatherRecord};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_client(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, location, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .inspect_err(|e| tracing::debug!("OpenWeather {endpoint} request failed: {e}"))?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!(
                "OpenWeather {endpoint} returned status {status}: {}",
                truncate_body(&body)
            );
            return Err(WeatherError::UpstreamStatus(status.as_u16()));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Failed to parse OpenWeather {endpoint} JSON: {e}");
            WeatherError::Parse(e.to_string())
        })
    }

    async fn fetch_current(&self, location: &str) -> Result<WeatherRecord, WeatherError> {
        let parsed: OwCurrentResponse = self.get_json("weather", location).await?;
        let date = unix_to_utc(parsed.dt)?.date_naive();

        Ok(to_record(parsed.name, &parsed.main, &parsed.weather, &parsed.wind, date))
    }

    async fn fetch_forecast(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<WeatherRecord, WeatherError> {
        let parsed: OwForecastResponse = self.get_json("forecast", location).await?;

        for slot in &parsed.list {
            let slot_date = unix_to_utc(slot.dt)?.date_naive();
            if slot_date == date {
                return Ok(to_record(
                    parsed.city.name.clone(),
                    &slot.main,
                    &slot.weather,
                    &slot.wind,
                    slot_date,
                ));
            }
        }

        tracing::debug!(location, %date, slots = parsed.list.len(), "no forecast slot on date");
        Err(WeatherError::NoDataForDate)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: Option<u16>,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastSlot {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastSlot>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(
        &self,
        location: &str,
        date: Option<NaiveDate>,
    ) -> Result<WeatherRecord, WeatherError> {
        match date {
            None => self.fetch_current(location).await,
            Some(date) => self.fetch_forecast(location, date).await,
        }
    }
}

fn to_record(
    location: String,
    main: &OwMain,
    weather: &[OwWeather],
    wind: &OwWind,
    date: NaiveDate,
) -> WeatherRecord {
    let condition = weather.first();

    WeatherRecord {
        location,
        temperature: main.temp,
        description: condition
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        icon: condition.map(|w| w.icon.clone()).unwrap_or_default(),
        humidity: main.humidity,
        pressure: main.pressure.round() as u32,
        wind_speed: wind.speed,
        date,
        condition_id: condition.and_then(|w| w.id),
    }
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::Parse(format!("timestamp out of range: {ts}")))
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
