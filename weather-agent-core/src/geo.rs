//! Approximate caller location from its public IP address.
//! Uses ipify for the address and ipinfo for the city; neither needs a key.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

use crate::config::GeoConfig;

#[async_trait]
pub trait GeoLocator: Send + Sync + Debug {
    /// City of the caller, or `None` when any step of the lookup fails.
    async fn resolve(&self) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    city: Option<String>,
}

#[derive(Debug)]
pub struct IpGeoLocator {
    http: Client,
    ip_echo_url: String,
    geo_base_url: String,
    ttl: Duration,
    last: Mutex<Option<(Instant, String)>>,
}

impl IpGeoLocator {
    pub fn new(http: Client, config: &GeoConfig, ttl: Duration) -> Self {
        Self {
            http,
            ip_echo_url: config.ip_echo_url.clone(),
            geo_base_url: config.geo_base_url.trim_end_matches('/').to_string(),
            ttl,
            last: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<String> {
        let last = self.last.lock();
        last.as_ref()
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, city)| city.clone())
    }

    async fn public_ip(&self) -> Option<String> {
        let response = match self.http.get(&self.ip_echo_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("IP echo request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("IP echo returned status {}", response.status());
            return None;
        }

        let ip = response.text().await.ok()?;
        let ip = ip.trim();
        if ip.is_empty() { None } else { Some(ip.to_string()) }
    }

    async fn city_for(&self, ip: &str) -> Option<String> {
        let url = format!("{}/{}/json", self.geo_base_url, ip);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("IP geolocation request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("IP geolocation returned status {}", response.status());
            return None;
        }

        let body: IpInfoResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("IP geolocation parse error: {}", e);
                return None;
            }
        };

        body.city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

#[async_trait]
impl GeoLocator for IpGeoLocator {
    async fn resolve(&self) -> Option<String> {
        if let Some(city) = self.cached() {
            return Some(city);
        }

        let ip = self.public_ip().await?;
        let city = self.city_for(&ip).await?;

        tracing::info!("Resolved location by IP: {}", city);
        if !self.ttl.is_zero() {
            *self.last.lock() = Some((Instant::now(), city.clone()));
        }
        Some(city)
    }
}

/// Always answers with the same city. Useful when the caller already knows
/// where it is, and in tests.
#[derive(Debug, Clone)]
pub struct FixedLocator(pub Option<String>);

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn resolve(&self) -> Option<String> {
        self.0.clone()
    }
}
