//! Integration tests for the IP geolocation chain using wiremock.

use reqwest::Client;
use std::time::Duration;
use weather_agent_core::{GeoLocator, IpGeoLocator, config::GeoConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn locator(server: &MockServer, ttl: Duration) -> IpGeoLocator {
    let config = GeoConfig {
        ip_echo_url: format!("{}/ip", server.uri()),
        geo_base_url: server.uri(),
    };
    IpGeoLocator::new(Client::new(), &config, ttl)
}

async fn mount_echo(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(status).set_body_string("203.0.113.7\n"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolves_city_through_both_lookups() {
    let server = MockServer::start().await;
    mount_echo(&server, 200).await;

    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "203.0.113.7",
            "city": "Dhaka",
            "country": "BD"
        })))
        .mount(&server)
        .await;

    let city = locator(&server, Duration::ZERO).resolve().await;
    assert_eq!(city.as_deref(), Some("Dhaka"));
}

#[tokio::test]
async fn test_echo_failure_short_circuits() {
    let server = MockServer::start().await;
    mount_echo(&server, 500).await;

    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "city": "Dhaka" })))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(locator(&server, Duration::ZERO).resolve().await, None);
}

#[tokio::test]
async fn test_geolocation_error_status_is_none() {
    let server = MockServer::start().await;
    mount_echo(&server, 200).await;

    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    assert_eq!(locator(&server, Duration::ZERO).resolve().await, None);
}

#[tokio::test]
async fn test_missing_city_is_none() {
    let server = MockServer::start().await;
    mount_echo(&server, 200).await;

    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "203.0.113.7",
            "bogon": true
        })))
        .mount(&server)
        .await;

    assert_eq!(locator(&server, Duration::ZERO).resolve().await, None);
}

#[tokio::test]
async fn test_successful_resolution_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "city": "Lisbon" })))
        .expect(1)
        .mount(&server)
        .await;

    let geo = locator(&server, Duration::from_secs(600));
    assert_eq!(geo.resolve().await.as_deref(), Some("Lisbon"));
    assert_eq!(geo.resolve().await.as_deref(), Some("Lisbon"));
}
