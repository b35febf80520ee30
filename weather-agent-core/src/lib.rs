//! Core library for the `weather-agent` assistant.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - IP geolocation and the OpenWeather provider (with a TTL cache)
//! - Date extraction, response formatting and the two lookup tools
//! - Tool routers (model-backed and offline) and the chat session
//!
//! It is used by `weather-agent-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod date;
pub mod error;
pub mod format;
pub mod geo;
pub mod model;
pub mod provider;
pub mod router;
pub mod session;
pub mod tools;

pub use config::Config;
pub use error::WeatherError;
pub use geo::{GeoLocator, IpGeoLocator};
pub use model::{ChatTurn, ToolCall, ToolName, WeatherCategory, WeatherRecord};
pub use provider::WeatherProvider;
pub use router::{RouterReply, ToolRouter};
pub use session::Assistant;
pub use tools::WeatherTools;
