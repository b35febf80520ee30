//! The two lookup tools exposed to the router.

use chrono::NaiveDate;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    GeoLocator, ToolCall, ToolName, WeatherError, WeatherProvider, WeatherRecord,
    date::{RelativeDateResolver, extract_date, strip_date},
    format::format_outcome,
};

/// Weather lookups bound to their collaborators and the anchor date.
#[derive(Debug, Clone)]
pub struct WeatherTools {
    geo: Arc<dyn GeoLocator>,
    weather: Arc<dyn WeatherProvider>,
    dates: Arc<dyn RelativeDateResolver>,
    anchor: NaiveDate,
}

impl WeatherTools {
    pub fn new(
        geo: Arc<dyn GeoLocator>,
        weather: Arc<dyn WeatherProvider>,
        dates: Arc<dyn RelativeDateResolver>,
        anchor: NaiveDate,
    ) -> Self {
        Self { geo, weather, dates, anchor }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Explicit argument, then an ISO date in the text, then a relative phrase.
    pub fn resolve_date(&self, input: &str, explicit: Option<NaiveDate>) -> Option<NaiveDate> {
        explicit
            .or_else(|| extract_date(input))
            .or_else(|| self.dates.resolve_relative_date(input, self.anchor))
    }

    fn days_ahead(&self, date: Option<NaiveDate>) -> Option<i64> {
        date.filter(|d| *d > self.anchor)
            .map(|d| (d - self.anchor).num_days())
    }

    /// Raw record for `location` on `date`, with the days-ahead count used for phrasing.
    pub async fn fetch(
        &self,
        location: &str,
        date: Option<NaiveDate>,
    ) -> (Result<WeatherRecord, WeatherError>, Option<i64>) {
        // The anchor day is served from current conditions.
        let date = date.filter(|d| *d != self.anchor);
        tracing::info!(location, ?date, "looking up weather");
        (self.weather.fetch(location, date).await, self.days_ahead(date))
    }

    async fn lookup(&self, location: &str, date: Option<NaiveDate>) -> String {
        let (outcome, days_ahead) = self.fetch(location, date).await;
        format_outcome(&outcome, days_ahead)
    }

    /// Weather where the caller is, located by public IP.
    pub async fn weather_by_ip(&self, input: &str, date: Option<NaiveDate>) -> String {
        self.weather_by_ip_located(input, date).await.0
    }

    /// Like [`Self::weather_by_ip`], also returning the location IP lookup settled on.
    pub async fn weather_by_ip_located(
        &self,
        input: &str,
        date: Option<NaiveDate>,
    ) -> (String, Option<String>) {
        let date = self.resolve_date(input, date);

        match self.geo.resolve().await {
            Some(location) => (self.lookup(&location, date).await, Some(location)),
            None => (WeatherError::LocationUnresolved.to_string(), None),
        }
    }

    /// Weather for the place named in `input`.
    pub async fn weather_for_location(&self, input: &str, date: Option<NaiveDate>) -> String {
        let date = self.resolve_date(input, date);
        let location = strip_date(input);

        if location.is_empty() {
            return "Please provide a location name.".to_string();
        }
        self.lookup(&location, date).await
    }

    pub async fn call(&self, call: &ToolCall) -> String {
        match call.tool {
            ToolName::ByIp => self.weather_by_ip(&call.raw_query, call.resolved_date).await,
            ToolName::ByLocation => {
                self.weather_for_location(&call.raw_query, call.resolved_date)
                    .await
            }
        }
    }
}

impl ToolName {
    pub fn description(&self) -> &'static str {
        match self {
            ToolName::ByLocation => {
                "Get weather for a specific location. Input should be a city name. \
                 Pass the resolved calendar date as `date` (YYYY-MM-DD) when the user asks \
                 about a day other than today; omit it for current conditions."
            }
            ToolName::ByIp => {
                "Get weather at the user's current location, detected from their IP address. \
                 Use when the user does not name a place. Pass the resolved calendar date as \
                 `date` (YYYY-MM-DD) when the user asks about a day other than today."
            }
        }
    }

    /// JSON schema of the tool's arguments.
    pub fn parameters_schema(&self) -> Value {
        let input_doc = match self {
            ToolName::ByLocation => "City or place name, e.g. \"Paris\"",
            ToolName::ByIp => "The user's question as asked",
        };

        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": input_doc
                },
                "date": {
                    "type": "string",
                    "description": "Absolute date in YYYY-MM-DD format"
                }
            },
            "required": ["input"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_input_only() {
        for tool in ToolName::all() {
            let schema = tool.parameters_schema();
            assert_eq!(schema["required"], json!(["input"]));
            assert_eq!(schema["properties"]["date"]["type"], "string");
            assert!(!tool.description().is_empty());
        }
    }
}
