//! Deterministic offline router.
//!
//! Picks a tool from the shape of the sentence: a place introduced by
//! "in", "for" or "at" selects the by-location tool, anything else is
//! answered for the caller's own location.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::{
    ChatTurn, ToolCall, ToolName,
    date::strip_date,
    router::{REGION_WARNING, RouterReply, ToolRouter},
    tools::WeatherTools,
};

static PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:in|for|at)\s+([^?!.]+?)(?:\s+(?:on|at|by|around|during)\b[^?!.]*)?(?:[?!.]|$)")
        .expect("valid place pattern")
});

static TRAILING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\s+(?:right now|now|currently|please|like))+$").expect("valid filler pattern")
});

/// Phrases that refer to the caller's own position rather than a place.
const SELF_REFERENCES: &[&str] = &[
    "here",
    "me",
    "myself",
    "where i am",
    "my position",
    "my current position",
    "my location",
    "my current location",
    "current location",
    "my area",
    "my city",
    "my place",
];

/// Countries and very large cities that get the region warning.
const BROAD_REGIONS: &[&str] = &[
    "us",
    "usa",
    "united states",
    "uk",
    "united kingdom",
    "bangladesh",
    "india",
    "china",
    "russia",
    "brazil",
    "canada",
    "australia",
    "germany",
    "france",
    "japan",
    "new york",
    "dhaka",
    "tokyo",
    "delhi",
    "mumbai",
    "shanghai",
    "beijing",
    "sao paulo",
    "mexico city",
    "cairo",
    "london",
    "los angeles",
    "istanbul",
    "karachi",
    "lagos",
];

pub fn is_broad_region(location: &str) -> bool {
    let needle = location.trim().to_lowercase();
    BROAD_REGIONS.contains(&needle.as_str())
}

/// Place named in `utterance`, if any.
pub fn extract_place(utterance: &str) -> Option<String> {
    let without_dates = strip_date(utterance);
    let caps = PLACE.captures(&without_dates)?;

    let place = TRAILING_FILLER.replace(caps[1].trim(), "");
    let place = place.trim().trim_end_matches(',');
    let place = place
        .strip_prefix("the ")
        .or_else(|| place.strip_prefix("The "))
        .unwrap_or(place)
        .trim();

    if place.is_empty() || SELF_REFERENCES.contains(&place.to_lowercase().as_str()) {
        None
    } else {
        Some(place.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RuleRouter {
    tools: WeatherTools,
}

impl RuleRouter {
    pub fn new(tools: WeatherTools) -> Self {
        Self { tools }
    }

    /// The tool invocation this router would make for `utterance`.
    pub fn plan(&self, utterance: &str) -> ToolCall {
        let resolved_date = self.tools.resolve_date(utterance, None);

        match extract_place(utterance) {
            Some(place) => ToolCall {
                tool: ToolName::ByLocation,
                raw_query: place,
                resolved_date,
            },
            None => ToolCall {
                tool: ToolName::ByIp,
                raw_query: utterance.trim().to_string(),
                resolved_date,
            },
        }
    }
}

#[async_trait]
impl ToolRouter for RuleRouter {
    async fn route(&self, utterance: &str, _history: &[ChatTurn]) -> anyhow::Result<RouterReply> {
        let call = self.plan(utterance);
        tracing::info!(tool = %call.tool, input = %call.raw_query, date = ?call.resolved_date, "routing");

        let (mut text, location) = match call.tool {
            ToolName::ByIp => {
                self.tools
                    .weather_by_ip_located(&call.raw_query, call.resolved_date)
                    .await
            }
            ToolName::ByLocation => (self.tools.call(&call).await, Some(call.raw_query.clone())),
        };
        if location.as_deref().is_some_and(is_broad_region) {
            text.push_str(REGION_WARNING);
        }

        Ok(RouterReply {
            text,
            tool_call: Some(call),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        WeatherError, WeatherProvider, WeatherRecord,
        date::RuleDateResolver,
        geo::FixedLocator,
    };
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Unreachable;

    #[async_trait]
    impl WeatherProvider for Unreachable {
        async fn fetch(
            &self,
            _location: &str,
            _date: Option<NaiveDate>,
        ) -> Result<WeatherRecord, WeatherError> {
            Err(WeatherError::UpstreamStatus(503))
        }
    }

    fn router() -> RuleRouter {
        router_at(None)
    }

    fn router_at(here: Option<&str>) -> RuleRouter {
        RuleRouter::new(WeatherTools::new(
            Arc::new(FixedLocator(here.map(str::to_owned))),
            Arc::new(Unreachable),
            Arc::new(RuleDateResolver),
            NaiveDate::from_ymd_opt(2025, 5, 23).unwrap(),
        ))
    }

    #[test]
    fn named_place_with_iso_date() {
        let call = router().plan("weather in Paris on 2025-06-01");

        assert_eq!(call.tool, ToolName::ByLocation);
        assert_eq!(call.raw_query, "Paris");
        assert_eq!(call.resolved_date, NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn named_place_with_relative_date() {
        let call = router().plan("What's the weather like in New York tomorrow?");

        assert_eq!(call.tool, ToolName::ByLocation);
        assert_eq!(call.raw_query, "New York");
        assert_eq!(call.resolved_date, NaiveDate::from_ymd_opt(2025, 5, 24));
    }

    #[test]
    fn no_place_goes_by_ip() {
        let call = router().plan("Will it rain in 3 days?");

        assert_eq!(call.tool, ToolName::ByIp);
        assert_eq!(call.resolved_date, NaiveDate::from_ymd_opt(2025, 5, 26));
    }

    #[test]
    fn self_reference_goes_by_ip() {
        assert_eq!(router().plan("how hot is it at my location right now").tool, ToolName::ByIp);
        assert_eq!(router().plan("weather here").tool, ToolName::ByIp);
        assert_eq!(router().plan("what's the weather for me").tool, ToolName::ByIp);
        assert_eq!(router().plan("forecast for my position tomorrow").tool, ToolName::ByIp);
    }

    #[test]
    fn place_stops_before_trailing_time() {
        let call = router().plan("weather in Paris on June 1");
        assert_eq!(call.raw_query, "Paris");
        assert_eq!(call.resolved_date, NaiveDate::from_ymd_opt(2025, 6, 1));

        assert_eq!(extract_place("weather in Paris at noon?").as_deref(), Some("Paris"));
        assert_eq!(extract_place("rain in New York by evening").as_deref(), Some("New York"));
    }

    #[test]
    fn past_relative_dates_are_resolved() {
        let call = router().plan("weather in Paris last month");
        assert_eq!(call.tool, ToolName::ByLocation);
        assert_eq!(call.raw_query, "Paris");
        assert_eq!(call.resolved_date, NaiveDate::from_ymd_opt(2025, 4, 23));

        let call = router().plan("weather in Paris last year");
        assert_eq!(call.resolved_date, NaiveDate::from_ymd_opt(2024, 5, 23));
    }

    #[test]
    fn filler_is_trimmed_from_place() {
        assert_eq!(extract_place("weather in Oslo right now please").as_deref(), Some("Oslo"));
        assert_eq!(extract_place("forecast for the Hague").as_deref(), Some("Hague"));
    }

    #[test]
    fn broad_regions() {
        assert!(is_broad_region("Dhaka"));
        assert!(is_broad_region(" new york "));
        assert!(!is_broad_region("Reykjavik"));
    }

    #[tokio::test]
    async fn route_appends_region_warning() {
        let reply = router().route("weather in Bangladesh", &[]).await.unwrap();

        assert_eq!(reply.text, format!("API error: 503{REGION_WARNING}"));
        assert_eq!(reply.tool_call.map(|c| c.tool), Some(ToolName::ByLocation));
    }

    #[tokio::test]
    async fn route_warns_for_broad_region_found_by_ip() {
        let reply = router_at(Some("Dhaka")).route("what's the weather?", &[]).await.unwrap();

        assert_eq!(reply.text, format!("API error: 503{REGION_WARNING}"));
        assert_eq!(reply.tool_call.map(|c| c.tool), Some(ToolName::ByIp));
    }

    #[tokio::test]
    async fn route_by_ip_small_city_has_no_warning() {
        let reply = router_at(Some("Reykjavik")).route("what's the weather?", &[]).await.unwrap();
        assert_eq!(reply.text, "API error: 503");
    }

    #[tokio::test]
    async fn route_by_ip_reports_unresolved_location() {
        let reply = router().route("what's the weather?", &[]).await.unwrap();
        assert_eq!(reply.text, "Could not determine location by IP.");
    }
}
