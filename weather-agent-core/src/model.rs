use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One weather observation or forecast slot, normalised from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub date: NaiveDate,
    /// Provider condition code (OpenWeather `weather[0].id`), when known.
    #[serde(default)]
    pub condition_id: Option<u16>,
}

impl WeatherRecord {
    pub fn category(&self) -> WeatherCategory {
        WeatherCategory::classify(self.condition_id, &self.description)
    }

    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }
}

/// Narrative family a record is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCategory {
    Haze,
    Cloudy,
    Other,
}

impl WeatherCategory {
    /// Map an OpenWeather condition code.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_condition_id(id: u16) -> Self {
        match id {
            721 => Self::Haze,
            801..=804 => Self::Cloudy,
            _ => Self::Other,
        }
    }

    /// Condition code wins; free text is only consulted when no code exists.
    pub fn classify(condition_id: Option<u16>, description: &str) -> Self {
        if let Some(id) = condition_id {
            return Self::from_condition_id(id);
        }

        let lower = description.to_lowercase();
        if lower.contains("haze") {
            Self::Haze
        } else if lower.contains("cloud") {
            Self::Cloudy
        } else {
            Self::Other
        }
    }
}

/// The two tools the router can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ByIp,
    ByLocation,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ByIp => "get_weather_by_ip",
            ToolName::ByLocation => "get_current_weather",
        }
    }

    pub const fn all() -> &'static [ToolName] {
        &[ToolName::ByLocation, ToolName::ByIp]
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ToolName {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "get_weather_by_ip" => Ok(ToolName::ByIp),
            "get_current_weather" => Ok(ToolName::ByLocation),
            _ => Err(anyhow::anyhow!(
                "Unknown tool '{value}'. Available tools: get_current_weather, get_weather_by_ip."
            )),
        }
    }
}

/// A single tool invocation decided by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub tool: ToolName,
    pub raw_query: String,
    pub resolved_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_text: String,
    pub agent_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str, condition_id: Option<u16>) -> WeatherRecord {
        WeatherRecord {
            location: "Dhaka".into(),
            temperature: 31.0,
            description: description.into(),
            icon: "50d".into(),
            humidity: 70,
            pressure: 1008,
            wind_speed: 2.1,
            date: NaiveDate::from_ymd_opt(2025, 5, 23).unwrap(),
            condition_id,
        }
    }

    #[test]
    fn condition_codes_map_to_categories() {
        assert_eq!(WeatherCategory::from_condition_id(721), WeatherCategory::Haze);
        assert_eq!(WeatherCategory::from_condition_id(801), WeatherCategory::Cloudy);
        assert_eq!(WeatherCategory::from_condition_id(804), WeatherCategory::Cloudy);
        assert_eq!(WeatherCategory::from_condition_id(800), WeatherCategory::Other);
        assert_eq!(WeatherCategory::from_condition_id(500), WeatherCategory::Other);
    }

    #[test]
    fn substring_fallback_without_code() {
        assert_eq!(record("light rain and clouds", None).category(), WeatherCategory::Cloudy);
        assert_eq!(record("Haze", None).category(), WeatherCategory::Haze);
        assert_eq!(record("clear sky", None).category(), WeatherCategory::Other);
    }

    #[test]
    fn code_overrides_misleading_text() {
        assert_eq!(record("no clouds expected", Some(800)).category(), WeatherCategory::Other);
    }

    #[test]
    fn icon_url_uses_cdn_pattern() {
        assert_eq!(
            record("haze", Some(721)).icon_url(),
            "https://openweathermap.org/img/wn/50d@2x.png"
        );
    }

    #[test]
    fn tool_name_roundtrip() {
        for tool in ToolName::all() {
            let parsed = ToolName::try_from(tool.as_str()).expect("roundtrip should succeed");
            assert_eq!(*tool, parsed);
        }
        assert!(ToolName::try_from("get_horoscope").is_err());
    }
}
