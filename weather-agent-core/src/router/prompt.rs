//! Instructions given to the model-backed router.

use chrono::NaiveDate;

use crate::{
    ToolName,
    date::{RelativeDateResolver, RuleDateResolver},
    router::REGION_WARNING,
};

const EXAMPLE_PHRASES: &[&str] = &[
    "today",
    "tomorrow",
    "yesterday",
    "next week",
    "in 3 days",
    "after 3 days",
    "2 months ago",
    "next year",
];

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// System prompt anchored at `anchor`. Example dates are computed, not fixed.
pub fn system_prompt(anchor: NaiveDate) -> String {
    let today = long_date(anchor);

    let examples = EXAMPLE_PHRASES
        .iter()
        .filter_map(|phrase| {
            RuleDateResolver
                .resolve_relative_date(phrase, anchor)
                .map(|d| format!("  - '{phrase}' is {} ({d})", long_date(d)))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let by_ip = ToolName::ByIp.as_str();
    let by_location = ToolName::ByLocation.as_str();
    let warning = REGION_WARNING.escape_debug();

    format!(
        "You are a helpful assistant that provides weather information. You can answer questions \
about current weather and forecasts. Use the tools to fetch weather data.

- If the user doesn't specify a location, use the {by_ip} tool to determine the location via IP and fetch the weather.
- If the user specifies a location, use the {by_location} tool with the location as `input`.
- The current date is {today}. Interpret natural language date expressions in the user's query and convert them to absolute dates relative to {today}. For example:
{examples}
- Pass the resolved date to the tool as `date` in YYYY-MM-DD format. If no date is mentioned, omit `date`.
- Call exactly one tool per question.
- If the location is a country (e.g., US, Bangladesh) or a large city (e.g., New York, Dhaka), append the following warning to your response: \"{warning}\"
- Respond with the weather information as provided by the tool, ensuring the warning is included when applicable.
- Provide clear, concise weather information, including temperature, weather description, humidity, pressure, and wind speed."
    )
}
