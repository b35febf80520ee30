use crate::{WeatherCategory, WeatherError, WeatherRecord};

/// Fixed-field one-liner.
pub fn summary_line(w: &WeatherRecord) -> String {
    format!(
        "Temperature: {}°C, Weather: {}, Humidity: {}%, Pressure: {} hPa, Wind Speed: {} m/s",
        w.temperature, w.description, w.humidity, w.pressure, w.wind_speed
    )
}

fn narrative(w: &WeatherRecord) -> String {
    let (location, date, description) = (&w.location, w.date, &w.description);
    let (temp, humidity, pressure, wind) = (w.temperature, w.humidity, w.pressure, w.wind_speed);

    match w.category() {
        WeatherCategory::Haze => format!(
            "The weather in {location} on {date} will be characterized by {description} with a temperature of {temp}°C. \
             The humidity is at {humidity}%, making the air feel quite heavy and sticky, typical for this region. \
             Atmospheric pressure is {pressure} hPa, suggesting stable conditions, though the haze indicates potential air quality concerns, possibly due to pollution or dust. \
             A gentle breeze at {wind} m/s offers slight relief but isn't strong enough to clear the haze. \
             Light clothing and staying hydrated are recommended, and consider limiting outdoor activities if you're sensitive to air quality."
        ),
        WeatherCategory::Cloudy => format!(
            "The weather in {location} on {date} will feature {description} with a temperature of {temp}°C. \
             The cloud cover will provide some shade, offering relief from direct sunlight and making it feel more comfortable compared to clearer days. \
             With humidity at {humidity}%, the air might feel a bit damp, and the pressure at {pressure} hPa suggests a stable atmosphere. \
             Wind speed is {wind} m/s, which is mild and won’t significantly impact the day. \
             The cloudy conditions might hint at a chance of light rain or drizzle, so carrying an umbrella could be wise."
        ),
        WeatherCategory::Other => format!(
            "The weather in {location} on {date} will be {description} with a temperature of {temp}°C. \
             Humidity is at {humidity}%, pressure at {pressure} hPa, and wind speed at {wind} m/s. \
             Expect typical conditions for this weather pattern—stay prepared for changes and dress accordingly."
        ),
    }
}

/// Human-readable narrative for a record.
///
/// With `days_ahead` the narrative is prefixed by a "the weather after N
/// days" wrapper carrying the summary line.
pub fn format_weather(w: &WeatherRecord, days_ahead: Option<i64>) -> String {
    let story = narrative(w);

    match days_ahead {
        Some(days) => format!(
            "the weather after {days} days in {} will be like {{ {} }}\n\n{story}",
            w.date.format("%d %B"),
            summary_line(w),
        ),
        None => story,
    }
}

/// Renders either the record or the user-facing error text.
pub fn format_outcome(outcome: &Result<WeatherRecord, WeatherError>, days_ahead: Option<i64>) -> String {
    match outcome {
        Ok(record) => format_weather(record, days_ahead),
        Err(e) => e.to_string(),
    }
}
