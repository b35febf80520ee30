/// Failures of the weather-lookup pipeline.
///
/// The `Display` text of each variant is the message shown to the user, so
/// tools can render any failure directly.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Could not fetch weather data.")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    UpstreamStatus(u16),

    #[error("Weather data not available for this date.")]
    NoDataForDate,

    #[error("Could not determine location by IP.")]
    LocationUnresolved,

    #[error("Could not fetch weather data.")]
    Parse(String),
}
