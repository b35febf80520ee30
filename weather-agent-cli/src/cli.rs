use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use weather_agent_core::{
    Assistant, Config, GeoLocator, IpGeoLocator, WeatherTools,
    date::RuleDateResolver,
    format::format_outcome,
    geo::FixedLocator,
    provider::{http_client, provider_from_config},
    router::router_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-agent", version, about = "Conversational weather assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Answer with the rule-based router even when a model key is configured.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Treat this date (YYYY-MM-DD) as "today".
    #[arg(long, global = true, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    /// Skip IP detection and use this city as the caller's location.
    #[arg(long, global = true, value_name = "CITY")]
    pub here: Option<String>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API keys and model settings.
    Configure,

    /// Print the config file location.
    ConfigPath,

    /// Ask a single weather question.
    Ask {
        /// Question in plain language, e.g. "weather in Paris tomorrow".
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Ask questions interactively until an empty line or Esc.
    Chat,

    /// Show weather for a location without going through the router.
    Show {
        /// Address or location name.
        address: String,

        /// Optional date (YYYY-MM-DD); if absent, means "now".
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match &self.command {
            Command::Configure => configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            Command::Ask { query } => {
                let mut assistant = self.assistant()?;
                println!("{}", assistant.ask(&query.join(" ")).await);
                Ok(())
            }
            Command::Chat => {
                let assistant = self.assistant()?;
                chat(assistant).await
            }
            Command::Show { address, date } => {
                let (_, tools) = self.tools()?;
                let (outcome, days_ahead) = tools.fetch(address, *date).await;
                println!("{}", format_outcome(&outcome, days_ahead));
                if let Ok(record) = &outcome {
                    println!("\nIcon: {}", record.icon_url());
                }
                Ok(())
            }
        }
    }

    fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load()?.with_env_overrides();
        if let Some(today) = self.today {
            config.anchor_date = Some(today);
        }
        Ok(config)
    }

    fn tools(&self) -> anyhow::Result<(Config, WeatherTools)> {
        let config = self.config()?;
        tracing::debug!(
            anchor = %config.anchor_date(),
            here = ?self.here,
            offline = self.offline,
            "building weather tools"
        );
        let weather = provider_from_config(&config)?;

        let geo: Arc<dyn GeoLocator> = match &self.here {
            Some(city) => Arc::new(FixedLocator(Some(city.clone()))),
            None => Arc::new(IpGeoLocator::new(
                http_client(config.http_timeout())?,
                &config.geo,
                config.cache_ttl(),
            )),
        };

        let tools = WeatherTools::new(geo, weather, Arc::new(RuleDateResolver), config.anchor_date());
        Ok((config, tools))
    }

    fn assistant(&self) -> anyhow::Result<Assistant> {
        let (config, tools) = self.tools()?;
        let router = router_from_config(&config, tools, self.offline)?;
        Ok(Assistant::new(router, config.history_limit))
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let weather_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !weather_key.trim().is_empty() {
        config.weather.api_key = Some(weather_key.trim().to_string());
    }

    let llm_key = Password::new("Model API key (Groq or any OpenAI-compatible endpoint):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key; without one the offline router is used")
        .prompt()?;
    if !llm_key.trim().is_empty() {
        config.llm.api_key = Some(llm_key.trim().to_string());
    }

    config.llm.base_url = Text::new("Model endpoint base URL:")
        .with_default(&config.llm.base_url)
        .prompt()?;
    config.llm.model = Text::new("Model:").with_default(&config.llm.model).prompt()?;

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn chat(mut assistant: Assistant) -> anyhow::Result<()> {
    println!("Weather Query Agent. Ask about current weather and forecasts; empty line to quit.");

    loop {
        let query = match Text::new("You:").prompt() {
            Ok(q) => q,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        let query = query.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let answer = assistant.ask(query).await;
        println!("\nAgent: {answer}\n");
    }

    Ok(())
}
