use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{ChatTurn, Config, ToolCall, provider::http_client, tools::WeatherTools};

pub mod llm;
pub mod prompt;
pub mod rules;

pub use llm::LlmRouter;
pub use rules::RuleRouter;

pub const REGION_WARNING: &str = "\n**Warning:** This is a country or large city. Weather may vary by specific location within this region.";

/// What the router hands back for one user utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterReply {
    pub text: String,
    /// The last tool invocation made while answering, if any.
    pub tool_call: Option<ToolCall>,
}

/// Decides which tool answers an utterance, invokes it, and phrases the reply.
#[async_trait]
pub trait ToolRouter: Send + Sync + Debug {
    async fn route(&self, utterance: &str, history: &[ChatTurn]) -> anyhow::Result<RouterReply>;
}

/// LLM router when a model key is configured, rule router otherwise.
pub fn router_from_config(
    config: &Config,
    tools: WeatherTools,
    offline: bool,
) -> anyhow::Result<Arc<dyn ToolRouter>> {
    if offline {
        return Ok(Arc::new(RuleRouter::new(tools)));
    }

    match config.llm_api_key() {
        Some(api_key) => {
            let http = http_client(config.http_timeout())?;
            Ok(Arc::new(LlmRouter::new(http, &config.llm, api_key.to_owned(), tools)))
        }
        None => {
            tracing::info!("no model API key configured, using the offline router");
            Ok(Arc::new(RuleRouter::new(tools)))
        }
    }
}
