//! Router backed by an OpenAI-compatible chat completions endpoint.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ChatTurn, ToolCall, ToolName,
    config::LlmConfig,
    router::{RouterReply, ToolRouter, prompt::system_prompt},
    tools::WeatherTools,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::text("tool", content)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded arguments, as produced by the model.
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDef,
}

#[derive(Debug, Serialize)]
struct FunctionDef {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    tools: &'a [ChatTool],
    tool_choice: &'static str,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct ToolArgs {
    input: String,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug)]
pub struct LlmRouter {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_steps: usize,
    tools: WeatherTools,
}

impl LlmRouter {
    pub fn new(http: Client, config: &LlmConfig, api_key: String, tools: WeatherTools) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_steps: config.max_steps.max(1),
            tools,
        }
    }

    fn tool_definitions() -> Vec<ChatTool> {
        ToolName::all()
            .iter()
            .map(|tool| ChatTool {
                kind: "function",
                function: FunctionDef {
                    name: tool.as_str(),
                    description: tool.description(),
                    parameters: tool.parameters_schema(),
                },
            })
            .collect()
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[ChatTool]) -> Result<ChatMessage> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            tools,
            tool_choice: "auto",
        };

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("Failed to read chat completion response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Chat completion request failed with status {}: {}",
                status,
                text.chars().take(200).collect::<String>(),
            ));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).context("Failed to parse chat completion JSON")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| anyhow!("Chat completion response contained no choices"))
    }

    /// Turn a model-issued call into a tool invocation, or an error text to
    /// hand back to the model.
    fn parse_call(&self, call: &WireToolCall) -> Result<ToolCall, String> {
        let tool = ToolName::try_from(call.function.name.as_str()).map_err(|e| e.to_string())?;

        let args: ToolArgs = serde_json::from_str(&call.function.arguments)
            .map_err(|e| format!("Invalid arguments for {tool}: {e}"))?;

        let resolved_date = args.date.as_deref().and_then(|d| {
            NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .inspect_err(|e| tracing::debug!("ignoring unparsable date '{d}': {e}"))
                .ok()
        });

        Ok(ToolCall {
            tool,
            raw_query: args.input,
            resolved_date,
        })
    }
}

#[async_trait]
impl ToolRouter for LlmRouter {
    async fn route(&self, utterance: &str, history: &[ChatTurn]) -> Result<RouterReply> {
        let tools = Self::tool_definitions();

        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(ChatMessage::text("system", system_prompt(self.tools.anchor())));
        for turn in history {
            messages.push(ChatMessage::text("user", turn.user_text.clone()));
            messages.push(ChatMessage::text("assistant", turn.agent_text.clone()));
        }
        messages.push(ChatMessage::text("user", utterance));

        let mut last: Option<(ToolCall, String)> = None;

        for step in 0..self.max_steps {
            let reply = self.complete(&messages, &tools).await?;
            let calls = reply.tool_calls.clone().unwrap_or_default();

            if calls.is_empty() {
                let text = reply.content.unwrap_or_default();
                let (tool_call, output) = match last {
                    Some((call, output)) => (Some(call), Some(output)),
                    None => (None, None),
                };
                let text = match output {
                    Some(output) if text.trim().is_empty() => output,
                    _ => text,
                };
                return Ok(RouterReply { text, tool_call });
            }

            messages.push(reply);
            for call in &calls {
                let content = match self.parse_call(call) {
                    Ok(tool_call) => {
                        tracing::info!(step, tool = %tool_call.tool, input = %tool_call.raw_query, date = ?tool_call.resolved_date, "model requested tool");
                        let output = self.tools.call(&tool_call).await;
                        last = Some((tool_call, output.clone()));
                        output
                    }
                    Err(problem) => {
                        tracing::warn!("model issued an unusable tool call: {problem}");
                        problem
                    }
                };
                messages.push(ChatMessage::tool(call.id.clone(), content));
            }
        }

        // Out of steps: fall back to whatever the tools produced.
        match last {
            Some((call, output)) => Ok(RouterReply {
                text: output,
                tool_call: Some(call),
            }),
            None => Err(anyhow!(
                "Model did not produce an answer within {} steps",
                self.max_steps
            )),
        }
    }
}
