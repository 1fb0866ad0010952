use crate::config::{ClientConfig, ResolvedClientConfig};
use crate::error::{LlmError, Result};
use crate::model_info::ModelInfo;
use crate::traits::ChatClient;
use crate::types::{CompletionRequest, CompletionResponse, StopReason, ToolChoice};
use async_trait::async_trait;
use parley_core::message::{ContentBlock, ToolUse};
use parley_core::{Message, Role, TokenUsage, ToolDefinition};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

const BASE_BACKOFF_MS: u64 = 500;

/// Chat-completion client for any endpoint speaking the OpenAI
/// `/chat/completions` protocol: OpenAI itself and DeepSeek.
pub struct OpenAiChatClient {
    client: Client,
    config: ResolvedClientConfig,
    usage: Mutex<TokenUsage>,
}

impl OpenAiChatClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::from_resolved(config.resolve()?)
    }

    pub fn from_resolved(config: ResolvedClientConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout).use_rustls_tls();
        if config.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            model = %config.model,
            provider = %config.provider,
            base_url = %config.base_url,
            "Created chat completion client"
        );

        Ok(Self {
            client,
            config,
            usage: Mutex::new(TokenUsage::default()),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ResolvedClientConfig {
        &self.config
    }

    fn provider_name(&self) -> &'static str {
        self.config.provider.as_str()
    }

    fn convert_messages(&self, messages: &[Message], system: Option<&str>) -> Vec<OpenAiMessage> {
        let mut result = Vec::new();

        if let Some(sys) = system.filter(|s| !s.is_empty()) {
            result.push(OpenAiMessage::text("system", sys));
        }

        for msg in messages {
            match msg.role {
                Role::System => {
                    let text = msg.text_content();
                    if !text.is_empty() {
                        result.push(OpenAiMessage::text("system", text));
                    }
                }
                Role::User => {
                    let mut user = OpenAiMessage::text("user", msg.text_content());
                    user.name = msg.name.clone().filter(|n| is_valid_participant_name(n));
                    result.push(user);
                }
                Role::Assistant => {
                    let tool_calls: Vec<_> = msg
                        .tool_uses()
                        .into_iter()
                        .map(|tu| OpenAiToolCall {
                            id: tu.id.clone(),
                            r#type: "function".to_string(),
                            function: OpenAiFunctionCall {
                                name: tu.name.clone(),
                                arguments: tu.input.to_string(),
                            },
                        })
                        .collect();

                    let text_content = msg.text_content();

                    result.push(OpenAiMessage {
                        role: "assistant".to_string(),
                        content: if text_content.is_empty() {
                            None
                        } else {
                            Some(text_content)
                        },
                        name: None,
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                        tool_call_id: None,
                    });
                }
                Role::Tool => {
                    for tr in msg.content.iter().filter_map(|c| c.as_tool_result()) {
                        result.push(OpenAiMessage {
                            role: "tool".to_string(),
                            content: Some(tr.content.clone()),
                            name: None,
                            tool_calls: None,
                            tool_call_id: Some(tr.tool_use_id.clone()),
                        });
                    }
                }
            }
        }

        result
    }

    fn convert_tools(&self, tools: &[ToolDefinition]) -> Result<Vec<OpenAiTool>> {
        tools
            .iter()
            .map(|t| {
                Ok(OpenAiTool {
                    r#type: "function".to_string(),
                    function: OpenAiFunction {
                        name: t.name.clone(),
                        description: Some(t.description.clone()),
                        parameters: serde_json::to_value(&t.parameters)?,
                    },
                })
            })
            .collect()
    }

    fn convert_tool_choice(&self, choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Auto => Value::String("auto".to_string()),
            ToolChoice::None => Value::String("none".to_string()),
            ToolChoice::Required => Value::String("required".to_string()),
            ToolChoice::Tool { name } => serde_json::json!({
                "type": "function",
                "function": { "name": name }
            }),
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> Result<Value> {
        let info = &self.config.info;

        if request.has_tools() && !info.function_calling {
            return Err(LlmError::invalid_request(format!(
                "model {} does not support function calling",
                self.config.model
            )));
        }
        if request.json_output && !info.json_output {
            return Err(LlmError::invalid_request(format!(
                "model {} does not support JSON output",
                self.config.model
            )));
        }

        let messages = self.convert_messages(&request.messages, request.system.as_deref());

        let mut body = serde_json::json!({
            "model": info.api_model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = temp.into();
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = top_p.into();
        }
        if let Some(stop) = &request.stop {
            body["stop"] = stop.clone().into();
        }
        if let Some(tools) = request.tools.as_deref().filter(|t| !t.is_empty()) {
            body["tools"] = serde_json::to_value(self.convert_tools(tools)?)?;
            if let Some(choice) = &request.tool_choice {
                body["tool_choice"] = self.convert_tool_choice(choice);
            }
        }
        if request.json_output {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        Ok(body)
    }

    fn parse_response(&self, response: OpenAiResponse) -> Result<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No choices in response"))?;

        let mut content_blocks = Vec::new();

        if let Some(reasoning) = choice.message.reasoning_content.filter(|r| !r.is_empty()) {
            content_blocks.push(ContentBlock::thinking(reasoning));
        }

        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content_blocks.push(ContentBlock::text(text));
        }

        for tc in choice.message.tool_calls.unwrap_or_default() {
            let input: Value = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                warn!(tool = %tc.function.name, error = %e, "Tool call arguments are not valid JSON");
                Value::Object(Default::default())
            });
            content_blocks.push(ContentBlock::tool_use(ToolUse::new(
                tc.id,
                tc.function.name,
                input,
            )));
        }

        let message = Message::new(Role::Assistant, content_blocks);

        let stop_reason = choice
            .finish_reason
            .as_deref()
            .and_then(StopReason::from_finish_reason)
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse::new(response.id, response.model, message)
            .with_usage(usage)
            .with_stop_reason(stop_reason))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout.as_millis() as u64)
        } else if e.is_connect() {
            LlmError::network(e.to_string())
        } else {
            LlmError::Reqwest(e)
        }
    }

    async fn send(&self, body: &Value) -> Result<CompletionResponse> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(retry_after_millis);
            let text = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, retry_after_ms, text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let parsed: OpenAiResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::invalid_response(format!("{}: {}", e, truncate(&text, 200))))?;
        self.parse_response(parsed)
    }

    fn status_error(&self, status: StatusCode, retry_after_ms: Option<u64>, body: String) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::AuthenticationFailed(format!("{}: {}", status, body))
            }
            StatusCode::TOO_MANY_REQUESTS => LlmError::rate_limited(self.provider_name(), retry_after_ms),
            s if s.is_server_error() && s != StatusCode::NOT_IMPLEMENTED => {
                LlmError::network(format!("{}: {}", status, body))
            }
            _ => LlmError::api(self.provider_name(), format!("{}: {}", status, body)),
        }
    }

    fn record_usage(&self, usage: TokenUsage) {
        let mut total = self.usage.lock().unwrap_or_else(|e| e.into_inner());
        *total += usage;
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn model_info(&self) -> &ModelInfo {
        &self.config.info
    }

    async fn create(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_body(&request)?;
        let messages = request.messages.len();
        let (this, body) = (self, &body);

        let response = with_retries(&self.config.model, self.config.max_retries, move |attempt| {
            debug!(model = %this.config.model, attempt, messages, "Sending chat completion");
            this.send(body)
        })
        .await?;

        self.record_usage(response.usage);
        Ok(response)
    }

    fn total_usage(&self) -> TokenUsage {
        *self.usage.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or has
/// been retried `max_retries` times. Waits `retry_after` when the error
/// carries one, the exponential backoff otherwise.
/// Seconds form of `Retry-After`, in milliseconds.
fn retry_after_millis(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().map(|secs| secs.saturating_mul(1000))
}

async fn with_retries<T, F, Fut>(model: &str, max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = e.retry_after().unwrap_or_else(|| backoff(attempt));
                warn!(
                    model,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying chat completion"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.min(6)))
}

/// Names the OpenAI protocol accepts in the `name` field.
fn is_valid_participant_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    r#type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiTool {
    r#type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    /// DeepSeek reasoning models return their chain of thought here.
    #[serde(default)]
    reasoning_content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
