//! Scripted model clients and agents for tests.

use crate::agent::ChatAgent;
use crate::error::Result;
use crate::message::ChatMessage;
use crate::result::AgentReply;
use async_trait::async_trait;
use parley_core::message::{ContentBlock, ToolUse};
use parley_core::{Context, Message, Role, TokenUsage};
use parley_llm::{
    get_info, ChatClient, CompletionRequest, CompletionResponse, LlmError, ModelInfo, StopReason,
};
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) fn text(content: &str) -> CompletionResponse {
    CompletionResponse::new("resp", "scripted", Message::assistant(content))
        .with_stop_reason(StopReason::EndTurn)
        .with_usage(TokenUsage::new(10, 5))
}

pub(crate) fn reasoning(thought: &str, content: &str) -> CompletionResponse {
    let message = Message::new(
        Role::Assistant,
        vec![ContentBlock::thinking(thought), ContentBlock::text(content)],
    );
    CompletionResponse::new("resp", "scripted", message).with_usage(TokenUsage::new(10, 20))
}

pub(crate) fn tool_call(id: &str, name: &str, input: serde_json::Value) -> CompletionResponse {
    let message = Message::new(
        Role::Assistant,
        vec![ContentBlock::tool_use(ToolUse::new(id, name, input))],
    );
    CompletionResponse::new("resp", "scripted", message)
        .with_stop_reason(StopReason::ToolUse)
        .with_usage(TokenUsage::new(8, 4))
}

/// Replays canned responses in order and records every request.
pub(crate) struct ScriptedClient {
    info: ModelInfo,
    responses: Mutex<VecDeque<parley_llm::Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(model: &str, responses: Vec<CompletionResponse>) -> Self {
        let info = get_info(model).unwrap_or_else(|| panic!("unknown test model {model}"));
        Self {
            info,
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn deepseek_v3(responses: Vec<CompletionResponse>) -> Self {
        Self::new("deepseek-v3", responses)
    }

    pub fn deepseek_r1(responses: Vec<CompletionResponse>) -> Self {
        Self::new("deepseek-r1", responses)
    }

    pub fn push_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    fn model(&self) -> &str {
        &self.info.id
    }

    fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    async fn create(&self, request: CompletionRequest) -> parley_llm::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text("default response")))
    }
}

/// Replies `"{name} turn {n}"` and records what it was handed.
pub(crate) struct EchoAgent {
    name: String,
    turns: Mutex<usize>,
    received: Mutex<Vec<ChatMessage>>,
}

impl EchoAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            turns: Mutex::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<ChatMessage> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatAgent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echoes its turn number"
    }

    async fn on_messages(&self, _ctx: &Context, messages: &[ChatMessage]) -> Result<AgentReply> {
        self.received.lock().unwrap().extend_from_slice(messages);
        let mut turns = self.turns.lock().unwrap();
        *turns += 1;
        Ok(AgentReply::new(ChatMessage::text(
            &self.name,
            format!("{} turn {}", self.name, *turns),
        )))
    }

    async fn reset(&self) {
        *self.turns.lock().unwrap() = 0;
        self.received.lock().unwrap().clear();
    }
}
