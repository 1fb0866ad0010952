use parley_core::message::{ToolResult, ToolUse};
use parley_core::{MessageId, Timestamp, TokenUsage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source name used for the task that starts a run.
pub const USER_SOURCE: &str = "user";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    /// Reasoning trace of a reasoning model.
    Thought(String),
    ToolCallRequest(Vec<ToolUse>),
    ToolCallExecution(Vec<ToolResult>),
    /// Tool results handed back as the reply when the agent does not
    /// reflect on them.
    ToolCallSummary(String),
}

/// One entry of a run transcript.
///
/// Thoughts and tool-call requests/executions are events: they are shown
/// and recorded but not handed to other participants, and do not count
/// towards message-count termination unless asked to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub source: String,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn new(source: impl Into<String>, content: MessageContent) -> Self {
        Self {
            id: MessageId::new(),
            source: source.into(),
            content,
            usage: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn text(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(source, MessageContent::Text(text.into()))
    }

    pub fn thought(source: impl Into<String>, thought: impl Into<String>) -> Self {
        Self::new(source, MessageContent::Thought(thought.into()))
    }

    pub fn tool_call_request(source: impl Into<String>, calls: Vec<ToolUse>) -> Self {
        Self::new(source, MessageContent::ToolCallRequest(calls))
    }

    pub fn tool_call_execution(source: impl Into<String>, results: Vec<ToolResult>) -> Self {
        Self::new(source, MessageContent::ToolCallExecution(results))
    }

    pub fn tool_call_summary(source: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(source, MessageContent::ToolCallSummary(summary.into()))
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn is_event(&self) -> bool {
        matches!(
            self.content,
            MessageContent::Thought(_)
                | MessageContent::ToolCallRequest(_)
                | MessageContent::ToolCallExecution(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self.content {
            MessageContent::Text(_) => "TextMessage",
            MessageContent::Thought(_) => "ThoughtEvent",
            MessageContent::ToolCallRequest(_) => "ToolCallRequestEvent",
            MessageContent::ToolCallExecution(_) => "ToolCallExecutionEvent",
            MessageContent::ToolCallSummary(_) => "ToolCallSummaryMessage",
        }
    }

    /// Text a participant reads: the body of text and summary messages.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) | MessageContent::ToolCallSummary(text) => Some(text),
            _ => None,
        }
    }

    /// Human-readable body of any message.
    pub fn to_text(&self) -> String {
        match &self.content {
            MessageContent::Text(text)
            | MessageContent::Thought(text)
            | MessageContent::ToolCallSummary(text) => text.clone(),
            MessageContent::ToolCallRequest(calls) => calls
                .iter()
                .map(|c| format!("{}({})", c.name, c.input))
                .collect::<Vec<_>>()
                .join("\n"),
            MessageContent::ToolCallExecution(results) => results
                .iter()
                .map(|r| {
                    if r.is_error {
                        format!("[{}] error: {}", r.tool_use_id, r.content)
                    } else {
                        format!("[{}] {}", r.tool_use_id, r.content)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.to_text())
    }
}
