use parley_core::{Message, TokenUsage};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ToolUse,
    ContentFilter,
}

impl StopReason {
    pub fn from_finish_reason(reason: &str) -> Option<Self> {
        match reason {
            "stop" => Some(StopReason::EndTurn),
            "length" => Some(StopReason::MaxTokens),
            "tool_calls" | "function_call" => Some(StopReason::ToolUse),
            "content_filter" => Some(StopReason::ContentFilter),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    pub fn new(id: impl Into<String>, model: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            message,
            stop_reason: None,
            usage: TokenUsage::default(),
        }
    }

    pub fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = Some(reason);
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn text_content(&self) -> String {
        self.message.text_content()
    }

    pub fn thinking(&self) -> Option<String> {
        self.message.thinking_content()
    }

    pub fn has_tool_use(&self) -> bool {
        self.message.has_tool_use()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_response() {
        let resp = CompletionResponse::new("resp-123", "deepseek-chat", Message::assistant("Hello"))
            .with_stop_reason(StopReason::EndTurn)
            .with_usage(TokenUsage::new(10, 5));

        assert_eq!(resp.id, "resp-123");
        assert_eq!(resp.text_content(), "Hello");
        assert_eq!(resp.usage.total(), 15);
        assert!(resp.thinking().is_none());
    }

    #[test]
    fn test_finish_reasons() {
        assert_eq!(StopReason::from_finish_reason("stop"), Some(StopReason::EndTurn));
        assert_eq!(StopReason::from_finish_reason("tool_calls"), Some(StopReason::ToolUse));
        assert_eq!(StopReason::from_finish_reason("length"), Some(StopReason::MaxTokens));
        assert_eq!(StopReason::from_finish_reason("insufficient_system_resource"), None);
    }
}
