use crate::error::{AgentError, Result};
use crate::message::ChatMessage;
use futures::stream::BoxStream;
use futures::StreamExt;
use parley_core::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What one agent turn produced: the reply other participants see, and the
/// events that led to it.
#[derive(Clone, Debug)]
pub struct AgentReply {
    pub chat_message: ChatMessage,
    pub inner_messages: Vec<ChatMessage>,
}

impl AgentReply {
    pub fn new(chat_message: ChatMessage) -> Self {
        Self {
            chat_message,
            inner_messages: Vec::new(),
        }
    }

    pub fn with_inner_messages(mut self, inner: Vec<ChatMessage>) -> Self {
        self.inner_messages = inner;
        self
    }

    /// Inner messages first, then the reply.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        let mut messages = self.inner_messages;
        messages.push(self.chat_message);
        messages
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TaskResult {
    pub messages: Vec<ChatMessage>,
    pub stop_reason: Option<String>,
}

impl TaskResult {
    pub fn new(messages: Vec<ChatMessage>, stop_reason: Option<String>) -> Self {
        Self {
            messages,
            stop_reason,
        }
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| !m.is_event())
    }

    /// Model usage summed over every message of the run.
    pub fn usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for usage in self.messages.iter().filter_map(|m| m.usage) {
            total += usage;
        }
        total
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{}", message)?;
        }
        match &self.stop_reason {
            Some(reason) => write!(f, "Stop reason: {}", reason),
            None => write!(f, "Stop reason: none"),
        }
    }
}

/// Item of a streamed run. Every message comes as it is produced, and the
/// stream ends with the aggregated result.
#[derive(Clone, Debug)]
pub enum RunEvent {
    Message(ChatMessage),
    Completed(TaskResult),
}

pub type RunStream<'a> = BoxStream<'a, Result<RunEvent>>;

/// Drains a run stream and returns its final result.
pub async fn collect_result(mut stream: RunStream<'_>) -> Result<TaskResult> {
    while let Some(event) = stream.next().await {
        if let RunEvent::Completed(result) = event? {
            return Ok(result);
        }
    }
    Err(AgentError::internal("run stream ended without a result"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn result() -> TaskResult {
        TaskResult::new(
            vec![
                ChatMessage::text("user", "北京天气?"),
                ChatMessage::thought("weather_assistant", "look it up")
                    .with_usage(TokenUsage::new(10, 2)),
                ChatMessage::text("weather_assistant", "晴天").with_usage(TokenUsage::new(20, 5)),
            ],
            Some("Text 'TERMINATE' mentioned".to_string()),
        )
    }

    #[test]
    fn test_usage_and_last_message() {
        let result = result();
        assert_eq!(result.usage(), TokenUsage::new(30, 7));
        assert_eq!(result.last_message().unwrap().to_text(), "晴天");
    }

    #[test]
    fn test_display() {
        let text = result().to_string();
        assert!(text.starts_with("[user] 北京天气?\n"));
        assert!(text.ends_with("Stop reason: Text 'TERMINATE' mentioned"));
        assert!(TaskResult::default().to_string().contains("none"));
    }

    #[test]
    fn test_reply_order() {
        let reply = AgentReply::new(ChatMessage::text("a", "answer"))
            .with_inner_messages(vec![ChatMessage::thought("a", "thinking")]);
        let messages = reply.into_messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_event());
        assert_eq!(messages[1].to_text(), "answer");
    }

    #[tokio::test]
    async fn test_collect_result() {
        let events: Vec<Result<RunEvent>> = vec![
            Ok(RunEvent::Message(ChatMessage::text("user", "hi"))),
            Ok(RunEvent::Completed(result())),
        ];
        let collected = collect_result(stream::iter(events).boxed()).await.unwrap();
        assert_eq!(collected.messages.len(), 3);

        let empty: Vec<Result<RunEvent>> = vec![];
        assert!(matches!(
            collect_result(stream::iter(empty).boxed()).await,
            Err(AgentError::Internal(_))
        ));
    }
}
