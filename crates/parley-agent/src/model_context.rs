use parley_core::{Message, Role};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStats {
    pub message_count: usize,
    pub tool_call_count: usize,
    pub model_calls: usize,
}

/// Conversation history an agent sends to its model. Survives between
/// runs until the agent is reset.
#[derive(Clone, Debug, Default)]
pub struct ModelContext {
    messages: Vec<Message>,
    stats: ContextStats,
}

impl ModelContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: Message) {
        self.stats.message_count += 1;
        self.messages.push(message);
    }

    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.add_message(message);
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The newest `n` messages. A window never opens on tool results whose
    /// call fell outside it.
    pub fn last_messages(&self, n: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..]
            .iter()
            .skip_while(|m| m.role == Role::Tool)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.stats = ContextStats::default();
    }

    pub fn stats(&self) -> ContextStats {
        self.stats.clone()
    }

    pub fn record_model_call(&mut self) {
        self.stats.model_calls += 1;
    }

    pub fn record_tool_calls(&mut self, count: usize) {
        self.stats.tool_call_count += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::message::{ContentBlock, ToolResult};

    #[test]
    fn test_add_message() {
        let mut context = ModelContext::new();
        context.add_message(Message::user("Hello"));
        context.add_message(Message::assistant("Hi there!"));

        assert_eq!(context.len(), 2);
        assert_eq!(context.messages()[0].role, Role::User);
        assert_eq!(context.messages()[1].role, Role::Assistant);
        assert_eq!(context.stats().message_count, 2);
    }

    #[test]
    fn test_last_messages() {
        let mut context = ModelContext::new();
        context.add_messages((0..10).map(|i| Message::user(format!("Message {}", i))));

        let last_3 = context.last_messages(3);
        assert_eq!(last_3.len(), 3);
        assert_eq!(last_3[0].text_content(), "Message 7");
        assert_eq!(context.last_messages(50).len(), 10);
    }

    #[test]
    fn test_window_skips_orphaned_tool_results() {
        let mut context = ModelContext::new();
        context.add_message(Message::user("weather?"));
        context.add_message(Message::assistant("calling"));
        context.add_message(Message::tool(vec![ContentBlock::tool_result(
            ToolResult::success("call_1", "晴天"),
        )]));
        context.add_message(Message::assistant("北京晴天"));

        let window = context.last_messages(2);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].text_content(), "北京晴天");
    }

    #[test]
    fn test_clear() {
        let mut context = ModelContext::new();
        context.add_message(Message::user("Hello"));
        context.record_model_call();
        context.record_tool_calls(2);
        assert_eq!(context.stats().tool_call_count, 2);

        context.clear();
        assert!(context.is_empty());
        assert_eq!(context.stats(), ContextStats::default());
    }
}
