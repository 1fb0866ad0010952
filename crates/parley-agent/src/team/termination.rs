//! Conditions that end a team run.
//!
//! A condition sees each batch of new messages once, after the turn that
//! produced it. Once it fires it stays terminated, and returns `None`, until
//! reset.

use crate::message::ChatMessage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopMessage {
    pub content: String,
    pub source: String,
}

impl StopMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

pub trait TerminationCondition: Send + Sync {
    fn check(&mut self, delta: &[ChatMessage]) -> Option<StopMessage>;

    fn terminated(&self) -> bool;

    fn reset(&mut self);

    /// Stops when either condition fires.
    fn or<T>(self, other: T) -> OrTermination
    where
        Self: Sized + 'static,
        T: TerminationCondition + 'static,
    {
        OrTermination::new(Box::new(self), Box::new(other))
    }

    /// Stops once both conditions have fired, not necessarily on the same
    /// check.
    fn and<T>(self, other: T) -> AndTermination
    where
        Self: Sized + 'static,
        T: TerminationCondition + 'static,
    {
        AndTermination::new(Box::new(self), Box::new(other))
    }
}

impl TerminationCondition for Box<dyn TerminationCondition> {
    fn check(&mut self, delta: &[ChatMessage]) -> Option<StopMessage> {
        (**self).check(delta)
    }

    fn terminated(&self) -> bool {
        (**self).terminated()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Fires once `max_messages` messages have been seen. Events are not counted
/// unless [`include_events`](Self::include_events) is set.
#[derive(Clone, Debug)]
pub struct MaxMessageTermination {
    max_messages: usize,
    include_events: bool,
    count: usize,
    terminated: bool,
}

impl MaxMessageTermination {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            include_events: false,
            count: 0,
            terminated: false,
        }
    }

    pub fn include_events(mut self) -> Self {
        self.include_events = true;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl TerminationCondition for MaxMessageTermination {
    fn check(&mut self, delta: &[ChatMessage]) -> Option<StopMessage> {
        if self.terminated {
            return None;
        }

        self.count += delta
            .iter()
            .filter(|m| self.include_events || !m.is_event())
            .count();

        if self.count >= self.max_messages {
            self.terminated = true;
            return Some(StopMessage::new(
                "MaxMessageTermination",
                format!(
                    "Maximum number of messages {} reached, current message count: {}",
                    self.max_messages, self.count
                ),
            ));
        }
        None
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        self.count = 0;
        self.terminated = false;
    }
}

/// Fires when a text or tool-summary message contains `text`.
#[derive(Clone, Debug)]
pub struct TextMentionTermination {
    text: String,
    sources: Option<Vec<String>>,
    terminated: bool,
}

impl TextMentionTermination {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
            terminated: false,
        }
    }

    /// Only messages from these sources are considered.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    fn accepts_source(&self, source: &str) -> bool {
        match &self.sources {
            Some(sources) => sources.iter().any(|s| s == source),
            None => true,
        }
    }
}

impl TerminationCondition for TextMentionTermination {
    fn check(&mut self, delta: &[ChatMessage]) -> Option<StopMessage> {
        if self.terminated {
            return None;
        }

        let mentioned = delta.iter().any(|m| {
            self.accepts_source(&m.source)
                && m.text_content().map_or(false, |t| t.contains(&self.text))
        });

        if mentioned {
            self.terminated = true;
            return Some(StopMessage::new(
                "TextMentionTermination",
                format!("Text '{}' mentioned", self.text),
            ));
        }
        None
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        self.terminated = false;
    }
}

pub struct OrTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
    terminated: bool,
}

impl OrTermination {
    pub fn new(a: Box<dyn TerminationCondition>, b: Box<dyn TerminationCondition>) -> Self {
        Self {
            conditions: vec![a, b],
            terminated: false,
        }
    }
}

impl TerminationCondition for OrTermination {
    fn check(&mut self, delta: &[ChatMessage]) -> Option<StopMessage> {
        if self.terminated {
            return None;
        }

        // Every condition sees every batch so counters stay in step.
        let fired: Vec<StopMessage> = self
            .conditions
            .iter_mut()
            .filter_map(|c| c.check(delta))
            .collect();

        if fired.is_empty() {
            return None;
        }
        self.terminated = true;
        Some(join_stop_messages(&fired))
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        self.terminated = false;
        for c in &mut self.conditions {
            c.reset();
        }
    }
}

pub struct AndTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
    fired: Vec<StopMessage>,
    terminated: bool,
}

impl AndTermination {
    pub fn new(a: Box<dyn TerminationCondition>, b: Box<dyn TerminationCondition>) -> Self {
        Self {
            conditions: vec![a, b],
            fired: Vec::new(),
            terminated: false,
        }
    }
}

impl TerminationCondition for AndTermination {
    fn check(&mut self, delta: &[ChatMessage]) -> Option<StopMessage> {
        if self.terminated {
            return None;
        }

        for c in self.conditions.iter_mut().filter(|c| !c.terminated()) {
            if let Some(stop) = c.check(delta) {
                self.fired.push(stop);
            }
        }

        if self.conditions.iter().all(|c| c.terminated()) {
            self.terminated = true;
            return Some(join_stop_messages(&self.fired));
        }
        None
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        self.terminated = false;
        self.fired.clear();
        for c in &mut self.conditions {
            c.reset();
        }
    }
}

fn join_stop_messages(messages: &[StopMessage]) -> StopMessage {
    StopMessage {
        content: messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        source: messages
            .iter()
            .map(|m| m.source.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str, n: usize) -> Vec<ChatMessage> {
        (0..n).map(|i| ChatMessage::text(source, format!("m{}", i))).collect()
    }

    #[test]
    fn test_max_messages() {
        let mut cond = MaxMessageTermination::new(6);
        assert!(cond.check(&texts("user", 1)).is_none());
        assert!(cond.check(&texts("a", 4)).is_none());

        let stop = cond.check(&texts("b", 1)).unwrap();
        assert_eq!(
            stop.content,
            "Maximum number of messages 6 reached, current message count: 6"
        );
        assert!(cond.terminated());
        assert!(cond.check(&texts("c", 1)).is_none());

        cond.reset();
        assert!(!cond.terminated());
        assert_eq!(cond.count(), 0);
    }

    #[test]
    fn test_max_messages_zero_fires_immediately() {
        let mut cond = MaxMessageTermination::new(0);
        assert!(cond.check(&[]).is_some());
    }

    #[test]
    fn test_events_not_counted_by_default() {
        let delta = vec![
            ChatMessage::thought("r1", "thinking"),
            ChatMessage::tool_call_request("a", vec![]),
            ChatMessage::text("r1", "answer"),
        ];

        let mut plain = MaxMessageTermination::new(2);
        assert!(plain.check(&delta).is_none());
        assert_eq!(plain.count(), 1);

        let mut with_events = MaxMessageTermination::new(2).include_events();
        assert!(with_events.check(&delta).is_some());
    }

    #[test]
    fn test_text_mention() {
        let mut cond = TextMentionTermination::new("TERMINATE");
        assert!(cond.check(&[ChatMessage::text("a", "keep going")]).is_none());
        assert!(cond
            .check(&[ChatMessage::thought("a", "TERMINATE soon")])
            .is_none());

        let stop = cond.check(&[ChatMessage::text("a", "done. TERMINATE")]).unwrap();
        assert_eq!(stop.content, "Text 'TERMINATE' mentioned");
        assert_eq!(stop.source, "TextMentionTermination");
    }

    #[test]
    fn test_text_mention_in_summary_and_sources() {
        let mut cond = TextMentionTermination::new("APPROVE").with_sources(["总结专家"]);
        assert!(cond.check(&[ChatMessage::text("创意专家", "APPROVE")]).is_none());
        assert!(cond
            .check(&[ChatMessage::tool_call_summary("总结专家", "APPROVE")])
            .is_some());
    }

    #[test]
    fn test_or_combination() {
        let mut cond = MaxMessageTermination::new(3).or(TextMentionTermination::new("TERMINATE"));
        assert!(cond.check(&texts("a", 1)).is_none());

        let stop = cond.check(&[ChatMessage::text("a", "TERMINATE")]).unwrap();
        assert_eq!(stop.content, "Text 'TERMINATE' mentioned");
        assert!(cond.terminated());
        assert!(cond.check(&texts("a", 5)).is_none());

        cond.reset();
        assert!(!cond.terminated());
        let stop = cond.check(&texts("a", 3)).unwrap();
        assert!(stop.content.starts_with("Maximum number of messages 3"));
    }

    #[test]
    fn test_or_both_fire() {
        let mut cond = MaxMessageTermination::new(1).or(TextMentionTermination::new("x"));
        let stop = cond.check(&[ChatMessage::text("a", "x")]).unwrap();
        assert_eq!(
            stop.content,
            "Maximum number of messages 1 reached, current message count: 1; Text 'x' mentioned"
        );
    }

    #[test]
    fn test_and_across_checks() {
        let mut cond = MaxMessageTermination::new(2).and(TextMentionTermination::new("done"));

        assert!(cond.check(&[ChatMessage::text("a", "done")]).is_none());
        let stop = cond.check(&texts("b", 1)).unwrap();
        assert!(stop.content.contains("Text 'done' mentioned"));
        assert!(stop.content.contains("Maximum number of messages 2"));
        assert!(cond.terminated());

        cond.reset();
        assert!(cond.check(&texts("b", 2)).is_none());
    }

    #[test]
    fn test_boxed_condition() {
        let mut boxed: Box<dyn TerminationCondition> = Box::new(MaxMessageTermination::new(1));
        assert!(boxed.check(&texts("a", 1)).is_some());
        assert!(boxed.terminated());
    }
}
