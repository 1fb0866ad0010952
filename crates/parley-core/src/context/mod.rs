use crate::types::{RequestId, Timestamp};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-run execution context: deadline, cancellation and the agent the
/// work is being done for. Cheap to clone; clones share the token.
#[derive(Clone)]
pub struct Context {
    pub request_id: RequestId,
    pub parent_id: Option<RequestId>,
    pub agent: Option<String>,
    pub started_at: Timestamp,
    pub deadline: Option<Timestamp>,
    cancellation: CancellationToken,
}

impl Context {
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            parent_id: None,
            agent: None,
            started_at: Timestamp::now(),
            deadline: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = self.started_at.after(timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Timestamp) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Child context: a fresh request id, the same deadline, and a child
    /// token that is cancelled along with the parent.
    pub fn child(&self) -> Self {
        Self {
            request_id: RequestId::new(),
            parent_id: Some(self.request_id),
            agent: self.agent.clone(),
            started_at: Timestamp::now(),
            deadline: self.deadline,
            cancellation: self.cancellation.child_token(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn is_timeout(&self) -> bool {
        match self.deadline {
            Some(deadline) => Timestamp::now() > deadline,
            None => false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_timeout()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| {
            let now = Timestamp::now().unix_millis();
            let deadline = d.unix_millis();
            if deadline > now {
                Duration::from_millis((deadline - now) as u64)
            } else {
                Duration::ZERO
            }
        })
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("parent_id", &self.parent_id)
            .field("agent", &self.agent)
            .field("deadline", &self.deadline)
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_cancelled_with_parent() {
        let parent = Context::new().with_agent("weather_assistant");
        let child = parent.child();

        assert_eq!(child.parent_id, Some(parent.request_id));
        assert_eq!(child.agent.as_deref(), Some("weather_assistant"));
        assert!(!child.is_cancelled());

        parent.cancel();
        assert!(child.is_cancelled());
        assert!(child.is_done());
    }

    #[test]
    fn test_cancelling_child_leaves_parent() {
        let parent = Context::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_remaining_with_timeout() {
        let ctx = Context::new().with_timeout(Duration::from_secs(30));
        let remaining = ctx.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(30));
        assert!(remaining > Duration::from_secs(25));
        assert!(!ctx.is_timeout());

        assert!(Context::new().remaining().is_none());
    }

    #[test]
    fn test_huge_timeout_means_no_deadline() {
        let ctx = Context::new().with_timeout(Duration::MAX);
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_timeout());
    }

    #[test]
    fn test_past_deadline() {
        let ctx = Context::new().with_deadline(Timestamp::from_unix_millis(0).unwrap());
        assert!(ctx.is_timeout());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
