use super::termination::TerminationCondition;
use crate::agent::ChatAgent;
use crate::error::{AgentError, Result};
use crate::message::{ChatMessage, USER_SOURCE};
use crate::result::{collect_result, RunEvent, RunStream, TaskResult};
use futures::{stream, StreamExt};
use parley_core::Context;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// A team whose participants take turns in a fixed order.
///
/// The conversation thread and the position in the rotation survive
/// between runs until [`reset`](Self::reset). Only one run may be in
/// progress at a time.
pub struct RoundRobinGroupChat {
    participants: Vec<Arc<dyn ChatAgent>>,
    max_turns: Option<usize>,
    state: Mutex<TeamState>,
}

struct TeamState {
    thread: Vec<ChatMessage>,
    /// Per participant, the first thread index it has not been handed yet.
    cursors: Vec<usize>,
    next_speaker: usize,
    termination: Option<Box<dyn TerminationCondition>>,
}

impl TeamState {
    fn reset_termination(&mut self) {
        if let Some(termination) = self.termination.as_mut() {
            termination.reset();
        }
    }
}

impl RoundRobinGroupChat {
    pub fn builder() -> RoundRobinGroupChatBuilder {
        RoundRobinGroupChatBuilder::default()
    }

    pub fn participant_names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name()).collect()
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    pub async fn run(&self, ctx: &Context, task: impl Into<String>) -> Result<TaskResult> {
        collect_result(self.run_stream(ctx, task)).await
    }

    pub fn run_stream(&self, ctx: &Context, task: impl Into<String>) -> RunStream<'_> {
        self.start(ctx, Some(task.into()))
    }

    /// Continues the conversation from the next speaker without a new task.
    pub async fn resume(&self, ctx: &Context) -> Result<TaskResult> {
        collect_result(self.resume_stream(ctx)).await
    }

    pub fn resume_stream(&self, ctx: &Context) -> RunStream<'_> {
        self.start(ctx, None)
    }

    /// Clears the thread, the rotation and every participant.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| AgentError::AlreadyRunning)?;

        state.thread.clear();
        state.cursors.iter_mut().for_each(|c| *c = 0);
        state.next_speaker = 0;
        state.reset_termination();

        for participant in &self.participants {
            participant.reset().await;
        }
        info!(participants = self.participants.len(), "Team reset");
        Ok(())
    }

    /// The whole conversation so far. Waits for a run in progress to end.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.thread.clone()
    }

    fn start(&self, ctx: &Context, task: Option<String>) -> RunStream<'_> {
        let Ok(state) = self.state.try_lock() else {
            return stream::once(async { Err(AgentError::AlreadyRunning) }).boxed();
        };

        let mut run = TeamRun {
            team: self,
            state,
            ctx: ctx.clone(),
            messages: Vec::new(),
            pending: VecDeque::new(),
            turns: 0,
            done: false,
            completed: false,
        };

        if let Err(e) = run.begin(task) {
            return stream::once(async move { Err(e) }).boxed();
        }

        stream::unfold(run, |mut run| async move {
            loop {
                if let Some(event) = run.pending.pop_front() {
                    return Some((Ok(event), run));
                }
                if run.done {
                    return None;
                }
                if let Err(e) = run.step().await {
                    run.done = true;
                    return Some((Err(e), run));
                }
            }
        })
        .boxed()
    }
}

/// One run in progress. Holds the team state for its whole lifetime.
struct TeamRun<'a> {
    team: &'a RoundRobinGroupChat,
    state: MutexGuard<'a, TeamState>,
    ctx: Context,
    messages: Vec<ChatMessage>,
    pending: VecDeque<RunEvent>,
    turns: usize,
    done: bool,
    completed: bool,
}

impl TeamRun<'_> {
    fn begin(&mut self, task: Option<String>) -> Result<()> {
        match task {
            Some(task) => {
                let task = ChatMessage::text(USER_SOURCE, task);
                info!(participants = self.team.participants.len(), "Team run started");
                self.record(vec![task]);
                let delta = self.messages.clone();
                self.check_termination(&delta);
                Ok(())
            }
            None if self.state.thread.is_empty() => Err(AgentError::NoTask),
            None => {
                info!(thread = self.state.thread.len(), "Team run resumed");
                Ok(())
            }
        }
    }

    async fn step(&mut self) -> Result<()> {
        if self.ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let count = self.team.participants.len();
        let index = self.state.next_speaker % count;
        self.state.next_speaker = (index + 1) % count;
        let speaker = Arc::clone(&self.team.participants[index]);

        let unseen: Vec<ChatMessage> = self.state.thread[self.state.cursors[index]..]
            .iter()
            .filter(|m| !m.is_event() && m.source != speaker.name())
            .cloned()
            .collect();
        self.state.cursors[index] = self.state.thread.len();

        info!(speaker = speaker.name(), turn = self.turns + 1, "Speaker selected");
        debug!(speaker = speaker.name(), messages = unseen.len(), "Handing over messages");

        let ctx = self.ctx.child().with_agent(speaker.name());
        let reply = speaker.on_messages(&ctx, &unseen).await?;
        self.turns += 1;

        let delta = reply.into_messages();
        self.record(delta.clone());

        if self.check_termination(&delta) {
            return Ok(());
        }
        if let Some(max) = self.team.max_turns {
            if self.turns >= max {
                self.finish(Some(format!("Maximum number of turns {} reached.", max)));
            }
        }
        Ok(())
    }

    fn record(&mut self, delta: Vec<ChatMessage>) {
        for message in delta {
            self.state.thread.push(message.clone());
            self.messages.push(message.clone());
            self.pending.push_back(RunEvent::Message(message));
        }
    }

    fn check_termination(&mut self, delta: &[ChatMessage]) -> bool {
        let stop = self
            .state
            .termination
            .as_mut()
            .and_then(|t| t.check(delta));

        match stop {
            Some(stop) => {
                self.finish(Some(stop.content));
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, stop_reason: Option<String>) {
        info!(turns = self.turns, stop_reason = ?stop_reason, "Team run finished");
        self.state.reset_termination();
        self.pending.push_back(RunEvent::Completed(TaskResult::new(
            std::mem::take(&mut self.messages),
            stop_reason,
        )));
        self.done = true;
        self.completed = true;
    }
}

impl Drop for TeamRun<'_> {
    fn drop(&mut self) {
        // Failed or abandoned runs still leave the condition fresh.
        if !self.completed {
            self.state.reset_termination();
        }
    }
}

#[derive(Default)]
pub struct RoundRobinGroupChatBuilder {
    participants: Vec<Arc<dyn ChatAgent>>,
    termination: Option<Box<dyn TerminationCondition>>,
    max_turns: Option<usize>,
}

impl RoundRobinGroupChatBuilder {
    pub fn participant(self, agent: impl ChatAgent + 'static) -> Self {
        self.shared_participant(Arc::new(agent))
    }

    pub fn shared_participant(mut self, agent: Arc<dyn ChatAgent>) -> Self {
        self.participants.push(agent);
        self
    }

    pub fn termination(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.termination = Some(Box::new(condition));
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn build(self) -> Result<RoundRobinGroupChat> {
        if self.participants.is_empty() {
            return Err(AgentError::config("a team needs at least one participant"));
        }

        let mut names = HashSet::new();
        for participant in &self.participants {
            if !names.insert(participant.name()) {
                return Err(AgentError::config(format!(
                    "duplicate participant name: {}",
                    participant.name()
                )));
            }
        }

        if self.termination.is_none() && self.max_turns.is_none() {
            return Err(AgentError::config(
                "a team needs a termination condition or max_turns",
            ));
        }
        if self.max_turns == Some(0) {
            return Err(AgentError::config("max_turns must be at least 1"));
        }

        let cursors = vec![0; self.participants.len()];
        Ok(RoundRobinGroupChat {
            participants: self.participants,
            max_turns: self.max_turns,
            state: Mutex::new(TeamState {
                thread: Vec::new(),
                cursors,
                next_speaker: 0,
                termination: self.termination,
            }),
        })
    }
}
