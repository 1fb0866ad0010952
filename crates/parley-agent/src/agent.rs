use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::executor::TurnExecutor;
use crate::message::{ChatMessage, USER_SOURCE};
use crate::model_context::{ContextStats, ModelContext};
use crate::result::{AgentReply, RunEvent, RunStream, TaskResult};
use async_trait::async_trait;
use futures::{stream, FutureExt, StreamExt};
use parley_core::{Context, Message};
use parley_llm::ChatClient;
use parley_tools::{Tool, ToolError, ToolExecutor, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// A participant in a conversation.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Handles the messages the agent has not seen yet and produces its
    /// reply.
    async fn on_messages(&self, ctx: &Context, messages: &[ChatMessage]) -> Result<AgentReply>;

    /// Forgets everything seen so far.
    async fn reset(&self);
}

/// An agent backed by a chat-completion model, optionally with tools.
pub struct AssistantAgent {
    config: AgentConfig,
    client: Arc<dyn ChatClient>,
    tools: Option<ToolExecutor>,
    context: Mutex<ModelContext>,
}

impl AssistantAgent {
    pub fn builder() -> AssistantAgentBuilder {
        AssistantAgentBuilder::new()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    pub fn tools(&self) -> Option<&ToolRegistry> {
        self.tools.as_ref().map(|t| t.registry())
    }

    pub async fn history(&self) -> Vec<Message> {
        self.context.lock().await.messages().to_vec()
    }

    pub async fn stats(&self) -> ContextStats {
        self.context.lock().await.stats()
    }

    /// Runs a single task: the task message, the agent's events, and its
    /// reply.
    pub async fn run(&self, ctx: &Context, task: impl Into<String>) -> Result<TaskResult> {
        let task = ChatMessage::text(USER_SOURCE, task.into());
        let reply = self.on_messages(ctx, std::slice::from_ref(&task)).await?;

        let mut messages = vec![task];
        messages.extend(reply.into_messages());
        Ok(TaskResult::new(messages, None))
    }

    pub fn run_stream(&self, ctx: &Context, task: impl Into<String>) -> RunStream<'_> {
        let ctx = ctx.clone();
        let task = task.into();

        async move { self.run(&ctx, task).await }
            .into_stream()
            .flat_map(|result| {
                let events: Vec<Result<RunEvent>> = match result {
                    Ok(result) => {
                        let mut events: Vec<Result<RunEvent>> = result
                            .messages
                            .iter()
                            .cloned()
                            .map(|m| Ok(RunEvent::Message(m)))
                            .collect();
                        events.push(Ok(RunEvent::Completed(result)));
                        events
                    }
                    Err(e) => vec![Err(e)],
                };
                stream::iter(events)
            })
            .boxed()
    }

    fn to_model_message(&self, message: &ChatMessage) -> Option<Message> {
        let text = message.text_content()?;
        if message.source == self.config.name {
            Some(Message::assistant(text))
        } else {
            Some(Message::user(text).with_name(&message.source))
        }
    }
}

#[async_trait]
impl ChatAgent for AssistantAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    async fn on_messages(&self, ctx: &Context, messages: &[ChatMessage]) -> Result<AgentReply> {
        let mut context = self.context.lock().await;
        context.add_messages(messages.iter().filter_map(|m| self.to_model_message(m)));
        debug!(agent = %self.config.name, new = messages.len(), history = context.len(), "Agent received messages");

        TurnExecutor::new(&self.config, self.client.as_ref(), self.tools.as_ref())
            .execute(ctx, &mut context)
            .await
    }

    async fn reset(&self) {
        self.context.lock().await.clear();
    }
}

impl std::fmt::Debug for AssistantAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantAgent")
            .field("name", &self.config.name)
            .field("model", &self.client.model())
            .field("tools", &self.tools())
            .finish()
    }
}

#[derive(Default)]
pub struct AssistantAgentBuilder {
    config: Option<AgentConfig>,
    name: Option<String>,
    description: Option<String>,
    system_message: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_tool_iterations: Option<usize>,
    reflect_on_tool_use: Option<bool>,
    max_context_messages: Option<usize>,
    tool_timeout: Option<Duration>,
    client: Option<Arc<dyn ChatClient>>,
    registry: ToolRegistry,
    registry_error: Option<ToolError>,
}

impl AssistantAgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = Some(max);
        self
    }

    pub fn reflect_on_tool_use(mut self, reflect: bool) -> Self {
        self.reflect_on_tool_use = Some(reflect);
        self
    }

    pub fn max_context_messages(mut self, max: usize) -> Self {
        self.max_context_messages = Some(max);
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replaces the tools registered so far.
    pub fn tools(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        if let Err(e) = self.registry.register(Arc::new(tool)) {
            self.registry_error.get_or_insert(e);
        }
        self
    }

    pub fn build(self) -> Result<AssistantAgent> {
        let client = self
            .client
            .ok_or_else(|| AgentError::config("a chat client is required"))?;

        if let Some(e) = self.registry_error {
            return Err(e.into());
        }

        let mut config = self.config.unwrap_or_default();

        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(description) = self.description {
            config.description = description;
        }
        if let Some(message) = self.system_message {
            config.system_message = Some(message);
        }
        if let Some(temp) = self.temperature {
            config.temperature = Some(temp);
        }
        if let Some(max) = self.max_tokens {
            config.max_tokens = Some(max);
        }
        if let Some(max) = self.max_tool_iterations {
            config.max_tool_iterations = max;
        }
        if let Some(reflect) = self.reflect_on_tool_use {
            config.reflect_on_tool_use = reflect;
        }
        if let Some(max) = self.max_context_messages {
            config.max_context_messages = max;
        }
        if let Some(timeout) = self.tool_timeout {
            config.tool_timeout_secs = timeout.as_secs();
        }

        validate_name(&config.name)?;
        if config.max_tool_iterations == 0 {
            return Err(AgentError::config("max_tool_iterations must be at least 1"));
        }
        if config.max_context_messages == 0 {
            return Err(AgentError::config("max_context_messages must be at least 1"));
        }

        let tools = if self.registry.is_empty() {
            None
        } else {
            if !client.model_info().function_calling {
                return Err(AgentError::config(format!(
                    "model {} does not support function calling, but agent {} has tools",
                    client.model(),
                    config.name
                )));
            }
            let timeout = self.tool_timeout.unwrap_or_else(|| config.tool_timeout());
            Some(ToolExecutor::new(Arc::new(self.registry)).with_timeout(timeout))
        };

        Ok(AssistantAgent {
            config,
            client,
            tools,
            context: Mutex::new(ModelContext::new()),
        })
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AgentError::config("agent name must not be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(AgentError::config(format!(
            "agent name must not contain whitespace: {:?}",
            name
        )));
    }
    Ok(())
}
