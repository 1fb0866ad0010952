pub mod agent;
pub mod config;
pub mod console;
pub mod error;
mod executor;
pub mod message;
pub mod model_context;
pub mod result;
pub mod team;

#[cfg(test)]
mod testing;

pub use agent::{AssistantAgent, AssistantAgentBuilder, ChatAgent};
pub use config::AgentConfig;
pub use console::Console;
pub use error::{AgentError, Result};
pub use message::{ChatMessage, MessageContent};
pub use model_context::{ContextStats, ModelContext};
pub use result::{collect_result, AgentReply, RunEvent, RunStream, TaskResult};
pub use team::{
    MaxMessageTermination, RoundRobinGroupChat, RoundRobinGroupChatBuilder, StopMessage,
    TerminationCondition, TextMentionTermination,
};

pub mod prelude {
    pub use crate::agent::{AssistantAgent, AssistantAgentBuilder, ChatAgent};
    pub use crate::config::AgentConfig;
    pub use crate::console::Console;
    pub use crate::error::{AgentError, Result};
    pub use crate::message::{ChatMessage, MessageContent};
    pub use crate::result::{AgentReply, RunEvent, RunStream, TaskResult};
    pub use crate::team::{
        MaxMessageTermination, RoundRobinGroupChat, StopMessage, TerminationCondition,
        TextMentionTermination,
    };
}
