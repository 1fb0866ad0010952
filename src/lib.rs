//! Chat-completion agents and round-robin teams for OpenAI-compatible
//! endpoints, with first-class DeepSeek model support.
//!
//! The workspace crates are re-exported under their short names:
//!
//! - [`core`]: messages, tool schemas, context and configuration
//! - [`llm`]: the chat-completion client and model registry
//! - [`tools`]: tool trait, function tools, registry and executor
//! - [`agent`]: assistant agents, teams, termination and the console

pub use parley_agent as agent;
pub use parley_core as core;
pub use parley_llm as llm;
pub use parley_tools as tools;

pub mod prelude {
    pub use parley_agent::prelude::*;
    pub use parley_core::{Context, ToolDefinition, ToolParameter};
    pub use parley_llm::credentials::{clear_proxy_env, set_api_key};
    pub use parley_llm::{get_info, ChatClient, ClientConfig, ModelInfo, OpenAiChatClient, Provider};
    pub use parley_tools::{FunctionTool, Tool, ToolOutput, ToolRegistry};
}
