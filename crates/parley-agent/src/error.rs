use parley_core::error::Error as CoreError;
use parley_llm::LlmError;
use parley_tools::ToolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Max tool iterations reached: {0}")]
    MaxIterationsReached(usize),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,

    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("No task given and nothing to resume")]
    NoTask,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Raised before the run did any work: bad builder input, missing
    /// credentials, unknown models.
    pub fn is_configuration(&self) -> bool {
        match self {
            AgentError::Config(_) => true,
            AgentError::Llm(e) => e.is_configuration(),
            AgentError::Core(e) => e.is_config(),
            _ => false,
        }
    }
}
