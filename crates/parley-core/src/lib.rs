pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod tool;
pub mod types;
pub mod usage;

pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
pub use message::{ContentBlock, Message, MessageBuilder, Role};
pub use tool::{ToolDefinition, ToolParameter};
pub use types::{Id, MessageId, Timestamp};
pub use usage::TokenUsage;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::message::{ContentBlock, Message, MessageBuilder, Role, ToolResult, ToolUse};
    pub use crate::tool::{ToolDefinition, ToolParameter};
    pub use crate::types::{Id, MessageId, Timestamp};
    pub use crate::usage::TokenUsage;
}
