mod loader;
mod types;

pub use loader::CONFIG_SEARCH_PATHS;
pub use types::{Config, GeneralConfig, LlmConfig, LogLevel};
