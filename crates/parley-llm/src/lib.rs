pub mod config;
pub mod credentials;
pub mod error;
pub mod model_info;
pub mod providers;
pub mod traits;
pub mod types;

pub use config::{ClientConfig, CredentialSource, ResolvedClientConfig};
pub use error::{LlmError, Result};
pub use model_info::{get_info, ModelFamily, ModelInfo, Provider, DEEPSEEK_API_BASE_URL, OPENAI_API_BASE_URL};
pub use traits::ChatClient;
pub use types::{CompletionRequest, CompletionResponse, StopReason, ToolChoice};

#[cfg(feature = "openai")]
pub use providers::OpenAiChatClient;

pub mod prelude {
    pub use crate::config::{ClientConfig, CredentialSource, ResolvedClientConfig};
    pub use crate::credentials::{clear_proxy_env, set_api_key, set_base_url};
    pub use crate::error::{LlmError, Result};
    pub use crate::model_info::{get_info, ModelFamily, ModelInfo, Provider};
    pub use crate::traits::ChatClient;
    pub use crate::types::{CompletionRequest, CompletionResponse, StopReason, ToolChoice};

    #[cfg(feature = "openai")]
    pub use crate::providers::OpenAiChatClient;
}

/// Serializes tests that write process environment variables.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
