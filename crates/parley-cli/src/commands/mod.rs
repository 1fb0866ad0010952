pub mod chat;
pub mod check;
pub mod demo;
pub mod run;

use parley_agent::AssistantAgent;
use parley_core::Config;
use parley_llm::credentials::clear_proxy_env;
use parley_llm::{ChatClient, ClientConfig, OpenAiChatClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Clears the proxy variables before any client reads the environment.
/// Returns the variables that were removed.
pub fn prepare_environment() -> Vec<&'static str> {
    let removed = clear_proxy_env();
    if !removed.is_empty() {
        info!(vars = ?removed, "Proxy variables cleared");
    }
    removed
}

/// Client settings after merging the config file, environment and flags.
#[derive(Clone, Debug)]
pub struct Settings {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub no_proxy: bool,
}

impl Settings {
    pub fn new(config: &Config) -> Self {
        Self {
            model: config.llm.default_model.clone(),
            api_key: config.llm.api_key.clone(),
            base_url: config.llm.base_url.clone(),
            timeout_secs: config.llm.timeout_secs,
            max_retries: config.llm.max_retries,
            no_proxy: config.llm.no_proxy,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if api_key.is_some() {
            self.api_key = api_key;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    pub fn with_no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy |= no_proxy;
        self
    }

    pub fn client_config(&self, model: &str) -> ClientConfig {
        let mut config = ClientConfig::new(model)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries);
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if self.no_proxy {
            config = config.without_proxy();
        }
        config
    }

    pub fn client(&self, model: &str) -> anyhow::Result<Arc<dyn ChatClient>> {
        let client = OpenAiChatClient::new(self.client_config(model))?;
        Ok(Arc::new(client))
    }
}

pub fn create_agent(
    settings: &Settings,
    model: &str,
    name: &str,
    system_message: &str,
) -> anyhow::Result<AssistantAgent> {
    let agent = AssistantAgent::builder()
        .name(name)
        .system_message(system_message)
        .client(settings.client(model)?)
        .build()?;
    Ok(agent)
}
