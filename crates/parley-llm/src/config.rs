use crate::credentials::{normalize_base_url, resolve_value, EnvLookup, ProcessEnv};
use crate::error::{LlmError, Result};
use crate::model_info::{get_info, ModelInfo, Provider};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Environment(String),
    Default,
}

/// Client construction parameters. Only the model is required; the rest
/// resolves from the environment and the model registry.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_info: Option<ModelInfo>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub no_proxy: bool,
}

impl ClientConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            base_url: None,
            model_info: None,
            timeout: Duration::from_secs(300),
            max_retries: 2,
            no_proxy: false,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Required for models the registry does not know.
    pub fn with_model_info(mut self, info: ModelInfo) -> Self {
        self.model_info = Some(info);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn without_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn resolve(&self) -> Result<ResolvedClientConfig> {
        self.resolve_with(&ProcessEnv)
    }

    pub fn resolve_with(&self, env: &dyn EnvLookup) -> Result<ResolvedClientConfig> {
        if self.model.trim().is_empty() {
            return Err(LlmError::Config("model name must not be empty".into()));
        }

        let info = match &self.model_info {
            Some(info) => info.clone(),
            None => get_info(&self.model).ok_or_else(|| LlmError::ModelNotFound(self.model.clone()))?,
        };
        let provider = info.provider;

        let (api_key, key_source) =
            match resolve_value(self.api_key.as_deref(), provider.api_key_env(), env) {
                Some((key, None)) => (key, CredentialSource::Explicit),
                Some((key, Some(var))) => (key, CredentialSource::Environment(var)),
                None => {
                    return Err(LlmError::missing_api_key(
                        provider.as_str(),
                        provider.api_key_env(),
                    ))
                }
            };

        let (base_url, base_url_source) =
            match resolve_value(self.base_url.as_deref(), provider.base_url_env(), env) {
                Some((url, None)) => (url, CredentialSource::Explicit),
                Some((url, Some(var))) => (url, CredentialSource::Environment(var)),
                None => (provider.default_base_url().to_string(), CredentialSource::Default),
            };

        Ok(ResolvedClientConfig {
            model: self.model.clone(),
            provider,
            api_key,
            key_source,
            base_url: normalize_base_url(&base_url),
            base_url_source,
            info,
            timeout: self.timeout,
            max_retries: self.max_retries,
            no_proxy: self.no_proxy,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedClientConfig {
    /// The identifier exactly as requested.
    pub model: String,
    pub provider: Provider,
    pub api_key: String,
    pub key_source: CredentialSource,
    pub base_url: String,
    pub base_url_source: CredentialSource,
    pub info: ModelInfo,
    pub timeout: Duration,
    pub max_retries: u32,
    pub no_proxy: bool,
}
