use serde::{Deserialize, Serialize};
use std::fmt;

pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_API_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Hosted endpoint a model is served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    DeepSeek,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_API_BASE_URL,
            Provider::DeepSeek => DEEPSEEK_API_BASE_URL,
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn base_url_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_BASE_URL",
            Provider::DeepSeek => "DEEPSEEK_BASE_URL",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Gpt4o,
    O1,
    R1,
    V3,
    Unknown,
}

impl ModelFamily {
    pub fn is_reasoning(&self) -> bool {
        matches!(self, ModelFamily::O1 | ModelFamily::R1)
    }
}

/// What a model supports, and the name it goes by on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    pub family: ModelFamily,
    /// Identifier sent in the request body. Differs from `id` for aliases.
    pub api_model: String,
    pub context_window: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub vision: bool,
    pub function_calling: bool,
    pub json_output: bool,
    pub structured_output: bool,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, provider: Provider) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            api_model: id.clone(),
            id,
            provider,
            family: ModelFamily::Unknown,
            context_window: None,
            max_output_tokens: None,
            vision: false,
            function_calling: false,
            json_output: false,
            structured_output: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_family(mut self, family: ModelFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_api_model(mut self, api_model: impl Into<String>) -> Self {
        self.api_model = api_model.into();
        self
    }

    pub fn with_context_window(mut self, size: u32) -> Self {
        self.context_window = Some(size);
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    pub fn with_tools(mut self) -> Self {
        self.function_calling = true;
        self
    }

    pub fn with_vision(mut self) -> Self {
        self.vision = true;
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn with_structured_output(mut self) -> Self {
        self.structured_output = true;
        self
    }
}

fn deepseek_reasoner(id: &str) -> ModelInfo {
    ModelInfo::new(id, Provider::DeepSeek)
        .with_name("DeepSeek-R1")
        .with_family(ModelFamily::R1)
        .with_api_model("deepseek-reasoner")
        .with_context_window(65536)
        .with_max_output_tokens(8192)
        .with_json_output()
}

fn deepseek_chat(id: &str) -> ModelInfo {
    ModelInfo::new(id, Provider::DeepSeek)
        .with_name("DeepSeek-V3")
        .with_family(ModelFamily::V3)
        .with_api_model("deepseek-chat")
        .with_context_window(65536)
        .with_max_output_tokens(8192)
        .with_tools()
        .with_json_output()
}

/// Every model the registry knows about.
pub fn known_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo::new("gpt-4o", Provider::OpenAi)
            .with_name("GPT-4o")
            .with_family(ModelFamily::Gpt4o)
            .with_context_window(128000)
            .with_max_output_tokens(16384)
            .with_tools()
            .with_vision()
            .with_json_output()
            .with_structured_output(),
        ModelInfo::new("gpt-4o-mini", Provider::OpenAi)
            .with_name("GPT-4o Mini")
            .with_family(ModelFamily::Gpt4o)
            .with_context_window(128000)
            .with_max_output_tokens(16384)
            .with_tools()
            .with_vision()
            .with_json_output()
            .with_structured_output(),
        ModelInfo::new("o1", Provider::OpenAi)
            .with_family(ModelFamily::O1)
            .with_context_window(200000)
            .with_max_output_tokens(100000)
            .with_tools()
            .with_vision()
            .with_json_output(),
        ModelInfo::new("o1-mini", Provider::OpenAi)
            .with_name("o1 Mini")
            .with_family(ModelFamily::O1)
            .with_context_window(128000)
            .with_max_output_tokens(65536),
        deepseek_reasoner("deepseek-r1"),
        deepseek_reasoner("deepseek-reasoner"),
        deepseek_chat("deepseek-v3"),
        deepseek_chat("deepseek-chat"),
    ]
}

/// Registry lookup by exact identifier. Unknown identifiers return `None`
/// rather than the nearest match.
pub fn get_info(model: &str) -> Option<ModelInfo> {
    known_models().into_iter().find(|m| m.id == model)
}

pub fn models_for(provider: Provider) -> Vec<ModelInfo> {
    known_models()
        .into_iter()
        .filter(|m| m.provider == provider)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deepseek_variants() {
        let r1 = get_info("deepseek-r1").unwrap();
        assert_eq!(r1.provider, Provider::DeepSeek);
        assert_eq!(r1.family, ModelFamily::R1);
        assert_eq!(r1.api_model, "deepseek-reasoner");
        assert!(!r1.function_calling);
        assert!(r1.family.is_reasoning());

        let v3 = get_info("deepseek-v3").unwrap();
        assert_eq!(v3.family, ModelFamily::V3);
        assert_eq!(v3.api_model, "deepseek-chat");
        assert!(v3.function_calling);
        assert!(!v3.vision);
    }

    #[test]
    fn test_unknown_model_has_no_fallback() {
        assert!(get_info("deepseek-r2").is_none());
        assert!(get_info("DeepSeek-R1").is_none());
        assert!(get_info("").is_none());
    }

    #[test]
    fn test_provider_endpoints() {
        assert_eq!(Provider::DeepSeek.default_base_url(), "https://api.deepseek.com/v1");
        assert_eq!(Provider::DeepSeek.api_key_env(), "DEEPSEEK_API_KEY");
        assert_eq!(Provider::OpenAi.base_url_env(), "OPENAI_BASE_URL");
    }

    #[test]
    fn test_models_for_provider() {
        let deepseek = models_for(Provider::DeepSeek);
        assert_eq!(deepseek.len(), 4);
        assert!(deepseek.iter().all(|m| m.provider == Provider::DeepSeek));
    }

    #[test]
    fn test_ids_are_unique() {
        let models = known_models();
        for (i, a) in models.iter().enumerate() {
            assert!(models[i + 1..].iter().all(|b| b.id != a.id), "duplicate {}", a.id);
        }
    }
}
