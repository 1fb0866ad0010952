use crate::error::{Result, ToolError};
use async_trait::async_trait;
use parley_core::{Context, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            content: serde_json::to_string_pretty(value)?,
            is_error: false,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    async fn execute(&self, ctx: &Context, input: Value) -> Result<ToolOutput>;

    /// Rejects inputs missing a required parameter.
    fn validate_input(&self, input: &Value) -> Result<()> {
        let missing = self.definition().missing_required(input);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::invalid_input(format!(
                "missing required parameter(s): {}",
                missing.join(", ")
            )))
        }
    }

    fn name(&self) -> &str {
        &self.definition().name
    }
}
