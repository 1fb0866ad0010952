use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::traits::ToolOutput;
use parley_core::message::{ToolResult, ToolUse};
use parley_core::Context;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    default_timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            default_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub async fn execute(&self, ctx: &Context, name: &str, input: Value) -> Result<ToolOutput> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;

        if ctx.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        tool.validate_input(&input)?;

        info!(tool = name, "Executing tool");

        let execute_timeout = ctx
            .remaining()
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout);

        match timeout(execute_timeout, tool.execute(ctx, input)).await {
            Ok(Ok(output)) => {
                info!(tool = name, is_error = output.is_error, "Tool execution completed");
                Ok(output)
            }
            Ok(Err(e)) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                Err(e)
            }
            Err(_) => {
                warn!(tool = name, timeout_ms = ?execute_timeout.as_millis(), "Tool execution timed out");
                Err(ToolError::Timeout(execute_timeout.as_millis() as u64))
            }
        }
    }

    /// Runs a model-issued call. Failures other than cancellation come back
    /// as error results so the model can see them.
    pub async fn execute_use(&self, ctx: &Context, call: &ToolUse) -> Result<ToolResult> {
        match self.execute(ctx, &call.name, call.input.clone()).await {
            Ok(output) if output.is_error => Ok(ToolResult::error(&call.id, output.content)),
            Ok(output) => Ok(ToolResult::success(&call.id, output.content)),
            Err(ToolError::Cancelled) => Err(ToolError::Cancelled),
            Err(e) => Ok(ToolResult::error(&call.id, format!("Error: {}", e))),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionTool;
    use crate::traits::Tool;
    use async_trait::async_trait;
    use parley_core::{ToolDefinition, ToolParameter};

    struct EchoTool {
        def: ToolDefinition,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                def: ToolDefinition::new("echo", "Echoes input")
                    .with_required_param("message", ToolParameter::string()),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _ctx: &Context, input: Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text(input.to_string()))
        }
    }

    fn slow_tool() -> FunctionTool {
        FunctionTool::new(ToolDefinition::new("slow", "A slow tool"), |_input| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ToolOutput::text("done"))
        })
    }

    fn executor() -> ToolExecutor {
        let registry = ToolRegistry::new()
            .with_tool(EchoTool::new())
            .unwrap()
            .with_tool(slow_tool())
            .unwrap();
        ToolExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_executor_execute() {
        let output = executor()
            .execute(&Context::new(), "echo", serde_json::json!({"message": "hello"}))
            .await
            .unwrap();

        assert!(output.content.contains("hello"));
    }

    #[tokio::test]
    async fn test_executor_not_found() {
        let result = executor().execute(&Context::new(), "nonexistent", Value::Null).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_required_rejected() {
        let result = executor()
            .execute(&Context::new(), "echo", serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_executor_timeout() {
        let executor = executor().with_timeout(Duration::from_millis(100));
        let result = executor.execute(&Context::new(), "slow", Value::Null).await;
        assert!(matches!(result, Err(ToolError::Timeout(100))));
    }

    #[tokio::test]
    async fn test_context_deadline_caps_timeout() {
        let ctx = Context::new().with_timeout(Duration::from_millis(50));
        let result = executor().execute(&ctx, "slow", Value::Null).await;
        assert!(matches!(result, Err(ToolError::Timeout(ms)) if ms <= 50));
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let ctx = Context::new();
        ctx.cancel();
        let result = executor()
            .execute(&ctx, "echo", serde_json::json!({"message": "x"}))
            .await;
        assert!(matches!(result, Err(ToolError::Cancelled)));
    }

    #[tokio::test]
    async fn test_execute_use_reports_errors_as_results() {
        let executor = executor();
        let ctx = Context::new();

        let ok = executor
            .execute_use(&ctx, &ToolUse::new("call_1", "echo", serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(ok.tool_use_id, "call_1");
        assert!(!ok.is_error);

        let missing = executor
            .execute_use(&ctx, &ToolUse::new("call_2", "get_time", Value::Null))
            .await
            .unwrap();
        assert!(missing.is_error);
        assert!(missing.content.contains("get_time"));
    }
}
