//! Plain functions exposed as tools.

use crate::error::{Result, ToolError};
use crate::traits::{Tool, ToolOutput};
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use parley_core::{Context, ToolDefinition};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<ToolOutput>> + Send + Sync>;

/// A tool backed by a closure.
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct Args { city: String }
///
/// let tool = FunctionTool::typed(
///     ToolDefinition::new("get_weather", "Current weather for a city")
///         .with_required_param("city", ToolParameter::string()),
///     |args: Args| format!("{} is sunny", args.city),
/// );
/// ```
#[derive(Clone)]
pub struct FunctionTool {
    def: ToolDefinition,
    handler: Handler,
}

impl FunctionTool {
    /// Async handler over the raw JSON arguments.
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput>> + Send + 'static,
    {
        Self {
            def: definition,
            handler: Arc::new(move |input| handler(input).boxed()),
        }
    }

    /// Sync handler over deserialized arguments. Arguments that do not
    /// deserialize into `A` fail with [`ToolError::InvalidInput`].
    pub fn typed<A, F>(definition: ToolDefinition, handler: F) -> Self
    where
        A: DeserializeOwned,
        F: Fn(A) -> String + Send + Sync + 'static,
    {
        let tool = definition.name.clone();
        Self {
            def: definition,
            handler: Arc::new(move |input| {
                let result = serde_json::from_value::<A>(input)
                    .map(|args| ToolOutput::text(handler(args)))
                    .map_err(|e| ToolError::invalid_input(format!("{}: {}", tool, e)));
                future::ready(result).boxed()
            }),
        }
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.def.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    async fn execute(&self, _ctx: &Context, input: Value) -> Result<ToolOutput> {
        (self.handler)(input).await
    }
}
