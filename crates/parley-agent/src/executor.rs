use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::message::ChatMessage;
use crate::model_context::ModelContext;
use crate::result::AgentReply;
use parley_core::message::{ContentBlock, ToolResult, ToolUse};
use parley_core::{Context, Message, Role};
use parley_llm::{ChatClient, CompletionRequest, CompletionResponse, ToolChoice};
use parley_tools::{ToolError, ToolExecutor};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs one agent turn against a model context: model calls, tool rounds,
/// and the final reply.
pub(crate) struct TurnExecutor<'a> {
    config: &'a AgentConfig,
    client: &'a dyn ChatClient,
    tools: Option<&'a ToolExecutor>,
}

impl<'a> TurnExecutor<'a> {
    pub fn new(
        config: &'a AgentConfig,
        client: &'a dyn ChatClient,
        tools: Option<&'a ToolExecutor>,
    ) -> Self {
        Self {
            config,
            client,
            tools,
        }
    }

    pub async fn execute(&self, ctx: &Context, context: &mut ModelContext) -> Result<AgentReply> {
        let name = self.config.name.as_str();
        let mut inner = Vec::new();
        let mut tool_rounds = 0;

        loop {
            let response = self.call_model(ctx, context).await?;
            let usage = response.usage;

            if let Some(thought) = response.thinking() {
                inner.push(ChatMessage::thought(name, thought));
            }

            let tool_uses: Vec<ToolUse> = response.message.tool_uses().into_iter().cloned().collect();

            if tool_uses.is_empty() {
                let text = response.text_content();
                context.add_message(Message::assistant(&text));
                info!(agent = name, tool_rounds, "Agent turn completed");
                return Ok(AgentReply::new(ChatMessage::text(name, text).with_usage(usage))
                    .with_inner_messages(inner));
            }

            tool_rounds += 1;
            if tool_rounds > self.config.max_tool_iterations {
                return Err(AgentError::MaxIterationsReached(self.config.max_tool_iterations));
            }

            inner.push(ChatMessage::tool_call_request(name, tool_uses.clone()).with_usage(usage));

            // A tool call enters the context only together with its results.
            let results = self.execute_tools(ctx, &tool_uses).await?;
            context.record_tool_calls(results.len());
            context.add_message(assistant_tool_message(&response, &tool_uses));
            context.add_message(Message::tool(
                results.iter().cloned().map(ContentBlock::tool_result).collect(),
            ));
            inner.push(ChatMessage::tool_call_execution(name, results.clone()));

            if !self.config.reflect_on_tool_use {
                let summary = results
                    .iter()
                    .map(|r| r.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                context.add_message(Message::assistant(&summary));
                return Ok(AgentReply::new(ChatMessage::tool_call_summary(name, summary))
                    .with_inner_messages(inner));
            }
        }
    }

    async fn call_model(&self, ctx: &Context, context: &mut ModelContext) -> Result<CompletionResponse> {
        if ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let request = self.build_request(context);
        context.record_model_call();
        debug!(
            agent = %self.config.name,
            model = self.client.model(),
            messages = request.messages.len(),
            "Calling model"
        );

        let token = ctx.cancellation_token();
        tokio::select! {
            response = self.client.create(request) => Ok(response?),
            _ = token.cancelled() => Err(AgentError::Cancelled),
        }
    }

    fn build_request(&self, context: &ModelContext) -> CompletionRequest {
        let messages = context.last_messages(self.config.max_context_messages);
        let mut request = CompletionRequest::new(messages);

        if let Some(system) = &self.config.system_message {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(tools) = self.tools {
            let definitions = tools.registry().definitions();
            if !definitions.is_empty() {
                request = request
                    .with_tools(definitions)
                    .with_tool_choice(ToolChoice::Auto);
            }
        }

        request
    }

    async fn execute_tools(&self, ctx: &Context, tool_uses: &[ToolUse]) -> Result<Vec<ToolResult>> {
        let mut results = Vec::with_capacity(tool_uses.len());

        for tu in tool_uses {
            let start = Instant::now();
            debug!(tool = %tu.name, id = %tu.id, "Executing tool");

            let result = match self.tools {
                Some(tools) => tools.execute_use(ctx, tu).await.map_err(|e| match e {
                    ToolError::Cancelled => AgentError::Cancelled,
                    other => AgentError::Tool(other),
                })?,
                None => ToolResult::error(&tu.id, format!("Error: {}", ToolError::not_found(&tu.name))),
            };

            let duration_ms = start.elapsed().as_millis() as u64;
            if result.is_error {
                warn!(tool = %tu.name, duration_ms, error = %result.content, "Tool returned an error");
            } else {
                info!(tool = %tu.name, duration_ms, "Tool completed");
            }
            results.push(result);
        }

        Ok(results)
    }
}

/// The assistant's tool-calling turn as stored in the model context. The
/// reasoning trace is left out.
fn assistant_tool_message(response: &CompletionResponse, tool_uses: &[ToolUse]) -> Message {
    let mut content = Vec::with_capacity(tool_uses.len() + 1);
    let text = response.text_content();
    if !text.is_empty() {
        content.push(ContentBlock::text(text));
    }
    content.extend(tool_uses.iter().cloned().map(ContentBlock::tool_use));
    Message::new(Role::Assistant, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{reasoning, text, tool_call, ScriptedClient};
    use parley_core::{ToolDefinition, ToolParameter};
    use parley_tools::{FunctionTool, Tool, ToolOutput, ToolRegistry};
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Deserialize)]
    struct CityArgs {
        city: String,
    }

    fn weather_tools() -> ToolExecutor {
        let tool = FunctionTool::typed(
            ToolDefinition::new("get_weather", "Weather for a city")
                .with_required_param("city", ToolParameter::string()),
            |args: CityArgs| format!("{}: 晴天", args.city),
        );
        ToolExecutor::new(Arc::new(ToolRegistry::new().with_tool(tool).unwrap()))
    }

    #[tokio::test]
    async fn test_simple_reply() {
        let config = AgentConfig::new("assistant").with_system_message("You are helpful.");
        let client = ScriptedClient::deepseek_v3(vec![text("Hello!")]);
        let mut context = ModelContext::new();
        context.add_message(Message::user("Hi"));

        let reply = TurnExecutor::new(&config, &client, None)
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        assert_eq!(reply.chat_message.to_text(), "Hello!");
        assert!(reply.inner_messages.is_empty());
        assert_eq!(context.len(), 2);

        let requests = client.requests();
        assert_eq!(requests[0].system.as_deref(), Some("You are helpful."));
        assert!(requests[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_reasoning_becomes_thought_event() {
        let config = AgentConfig::new("reasoning_expert");
        let client = ScriptedClient::deepseek_r1(vec![reasoning("a + b = 40", "小明21岁")]);
        let mut context = ModelContext::new();
        context.add_message(Message::user("puzzle"));

        let reply = TurnExecutor::new(&config, &client, None)
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        assert_eq!(reply.inner_messages.len(), 1);
        assert_eq!(reply.inner_messages[0].kind(), "ThoughtEvent");
        assert_eq!(reply.chat_message.to_text(), "小明21岁");
        assert!(context.messages()[1].thinking_content().is_none());
    }

    #[tokio::test]
    async fn test_tool_round_with_reflection() {
        let config = AgentConfig::new("weather_assistant");
        let client = ScriptedClient::deepseek_v3(vec![
            tool_call("call_1", "get_weather", serde_json::json!({"city": "北京"})),
            text("北京今天晴天"),
        ]);
        let tools = weather_tools();
        let mut context = ModelContext::new();
        context.add_message(Message::user("北京天气?"));

        let reply = TurnExecutor::new(&config, &client, Some(&tools))
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        assert_eq!(reply.chat_message.to_text(), "北京今天晴天");
        let kinds: Vec<_> = reply.inner_messages.iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, vec!["ToolCallRequestEvent", "ToolCallExecutionEvent"]);
        assert_eq!(reply.inner_messages[1].to_text(), "[call_1] 北京: 晴天");

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.as_ref().unwrap()[0].name, "get_weather");
        assert_eq!(requests[1].messages.last().unwrap().role, Role::Tool);
        assert_eq!(context.stats().tool_call_count, 1);
    }

    #[tokio::test]
    async fn test_tool_summary_without_reflection() {
        let config = AgentConfig::new("weather_assistant").with_reflect_on_tool_use(false);
        let client = ScriptedClient::deepseek_v3(vec![tool_call(
            "call_1",
            "get_weather",
            serde_json::json!({"city": "上海"}),
        )]);
        let tools = weather_tools();
        let mut context = ModelContext::new();

        let reply = TurnExecutor::new(&config, &client, Some(&tools))
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        assert_eq!(reply.chat_message.kind(), "ToolCallSummaryMessage");
        assert_eq!(reply.chat_message.to_text(), "上海: 晴天");
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let config = AgentConfig::new("weather_assistant");
        let client = ScriptedClient::deepseek_v3(vec![
            tool_call("call_1", "get_time", serde_json::json!({})),
            text("I cannot tell the time."),
        ]);
        let tools = weather_tools();
        let mut context = ModelContext::new();

        let reply = TurnExecutor::new(&config, &client, Some(&tools))
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        assert_eq!(reply.chat_message.to_text(), "I cannot tell the time.");
        let execution = &reply.inner_messages[1];
        assert!(execution.to_text().contains("error"));
        assert!(execution.to_text().contains("get_time"));
    }

    #[tokio::test]
    async fn test_max_tool_iterations() {
        let config = AgentConfig::new("weather_assistant").with_max_tool_iterations(2);
        let call = || tool_call("call_1", "get_weather", serde_json::json!({"city": "广州"}));
        let client = ScriptedClient::deepseek_v3(vec![call(), call(), call()]);
        let tools = weather_tools();
        let mut context = ModelContext::new();

        let result = TurnExecutor::new(&config, &client, Some(&tools))
            .execute(&Context::new(), &mut context)
            .await;

        assert!(matches!(result, Err(AgentError::MaxIterationsReached(2))));
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_model_call() {
        let config = AgentConfig::new("assistant");
        let client = ScriptedClient::deepseek_v3(vec![text("never")]);
        let ctx = Context::new();
        ctx.cancel();

        let result = TurnExecutor::new(&config, &client, None)
            .execute(&ctx, &mut ModelContext::new())
            .await;

        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert!(client.requests().is_empty());
    }

    /// Cancels the run from inside the tool call.
    struct CancellingTool {
        def: ToolDefinition,
    }

    #[async_trait::async_trait]
    impl Tool for CancellingTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, ctx: &Context, _input: serde_json::Value) -> parley_tools::Result<ToolOutput> {
            ctx.cancel();
            Ok(ToolOutput::text("stopped"))
        }
    }

    #[tokio::test]
    async fn test_cancelled_tool_round_leaves_history_consistent() {
        let config = AgentConfig::new("assistant");
        let two_calls = CompletionResponse::new(
            "resp",
            "scripted",
            Message::new(
                Role::Assistant,
                vec![
                    ContentBlock::tool_use(ToolUse::new("call_1", "stop", serde_json::json!({}))),
                    ContentBlock::tool_use(ToolUse::new("call_2", "stop", serde_json::json!({}))),
                ],
            ),
        );
        let client = ScriptedClient::deepseek_v3(vec![two_calls, text("fresh start")]);
        let tool = CancellingTool {
            def: ToolDefinition::new("stop", "Stops the run"),
        };
        let tools = ToolExecutor::new(Arc::new(ToolRegistry::new().with_tool(tool).unwrap()));
        let mut context = ModelContext::new();
        context.add_message(Message::user("first"));

        let result = TurnExecutor::new(&config, &client, Some(&tools))
            .execute(&Context::new(), &mut context)
            .await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert!(context.messages().iter().all(|m| !m.has_tool_use()));

        context.add_message(Message::user("second"));
        TurnExecutor::new(&config, &client, Some(&tools))
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        let request = &client.requests()[1];
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User]);
        assert!(request.messages.iter().all(|m| !m.has_tool_use()));
    }

    #[tokio::test]
    async fn test_request_options() {
        let config = AgentConfig::new("assistant")
            .with_temperature(0.3)
            .with_max_tokens(512)
            .with_max_context_messages(2);
        let client = ScriptedClient::deepseek_v3(vec![text("ok")]);
        let mut context = ModelContext::new();
        context.add_messages((0..5).map(|i| Message::user(format!("m{}", i))));

        TurnExecutor::new(&config, &client, None)
            .execute(&Context::new(), &mut context)
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].text_content(), "m3");
    }
}
