//! Three DeepSeek agents taking turns in a round robin
//!
//! Run with: DEEPSEEK_API_KEY=... cargo run --example multi_agent

use parley::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    clear_proxy_env();

    let r1: Arc<dyn ChatClient> = Arc::new(OpenAiChatClient::new(ClientConfig::new("deepseek-r1"))?);
    // One V3 client shared by two agents
    let v3: Arc<dyn ChatClient> = Arc::new(OpenAiChatClient::new(ClientConfig::new("deepseek-v3"))?);

    let reasoning = AssistantAgent::builder()
        .name("推理专家")
        .system_message("你是一个逻辑推理专家，擅长分析和推理复杂问题。")
        .client(r1)
        .build()?;

    let creative = AssistantAgent::builder()
        .name("创意专家")
        .system_message("你是一个创意专家，善于提供创新的想法和解决方案。")
        .client(v3.clone())
        .build()?;

    let summary = AssistantAgent::builder()
        .name("总结专家")
        .system_message("你是一个总结专家，善于整合信息并提供清晰的总结。")
        .client(v3)
        .build()?;

    let team = RoundRobinGroupChat::builder()
        .participant(reasoning)
        .participant(creative)
        .participant(summary)
        .termination(MaxMessageTermination::new(6))
        .build()?;

    let ctx = Context::new();
    let task = "请团队协作设计一个智能家居系统的核心功能，包括逻辑分析、创意想法和最终总结。";
    Console::stdout()
        .with_usage(true)
        .run(team.run_stream(&ctx, task))
        .await?;

    Ok(())
}
