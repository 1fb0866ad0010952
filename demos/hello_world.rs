//! Hello world with DeepSeek-R1
//!
//! Run with: DEEPSEEK_API_KEY=... cargo run --example hello_world

use parley::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    clear_proxy_env();

    // Key and base URL come from DEEPSEEK_API_KEY / DEEPSEEK_BASE_URL
    let client = OpenAiChatClient::new(ClientConfig::new("deepseek-r1"))?;

    let agent = AssistantAgent::builder()
        .name("deepseek_assistant")
        .system_message("你是一个友好的AI助手，使用DeepSeek R1模型。")
        .client(Arc::new(client))
        .build()?;

    let ctx = Context::new();
    let result = agent.run(&ctx, "你好！请介绍一下你自己。").await?;
    println!("{}", result);

    Ok(())
}
