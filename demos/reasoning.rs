//! Logic puzzle with DeepSeek-R1; the model's reasoning shows up as a
//! ThoughtEvent before the answer.
//!
//! Run with: DEEPSEEK_API_KEY=... cargo run --example reasoning

use parley::prelude::*;
use std::sync::Arc;

const TASK: &str = "有三个朋友：小明、小红、小李。
- 小明比小红大2岁
- 小李比小明小3岁
- 三人年龄之和是60岁
请推理出每个人的年龄。";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    clear_proxy_env();

    let client = OpenAiChatClient::new(ClientConfig::new("deepseek-r1"))?;

    let agent = AssistantAgent::builder()
        .name("reasoning_expert")
        .system_message("你是一个逻辑推理专家，善于分析复杂问题。")
        .client(Arc::new(client))
        .build()?;

    let ctx = Context::new();
    Console::stdout().run(agent.run_stream(&ctx, TASK)).await?;

    Ok(())
}
