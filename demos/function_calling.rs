//! Function calling with DeepSeek-V3
//!
//! Run with: DEEPSEEK_API_KEY=... cargo run --example function_calling

use parley::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct WeatherArgs {
    city: String,
}

/// Canned weather for a handful of cities.
fn get_weather(args: WeatherArgs) -> String {
    let report = match args.city.as_str() {
        "北京" => "晴天，温度15-25°C，微风",
        "上海" => "多云，温度18-28°C，南风",
        "广州" => "雨天，温度20-26°C，东南风",
        "深圳" => "晴天，温度22-30°C，无风",
        _ => return format!("{}的天气信息暂时无法获取", args.city),
    };
    report.to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    clear_proxy_env();

    let weather = FunctionTool::typed(
        ToolDefinition::new("get_weather", "获取指定城市的天气信息")
            .with_required_param("city", ToolParameter::string().with_description("城市名称")),
        get_weather,
    );

    // R1 has no function calling; the builder rejects tools on it
    let client = OpenAiChatClient::new(ClientConfig::new("deepseek-v3"))?;

    let agent = AssistantAgent::builder()
        .name("weather_assistant")
        .system_message("你是一个天气助手，可以查询城市天气信息。")
        .client(Arc::new(client))
        .tool(weather)
        .build()?;

    let ctx = Context::new();
    Console::stdout()
        .run(agent.run_stream(&ctx, "请帮我查询北京和上海的天气情况"))
        .await?;

    Ok(())
}
