use super::{create_agent, prepare_environment, Settings};
use colored::Colorize;
use parley_agent::{AssistantAgent, Console, MaxMessageTermination, RoundRobinGroupChat};
use parley_core::{Context, ToolDefinition, ToolParameter};
use parley_tools::FunctionTool;
use serde::Deserialize;
use tracing::info;

const R1: &str = "deepseek-r1";
const V3: &str = "deepseek-v3";

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Demo {
    Hello,
    Reasoning,
    Team,
    Tools,
}

impl Demo {
    pub const ALL: [Demo; 4] = [Demo::Hello, Demo::Reasoning, Demo::Team, Demo::Tools];

    fn title(&self) -> &'static str {
        match self {
            Demo::Hello => "DeepSeek hello world",
            Demo::Reasoning => "DeepSeek reasoning",
            Demo::Team => "DeepSeek multi-agent team",
            Demo::Tools => "DeepSeek function calling",
        }
    }
}

pub async fn run(settings: &Settings, only: Option<Demo>) -> anyhow::Result<()> {
    prepare_environment();

    println!("{}", "parley + DeepSeek demonstrations".green().bold());
    println!("{}", "=".repeat(50));

    let demos = match only {
        Some(demo) => vec![demo],
        None => Demo::ALL.to_vec(),
    };

    let ctx = Context::new();
    for demo in demos {
        println!("\n{}", demo.title().cyan().bold());
        info!(demo = ?demo, "Running demo");
        match demo {
            Demo::Hello => hello_world(settings, &ctx).await?,
            Demo::Reasoning => reasoning(settings, &ctx).await?,
            Demo::Team => team(settings, &ctx).await?,
            Demo::Tools => function_calling(settings, &ctx).await?,
        }
    }

    println!("\n{}", "All demonstrations finished.".green().bold());
    Ok(())
}

async fn hello_world(settings: &Settings, ctx: &Context) -> anyhow::Result<()> {
    let agent = create_agent(
        settings,
        R1,
        "deepseek_assistant",
        "你是一个友好的AI助手，使用DeepSeek R1模型。",
    )?;
    let result = agent.run(ctx, "你好！请介绍一下你自己。").await?;
    println!("{}", result);
    Ok(())
}

pub const REASONING_TASK: &str = "有三个朋友：小明、小红、小李。
- 小明比小红大2岁
- 小李比小明小3岁
- 三人年龄之和是60岁
请推理出每个人的年龄。";

async fn reasoning(settings: &Settings, ctx: &Context) -> anyhow::Result<()> {
    let agent = create_agent(
        settings,
        R1,
        "reasoning_expert",
        "你是一个逻辑推理专家，善于分析复杂问题。",
    )?;
    let result = agent.run(ctx, REASONING_TASK).await?;
    println!("{}", result);
    Ok(())
}

async fn team(settings: &Settings, ctx: &Context) -> anyhow::Result<()> {
    let v3 = settings.client(V3)?;

    let reasoning = create_agent(
        settings,
        R1,
        "推理专家",
        "你是一个逻辑推理专家，擅长分析和推理复杂问题。",
    )?;
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

    let task = "请团队协作设计一个智能家居系统的核心功能，包括逻辑分析、创意想法和最终总结。";
    Console::stdout()
        .with_usage(true)
        .run(team.run_stream(ctx, task))
        .await?;
    Ok(())
}

#[derive(Deserialize)]
struct WeatherArgs {
    city: String,
}

pub fn lookup_weather(city: &str) -> String {
    match city {
        "北京" => "晴天，温度15-25°C，微风".to_string(),
        "上海" => "多云，温度18-28°C，南风".to_string(),
        "广州" => "雨天，温度20-26°C，东南风".to_string(),
        "深圳" => "晴天，温度22-30°C，无风".to_string(),
        other => format!("{}的天气信息暂时无法获取", other),
    }
}

pub fn weather_tool() -> FunctionTool {
    FunctionTool::typed(
        ToolDefinition::new("get_weather", "获取指定城市的天气信息").with_required_param(
            "city",
            ToolParameter::string().with_description("城市名称"),
        ),
        |args: WeatherArgs| lookup_weather(&args.city),
    )
}

async fn function_calling(settings: &Settings, ctx: &Context) -> anyhow::Result<()> {
    let agent = AssistantAgent::builder()
        .name("weather_assistant")
        .system_message("你是一个天气助手，可以查询城市天气信息。")
        .client(settings.client(V3)?)
        .tool(weather_tool())
        .build()?;

    let result = agent.run(ctx, "请帮我查询北京和上海的天气情况").await?;
    println!("{}", result);
    Ok(())
}
