use super::{create_agent, prepare_environment, Settings};
use parley_agent::Console;
use parley_core::Context;

pub async fn run(settings: &Settings, name: &str, system: &str, task: &str) -> anyhow::Result<()> {
    prepare_environment();
    let agent = create_agent(settings, &settings.model, name, system)?;
    let ctx = Context::new();
    Console::stdout()
        .with_usage(true)
        .run(agent.run_stream(&ctx, task))
        .await?;
    Ok(())
}
