use clap::{Parser, Subcommand};
use parley_core::config::LogLevel;
use parley_core::Config;
use std::path::PathBuf;

mod commands;
mod report;

#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about = "Chat-completion agents for DeepSeek and OpenAI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; defaults to the first of ./parley.toml, ~/.parley/config.toml, ~/.config/parley/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model for agents that do not pick their own
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API key; otherwise read from the provider's variable, e.g. DEEPSEEK_API_KEY
    #[arg(short = 'k', long, global = true)]
    api_key: Option<String>,

    #[arg(short, long, global = true)]
    base_url: Option<String>,

    /// Bypass any system proxy for model requests
    #[arg(long, global = true)]
    no_proxy: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Check model info and client construction without calling the API
    Check,
    /// Run the demonstrations
    Demo {
        #[arg(long, value_enum)]
        only: Option<commands::demo::Demo>,
    },
    /// Run a single task and exit
    Run {
        /// The task to send
        task: String,
        /// System message for the agent
        #[arg(short, long, default_value = "You are a helpful assistant.")]
        system: String,
        /// Agent name
        #[arg(short, long, default_value = "assistant")]
        name: String,
    },
    /// Start an interactive chat session
    Chat {
        /// System message for the agent
        #[arg(short, long, default_value = "You are a helpful assistant.")]
        system: String,
    },
}

fn init_tracing(verbose: u8, configured: LogLevel) {
    let level = match verbose {
        0 => configured.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_default()?,
    };
    Ok(config.merge_env())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(cli.verbose, config.general.log_level);

    let settings = commands::Settings::new(&config)
        .with_model(cli.model)
        .with_api_key(cli.api_key)
        .with_base_url(cli.base_url)
        .with_no_proxy(cli.no_proxy);

    let outcome = match cli.command {
        Commands::Check => commands::check::run(&settings).await,
        Commands::Demo { only } => commands::demo::run(&settings, only).await,
        Commands::Run { task, system, name } => {
            commands::run::run(&settings, &name, &system, &task).await
        }
        Commands::Chat { system } => commands::chat::run(&settings, &system).await,
    };

    if let Err(e) = outcome {
        report::print_failure(&e);
        std::process::exit(1);
    }

    Ok(())
}
