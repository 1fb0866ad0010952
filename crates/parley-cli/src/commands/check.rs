use super::{prepare_environment, Settings};
use colored::Colorize;
use parley_llm::{get_info, ChatClient, ClientConfig, OpenAiChatClient, Provider, DEEPSEEK_API_BASE_URL};

const VARIANTS: [&str; 2] = ["deepseek-r1", "deepseek-v3"];
const EXPLICIT_BASE_URL: &str = "https://api.deepseek.com/v1/";

type Check = fn(&Settings) -> anyhow::Result<()>;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    prepare_environment();

    println!("{}", "DeepSeek configuration check".green().bold());
    println!("{}", "=".repeat(40));

    let checks: [(&str, Check); 3] = [
        ("model info", check_model_info),
        ("client creation", check_client_creation),
        ("explicit configuration", check_explicit_config),
    ];

    let total = checks.len();
    let mut passed = 0;
    for (name, check) in checks {
        println!("\n{} {}", "Checking".cyan().bold(), name);
        match check(settings) {
            Ok(()) => passed += 1,
            Err(e) => println!("{} {} failed: {}", "✗".red().bold(), name, e),
        }
    }

    println!("\nResult: {}/{} passed", passed, total);
    if passed == total {
        println!("{}", "All checks passed.".green().bold());
        Ok(())
    } else {
        println!("{}", "Some checks failed, review the configuration.".yellow());
        anyhow::bail!("{} of {} checks failed", total - passed, total)
    }
}

fn ok(line: impl std::fmt::Display) {
    println!("{} {}", "✓".green().bold(), line);
}

fn check_model_info(_settings: &Settings) -> anyhow::Result<()> {
    ok(format!("DEEPSEEK_API_BASE_URL: {}", DEEPSEEK_API_BASE_URL));
    for model in VARIANTS {
        let info = get_info(model).ok_or_else(|| anyhow::anyhow!("no model info for {}", model))?;
        ok(format!("{}: {:?}", model, info));
    }
    Ok(())
}

fn check_client_creation(settings: &Settings) -> anyhow::Result<()> {
    for model in VARIANTS {
        let mut config = ClientConfig::new(model);
        if settings.no_proxy {
            config = config.without_proxy();
        }
        let client = OpenAiChatClient::new(config)?;
        if client.model() != model {
            anyhow::bail!("client for {} reports model {}", model, client.model());
        }
        ok(format!("{} client created", model));
    }
    Ok(())
}

fn check_explicit_config(settings: &Settings) -> anyhow::Result<()> {
    let api_key = settings
        .api_key
        .clone()
        .or_else(|| std::env::var(Provider::DeepSeek.api_key_env()).ok())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("no API key; pass --api-key or set {}", Provider::DeepSeek.api_key_env())
        })?;

    let mut config = ClientConfig::new("deepseek-r1")
        .with_api_key(api_key)
        .with_base_url(EXPLICIT_BASE_URL);
    if settings.no_proxy {
        config = config.without_proxy();
    }

    let client = OpenAiChatClient::new(config)?;
    ok("explicitly configured client created");
    ok(format!("model: {} ({})", client.model(), client.base_url()));
    Ok(())
}
