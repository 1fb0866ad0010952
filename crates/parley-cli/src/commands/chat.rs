use colored::Colorize;
use parley_agent::ChatAgent;
use parley_core::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{create_agent, prepare_environment, Settings};

pub async fn run(settings: &Settings, system: &str) -> anyhow::Result<()> {
    prepare_environment();
    let agent = create_agent(settings, &settings.model, "assistant", system)?;

    println!("{} ({})", "parley chat".green().bold(), settings.model);
    println!("Type {} to exit, {} to start over\n", "quit".yellow(), "/reset".yellow());

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline(&format!("{} ", "You:".cyan().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "quit" || line == "exit" {
                    println!("{}", "Goodbye!".green());
                    break;
                }

                rl.add_history_entry(line)?;

                if line == "/reset" {
                    agent.reset().await;
                    println!("{}\n", "History cleared.".yellow());
                    continue;
                }

                print!("{} ", "Assistant:".magenta().bold());

                let ctx = Context::new();
                match agent.run(&ctx, line).await {
                    Ok(result) => {
                        let reply = result
                            .last_message()
                            .map(|m| m.to_text())
                            .unwrap_or_default();
                        println!("{}\n", reply);
                    }
                    Err(e) => {
                        println!("{} {}\n", "Error:".red().bold(), e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".yellow());
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Err(err) => {
                println!("{} {:?}", "Error:".red().bold(), err);
                break;
            }
        }
    }

    Ok(())
}
