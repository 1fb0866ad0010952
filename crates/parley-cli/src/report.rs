use colored::Colorize;
use parley_agent::AgentError;
use parley_llm::LlmError;

pub const HINTS: [&str; 3] = [
    "Is the DEEPSEEK_API_KEY environment variable set correctly?",
    "Is the network connection working and the endpoint reachable?",
    "Was parley built with the `openai` feature of parley-llm?",
];

/// Whether the failure came from configuration rather than a request.
pub fn is_configuration(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<AgentError>() {
        return e.is_configuration();
    }
    if let Some(e) = err.downcast_ref::<LlmError>() {
        return e.is_configuration();
    }
    err.downcast_ref::<parley_core::Error>()
        .is_some_and(parley_core::Error::is_config)
}

pub fn failure_lines(err: &anyhow::Error) -> Vec<String> {
    let kind = if is_configuration(err) {
        "configuration error"
    } else {
        "run failed"
    };
    let mut lines = vec![format!("{}: {:#}", kind, err), "Please check:".to_string()];
    lines.extend(
        HINTS
            .iter()
            .enumerate()
            .map(|(i, hint)| format!("{}. {}", i + 1, hint)),
    );
    lines
}

pub fn print_failure(err: &anyhow::Error) {
    let lines = failure_lines(err);
    if let Some((head, hints)) = lines.split_first() {
        eprintln!("{} {}", "✗".red().bold(), head.red());
        for line in hints {
            eprintln!("{}", line);
        }
    }
}
