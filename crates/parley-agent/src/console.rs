use crate::error::{AgentError, Result};
use crate::message::ChatMessage;
use crate::result::{RunEvent, RunStream, TaskResult};
use futures::StreamExt;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

/// Renders a run as it happens.
///
/// ```text
/// ---------- TextMessage (user) ----------
/// 请帮我查询北京和上海的天气情况
/// ---------- ToolCallRequestEvent (weather_assistant) ----------
/// get_weather({"city":"北京"})
/// ```
pub struct Console<W: Write> {
    writer: W,
    show_usage: bool,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            show_usage: false,
        }
    }

    /// Also print token totals and run duration at the end.
    pub fn with_usage(mut self, show: bool) -> Self {
        self.show_usage = show;
        self
    }

    /// Drains the stream, rendering every message, and returns the result.
    pub async fn run(&mut self, mut stream: RunStream<'_>) -> Result<TaskResult> {
        let started = Instant::now();

        while let Some(event) = stream.next().await {
            match event? {
                RunEvent::Message(message) => self.render_message(&message)?,
                RunEvent::Completed(result) => {
                    self.render_summary(&result, started.elapsed())?;
                    return Ok(result);
                }
            }
        }

        Err(AgentError::internal("run stream ended without a result"))
    }

    pub fn render_message(&mut self, message: &ChatMessage) -> io::Result<()> {
        writeln!(
            self.writer,
            "---------- {} ({}) ----------",
            message.kind(),
            message.source
        )?;
        writeln!(self.writer, "{}", message.to_text())?;
        self.writer.flush()
    }

    fn render_summary(&mut self, result: &TaskResult, elapsed: Duration) -> io::Result<()> {
        if let Some(reason) = &result.stop_reason {
            writeln!(self.writer, "Stop reason: {}", reason)?;
        }
        if self.show_usage {
            let usage = result.usage();
            writeln!(self.writer, "Total prompt tokens: {}", usage.input_tokens)?;
            writeln!(self.writer, "Total completion tokens: {}", usage.output_tokens)?;
            writeln!(self.writer, "Duration: {:.2} seconds", elapsed.as_secs_f64())?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::TokenUsage;
    use futures::stream;

    fn events() -> Vec<Result<RunEvent>> {
        let task = ChatMessage::text("user", "你好");
        let reply = ChatMessage::text("deepseek_assistant", "你好！").with_usage(TokenUsage::new(12, 3));
        vec![
            Ok(RunEvent::Message(task.clone())),
            Ok(RunEvent::Message(reply.clone())),
            Ok(RunEvent::Completed(TaskResult::new(
                vec![task, reply],
                Some("Maximum number of turns 1 reached.".into()),
            ))),
        ]
    }

    #[tokio::test]
    async fn test_console_renders_headers() {
        let mut console = Console::new(Vec::new());
        let result = console.run(stream::iter(events()).boxed()).await.unwrap();
        assert_eq!(result.messages.len(), 2);

        let output = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            output,
            "---------- TextMessage (user) ----------\n你好\n\
             ---------- TextMessage (deepseek_assistant) ----------\n你好！\n\
             Stop reason: Maximum number of turns 1 reached.\n"
        );
    }

    #[tokio::test]
    async fn test_console_usage() {
        let mut console = Console::new(Vec::new()).with_usage(true);
        console.run(stream::iter(events()).boxed()).await.unwrap();

        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("Total prompt tokens: 12\n"));
        assert!(output.contains("Total completion tokens: 3\n"));
        assert!(output.contains("Duration: "));
    }

    #[tokio::test]
    async fn test_console_propagates_errors() {
        let events: Vec<Result<RunEvent>> = vec![
            Ok(RunEvent::Message(ChatMessage::text("user", "hi"))),
            Err(AgentError::Cancelled),
        ];
        let mut console = Console::new(Vec::new());
        let result = console.run(stream::iter(events).boxed()).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }
}
