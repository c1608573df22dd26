//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use crate::config::ReplConfig;
use crate::output::console::ConsoleFormatter;
use crate::progress::reply::ReplyProgress;
use multiturn_application::{ChatSession, SessionError};
use multiturn_domain::{ChatMessage, Role};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Why a pending reply was cancelled by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CancelReason {
    Interrupted,
    TimedOut(Duration),
}

/// Interactive chat REPL
pub struct ChatRepl {
    session: Arc<ChatSession>,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(session: Arc<ChatSession>) -> Self {
        Self {
            session,
            config: ReplConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.config.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(&line) {
                        if self.handle_command(command).await {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line.as_str());

                    println!();
                    if let Err(e) = self.send(&line).await {
                        self.report(&e);
                    }
                    println!();
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.config.history_file
            && let Err(e) = rl.save_history(path)
        {
            debug!("Could not save history to {}: {}", path.display(), e);
        }

        Ok(())
    }

    /// Submit one message and print the reply as it streams in.
    ///
    /// Ctrl-C cancels the pending reply, and so does the configured timeout.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, SessionError> {
        let model = self.session.config().model.to_string();
        let mut progress = ReplyProgress::stdout(
            ConsoleFormatter::role_label(Role::Model),
            &model,
            self.config.show_progress,
        );
        let mut snapshots = self.session.subscribe();

        let submit = self.session.submit(text);
        tokio::pin!(submit);

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut cancel_reason = None;
        let result = loop {
            tokio::select! {
                result = &mut submit => break result,
                changed = snapshots.changed() => {
                    if changed.is_ok() {
                        let snapshot = snapshots.borrow_and_update();
                        if let Err(e) = progress.update(&snapshot) {
                            debug!("Could not print streamed text: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c(), if cancel_reason.is_none() => {
                    cancel_reason = Some(CancelReason::Interrupted);
                    self.session.cancel();
                }
                _ = &mut deadline, if cancel_reason.is_none() => {
                    if let Some(limit) = timeout {
                        warn!("Reply still pending after {:?}; cancelling", limit);
                        cancel_reason = Some(CancelReason::TimedOut(limit));
                    }
                    self.session.cancel();
                }
            }
        };

        let reply_text = result.as_ref().ok().map(|reply| reply.text.as_str());
        if let Err(e) = progress.finish(reply_text) {
            debug!("Could not print reply: {}", e);
        }

        if let (Err(SessionError::Cancelled), Some(reason)) = (&result, cancel_reason) {
            let notice = match reason {
                CancelReason::Interrupted => "cancelled".to_string(),
                CancelReason::TimedOut(limit) => {
                    format!("timed out after {}s", limit.as_secs())
                }
            };
            println!("{}", ConsoleFormatter::format_notice(&notice));
        }

        result
    }

    fn report(&self, error: &SessionError) {
        match error {
            // Already announced by `send`
            SessionError::Cancelled => {}
            SessionError::Transport(_) => {
                eprintln!("{}", ConsoleFormatter::format_error(error));
                eprintln!(
                    "{}",
                    ConsoleFormatter::format_notice("your message was kept; send again to retry")
                );
            }
            _ => eprintln!("{}", ConsoleFormatter::format_error(error)),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           Multiturn Chat - Chat Mode        │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model: {}", self.session.config().model);
        println!();
        println!("{}", ReplCommand::help_text());
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                println!("{}", ReplCommand::help_text());
                println!();
            }
            ReplCommand::New => {
                self.session.reset();
                println!("{}", ConsoleFormatter::format_notice("new conversation"));
            }
            ReplCommand::History => {
                println!();
                println!(
                    "{}",
                    ConsoleFormatter::format_transcript(&self.session.transcript())
                );
                println!();
            }
            ReplCommand::Model => {
                let current = &self.session.config().model;
                println!("Current model: {}", current);
                match self.session.available_models().await {
                    Ok(models) => {
                        println!("Available models:");
                        for model in models {
                            let mark = if &model == current { "*" } else { " " };
                            println!("  {} {}", mark, model);
                        }
                    }
                    Err(e) => debug!("Could not list models: {}", e),
                }
            }
            ReplCommand::Unknown(line) => {
                println!("Unknown command: {}", line);
                println!("Type /help for available commands");
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use multiturn_application::{ChatRequest, GatewayError, LlmGateway, SessionConfig};

    struct EchoGateway;

    #[async_trait]
    impl LlmGateway for EchoGateway {
        async fn send(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            let last = request.messages.last().map(|m| m.text.as_str()).unwrap_or("");
            Ok(format!("echo: {}", last))
        }
    }

    struct SilentGateway;

    #[async_trait]
    impl LlmGateway for SilentGateway {
        async fn send(&self, _request: &ChatRequest) -> Result<String, GatewayError> {
            std::future::pending().await
        }
    }

    fn repl(gateway: impl LlmGateway + 'static, config: ReplConfig) -> ChatRepl {
        let session = Arc::new(ChatSession::new(Arc::new(gateway), SessionConfig::default()));
        ChatRepl::new(session).with_config(config)
    }

    fn quiet() -> ReplConfig {
        ReplConfig {
            show_progress: false,
            history_file: None,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn send_returns_the_model_reply() {
        let repl = repl(EchoGateway, quiet());
        let reply = repl.send("hi").await.unwrap();
        assert_eq!(reply.text, "echo: hi");
        assert_eq!(repl.session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn timeout_cancels_pending_reply() {
        let config = ReplConfig {
            timeout: Some(Duration::from_millis(20)),
            ..quiet()
        };
        let repl = repl(SilentGateway, config);

        assert_eq!(repl.send("hello?").await, Err(SessionError::Cancelled));
        assert!(!repl.session.is_pending());
        assert_eq!(repl.session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn new_command_resets_the_session() {
        let repl = repl(EchoGateway, quiet());
        repl.send("hi").await.unwrap();

        assert!(!repl.handle_command(ReplCommand::New).await);
        assert!(repl.session.transcript().is_empty());
        assert!(!repl.handle_command(ReplCommand::Model).await);
        assert!(repl.handle_command(ReplCommand::Quit).await);
    }
}
