//! Slash commands understood by the chat REPL

/// A parsed `/command` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    /// Start a new conversation (reset the session)
    New,
    /// Print the transcript so far
    History,
    /// Show the model in use
    Model,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`. Returns `None` for ordinary messages.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let name = line.strip_prefix('/')?.split_whitespace().next().unwrap_or("");
        Some(match name {
            "quit" | "exit" | "q" => ReplCommand::Quit,
            "help" | "h" | "?" => ReplCommand::Help,
            "new" | "reset" | "clear" => ReplCommand::New,
            "history" => ReplCommand::History,
            "model" => ReplCommand::Model,
            _ => ReplCommand::Unknown(line.to_string()),
        })
    }

    pub fn help_text() -> &'static str {
        "Commands:\n  \
         /help, /h, /?       - Show this help\n  \
         /new, /reset        - Start a new conversation\n  \
         /history            - Show the conversation so far\n  \
         /model              - Show the current model\n  \
         /quit, /exit, /q    - Exit chat\n\n\
         Press Ctrl-C while a reply is streaming to cancel it."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(ReplCommand::parse("hello /there"), None);
    }

    #[test]
    fn aliases_map_to_the_same_command() {
        for line in ["/quit", "/exit", " /q "] {
            assert_eq!(ReplCommand::parse(line), Some(ReplCommand::Quit));
        }
        assert_eq!(ReplCommand::parse("/reset"), Some(ReplCommand::New));
        assert_eq!(ReplCommand::parse("/history"), Some(ReplCommand::History));
    }

    #[test]
    fn unknown_command_keeps_the_line() {
        assert_eq!(
            ReplCommand::parse("/frobnicate now"),
            Some(ReplCommand::Unknown("/frobnicate now".to_string()))
        );
    }
}
