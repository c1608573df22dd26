//! Console output formatter for chat transcripts

use colored::Colorize;
use multiturn_domain::{ChatMessage, Role};

/// Formats chat messages for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Colored speaker label: green for the user, blue for the model.
    pub fn role_label(role: Role) -> String {
        match role {
            Role::User => "You:".green().bold().to_string(),
            Role::Model => "Model:".blue().bold().to_string(),
        }
    }

    fn format_message(message: &ChatMessage) -> String {
        format!("{} {}", Self::role_label(message.role), message.text)
    }

    /// Format a whole transcript, one blank line between turns
    pub fn format_transcript(messages: &[ChatMessage]) -> String {
        if messages.is_empty() {
            return "(no messages yet)".dimmed().to_string();
        }
        messages
            .iter()
            .map(Self::format_message)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn format_error(error: &dyn std::error::Error) -> String {
        format!("{} {}", "Error:".red().bold(), error)
    }

    pub fn format_notice(notice: &str) -> String {
        format!("({})", notice).dimmed().to_string()
    }
}
