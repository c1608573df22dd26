//! Presentation-level configuration
//!
//! Configuration for REPL behavior.

use std::path::PathBuf;
use std::time::Duration;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Show the loading spinner while a reply is pending
    pub show_progress: bool,
    /// Path to history file (`None` disables history)
    pub history_file: Option<PathBuf>,
    /// Cancel replies still pending after this long
    pub timeout: Option<Duration>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: Self::default_history_path(),
            timeout: None,
        }
    }
}

impl ReplConfig {
    /// `$XDG_DATA_HOME/multiturn-chat/history.txt` or platform equivalent
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("multiturn-chat").join("history.txt"))
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_timeout_secs(mut self, seconds: Option<u64>) -> Self {
        self.timeout = seconds.map(Duration::from_secs);
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }
}
