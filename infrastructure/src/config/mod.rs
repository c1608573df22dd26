//! Configuration file loading for multiturn-chat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `MULTITURN_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./multiturn.toml` or `./.multiturn.toml`
//! 4. Global: `$XDG_CONFIG_HOME/multiturn-chat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileLoggingConfig, FileProviderConfig, FileReplConfig,
    FileSessionConfig,
};
pub use loader::ConfigLoader;
