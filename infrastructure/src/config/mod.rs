//! Configuration file loading for agora
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `AGORA_*` environment variables (`AGORA_DISCUSSION__TOPIC=...`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./agora.toml` or `./.agora.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agora/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileConfig, FileDiscussionConfig, FileLoggingConfig,
    FileMemoryConfig, FileOutputConfig, FileProviderConfig, ProviderKind,
};
pub use loader::ConfigLoader;
