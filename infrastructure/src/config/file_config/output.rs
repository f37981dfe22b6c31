//! Output and logging configuration from TOML (`[output]` and `[logging]` sections)

use agora_domain::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format (uses domain type)
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
    /// Directory for `<session>.events.jsonl` files; in-memory only when unset
    pub events_dir: Option<PathBuf>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            events_dir: None,
        }
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily rolling log files; stderr only when unset
    pub dir: Option<PathBuf>,
    pub file_prefix: String,
    /// `EnvFilter` directive used when `-v` is not given
    pub filter: Option<String>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: "agora.log".to_string(),
            filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_deserialize() {
        let toml_str = r#"
[output]
format = "json"
events_dir = "runs"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(config.output.events_dir, Some(PathBuf::from("runs")));
        assert!(config.output.color);
    }
}
