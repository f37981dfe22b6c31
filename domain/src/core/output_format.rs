//! Output format value object

use serde::{Deserialize, Serialize};

/// How a finished discussion is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every public event as it happened
    #[default]
    Transcript,
    /// Only the final summary and outcome
    Summary,
    /// Outcome and events as JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_transcript() {
        assert_eq!(OutputFormat::default(), OutputFormat::Transcript);
    }

    #[test]
    fn test_deserialize_lowercase() {
        let format: OutputFormat = serde_json::from_str("\"summary\"").unwrap();
        assert_eq!(format, OutputFormat::Summary);
    }
}
