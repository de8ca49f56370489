//! Configuration handling for the form engine

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required";
const DEFAULT_NUMBER_MESSAGE: &str = "Please enter a valid number";
const DEFAULT_OPTION_MESSAGE: &str = "Please select one of the available options";

/// Engine-wide defaults shared by every form instance
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Message used for required fields that do not carry their own
    pub required_message: Option<String>,
    /// Message used when a number field does not parse or is out of range
    pub number_message: Option<String>,
    /// Message used when a radio/dropdown value is not one of its options
    pub option_message: Option<String>,
    /// Upper bound for a whole-form validation pass
    pub validation_timeout_ms: Option<u64>,
    /// Upper bound for the submit handler
    pub submit_timeout_ms: Option<u64>,
}

impl EngineConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "formwright", "formwright")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: EngineConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(&path, content)?;
        }
        Ok(())
    }

    pub fn required_message(&self) -> &str {
        self.required_message
            .as_deref()
            .unwrap_or(DEFAULT_REQUIRED_MESSAGE)
    }

    pub fn number_message(&self) -> &str {
        self.number_message.as_deref().unwrap_or(DEFAULT_NUMBER_MESSAGE)
    }

    pub fn option_message(&self) -> &str {
        self.option_message.as_deref().unwrap_or(DEFAULT_OPTION_MESSAGE)
    }

    pub fn validation_timeout(&self) -> Option<Duration> {
        self.validation_timeout_ms.map(Duration::from_millis)
    }

    pub fn submit_timeout(&self) -> Option<Duration> {
        self.submit_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.required_message.is_none());
        assert!(config.number_message.is_none());
        assert!(config.option_message.is_none());
        assert!(config.validation_timeout().is_none());
        assert!(config.submit_timeout().is_none());
    }

    #[test]
    fn test_default_messages() {
        let config = EngineConfig::default();
        assert_eq!(config.required_message(), DEFAULT_REQUIRED_MESSAGE);
        assert_eq!(config.number_message(), DEFAULT_NUMBER_MESSAGE);
        assert_eq!(config.option_message(), DEFAULT_OPTION_MESSAGE);
    }

    #[test]
    fn test_overridden_messages() {
        let config = EngineConfig {
            required_message: Some("Required".to_string()),
            ..Default::default()
        };
        assert_eq!(config.required_message(), "Required");
        assert_eq!(config.number_message(), DEFAULT_NUMBER_MESSAGE);
    }

    #[test]
    fn test_timeouts_convert_to_durations() {
        let config = EngineConfig {
            validation_timeout_ms: Some(1500),
            submit_timeout_ms: Some(30_000),
            ..Default::default()
        };
        assert_eq!(
            config.validation_timeout(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(config.submit_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig {
            required_message: Some("Required".to_string()),
            number_message: Some("Numbers only".to_string()),
            option_message: None,
            validation_timeout_ms: Some(500),
            submit_timeout_ms: None,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.required_message, Some("Required".to_string()));
        assert_eq!(parsed.number_message, Some("Numbers only".to_string()));
        assert!(parsed.option_message.is_none());
        assert_eq!(parsed.validation_timeout_ms, Some(500));
        assert!(parsed.submit_timeout_ms.is_none());
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: EngineConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.required_message.is_none());
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"submit_timeout_ms": 100, "unknown_field": "value"}"#;
        let parsed: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.submit_timeout_ms, Some(100));
    }

    #[test]
    fn test_load_returns_ok() {
        // Falls back to defaults when no config file exists
        let result = EngineConfig::load();
        assert!(result.is_ok());
    }
}
