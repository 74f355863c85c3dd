use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_tick_rate_ms() -> u64 {
    100
}
fn default_notice_secs() -> u64 {
    5
}
fn default_log_filter() -> String {
    "info".to_string()
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizdesk")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            theme: default_theme(),
            tick_rate_ms: default_tick_rate_ms(),
            notice_secs: default_notice_secs(),
            log_filter: default_log_filter(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizdesk")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_path().join("logs")
    }

    /// Clamp numeric fields into usable ranges and normalize the base URL so
    /// endpoint paths can be appended with a single `/`.
    pub fn validate(&mut self) {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if trimmed.is_empty() {
            default_api_base_url()
        } else {
            trimmed.to_string()
        };
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 300);
        self.tick_rate_ms = self.tick_rate_ms.clamp(16, 1000);
        self.notice_secs = self.notice_secs.clamp(1, 60);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.notice_secs, 5);
        assert_eq!(config.log_filter, "info");
        assert!(config.data_dir.contains("quizdesk"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
api_base_url = "https://exams.example.org/api/v1"
theme = "gruvbox-dark"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_base_url, "https://exams.example.org/api/v1");
        assert_eq!(config.theme, "gruvbox-dark");
        assert_eq!(config.tick_rate_ms, 100);
    }

    #[test]
    fn test_validate_strips_trailing_slashes() {
        let mut config = Config::default();
        config.api_base_url = "http://host:8000/api/v1//".to_string();
        config.validate();
        assert_eq!(config.api_base_url, "http://host:8000/api/v1");
    }

    #[test]
    fn test_validate_blank_url_resets() {
        let mut config = Config::default();
        config.api_base_url = "   ".to_string();
        config.validate();
        assert_eq!(config.api_base_url, default_api_base_url());
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.request_timeout_secs = 0;
        config.tick_rate_ms = 5;
        config.notice_secs = 600;
        config.validate();
        assert_eq!(config.request_timeout_secs, 1);
        assert_eq!(config.tick_rate_ms, 16);
        assert_eq!(config.notice_secs, 60);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.api_base_url, deserialized.api_base_url);
        assert_eq!(config.data_dir, deserialized.data_dir);
    }
}
