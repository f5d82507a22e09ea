use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Name of the per-user directory holding config, history and log
pub const APP_DIR: &str = ".askcmd";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Overrides `~/.askcmd/history.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,

    /// Overrides `~/.askcmd/askcmd.log`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

/// Config summary that is safe to log
#[derive(Debug, Clone, PartialEq)]
pub struct SafeSummary {
    pub api_key_configured: bool,
    pub base_url: String,
    pub model: String,
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
            .unwrap_or(crate::providers::DEFAULT_MAX_TOKENS)
    }

    /// Resolved history file path, `None` only when no home directory exists
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_path
            .clone()
            .or_else(|| app_dir().map(|dir| dir.join("history.json")))
    }

    /// Resolved diagnostic log path, `None` only when no home directory exists
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_path
            .clone()
            .or_else(|| app_dir().map(|dir| dir.join("askcmd.log")))
    }

    pub fn get_safe_summary(&self) -> SafeSummary {
        SafeSummary {
            api_key_configured: self.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            base_url: self.base_url().to_string(),
            model: self.model().to_string(),
        }
    }
}

/// `~/.askcmd`
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR))
}
