use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Where the classification model is served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Hugging Face space id, e.g. "owner/name"
    pub space: String,
    /// Gradio route of the prediction endpoint
    pub route: String,
    /// Explicit service root; overrides the address derived from `space`
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub hf_token: Option<String>,
    /// `HF_TOKEN` from the environment; never written back to disk
    #[serde(skip)]
    pub env_token: Option<String>,
}

impl ServiceConfig {
    /// Token from the config file, else from the environment.
    pub fn token(&self) -> Option<&str> {
        self.hf_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.env_token.as_deref())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            space: "srijonashraf/maize-leaf-disease-detection".into(),
            route: "/predict".into(),
            base_url: None,
            hf_token: None,
            env_token: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    /// Unset means the HTTP client's own default applies.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// JSON file replacing the built-in recommendation table
    #[serde(default)]
    pub recommendations_path: Option<PathBuf>,
}

impl Config {
    /// Directory: ~/.config/leaf-doctor/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("leaf-doctor");
        p
    }

    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk, returning defaults if file doesn't exist or is invalid.
    pub fn load() -> Self {
        let path = Self::path();
        let mut config = match fs::read_to_string(&path) {
            Ok(data) => Self::parse(&data),
            Err(_) => Self::default(),
        };
        config.service.env_token = std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        config
    }

    fn parse(data: &str) -> Self {
        serde_json::from_str(data).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid config: {e}");
            Self::default()
        })
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = Self::dir();
        fs::create_dir_all(&dir)?;
        let data = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(), data)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
