use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{Result, FieldSyncError};
use crate::language::Language;

fn default_discard_stale_responses() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub translate: TranslateConfig,
    pub debounce: DebounceConfig,
    pub binding: BindingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Base URL of the site serving the translation endpoint
    pub endpoint: String,
    /// Path of the translation endpoint
    pub path: String,
    /// Header carrying the security token
    pub csrf_header: String,
    /// Name of the hidden input holding the security token
    pub csrf_field: String,
    /// Request timeout in seconds; no timeout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period after the last keystroke before translating
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Name field in the first language
    pub first: FieldSpec,
    /// Name field in the second language
    pub second: FieldSpec,
    /// Drop responses that were overtaken by a newer edit of the same field
    #[serde(default = "default_discard_stale_responses")]
    pub discard_stale_responses: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Element identifier on the page
    pub id: String,
    /// Language the field is written in
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate: TranslateConfig {
                endpoint: "http://127.0.0.1:8000".to_string(),
                path: "/ar/dashboard/api/translate/".to_string(),
                csrf_header: "X-CSRFToken".to_string(),
                csrf_field: "csrfmiddlewaretoken".to_string(),
                request_timeout_secs: None,
            },
            debounce: DebounceConfig { delay_ms: 1000 },
            binding: BindingConfig {
                first: FieldSpec {
                    id: "id_name_ar".to_string(),
                    language: Language::Arabic,
                },
                second: FieldSpec {
                    id: "id_name_en".to_string(),
                    language: Language::English,
                },
                discard_stale_responses: true,
            },
        }
    }
}

impl TranslateConfig {
    pub fn url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), self.path)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FieldSyncError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| FieldSyncError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FieldSyncError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| FieldSyncError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let binding = &self.binding;
        if binding.first.id.trim().is_empty() || binding.second.id.trim().is_empty() {
            return Err(FieldSyncError::Config("Field ids must not be empty".to_string()));
        }
        if binding.first.id == binding.second.id {
            return Err(FieldSyncError::Config(format!(
                "Both fields use the id '{}'",
                binding.first.id
            )));
        }
        if binding.first.language == binding.second.language {
            return Err(FieldSyncError::Config(format!(
                "Both fields are in the same language '{}'",
                binding.first.language
            )));
        }
        if !self.translate.path.starts_with('/') {
            return Err(FieldSyncError::Config(format!(
                "Endpoint path '{}' must start with '/'",
                self.translate.path
            )));
        }
        Ok(())
    }
}
