use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FieldSyncError, Result};

/// Languages the name fields can be translated between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Short code sent as `target_language`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::English => "en",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Arabic => "Arabic",
            Self::English => "English",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().to_lowercase().as_str() {
            "ar" => Ok(Self::Arabic),
            "en" => Ok(Self::English),
            _ => Err(FieldSyncError::UnsupportedLanguage(format!(
                "'{}'. Valid languages: ar, en",
                code
            ))),
        }
    }
}

impl FromStr for Language {
    type Err = FieldSyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
