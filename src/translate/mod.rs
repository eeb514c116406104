// Translation client
//
// The binder talks to the backend through the `Translator` trait so the
// trigger logic can run against a mock; `HttpTranslator` is the real client.

pub mod http;

use async_trait::async_trait;

pub use http::*;
use crate::error::Result;
use crate::language::Language;

/// Translate a piece of text into the target language
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// `Ok(None)` when the backend answered without a usable translation
    async fn translate(&self, text: &str, target_language: Language) -> Result<Option<String>>;
}
