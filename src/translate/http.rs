use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, FieldSyncError};
use crate::language::Language;
use crate::token::TokenProvider;
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
}

/// Client for the form's translation endpoint
pub struct HttpTranslator {
    client: Client,
    url: String,
    csrf_header: String,
    token: Arc<dyn TokenProvider>,
}

impl HttpTranslator {
    pub fn new(config: &TranslateConfig, token: Arc<dyn TokenProvider>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: config.url(),
            csrf_header: config.csrf_header.clone(),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Pull `translated_text` out of a response body.
///
/// Non-empty strings, non-zero numbers and `true` count as a translation;
/// scalars are written out as text. Anything else is no translation.
fn extract_translation(body: &str) -> Result<Option<String>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FieldSyncError::Payload(format!("response is not JSON: {}", e)))?;

    Ok(match value.get("translated_text") {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_language: Language) -> Result<Option<String>> {
        let token = self.token.token().ok_or_else(|| {
            FieldSyncError::MissingToken("request would be unauthenticated".to_string())
        })?;

        let request = TranslationRequest {
            text: text.to_string(),
            target_language: target_language.code().to_string(),
        };

        debug!("Sending translation request to: {}", self.url);

        let response = self.client
            .post(&self.url)
            .header(self.csrf_header.as_str(), token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FieldSyncError::Status { status, body });
        }

        let body = response.text().await?;
        debug!("Raw translation response: {}", body);

        extract_translation(&body)
    }
}
