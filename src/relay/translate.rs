//! OpenRouter translation relay
//!
//! Translation is a single chat-completion call: the user message carries the
//! recognized text, the system message carries the fixed per-direction
//! instruction telling the model to return only the translated words.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Translator;
use crate::lang::Direction;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai";

/// Default completion model
pub const TRANSLATION_MODEL: &str = "qwen/qwen3-32b";

/// Suffix disabling the model's reasoning preamble; without it qwen3 prefixes
/// a thinking block to the translation.
const NO_THINK_SUFFIX: &str = " /no_think";

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Translates text via the OpenRouter chat-completions API
pub struct OpenRouterTranslator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterTranslator {
    /// Create a new translator
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: String, timeout: std::time::Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingCredentials(
                "OpenRouter API key required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: TRANSLATION_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the completion model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the provider base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(&self, text: &str, direction: Direction) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "user",
                    content: format!("{text}{NO_THINK_SUFFIX}"),
                },
                Message {
                    role: "system",
                    content: direction.translation_instruction().to_string(),
                },
            ],
        }
    }

    /// Pull the translated text out of the completion, trimmed.
    ///
    /// A missing or empty completion yields an empty string rather than an
    /// error; "nothing usable" is a valid outcome the caller renders as a
    /// placeholder.
    fn extract_translation(response: &CompletionResponse) -> String {
        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl Translator for OpenRouterTranslator {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String> {
        tracing::debug!(
            chars = text.len(),
            direction = %direction,
            "starting translation"
        );

        let url = format!("{}/api/v1/chat/completions", self.base_url);
        let request = self.build_request(text, direction);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "translation request failed");
                Error::TranslationUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "translation API error");
            return Err(Error::TranslationUnavailable(format!(
                "completion API error {status}: {body}"
            )));
        }

        let result: CompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse completion response");
            Error::TranslationUnavailable(e.to_string())
        })?;

        let translation = Self::extract_translation(&result);
        if translation.is_empty() {
            tracing::warn!("completion returned no translation");
        } else {
            tracing::info!(translation = %translation, "translation complete");
        }
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn translator() -> OpenRouterTranslator {
        OpenRouterTranslator::new("test-key".to_string(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn request_carries_text_and_no_think_suffix() {
        let request = translator().build_request("Hola", Direction::Forward);

        assert_eq!(request.model, TRANSLATION_MODEL);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "Hola /no_think");
        assert_eq!(request.messages[1].role, "system");
    }

    #[test]
    fn system_instruction_swaps_with_direction() {
        let t = translator();
        let forward = t.build_request("same text", Direction::Forward);
        let reverse = t.build_request("same text", Direction::Reverse);

        assert_ne!(forward.messages[1].content, reverse.messages[1].content);
        assert!(forward.messages[1].content.contains("Spanish to English"));
        assert!(reverse.messages[1].content.contains("English to Spanish"));
        // The user payload is direction-independent
        assert_eq!(forward.messages[0].content, reverse.messages[0].content);
    }

    #[test]
    fn extract_translation_trims_content() {
        let response: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [ { "message": { "content": "  Hello \n" } } ]
        }))
        .unwrap();

        assert_eq!(
            OpenRouterTranslator::extract_translation(&response),
            "Hello"
        );
    }

    #[test]
    fn missing_or_malformed_completion_yields_empty_string() {
        let empty: CompletionResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(OpenRouterTranslator::extract_translation(&empty), "");

        let null_content: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [ { "message": {} } ]
        }))
        .unwrap();
        assert_eq!(OpenRouterTranslator::extract_translation(&null_content), "");
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            OpenRouterTranslator::new(String::new(), Duration::from_secs(1)),
            Err(Error::MissingCredentials(_))
        ));
    }
}
