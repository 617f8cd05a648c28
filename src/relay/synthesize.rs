//! ElevenLabs speech-synthesis relay
//!
//! Synthesis is streamed: the provider's byte stream is passed through to the
//! caller chunk by chunk, never buffered whole in the relay.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;

use super::{AudioStream, Synthesizer};
use crate::config::VoiceConfig;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Synthesizes speech via the ElevenLabs streaming text-to-speech API
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: String,
    voice: VoiceConfig,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: String, voice: VoiceConfig, timeout: std::time::Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingCredentials(
                "ElevenLabs API key required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            voice,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the provider base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<AudioStream> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput(
                "missing or invalid 'text' field".to_string(),
            ));
        }

        let voice = self.voice.resolve(voice_id);
        tracing::debug!(chars = text.len(), voice = %voice, "starting synthesis");

        let url = format!(
            "{}/v1/text-to-speech/{}/stream?output_format={}",
            self.base_url, voice, self.voice.output_format
        );

        let request = SynthesisRequest {
            text,
            model_id: &self.voice.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "synthesis request failed");
                Error::SynthesisUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "synthesis API error");
            return Err(Error::SynthesisUnavailable(format!(
                "synthesis API error {status}: {body}"
            )));
        }

        tracing::info!(voice = %voice, "synthesis stream open");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::SynthesisUnavailable(e.to_string())))
            .boxed();

        Ok(stream)
    }
}
