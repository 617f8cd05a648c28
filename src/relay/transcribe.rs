//! Google Cloud Speech-to-Text relay

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{AudioClip, Transcriber};
use crate::lang::Direction;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://speech.googleapis.com";

/// Request body for `speech:recognize`
#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'static str,
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    /// Base64-encoded clip bytes
    content: String,
}

/// Response from `speech:recognize`
#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

/// Transcribes speech clips via the Google Cloud Speech-to-Text REST API
pub struct GoogleTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleTranscriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: String, timeout: std::time::Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingCredentials(
                "Google Speech API key required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the provider base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(clip: &AudioClip, direction: Direction) -> RecognizeRequest {
        RecognizeRequest {
            config: RecognitionConfig {
                encoding: clip.encoding.as_str(),
                sample_rate_hertz: clip.encoding.sample_rate_hertz(),
                language_code: direction.source_language_code(),
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(&clip.bytes),
            },
        }
    }

    /// Space-join the top alternative of each result segment, provider order
    fn join_transcript(response: &RecognizeResponse) -> String {
        response
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Transcriber for GoogleTranscriber {
    async fn transcribe(&self, clip: &AudioClip, direction: Direction) -> Result<String> {
        tracing::debug!(
            audio_bytes = clip.bytes.len(),
            encoding = clip.encoding.as_str(),
            language = direction.source_language_code(),
            "starting transcription"
        );

        let url = format!(
            "{}/v1/speech:recognize?key={}",
            self.base_url, self.api_key
        );
        let request = Self::build_request(clip, direction);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "speech recognition request failed");
                Error::TranscriptionUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "speech recognition API error");
            return Err(Error::TranscriptionUnavailable(format!(
                "speech API error {status}: {body}"
            )));
        }

        let result: RecognizeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse speech recognition response");
            Error::TranscriptionUnavailable(e.to_string())
        })?;

        // No results means "could not transcribe", not a failure
        let transcript = Self::join_transcript(&result);
        if transcript.is_empty() {
            tracing::warn!("no transcription results returned");
        } else {
            tracing::info!(transcript = %transcript, "transcription complete");
        }
        Ok(transcript)
    }
}
