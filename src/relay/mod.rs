//! Relay clients for the external speech and translation providers
//!
//! A relay marshals exactly one request to one provider and unwraps the
//! response into a strict result type. Each relay sits behind a trait so the
//! orchestrator and tests never depend on a live provider.

mod synthesize;
mod transcribe;
mod translate;

pub use synthesize::ElevenLabsSynthesizer;
pub use transcribe::GoogleTranscriber;
pub use translate::OpenRouterTranslator;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::lang::Direction;
use crate::Result;

/// Audio container the recognizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// Opus in a WebM container (browser `MediaRecorder` output)
    WebmOpus,
    /// Uncompressed 16-bit PCM WAV (local capture output)
    Linear16,
}

impl AudioEncoding {
    /// Provider encoding token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebmOpus => "WEBM_OPUS",
            Self::Linear16 => "LINEAR16",
        }
    }

    /// Sample rate this encoding is captured at
    #[must_use]
    pub const fn sample_rate_hertz(self) -> u32 {
        match self {
            Self::WebmOpus => 48_000,
            Self::Linear16 => 16_000,
        }
    }
}

/// One finalized recording, ready for transcription
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Raw container bytes
    pub bytes: Bytes,
    /// Container/codec of `bytes`
    pub encoding: AudioEncoding,
}

impl AudioClip {
    /// Wrap raw audio bytes
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, encoding: AudioEncoding) -> Self {
        Self {
            bytes: bytes.into(),
            encoding,
        }
    }

    /// Whether the clip carries no audio at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Synthesized audio delivered as it arrives from the provider.
///
/// Callers can begin consuming before the clip is fully downloaded; nothing
/// in the relay layer materializes the whole stream.
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

/// Drain an [`AudioStream`] into a single buffer.
///
/// Used by the playback path, which needs the complete clip before decoding.
///
/// # Errors
///
/// Returns the first stream error encountered.
pub async fn collect_audio(mut stream: AudioStream) -> Result<Bytes> {
    use futures::StreamExt;

    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(Bytes::from(buf))
}

/// Speech recognition seam
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a clip spoken in the direction's source language.
    ///
    /// An empty string means "nothing usable was recognized" and is a valid
    /// outcome, distinct from a transport failure.
    ///
    /// # Errors
    ///
    /// Returns `TranscriptionUnavailable` on transport or parse failure.
    async fn transcribe(&self, clip: &AudioClip, direction: Direction) -> Result<String>;
}

/// Translation seam
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate recognized text into the direction's target language.
    ///
    /// A missing or malformed provider completion yields an empty string,
    /// distinguishable from the `TranslationUnavailable` transport failure.
    ///
    /// # Errors
    ///
    /// Returns `TranslationUnavailable` on transport failure.
    async fn translate(&self, text: &str, direction: Direction) -> Result<String>;
}

/// Speech synthesis seam
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text with the given voice, streaming audio bytes back.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty text and `SynthesisUnavailable` on
    /// transport failure.
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<AudioStream>;
}
