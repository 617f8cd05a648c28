//! Configuration management for the echolingo gateway
//!
//! All provider credentials come from process-wide environment variables.
//! A missing credential is not a startup failure: the affected relay is
//! simply left unconfigured and surfaces as a 5xx at request time.

use std::time::Duration;

use serde::Serialize;

use crate::{Error, Result};

/// Default HTTP port for the gateway
pub const DEFAULT_PORT: u16 = 8787;

/// Default timeout budget for a single relay call
pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 30;

/// Synthesis voice identifier used when the caller picks none (Enrique M Nieto)
pub const DEFAULT_VOICE_ID: &str = "gbTn1bmCvNgk0QEAVyfM";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP API listens on
    pub port: u16,

    /// Provider credentials
    pub keys: ProviderKeys,

    /// Relay behavior (timeouts)
    pub relay: RelayConfig,

    /// Synthesis voice settings
    pub voice: VoiceConfig,

    /// Optional directory of static web-client files to serve
    pub static_dir: Option<std::path::PathBuf>,
}

impl Config {
    /// Load configuration from the environment
    #[must_use]
    pub fn from_env() -> Self {
        let port = std::env::var("ECHOLINGO_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            keys: ProviderKeys::from_env(),
            relay: RelayConfig::default(),
            voice: VoiceConfig::default(),
            static_dir: std::env::var("ECHOLINGO_STATIC_DIR")
                .ok()
                .map(std::path::PathBuf::from),
        }
    }
}

/// API keys for the three external providers
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    /// Google Cloud Speech-to-Text API key
    pub google_speech: Option<String>,

    /// `OpenRouter` API key (translation via chat completions)
    /// See: <https://openrouter.ai/keys>
    pub openrouter: Option<String>,

    /// `ElevenLabs` API key (speech synthesis)
    pub elevenlabs: Option<String>,
}

impl ProviderKeys {
    /// Read provider keys from the environment.
    ///
    /// Reads `GOOGLE_SPEECH_API_KEY`, `OPENROUTER_API_KEY`, and
    /// `ELEVENLABS_API_KEY`. Empty values count as absent.
    #[must_use]
    pub fn from_env() -> Self {
        fn non_empty(var: &str) -> Option<String> {
            std::env::var(var).ok().filter(|v| !v.is_empty())
        }

        Self {
            google_speech: non_empty("GOOGLE_SPEECH_API_KEY"),
            openrouter: non_empty("OPENROUTER_API_KEY"),
            elevenlabs: non_empty("ELEVENLABS_API_KEY"),
        }
    }

    /// Google Speech key, or a `MissingCredentials` error
    ///
    /// # Errors
    ///
    /// Returns error if the key is not configured
    pub fn require_google_speech(&self) -> Result<&str> {
        self.google_speech
            .as_deref()
            .ok_or_else(|| Error::MissingCredentials("GOOGLE_SPEECH_API_KEY not set".to_string()))
    }

    /// `OpenRouter` key, or a `MissingCredentials` error
    ///
    /// # Errors
    ///
    /// Returns error if the key is not configured
    pub fn require_openrouter(&self) -> Result<&str> {
        self.openrouter
            .as_deref()
            .ok_or_else(|| Error::MissingCredentials("OPENROUTER_API_KEY not set".to_string()))
    }

    /// `ElevenLabs` key, or a `MissingCredentials` error
    ///
    /// # Errors
    ///
    /// Returns error if the key is not configured
    pub fn require_elevenlabs(&self) -> Result<&str> {
        self.elevenlabs
            .as_deref()
            .ok_or_else(|| Error::MissingCredentials("ELEVENLABS_API_KEY not set".to_string()))
    }
}

/// Relay client behavior
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Timeout budget for one outbound provider call.
    /// A hung provider must never leave a turn pending forever.
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS),
        }
    }
}

/// A selectable synthesis voice
#[derive(Debug, Clone, Serialize)]
pub struct Voice {
    /// Provider voice identifier
    pub id: String,
    /// Display name
    pub name: String,
}

/// Speech synthesis settings
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Voice used when the caller specifies none, or an unknown id
    pub default_voice: String,

    /// Synthesis model identifier
    pub model: String,

    /// Output audio encoding requested from the provider
    pub output_format: String,

    /// Selectable voices offered to clients
    pub catalog: Vec<Voice>,
}

impl VoiceConfig {
    /// Resolve a requested voice id against the catalog.
    ///
    /// Absent or unknown ids fall back to the default voice; turns keep the
    /// voice they were created with, so resolution happens exactly once.
    #[must_use]
    pub fn resolve(&self, requested: Option<&str>) -> String {
        match requested {
            Some(id) if !id.is_empty() && self.catalog.iter().any(|v| v.id == id) => {
                id.to_string()
            }
            Some(id) if !id.is_empty() => {
                tracing::debug!(voice = %id, "unknown voice id, using default");
                self.default_voice.clone()
            }
            _ => self.default_voice.clone(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            default_voice: DEFAULT_VOICE_ID.to_string(),
            model: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            catalog: vec![
                Voice {
                    id: "gbTn1bmCvNgk0QEAVyfM".to_string(),
                    name: "Enrique M Nieto".to_string(),
                },
                Voice {
                    id: "Nh2zY9kknu6z4pZy6FhD".to_string(),
                    name: "David Martin".to_string(),
                },
                Voice {
                    id: "6xftrpatV0jGmFHxDjUv".to_string(),
                    name: "Martin Osborne".to_string(),
                },
                Voice {
                    id: "KHCvMklQZZo0O30ERnVn".to_string(),
                    name: "Sara Martin".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_voice_keeps_it() {
        let config = VoiceConfig::default();
        assert_eq!(
            config.resolve(Some("Nh2zY9kknu6z4pZy6FhD")),
            "Nh2zY9kknu6z4pZy6FhD"
        );
    }

    #[test]
    fn resolve_unknown_or_absent_voice_falls_back_to_default() {
        let config = VoiceConfig::default();
        assert_eq!(config.resolve(Some("no-such-voice")), DEFAULT_VOICE_ID);
        assert_eq!(config.resolve(Some("")), DEFAULT_VOICE_ID);
        assert_eq!(config.resolve(None), DEFAULT_VOICE_ID);
    }

    #[test]
    fn missing_keys_yield_missing_credentials() {
        let keys = ProviderKeys::default();
        assert!(matches!(
            keys.require_google_speech(),
            Err(crate::Error::MissingCredentials(_))
        ));
        assert!(matches!(
            keys.require_openrouter(),
            Err(crate::Error::MissingCredentials(_))
        ));
        assert!(matches!(
            keys.require_elevenlabs(),
            Err(crate::Error::MissingCredentials(_))
        ));
    }
}
