//! HTTP API server for the echolingo gateway

pub mod health;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{Config, Voice, VoiceConfig};
use crate::relay::{
    ElevenLabsSynthesizer, GoogleTranscriber, OpenRouterTranslator, Synthesizer, Transcriber,
    Translator,
};
use crate::Result;

/// Shared state for API handlers
///
/// Each relay is present only when its provider credential is configured;
/// handlers turn an absent relay into a `MissingCredentials` error rather
/// than failing at startup.
pub struct ApiState {
    /// Speech-recognition relay
    pub transcriber: Option<Arc<dyn Transcriber>>,
    /// Translation relay
    pub translator: Option<Arc<dyn Translator>>,
    /// Speech-synthesis relay
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
    /// Selectable synthesis voices
    pub voices: Vec<Voice>,
}

impl ApiState {
    /// Build relay clients from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a configured relay client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Self> {
        let transcriber: Option<Arc<dyn Transcriber>> = match &config.keys.google_speech {
            Some(key) => Some(Arc::new(GoogleTranscriber::new(
                key.clone(),
                config.relay.timeout,
            )?)),
            None => {
                tracing::warn!("GOOGLE_SPEECH_API_KEY not set, transcription disabled");
                None
            }
        };

        let translator: Option<Arc<dyn Translator>> = match &config.keys.openrouter {
            Some(key) => Some(Arc::new(OpenRouterTranslator::new(
                key.clone(),
                config.relay.timeout,
            )?)),
            None => {
                tracing::warn!("OPENROUTER_API_KEY not set, translation disabled");
                None
            }
        };

        let synthesizer: Option<Arc<dyn Synthesizer>> = match &config.keys.elevenlabs {
            Some(key) => Some(Arc::new(ElevenLabsSynthesizer::new(
                key.clone(),
                config.voice.clone(),
                config.relay.timeout,
            )?)),
            None => {
                tracing::warn!("ELEVENLABS_API_KEY not set, synthesis disabled");
                None
            }
        };

        Ok(Self {
            transcriber,
            translator,
            synthesizer,
            voices: config.voice.catalog.clone(),
        })
    }

    /// State with no providers configured (used in tests)
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            transcriber: None,
            translator: None,
            synthesizer: None,
            voices: VoiceConfig::default().catalog,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Create a server for the given state
    #[must_use]
    pub fn new(state: Arc<ApiState>, port: u16, static_dir: Option<PathBuf>) -> Self {
        Self {
            state,
            port,
            static_dir,
        }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(voice::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        // Serve the web client if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from the web client
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Build the bare API router for the given state (used in tests)
#[must_use]
pub fn test_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(voice::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state))
}
