//! Echolingo - voice-to-voice translation gateway
//!
//! This library provides the core functionality for the echolingo gateway:
//! - Relay clients for the recognition, translation, and synthesis providers
//! - The conversation log and turn orchestration pipeline
//! - Local microphone capture and speaker playback for the CLI client
//! - The HTTP API the web client talks to
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Clients                           │
//! │      Web client (HTTP)   │   CLI chat (mic/speaker) │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Echolingo Gateway                     │
//! │   Capture │ Turn Orchestrator │ Turn Log │ Playback │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Provider Relays                       │
//! │   Speech-to-Text │ Translation │ Text-to-Speech     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod lang;
pub mod relay;
pub mod session;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use lang::Direction;
pub use relay::{AudioClip, AudioEncoding, AudioStream, Synthesizer, Transcriber, Translator};
pub use session::{
    AudioSink, AudioStatus, Orchestrator, PlaybackCommand, PlaybackController, Speaker, Turn,
    TurnId, TurnLog, TurnState,
};
