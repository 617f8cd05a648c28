//! Shared test doubles for the relay seams
//!
//! Each mock implements one relay trait and records what it was asked to do,
//! so tests can assert on outbound behavior without a live provider.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use echolingo::relay::{AudioClip, AudioStream, Synthesizer, Transcriber, Translator};
use echolingo::session::AudioSink;
use echolingo::{Direction, Error, Result};

/// Transcriber replaying a fixed script, one step per call
pub struct ScriptedTranscriber {
    steps: Mutex<VecDeque<Result<String>>>,
    directions: Mutex<Vec<Direction>>,
}

impl ScriptedTranscriber {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            directions: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn text(self, text: &str) -> Self {
        self.steps.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    #[must_use]
    pub fn failing(self) -> Self {
        self.steps.lock().unwrap().push_back(Err(
            Error::TranscriptionUnavailable("mock outage".to_string()),
        ));
        self
    }

    /// Directions of every call received so far
    pub fn directions(&self) -> Vec<Direction> {
        self.directions.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.directions.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip, direction: Direction) -> Result<String> {
        self.directions.lock().unwrap().push(direction);
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected transcribe call")
    }
}

/// Transcriber keyed by clip content, with a per-clip delay.
///
/// Lets a test race two in-flight turns with deterministic results no matter
/// which relay chain reaches the provider first.
pub struct KeyedTranscriber {
    entries: HashMap<Vec<u8>, (Duration, String)>,
}

impl KeyedTranscriber {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn clip(mut self, bytes: &[u8], delay: Duration, text: &str) -> Self {
        self.entries
            .insert(bytes.to_vec(), (delay, text.to_string()));
        self
    }
}

#[async_trait]
impl Transcriber for KeyedTranscriber {
    async fn transcribe(&self, clip: &AudioClip, _direction: Direction) -> Result<String> {
        let (delay, text) = self
            .entries
            .get(clip.bytes.as_ref())
            .expect("transcribe call with unknown clip");
        if !delay.is_zero() {
            tokio::time::sleep(*delay).await;
        }
        Ok(text.clone())
    }
}

/// Translator echoing its input with a `T:` prefix, recording each call
pub struct EchoTranslator {
    calls: Mutex<Vec<(String, Direction)>>,
}

impl EchoTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Direction)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), direction));
        Ok(format!("T:{text}"))
    }
}

/// Translator replaying a fixed script, one step per call
pub struct ScriptedTranslator {
    steps: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(String, Direction)>>,
}

impl ScriptedTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn text(self, text: &str) -> Self {
        self.steps.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    #[must_use]
    pub fn failing(self) -> Self {
        self.steps.lock().unwrap().push_back(Err(
            Error::TranslationUnavailable("mock outage".to_string()),
        ));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), direction));
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected translate call")
    }
}

/// Synthesizer replaying a fixed script and recording every request
pub struct ScriptedSynthesizer {
    steps: Mutex<VecDeque<Result<Bytes>>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedSynthesizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn audio(self, bytes: &'static [u8]) -> Self {
        self.steps
            .lock()
            .unwrap()
            .push_back(Ok(Bytes::from_static(bytes)));
        self
    }

    #[must_use]
    pub fn failing(self) -> Self {
        self.steps.lock().unwrap().push_back(Err(
            Error::SynthesisUnavailable("mock outage".to_string()),
        ));
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<AudioStream> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("missing text".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.map(str::to_string)));

        let bytes = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected synthesize call")?;

        // Two chunks so consumers exercise the streaming path
        let mid = bytes.len() / 2;
        let chunks = vec![Ok(bytes.slice(..mid)), Ok(bytes.slice(mid..))];
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// Audio sink recording every clip it is asked to play
#[derive(Default)]
pub struct RecordingSink {
    played: Mutex<Vec<Bytes>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Bytes> {
        self.played.lock().unwrap().clone()
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, audio: Bytes) -> Result<()> {
        self.played.lock().unwrap().push(audio);
        Ok(())
    }
}
