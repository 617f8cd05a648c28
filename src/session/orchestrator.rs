//! Turn orchestration: capture -> transcribe -> translate -> synthesize
//!
//! Each captured clip becomes one pending turn whose relay chain runs to
//! completion independently of any other turn. Transcription and translation
//! are strictly sequential within a turn; synthesis is fire-and-forget
//! relative to the chain but serialized per turn by the log's audio slot.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use super::playback::PlaybackCommand;
use super::{TurnId, TurnLog};
use crate::lang::Direction;
use crate::relay::{collect_audio, AudioClip, Synthesizer, Transcriber, Translator};
use crate::{Error, Result};

/// Sequences the relay chain for every captured clip
pub struct Orchestrator {
    log: Arc<TurnLog>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn Synthesizer>,
    playback: mpsc::Sender<PlaybackCommand>,
    direction: RwLock<Direction>,
    voice: RwLock<String>,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh conversation in `direction`
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
        playback: mpsc::Sender<PlaybackCommand>,
        direction: Direction,
        voice: String,
    ) -> Self {
        Self {
            log: Arc::new(TurnLog::new(direction)),
            transcriber,
            translator,
            synthesizer,
            playback,
            direction: RwLock::new(direction),
            voice: RwLock::new(voice),
        }
    }

    /// The conversation log
    #[must_use]
    pub fn log(&self) -> Arc<TurnLog> {
        Arc::clone(&self.log)
    }

    /// Active translation direction
    pub async fn direction(&self) -> Direction {
        *self.direction.read().await
    }

    /// Switch session mode: flips the direction and restarts the session
    /// with a single fresh greeting turn.
    pub async fn set_direction(&self, direction: Direction) {
        {
            let mut current = self.direction.write().await;
            *current = direction;
        }
        self.log.reset(direction).await;
        tracing::info!(direction = %direction, "session mode switched");
    }

    /// Select the synthesis voice for turns created from now on
    pub async fn set_voice(&self, voice_id: String) {
        *self.voice.write().await = voice_id;
    }

    /// Process one captured clip to completion and return its turn id.
    ///
    /// The turn is appended immediately in the pending state; the relay
    /// chain then resolves it, successfully or not. No failure leaves the
    /// turn pending.
    pub async fn process_clip(&self, clip: AudioClip) -> TurnId {
        let direction = self.direction().await;
        let voice = self.voice.read().await.clone();
        let id = self.log.append_pending(direction, voice).await;

        self.drive_turn(id, &clip, direction).await;
        id
    }

    /// Drain captured clips until the channel closes, one spawned relay
    /// chain per clip so a fast second turn never waits on a slow first.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<AudioClip>) {
        while let Some(clip) = rx.recv().await {
            let orchestrator = Arc::clone(&self);
            tokio::spawn(async move {
                orchestrator.process_clip(clip).await;
            });
        }
    }

    /// Replay a turn's synthesized audio.
    ///
    /// Ready audio plays immediately without a new synthesis call; a turn
    /// without ready audio is synthesized first. A replay that finds
    /// synthesis already in flight simply yields to it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown turn or one with nothing to
    /// speak, or the synthesis failure.
    pub async fn replay(&self, id: TurnId) -> Result<()> {
        let turn = self
            .log
            .get(id)
            .await
            .ok_or_else(|| Error::InvalidInput(format!("no such turn: {id}")))?;

        if turn.audio_ready() {
            if let Some(audio) = turn.audio {
                self.send_playback(PlaybackCommand::Play { turn_id: id, audio })
                    .await;
                return Ok(());
            }
        }

        let text = turn
            .target_text
            .ok_or_else(|| Error::InvalidInput(format!("turn {id} has no translation")))?;

        if !self.log.begin_synthesis(id).await {
            tracing::debug!(turn = id, "synthesis already in flight, replay yields");
            return Ok(());
        }

        match self.synthesize_clip(&text, &turn.voice_id).await {
            Ok(audio) => {
                self.log.complete_synthesis(id, audio.clone()).await;
                self.send_playback(PlaybackCommand::Play { turn_id: id, audio })
                    .await;
                Ok(())
            }
            Err(e) => {
                self.log.fail_synthesis(id, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Run the transcription/translation chain and resolve the turn
    async fn drive_turn(&self, id: TurnId, clip: &AudioClip, direction: Direction) {
        let recognized = match self.transcriber.transcribe(clip, direction).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(turn = id, error = %e, "transcription failed");
                self.log
                    .resolve(id, direction.not_transcribed_marker().to_string(), None)
                    .await;
                return;
            }
        };

        // Empty recognition is valid output: render the marker, not an error
        if recognized.is_empty() {
            self.log
                .resolve(id, direction.not_transcribed_marker().to_string(), None)
                .await;
            return;
        }

        // Translation is only issued once transcription has returned
        let translated = match self.translator.translate(&recognized, direction).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(turn = id, error = %e, "translation failed");
                self.log.resolve(id, recognized, None).await;
                return;
            }
        };

        let target = (!translated.is_empty()).then_some(translated);
        let has_target = target.is_some();
        self.log.resolve(id, recognized, target).await;

        if has_target {
            self.auto_synthesize(id).await;
        }
    }

    /// Synthesize a freshly translated turn and hand the clip to playback
    async fn auto_synthesize(&self, id: TurnId) {
        let Some(turn) = self.log.get(id).await else {
            return;
        };
        let Some(text) = turn.target_text else {
            return;
        };

        // The audio slot guards against duplicate concurrent synthesis
        if !self.log.begin_synthesis(id).await {
            return;
        }

        match self.synthesize_clip(&text, &turn.voice_id).await {
            Ok(audio) => {
                self.log.complete_synthesis(id, audio.clone()).await;
                self.send_playback(PlaybackCommand::Autoplay { turn_id: id, audio })
                    .await;
            }
            Err(e) => {
                tracing::warn!(turn = id, error = %e, "synthesis failed");
                self.log.fail_synthesis(id, e.to_string()).await;
            }
        }
    }

    async fn synthesize_clip(&self, text: &str, voice_id: &str) -> Result<Bytes> {
        let voice = (!voice_id.is_empty()).then_some(voice_id);
        let stream = self.synthesizer.synthesize(text, voice).await?;
        collect_audio(stream).await
    }

    /// Playback is best-effort; a closed channel (headless mode) is fine
    async fn send_playback(&self, command: PlaybackCommand) {
        if self.playback.send(command).await.is_err() {
            tracing::debug!("playback channel closed, dropping clip");
        }
    }
}
