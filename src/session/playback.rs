//! Playback controller
//!
//! Tracks exactly one "current" clip, autoplays newly synthesized audio at
//! most once per arrival, and replays past turns on demand. The actual
//! speaker output sits behind [`AudioSink`] so the controller runs in tests
//! without audio hardware.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};

use super::TurnId;
use crate::Result;

/// Destination for decoded playback
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one complete clip, returning when playback finishes
    ///
    /// # Errors
    ///
    /// Returns error if the device rejects the clip
    async fn play(&self, audio: Bytes) -> Result<()>;
}

/// A playback request addressed to the controller
#[derive(Debug)]
pub enum PlaybackCommand {
    /// Audio that arrived from auto-triggered synthesis; plays only while
    /// the autoplay flag is armed
    Autoplay {
        /// Turn the clip belongs to
        turn_id: TurnId,
        /// Complete synthesized clip
        audio: Bytes,
    },
    /// User-initiated playback; always plays
    Play {
        /// Turn the clip belongs to
        turn_id: TurnId,
        /// Complete synthesized clip
        audio: Bytes,
    },
}

#[derive(Debug)]
struct ControllerState {
    current: Option<TurnId>,
    may_autoplay: bool,
}

/// Serializes playback and owns the autoplay flag
pub struct PlaybackController {
    sink: Arc<dyn AudioSink>,
    state: Mutex<ControllerState>,
}

impl PlaybackController {
    /// Create a controller with the autoplay flag armed
    #[must_use]
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(ControllerState {
                current: None,
                may_autoplay: true,
            }),
        }
    }

    /// The turn whose audio is currently loaded, if any
    pub async fn current(&self) -> Option<TurnId> {
        self.state.lock().await.current
    }

    /// Process one playback command
    ///
    /// # Errors
    ///
    /// Returns error if the sink fails
    pub async fn handle(&self, command: PlaybackCommand) -> Result<()> {
        match command {
            PlaybackCommand::Autoplay { turn_id, audio } => {
                let armed = {
                    let mut state = self.state.lock().await;
                    state.current = Some(turn_id);
                    // Disarm for the duration of this clip; a clip autoplays
                    // at most once
                    std::mem::take(&mut state.may_autoplay)
                };

                if armed {
                    tracing::debug!(turn = turn_id, "autoplaying synthesized clip");
                    self.sink.play(audio).await?;
                    self.state.lock().await.may_autoplay = true;
                } else {
                    tracing::debug!(turn = turn_id, "autoplay suppressed, clip loaded");
                }
            }
            PlaybackCommand::Play { turn_id, audio } => {
                {
                    let mut state = self.state.lock().await;
                    state.current = Some(turn_id);
                    state.may_autoplay = false;
                }
                tracing::debug!(turn = turn_id, "playing clip");
                self.sink.play(audio).await?;
                self.state.lock().await.may_autoplay = true;
            }
        }
        Ok(())
    }

    /// Drain commands until the channel closes.
    ///
    /// Sink failures are logged, not propagated; a broken speaker must not
    /// take down the session.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<PlaybackCommand>) {
        while let Some(command) = rx.recv().await {
            if let Err(e) = self.handle(command).await {
                tracing::warn!(error = %e, "playback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        plays: AtomicUsize,
    }

    #[async_trait]
    impl AudioSink for CountingSink {
        async fn play(&self, _audio: Bytes) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn controller() -> (Arc<CountingSink>, PlaybackController) {
        let sink = Arc::new(CountingSink::default());
        let controller = PlaybackController::new(sink.clone());
        (sink, controller)
    }

    #[tokio::test]
    async fn autoplay_plays_exactly_once_and_rearms() {
        let (sink, controller) = controller();

        controller
            .handle(PlaybackCommand::Autoplay {
                turn_id: 1,
                audio: Bytes::from_static(b"a"),
            })
            .await
            .unwrap();
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);
        assert_eq!(controller.current().await, Some(1));

        // Completion re-armed the flag, so the next auto clip plays too
        controller
            .handle(PlaybackCommand::Autoplay {
                turn_id: 2,
                audio: Bytes::from_static(b"b"),
            })
            .await
            .unwrap();
        assert_eq!(sink.plays.load(Ordering::SeqCst), 2);
        assert_eq!(controller.current().await, Some(2));
    }

    #[tokio::test]
    async fn manual_play_always_plays() {
        let (sink, controller) = controller();

        controller
            .handle(PlaybackCommand::Play {
                turn_id: 7,
                audio: Bytes::from_static(b"x"),
            })
            .await
            .unwrap();
        controller
            .handle(PlaybackCommand::Play {
                turn_id: 7,
                audio: Bytes::from_static(b"x"),
            })
            .await
            .unwrap();

        assert_eq!(sink.plays.load(Ordering::SeqCst), 2);
        assert_eq!(controller.current().await, Some(7));
    }

    #[tokio::test]
    async fn run_drains_channel_until_closed() {
        let (sink, controller) = controller();
        let controller = Arc::new(controller);
        let (tx, rx) = mpsc::channel(4);

        let task = tokio::spawn(controller.clone().run(rx));

        tx.send(PlaybackCommand::Autoplay {
            turn_id: 1,
            audio: Bytes::from_static(b"a"),
        })
        .await
        .unwrap();
        tx.send(PlaybackCommand::Play {
            turn_id: 1,
            audio: Bytes::from_static(b"a"),
        })
        .await
        .unwrap();
        drop(tx);

        task.await.unwrap();
        assert_eq!(sink.plays.load(Ordering::SeqCst), 2);
    }
}
