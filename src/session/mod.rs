//! Conversation state: the ordered, id-keyed log of exchange turns
//!
//! Turns are append-only. `id`, `speaker`, `direction`, and `voice_id` are
//! fixed at creation; the text and audio fields only ever move forward
//! through the turn's own lifecycle (`Pending -> Resolved`,
//! `None -> Loading -> {Ready|Failed}`). Every mutation is addressed by
//! [`TurnId`], never by position, so concurrent in-flight turns cannot
//! clobber each other.

pub mod orchestrator;
pub mod playback;

pub use orchestrator::Orchestrator;
pub use playback::{AudioSink, PlaybackCommand, PlaybackController};

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::lang::Direction;

/// Monotonic turn identifier; insertion order is display and playback order
pub type TurnId = u64;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// Gateway-generated turn (session greeting)
    System,
    /// A spoken user utterance
    User,
}

/// Relay-chain lifecycle of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Transcription/translation still in flight
    Pending,
    /// Chain finished, successfully or not
    Resolved,
}

/// Synthesis lifecycle of a turn, independent of [`TurnState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// No synthesis attempted
    None,
    /// Synthesis request in flight
    Loading,
    /// Synthesized audio cached on the turn
    Ready,
    /// Synthesis failed; a later attempt may replace it
    Failed,
}

/// One exchange in the conversation
#[derive(Debug, Clone)]
pub struct Turn {
    /// Sequence position, unique within the session
    pub id: TurnId,
    /// Originator
    pub speaker: Speaker,
    /// Language direction fixed at creation
    pub direction: Direction,
    /// Synthesis voice selected at creation; turns are not re-voiced
    pub voice_id: String,
    /// Recognized text, or a localized placeholder while pending
    pub source_text: String,
    /// Translated text, present once translation completes
    pub target_text: Option<String>,
    /// Relay-chain state
    pub state: TurnState,
    /// Synthesized audio, at most one per turn
    pub audio: Option<Bytes>,
    /// Synthesis state
    pub audio_status: AudioStatus,
    /// Present only when `audio_status` is `Failed`
    pub audio_error: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Whether this turn has synthesized audio ready for playback
    #[must_use]
    pub const fn audio_ready(&self) -> bool {
        matches!(self.audio_status, AudioStatus::Ready)
    }
}

#[derive(Debug, Default)]
struct LogInner {
    turns: BTreeMap<TurnId, Turn>,
    next_id: TurnId,
}

impl LogInner {
    fn push(&mut self, mut turn: Turn) -> TurnId {
        let id = self.next_id;
        self.next_id += 1;
        turn.id = id;
        self.turns.insert(id, turn);
        id
    }
}

/// Id-keyed arena of turns with safe concurrent mutation
///
/// Multiple relay chains may complete out of order; each addresses its own
/// turn through this log.
#[derive(Debug)]
pub struct TurnLog {
    inner: RwLock<LogInner>,
}

impl TurnLog {
    /// Create a log seeded with the greeting turn for `direction`
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        let mut inner = LogInner::default();
        inner.push(greeting_turn(direction));
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Reset to a single fresh system greeting turn for `direction`.
    ///
    /// This is the only way turns are ever destroyed. Ids stay monotonic
    /// across the reset: a relay chain still in flight for a destroyed turn
    /// holds an id no future turn will ever receive, so its late completion
    /// finds nothing to mutate.
    pub async fn reset(&self, direction: Direction) {
        let mut inner = self.inner.write().await;
        inner.turns.clear();
        inner.push(greeting_turn(direction));
        tracing::debug!(direction = %direction, "conversation reset");
    }

    /// Append a new pending user turn, returning its id
    pub async fn append_pending(&self, direction: Direction, voice_id: String) -> TurnId {
        let mut inner = self.inner.write().await;
        let id = inner.push(Turn {
            id: 0,
            speaker: Speaker::User,
            direction,
            voice_id,
            source_text: direction.transcribing_placeholder().to_string(),
            target_text: None,
            state: TurnState::Pending,
            audio: None,
            audio_status: AudioStatus::None,
            audio_error: None,
            created_at: Utc::now(),
        });
        tracing::debug!(turn = id, direction = %direction, "appended pending turn");
        id
    }

    /// Resolve a pending turn with its final text.
    ///
    /// Returns `false` if the turn does not exist or already resolved;
    /// lifecycle transitions never move backwards.
    pub async fn resolve(
        &self,
        id: TurnId,
        source_text: String,
        target_text: Option<String>,
    ) -> bool {
        let mut inner = self.inner.write().await;
        let Some(turn) = inner.turns.get_mut(&id) else {
            return false;
        };
        if turn.state != TurnState::Pending {
            tracing::warn!(turn = id, "ignoring resolve of non-pending turn");
            return false;
        }
        turn.source_text = source_text;
        turn.target_text = target_text;
        turn.state = TurnState::Resolved;
        tracing::debug!(turn = id, translated = turn.target_text.is_some(), "turn resolved");
        true
    }

    /// Claim the synthesis slot for a turn.
    ///
    /// Returns `true` and transitions `None`/`Failed -> Loading` when the
    /// slot is free. Returns `false` while a request is already in flight or
    /// audio is already cached, so synthesis is serialized per turn and never
    /// reissued for a ready turn.
    pub async fn begin_synthesis(&self, id: TurnId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(turn) = inner.turns.get_mut(&id) else {
            return false;
        };
        match turn.audio_status {
            AudioStatus::None | AudioStatus::Failed => {
                turn.audio_status = AudioStatus::Loading;
                turn.audio_error = None;
                tracing::debug!(turn = id, "synthesis started");
                true
            }
            AudioStatus::Loading | AudioStatus::Ready => false,
        }
    }

    /// Store synthesized audio, replacing any previous handle
    pub async fn complete_synthesis(&self, id: TurnId, audio: Bytes) -> bool {
        let mut inner = self.inner.write().await;
        let Some(turn) = inner.turns.get_mut(&id) else {
            return false;
        };
        if turn.audio_status != AudioStatus::Loading {
            tracing::warn!(turn = id, "ignoring synthesis result for idle turn");
            return false;
        }
        turn.audio = Some(audio);
        turn.audio_status = AudioStatus::Ready;
        tracing::debug!(turn = id, "synthesis ready");
        true
    }

    /// Record a synthesis failure with a human-readable message
    pub async fn fail_synthesis(&self, id: TurnId, message: String) -> bool {
        let mut inner = self.inner.write().await;
        let Some(turn) = inner.turns.get_mut(&id) else {
            return false;
        };
        if turn.audio_status != AudioStatus::Loading {
            return false;
        }
        turn.audio_status = AudioStatus::Failed;
        turn.audio_error = Some(message);
        tracing::debug!(turn = id, "synthesis failed");
        true
    }

    /// Snapshot one turn
    pub async fn get(&self, id: TurnId) -> Option<Turn> {
        self.inner.read().await.turns.get(&id).cloned()
    }

    /// Snapshot all turns in insertion order
    pub async fn turns(&self) -> Vec<Turn> {
        self.inner.read().await.turns.values().cloned().collect()
    }

    /// Number of turns in the log
    pub async fn len(&self) -> usize {
        self.inner.read().await.turns.len()
    }

    /// Whether the log holds no turns
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.turns.is_empty()
    }
}

fn greeting_turn(direction: Direction) -> Turn {
    Turn {
        id: 0,
        speaker: Speaker::System,
        direction,
        voice_id: String::new(),
        source_text: direction.greeting().to_string(),
        target_text: None,
        state: TurnState::Resolved,
        audio: None,
        audio_status: AudioStatus::None,
        audio_error: None,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_log_holds_greeting_turn() {
        let log = TurnLog::new(Direction::Forward);
        let turns = log.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].speaker, Speaker::System);
        assert_eq!(turns[0].source_text, Direction::Forward.greeting());
        assert_eq!(turns[0].state, TurnState::Resolved);
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_ordered() {
        let log = TurnLog::new(Direction::Forward);
        let a = log.append_pending(Direction::Forward, "v".to_string()).await;
        let b = log.append_pending(Direction::Forward, "v".to_string()).await;
        assert!(b > a);

        let ids: Vec<_> = log.turns().await.iter().map(|t| t.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn resolve_is_one_way() {
        let log = TurnLog::new(Direction::Forward);
        let id = log.append_pending(Direction::Forward, "v".to_string()).await;

        assert!(log.resolve(id, "Hola".to_string(), Some("Hello".to_string())).await);
        // A second resolve must not overwrite the first
        assert!(!log.resolve(id, "clobber".to_string(), None).await);

        let turn = log.get(id).await.unwrap();
        assert_eq!(turn.source_text, "Hola");
        assert_eq!(turn.target_text.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn synthesis_slot_is_serialized_per_turn() {
        let log = TurnLog::new(Direction::Forward);
        let id = log.append_pending(Direction::Forward, "v".to_string()).await;
        log.resolve(id, "Hola".to_string(), Some("Hello".to_string())).await;

        assert!(log.begin_synthesis(id).await);
        // Second claim while loading is refused
        assert!(!log.begin_synthesis(id).await);

        assert!(log.complete_synthesis(id, Bytes::from_static(b"mp3")).await);
        // Ready turns are never re-synthesized
        assert!(!log.begin_synthesis(id).await);

        let turn = log.get(id).await.unwrap();
        assert!(turn.audio_ready());
        assert_eq!(turn.audio.as_deref(), Some(&b"mp3"[..]));
    }

    #[tokio::test]
    async fn failed_synthesis_can_be_retried_and_replaced() {
        let log = TurnLog::new(Direction::Forward);
        let id = log.append_pending(Direction::Forward, "v".to_string()).await;
        log.resolve(id, "Hola".to_string(), Some("Hello".to_string())).await;

        assert!(log.begin_synthesis(id).await);
        assert!(log.fail_synthesis(id, "provider down".to_string()).await);

        let turn = log.get(id).await.unwrap();
        assert_eq!(turn.audio_status, AudioStatus::Failed);
        assert!(turn.audio_error.is_some());

        // A retry claims the slot again and replaces, not appends
        assert!(log.begin_synthesis(id).await);
        assert!(log.complete_synthesis(id, Bytes::from_static(b"take2")).await);
        let turn = log.get(id).await.unwrap();
        assert_eq!(turn.audio.as_deref(), Some(&b"take2"[..]));
        assert!(turn.audio_error.is_none());
    }

    #[tokio::test]
    async fn synthesis_result_for_idle_turn_is_ignored() {
        let log = TurnLog::new(Direction::Forward);
        let id = log.append_pending(Direction::Forward, "v".to_string()).await;

        assert!(!log.complete_synthesis(id, Bytes::from_static(b"x")).await);
        assert!(!log.fail_synthesis(id, "late".to_string()).await);
        assert_eq!(log.get(id).await.unwrap().audio_status, AudioStatus::None);
    }

    #[tokio::test]
    async fn reset_destroys_turns_and_reseeds_greeting() {
        let log = TurnLog::new(Direction::Forward);
        log.append_pending(Direction::Forward, "v".to_string()).await;
        assert_eq!(log.len().await, 2);

        log.reset(Direction::Reverse).await;
        let turns = log.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].source_text, Direction::Reverse.greeting());
        assert_eq!(turns[0].speaker, Speaker::System);
    }

    #[tokio::test]
    async fn reset_never_recycles_ids_under_a_stale_chain() {
        let log = TurnLog::new(Direction::Forward);
        let stale = log.append_pending(Direction::Forward, "v".to_string()).await;

        // The session restarts while the stale turn's chain is still in flight
        log.reset(Direction::Forward).await;
        let fresh = log.append_pending(Direction::Forward, "v".to_string()).await;
        assert_ne!(stale, fresh);

        // The stale chain's late completion finds no turn to mutate
        assert!(!log.resolve(stale, "text from before the reset".to_string(), None).await);
        assert!(!log.begin_synthesis(stale).await);

        let turn = log.get(fresh).await.unwrap();
        assert_eq!(turn.source_text, Direction::Forward.transcribing_placeholder());
        assert_eq!(turn.state, TurnState::Pending);
    }

    #[tokio::test]
    async fn mutations_address_turns_by_id_not_position() {
        let log = TurnLog::new(Direction::Forward);
        let first = log.append_pending(Direction::Forward, "v".to_string()).await;
        let second = log.append_pending(Direction::Forward, "v".to_string()).await;

        // The later turn resolves first; the earlier one is untouched
        assert!(log.resolve(second, "dos".to_string(), None).await);
        assert_eq!(
            log.get(first).await.unwrap().source_text,
            Direction::Forward.transcribing_placeholder()
        );

        assert!(log.resolve(first, "uno".to_string(), None).await);
        assert_eq!(log.get(second).await.unwrap().source_text, "dos");
        assert_eq!(log.get(first).await.unwrap().source_text, "uno");
    }
}
