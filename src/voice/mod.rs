//! Local audio I/O
//!
//! Microphone capture and speaker playback for the CLI chat client. The
//! HTTP surface never touches this module; browser clients record on their
//! own side and post finished clips.

mod capture;
mod playback;

pub use capture::{samples_to_wav, AudioCapture, CaptureController, SAMPLE_RATE};
pub use playback::AudioPlayback;
