//! Audio capture from microphone

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use tokio::sync::mpsc;

use crate::relay::{AudioClip, AudioEncoding};
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// Captures audio from the default input device
pub struct AudioCapture {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if no usable input device exists
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::DeviceUnavailable("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(map_configs_error)?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio.
    ///
    /// A no-op when already capturing; only one recording session can be
    /// active at a time.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` or `PermissionDenied` if the platform
    /// refuses the device, `Audio` for other stream failures
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::DeviceUnavailable("no input device".to_string()))?;

        let config = self.config.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(map_build_error)?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing and release the device stream
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Get captured audio buffer and clear it
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Get captured audio buffer without clearing
    #[must_use]
    pub fn peek_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Clear the audio buffer
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

fn map_build_error(e: cpal::BuildStreamError) -> Error {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            Error::DeviceUnavailable("input device disappeared".to_string())
        }
        other => {
            let message = other.to_string();
            if message.to_ascii_lowercase().contains("permission") {
                Error::PermissionDenied(message)
            } else {
                Error::Audio(message)
            }
        }
    }
}

fn map_configs_error(e: cpal::SupportedStreamConfigsError) -> Error {
    match e {
        cpal::SupportedStreamConfigsError::DeviceNotAvailable => {
            Error::DeviceUnavailable("input device disappeared".to_string())
        }
        other => Error::Audio(other.to_string()),
    }
}

/// Owns one recording session at a time and turns each stop into exactly
/// one captured clip on the event channel.
///
/// The device stream is released on `stop` and again on drop, so an error
/// mid-session never leaves the microphone held.
pub struct CaptureController {
    capture: AudioCapture,
    events: mpsc::Sender<AudioClip>,
}

impl CaptureController {
    /// Create a controller emitting clips on `events`
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if no input device exists
    pub fn new(events: mpsc::Sender<AudioClip>) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            events,
        })
    }

    /// Begin a recording session; a no-op while one is already active
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable`, `PermissionDenied`, or `Audio` per
    /// [`AudioCapture::start`]
    pub fn start(&mut self) -> Result<()> {
        self.capture.start()
    }

    /// Whether a recording session is active
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.capture.is_capturing()
    }

    /// Finalize the session: release the device, encode the buffered
    /// samples as WAV, and emit exactly one clip event.
    ///
    /// A stop without an active session emits nothing.
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails or the event channel is closed
    pub async fn stop(&mut self) -> Result<()> {
        if !self.capture.is_capturing() {
            return Ok(());
        }

        self.capture.stop();
        let samples = self.capture.take_buffer();
        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let clip = AudioClip::new(wav, AudioEncoding::Linear16);

        tracing::debug!(bytes = clip.bytes.len(), "captured clip finalized");
        self.events
            .send(clip)
            .await
            .map_err(|_| Error::Audio("capture event channel closed".to_string()))
    }
}

/// Convert f32 samples to WAV bytes for the recognition relay
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
