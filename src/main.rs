use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use echolingo::api::{ApiServer, ApiState};
use echolingo::config::Config;
use echolingo::lang::Direction;
use echolingo::relay::{
    collect_audio, ElevenLabsSynthesizer, GoogleTranscriber, OpenRouterTranslator, Synthesizer,
};
use echolingo::session::{Orchestrator, PlaybackController, Speaker, TurnState};
use echolingo::voice::{AudioCapture, AudioPlayback, CaptureController};

/// Echolingo - voice-to-voice translation gateway
#[derive(Parser)]
#[command(name = "echolingo", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "ECHOLINGO_PORT", default_value = "8787")]
    port: u16,

    /// Directory of static web-client files to serve
    #[arg(long, env = "ECHOLINGO_STATIC_DIR")]
    static_dir: Option<std::path::PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive voice chat from the terminal (mic in, speaker out)
    Chat {
        /// Translation direction token ("es-en" or "en-es")
        #[arg(short, long, default_value = "es-en")]
        direction: String,

        /// Synthesis voice id (defaults to the catalog default)
        #[arg(long)]
        voice: Option<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test speech synthesis output
    TestSynth {
        /// Text to speak
        #[arg(default_value = "Hola, esto es una prueba de voz.")]
        text: String,

        /// Synthesis voice id
        #[arg(long)]
        voice: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,echolingo=info",
        1 => "info,echolingo=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Chat { direction, voice } => {
                chat(Direction::from_token(&direction), voice).await
            }
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestSynth { text, voice } => test_synth(&text, voice.as_deref()).await,
        };
    }

    let mut config = Config::from_env();
    config.port = cli.port;
    if cli.static_dir.is_some() {
        config.static_dir = cli.static_dir;
    }

    tracing::info!(port = config.port, "starting echolingo gateway");

    let state = Arc::new(ApiState::from_config(&config)?);
    let server = ApiServer::new(state, config.port, config.static_dir.clone());
    server.run().await?;

    Ok(())
}

/// Interactive voice chat: Enter toggles recording, `q` quits
#[allow(clippy::future_not_send)]
async fn chat(direction: Direction, voice: Option<String>) -> anyhow::Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let config = Config::from_env();
    let timeout = config.relay.timeout;

    let transcriber = Arc::new(GoogleTranscriber::new(
        config.keys.require_google_speech()?.to_string(),
        timeout,
    )?);
    let translator = Arc::new(OpenRouterTranslator::new(
        config.keys.require_openrouter()?.to_string(),
        timeout,
    )?);
    let synthesizer = Arc::new(ElevenLabsSynthesizer::new(
        config.keys.require_elevenlabs()?.to_string(),
        config.voice.clone(),
        timeout,
    )?);

    let sink = Arc::new(AudioPlayback::new()?);
    let playback = Arc::new(PlaybackController::new(sink));
    let (play_tx, play_rx) = mpsc::channel(8);
    tokio::spawn(Arc::clone(&playback).run(play_rx));

    let voice_id = config.voice.resolve(voice.as_deref());
    let orchestrator = Arc::new(Orchestrator::new(
        transcriber,
        translator,
        synthesizer,
        play_tx,
        direction,
        voice_id,
    ));

    let (clip_tx, clip_rx) = mpsc::channel(4);
    tokio::spawn(Arc::clone(&orchestrator).run(clip_rx));

    let mut capture = CaptureController::new(clip_tx)?;

    println!("{}", direction.greeting());
    println!(
        "Press Enter to start/stop recording, 'log' to show the conversation, \
         'switch' to flip the direction, 'q' to quit.\n"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "q" | "quit" => break,
            "log" => print_log(&orchestrator).await,
            "switch" => {
                // Session mode toggle: restarts the conversation
                if capture.is_recording() {
                    capture.stop().await?;
                }
                let flipped = orchestrator.direction().await.flipped();
                orchestrator.set_direction(flipped).await;
                println!("{}", flipped.greeting());
            }
            _ => {
                let direction = orchestrator.direction().await;
                if capture.is_recording() {
                    capture.stop().await?;
                    println!("({})", direction.transcribing_placeholder());
                } else {
                    capture.start()?;
                    println!(
                        "Recording ({})... press Enter to stop.",
                        direction.spoken_language()
                    );
                }
            }
        }
    }

    if capture.is_recording() {
        capture.stop().await?;
    }

    Ok(())
}

/// Print the conversation log
async fn print_log(orchestrator: &Orchestrator) {
    for turn in orchestrator.log().turns().await {
        let who = match turn.speaker {
            Speaker::System => "system",
            Speaker::User => "you",
        };
        let pending = if turn.state == TurnState::Pending {
            " (pending)"
        } else {
            ""
        };
        match &turn.target_text {
            Some(target) => println!("[{:>3}] {who}: {} -> {target}{pending}", turn.id, turn.source_text),
            None => println!("[{:>3}] {who}: {}{pending}", turn.id, turn.source_text),
        }
    }
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );

        capture.clear_buffer();
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 44_100_i32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    tokio::task::spawn_blocking(move || playback.play_samples_blocking(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Test speech synthesis end to end
async fn test_synth(text: &str, voice: Option<&str>) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"\n");

    let config = Config::from_env();
    let synthesizer = ElevenLabsSynthesizer::new(
        config.keys.require_elevenlabs()?.to_string(),
        config.voice.clone(),
        config.relay.timeout,
    )?;

    let stream = synthesizer.synthesize(text, voice).await?;
    let audio = collect_audio(stream).await?;
    println!("Got {} bytes of audio data", audio.len());

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    tokio::task::spawn_blocking(move || playback.play_mp3_blocking(&audio)).await??;

    println!("\n---");
    println!("If you heard the speech, synthesis is working!");

    Ok(())
}
