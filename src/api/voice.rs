//! Voice API endpoints: transcription+translation and speech synthesis

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::config::Voice;
use crate::lang::Direction;
use crate::relay::{AudioClip, AudioEncoding};
use crate::Error;

/// Build the voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/synthesize", post(synthesize))
        .route("/voices", get(voices))
        .with_state(state)
}

/// Transcription response
///
/// `transcript` is empty when no recognizable speech was found; callers
/// must treat that as "could not transcribe", not as a failure.
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// Transcribe a clip and translate the recognized text
///
/// Multipart form body: `audio` (binary clip, required) and `direction`
/// (`"es-en"` or `"en-es"`, optional, default forward).
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<AudioClip> = None;
    let mut direction = Direction::Forward;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError(Error::InvalidInput(format!("malformed multipart body: {e}"))))?
    {
        match field.name() {
            Some("audio") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError(Error::InvalidInput(format!("unreadable audio: {e}"))))?;
                audio = Some(AudioClip::new(bytes, AudioEncoding::WebmOpus));
            }
            Some("direction") => {
                let token = field.text().await.unwrap_or_default();
                direction = Direction::from_token(&token);
            }
            _ => {}
        }
    }

    let clip = audio
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError(Error::InvalidInput("no audio file provided".to_string())))?;

    let transcriber = state.transcriber.as_ref().ok_or_else(|| {
        ApiError(Error::MissingCredentials(
            "speech recognition not configured".to_string(),
        ))
    })?;

    let transcript = transcriber.transcribe(&clip, direction).await?;

    // No recognizable speech: a valid, empty result
    if transcript.is_empty() {
        return Ok(Json(TranscribeResponse {
            transcript,
            translation: None,
        }));
    }

    let translator = state.translator.as_ref().ok_or_else(|| {
        ApiError(Error::MissingCredentials(
            "translation not configured".to_string(),
        ))
    })?;

    let translation = translator.translate(&transcript, direction).await?;

    Ok(Json(TranscribeResponse {
        transcript,
        translation: Some(translation),
    }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    #[serde(rename = "voiceId")]
    pub voice_id: Option<String>,
}

/// Synthesize text to speech, streaming MP3 audio back as it arrives
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError(Error::InvalidInput(
            "missing or invalid 'text' field".to_string(),
        )));
    }

    let synthesizer = state.synthesizer.as_ref().ok_or_else(|| {
        ApiError(Error::MissingCredentials(
            "speech synthesis not configured".to_string(),
        ))
    })?;

    let stream = synthesizer
        .synthesize(&request.text, request.voice_id.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// List the selectable synthesis voices
async fn voices(State(state): State<Arc<ApiState>>) -> Json<Vec<Voice>> {
    Json(state.voices.clone())
}

/// Error wrapper mapping the crate taxonomy onto HTTP statuses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::TranscriptionUnavailable(_)
            | Error::TranslationUnavailable(_)
            | Error::SynthesisUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
