//! HTTP API for the speech console.
//!
//! Runs on port 2005 by default. CORS-permissive so a local page or script
//! can drive the console from another origin.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use parla_core::types::{RecognitionStatus, SpeakState, SynthesisStatus, Voice};

use crate::console::SpeechConsole;
use crate::presenter::PageState;

/// Build the axum router with a shared [`SpeechConsole`].
pub fn router(console: Arc<SpeechConsole>) -> Router {
    Router::new()
        .route("/speak", post(speak))
        .route("/voice", post(voice))
        .route("/voices", get(voices))
        .route("/toggle", post(toggle))
        .route("/transcript", get(transcript))
        .route("/status", get(status))
        .route("/page", get(page))
        .layer(CorsLayer::permissive())
        .with_state(console)
}

#[derive(serde::Deserialize)]
struct SpeakRequest {
    text: String,
}

#[derive(serde::Serialize)]
struct SpeakResponse {
    ok: bool,
    speaking: bool,
}

async fn speak(
    State(console): State<Arc<SpeechConsole>>,
    Json(req): Json<SpeakRequest>,
) -> Json<SpeakResponse> {
    console.set_input_text(&req.text);
    let mut synthesis = console.synthesis();
    synthesis.submit(&req.text);
    Json(SpeakResponse {
        ok: true,
        speaking: synthesis.status().state == SpeakState::Speaking,
    })
}

#[derive(serde::Deserialize)]
struct VoiceRequest {
    index: usize,
}

#[derive(serde::Serialize)]
struct VoiceResponse {
    ok: bool,
    selected: Option<String>,
}

async fn voice(
    State(console): State<Arc<SpeechConsole>>,
    Json(req): Json<VoiceRequest>,
) -> Json<VoiceResponse> {
    let text = console.input_text();
    let mut synthesis = console.synthesis();
    synthesis.select_voice(req.index, &text);
    Json(VoiceResponse {
        ok: true,
        selected: synthesis.status().voice,
    })
}

async fn voices(State(console): State<Arc<SpeechConsole>>) -> Json<Vec<Voice>> {
    Json(console.synthesis().voices().to_vec())
}

#[derive(serde::Serialize)]
struct ToggleResponse {
    ok: bool,
    capturing: bool,
}

async fn toggle(State(console): State<Arc<SpeechConsole>>) -> Json<ToggleResponse> {
    let mut recognition = console.recognition();
    recognition.toggle();
    Json(ToggleResponse {
        ok: true,
        capturing: recognition.status().capturing,
    })
}

#[derive(serde::Serialize)]
struct TranscriptResponse {
    markup: String,
}

async fn transcript(State(console): State<Arc<SpeechConsole>>) -> Json<TranscriptResponse> {
    let markup = console.recognition().status().transcript;
    Json(TranscriptResponse { markup })
}

#[derive(serde::Serialize)]
struct StatusResponse {
    synthesis: SynthesisStatus,
    recognition: RecognitionStatus,
}

async fn status(State(console): State<Arc<SpeechConsole>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        synthesis: console.synthesis().status(),
        recognition: console.recognition().status(),
    })
}

async fn page(State(console): State<Arc<SpeechConsole>>) -> Json<PageState> {
    Json(console.page().snapshot())
}
