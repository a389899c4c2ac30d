//! Shared types for the parla speech console.
//!
//! These types are used across parla-lib, parla-cli, and the HTTP API.
//! Keeping them in parla-core means consumers can depend on types without
//! pulling in tokio, rodio, or other heavy deps.

use serde::{Deserialize, Serialize};

// ─── Synthesis types ───────────────────────────────────────────────────────

/// A synthetic voice offered by the synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub locale: String,
}

impl Voice {
    /// Selector entry text: `"Name (locale)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.locale)
    }
}

/// Observable synthesis state. One utterance at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakState {
    Idle,
    Speaking,
}

/// Synthesis status snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisStatus {
    pub state: SpeakState,
    /// Name of the currently selected voice, if any.
    pub voice: Option<String>,
    pub voice_count: usize,
    /// What the engine itself reports, independent of our state flag.
    pub engine_speaking: bool,
}

// ─── Recognition types ─────────────────────────────────────────────────────

/// Recognition session configuration, fixed for the lifetime of the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionConfig {
    /// Continuous capture with interim results in the given language.
    pub fn continuous(language: &str) -> Self {
        Self {
            language: language.to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 5,
        }
    }
}

/// One transcript hypothesis for a recognized segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
}

/// One recognized segment, finalized or provisional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    /// Ranked hypotheses, best first.
    pub alternatives: Vec<Alternative>,
    pub is_final: bool,
}

impl RecognitionResult {
    /// Build a finalized segment with a single hypothesis.
    pub fn finalized(transcript: &str) -> Self {
        Self {
            alternatives: vec![Alternative {
                transcript: transcript.to_string(),
            }],
            is_final: true,
        }
    }

    /// Build a provisional segment with a single hypothesis.
    pub fn provisional(transcript: &str) -> Self {
        Self {
            alternatives: vec![Alternative {
                transcript: transcript.to_string(),
            }],
            is_final: false,
        }
    }

    /// The top-ranked transcript, if the engine supplied any hypothesis.
    pub fn top_transcript(&self) -> Option<&str> {
        self.alternatives.first().map(|a| a.transcript.as_str())
    }
}

/// One delivery from the recognition engine.
///
/// `results` spans the whole session so far; entries before `resume_index`
/// were already delivered in an earlier batch and must not be reprocessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBatch {
    pub resume_index: usize,
    pub results: Vec<RecognitionResult>,
}

/// Recognition status snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionStatus {
    /// Whether a capture session is intended to be running.
    pub capturing: bool,
    /// Current rendered transcript markup.
    pub transcript: String,
}
