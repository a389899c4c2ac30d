//! Capability seams for the host speech engines.
//!
//! The controllers never talk to an engine directly. They issue
//! fire-and-forget requests through these traits and react to the events
//! the engine pushes back over its own channel. The two event streams are
//! independent; nothing orders one against the other. Production adapters
//! live in [`crate::kokoro`] and [`crate::sidecar`]; tests substitute
//! fakes.

use parla_core::types::{ResultBatch, Voice};

/// Events pushed by a synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// The voice catalog changed. May fire any number of times, including
    /// never on engines whose catalog is fixed before startup.
    VoicesChanged,
    /// The current utterance finished playing.
    Ended,
    /// The current utterance failed.
    Error(String),
}

/// Events pushed by a recognition engine. Within one session the engine
/// orders these itself: `Started` precedes results, `Ended` closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Capture actually began.
    Started,
    /// Capture terminated, whatever the reason.
    Ended,
    /// The engine detected prolonged silence.
    SpeechEnded,
    /// The session failed, carrying the engine's error code.
    Error(String),
    /// A window of provisional and finalized results.
    Result(ResultBatch),
}

/// A text-to-speech engine as the synthesis controller sees it.
///
/// All methods are fire-and-forget; outcomes arrive later as
/// [`SynthesisEvent`]s.
pub trait SynthesisCapability: Send + Sync {
    /// Current voice catalog in engine order. May be empty until the
    /// engine signals [`SynthesisEvent::VoicesChanged`].
    fn voices(&self) -> Vec<Voice>;

    /// Start rendering `text` with `voice`.
    fn speak(&self, text: &str, voice: &Voice);

    /// Interrupt any in-progress utterance.
    fn cancel(&self);

    /// Whether the engine reports an utterance in progress.
    fn is_speaking(&self) -> bool;
}

/// A continuous speech recognizer as the recognition controller sees it.
pub trait RecognitionCapability: Send + Sync {
    /// Ask the engine to begin capturing.
    fn start(&self);

    /// Ask the engine to stop. The matching [`RecognitionEvent::Ended`]
    /// arrives asynchronously; trailing events after this call are
    /// normal.
    fn stop(&self);
}
