//! Recognition controller — capture lifecycle and transcript accumulation.
//!
//! The `started` flag tracks user intent only; button state follows the
//! engine's own start/end callbacks, so a start that never takes leaves
//! the UI untouched. Results arrive in batches that span the whole
//! session; processing resumes at the batch's resume index.

use std::sync::Arc;

use tracing::{debug, warn};

use parla_core::highlight;
use parla_core::locale::KeywordTable;
use parla_core::types::{RecognitionStatus, ResultBatch};

use crate::capability::{RecognitionCapability, RecognitionEvent};
use crate::presenter::Presenter;

pub struct RecognitionController {
    capability: Arc<dyn RecognitionCapability>,
    presenter: Arc<dyn Presenter>,
    keywords: KeywordTable,
    /// User intent, not engine state.
    started: bool,
    /// Finalized markup. Only grows within a session.
    accumulated: String,
    /// Provisional markup tail. Rebuilt from scratch on every batch.
    interim: String,
}

impl RecognitionController {
    pub fn new(
        capability: Arc<dyn RecognitionCapability>,
        presenter: Arc<dyn Presenter>,
        keywords: KeywordTable,
    ) -> Self {
        Self {
            capability,
            presenter,
            keywords,
            started: false,
            accumulated: String::new(),
            interim: String::new(),
        }
    }

    /// The capture toggle. Flips intent and asks the engine to follow.
    pub fn toggle(&mut self) {
        if self.started {
            debug!("capture stop requested");
            self.capability.stop();
            self.started = false;
        } else {
            debug!("capture start requested");
            self.capability.start();
            self.started = true;
        }
    }

    /// Feed one engine event through the state machine.
    pub fn handle_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Started => {
                debug!("capture started");
                self.presenter.set_capture_button("Stop", true);
            }
            RecognitionEvent::Ended => {
                debug!("capture ended");
                self.presenter.set_capture_button("Start", false);
            }
            RecognitionEvent::SpeechEnded => {
                debug!("speech ended, stopping capture");
                self.capability.stop();
            }
            RecognitionEvent::Error(code) => {
                warn!(code = %code, "recognition error, stopping session");
                self.capability.stop();
                self.started = false;
                self.presenter
                    .alert(&format!("Error occurred in recognition: {code}"));
            }
            RecognitionEvent::Result(batch) => self.process_batch(batch),
        }
    }

    /// One result window: finalized entries extend the accumulated markup,
    /// provisional entries rebuild the interim tail.
    fn process_batch(&mut self, batch: ResultBatch) {
        self.interim.clear();

        for result in batch.results.iter().skip(batch.resume_index) {
            let Some(transcript) = result.top_transcript() else {
                warn!("result entry without alternatives, skipping");
                continue;
            };
            if result.is_final {
                highlight::append_final(&mut self.accumulated, transcript, &self.keywords);
            } else {
                self.interim.push_str(transcript);
            }
        }

        self.presenter
            .show_transcript(&highlight::render(&self.accumulated, &self.interim));
    }

    /// Status snapshot.
    pub fn status(&self) -> RecognitionStatus {
        RecognitionStatus {
            capturing: self.started,
            transcript: highlight::render(&self.accumulated, &self.interim),
        }
    }
}
