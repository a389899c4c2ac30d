//! Console assembly — both controllers wired to their engines.
//!
//! Builds the page presenter, runs the one-time locale setup, constructs
//! the controllers, and spawns one pump task per engine event channel.
//! The two event streams stay independent; nothing orders one against the
//! other. Controllers live behind std mutexes and locks are never held
//! across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::info;

use parla_core::locale;

use crate::capability::{
    RecognitionCapability, RecognitionEvent, SynthesisCapability, SynthesisEvent,
};
use crate::presenter::{PageView, Presenter};
use crate::recognition::RecognitionController;
use crate::synthesis::SynthesisController;

/// A fully wired speech console. The HTTP API holds one behind an `Arc`.
pub struct SpeechConsole {
    synthesis: Mutex<SynthesisController>,
    recognition: Mutex<RecognitionController>,
    presenter: Arc<PageView>,
    /// The synthesis text field. Voice selection re-reads it.
    input_text: Mutex<String>,
}

impl SpeechConsole {
    /// Wire the console and spawn its event pumps. Requires a running
    /// tokio runtime.
    pub fn new(
        language: &str,
        synthesis: Arc<dyn SynthesisCapability>,
        synthesis_events: mpsc::UnboundedReceiver<SynthesisEvent>,
        recognition: Arc<dyn RecognitionCapability>,
        recognition_events: mpsc::UnboundedReceiver<RecognitionEvent>,
    ) -> Arc<Self> {
        let presenter = Arc::new(PageView::default());
        let bundle = locale::select_bundle(language);
        presenter.set_copy(
            bundle.synthesis_copy,
            bundle.recognition_copy,
            &bundle.language_line(language),
        );
        info!(language, "console locale configured");

        let mut synthesis_ctrl = SynthesisController::new(synthesis, presenter.clone(), language);
        // The catalog may already be populated; engines that load late
        // signal VoicesChanged and trigger another refresh.
        synthesis_ctrl.refresh_voices();

        let recognition_ctrl =
            RecognitionController::new(recognition, presenter.clone(), bundle.keyword_table());

        let console = Arc::new(Self {
            synthesis: Mutex::new(synthesis_ctrl),
            recognition: Mutex::new(recognition_ctrl),
            presenter,
            input_text: Mutex::new(String::new()),
        });

        console
            .clone()
            .spawn_pumps(synthesis_events, recognition_events);
        console
    }

    fn spawn_pumps(
        self: Arc<Self>,
        mut synthesis_events: mpsc::UnboundedReceiver<SynthesisEvent>,
        mut recognition_events: mpsc::UnboundedReceiver<RecognitionEvent>,
    ) {
        let console = self.clone();
        tokio::spawn(async move {
            while let Some(event) = synthesis_events.recv().await {
                console.synthesis().handle_event(event);
            }
        });

        let console = self;
        tokio::spawn(async move {
            while let Some(event) = recognition_events.recv().await {
                console.recognition().handle_event(event);
            }
        });
    }

    /// Lock the synthesis controller.
    pub fn synthesis(&self) -> MutexGuard<'_, SynthesisController> {
        self.synthesis.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lock the recognition controller.
    pub fn recognition(&self) -> MutexGuard<'_, RecognitionController> {
        self.recognition.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The page state source.
    pub fn page(&self) -> &PageView {
        &self.presenter
    }

    /// Replace the synthesis text field.
    pub fn set_input_text(&self, text: &str) {
        *self.input_text.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
    }

    /// Current synthesis text field contents.
    pub fn input_text(&self) -> String {
        self.input_text
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parla_core::types::{RecognitionResult, ResultBatch, Voice};

    struct StaticSynth {
        catalog: Vec<Voice>,
    }

    impl SynthesisCapability for StaticSynth {
        fn voices(&self) -> Vec<Voice> {
            self.catalog.clone()
        }

        fn speak(&self, _: &str, _: &Voice) {}
        fn cancel(&self) {}

        fn is_speaking(&self) -> bool {
            false
        }
    }

    struct NoopRecognizer;

    impl RecognitionCapability for NoopRecognizer {
        fn start(&self) {}
        fn stop(&self) {}
    }

    fn russian_console() -> (
        Arc<SpeechConsole>,
        mpsc::UnboundedSender<SynthesisEvent>,
        mpsc::UnboundedSender<RecognitionEvent>,
    ) {
        let (syn_tx, syn_rx) = mpsc::unbounded_channel();
        let (rec_tx, rec_rx) = mpsc::unbounded_channel();
        let synth = StaticSynth {
            catalog: vec![Voice {
                name: "r_one".into(),
                locale: "ru-RU".into(),
            }],
        };
        let console = SpeechConsole::new(
            "ru-RU",
            Arc::new(synth),
            syn_rx,
            Arc::new(NoopRecognizer),
            rec_rx,
        );
        (console, syn_tx, rec_tx)
    }

    // Current-thread runtime: spawned pumps only run when we yield.
    async fn drain_pumps() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn locale_setup_runs_once_at_construction() {
        let (console, _syn_tx, _rec_tx) = russian_console();
        let page = console.page().snapshot();
        assert!(page.synthesis_copy.starts_with("Синтез речи"));
        assert!(page.recognition_copy.starts_with("Распознавание речи"));
        assert_eq!(page.language_line, "Язык распознавания: ru-RU");
        // Initial catalog refresh happened before any engine event
        assert_eq!(page.voice_options, vec!["r_one (ru-RU)".to_string()]);
        assert_eq!(page.selected_voice, Some(0));
    }

    #[tokio::test]
    async fn pumps_feed_both_controllers() {
        let (console, syn_tx, rec_tx) = russian_console();

        rec_tx.send(RecognitionEvent::Started).unwrap();
        rec_tx
            .send(RecognitionEvent::Result(ResultBatch {
                resume_index: 0,
                results: vec![RecognitionResult::finalized("красный")],
            }))
            .unwrap();
        syn_tx.send(SynthesisEvent::VoicesChanged).unwrap();
        drain_pumps().await;

        let page = console.page().snapshot();
        assert_eq!(page.capture_label, "Stop");
        assert!(page.capture_active);
        assert!(page.transcript.contains("background-color: red"));
        assert_eq!(page.selected_voice, Some(0));
    }

    #[tokio::test]
    async fn input_text_round_trips() {
        let (console, _syn_tx, _rec_tx) = russian_console();
        assert_eq!(console.input_text(), "");
        console.set_input_text("привет мир");
        assert_eq!(console.input_text(), "привет мир");
    }
}
