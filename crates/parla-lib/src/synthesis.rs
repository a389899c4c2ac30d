//! Synthesis controller — voice catalog, utterance toggle, engine events.
//!
//! A two-state machine (idle/speaking). Speak interrupts when speaking and
//! starts when idle; the engine's end and error callbacks both walk the
//! state back to idle, whichever fires.

use std::sync::Arc;

use tracing::{debug, error, warn};

use parla_core::types::{SpeakState, SynthesisStatus, Voice};

use crate::capability::{SynthesisCapability, SynthesisEvent};
use crate::presenter::Presenter;

pub struct SynthesisController {
    capability: Arc<dyn SynthesisCapability>,
    presenter: Arc<dyn Presenter>,
    /// Language tag that drives default voice selection.
    language: String,
    voices: Vec<Voice>,
    selected: Option<usize>,
    speaking: bool,
}

impl SynthesisController {
    pub fn new(
        capability: Arc<dyn SynthesisCapability>,
        presenter: Arc<dyn Presenter>,
        language: &str,
    ) -> Self {
        Self {
            capability,
            presenter,
            language: language.to_string(),
            voices: Vec::new(),
            selected: None,
            speaking: false,
        }
    }

    /// Rebuild the voice list from the engine catalog.
    ///
    /// Selection is the first voice whose locale equals the configured
    /// language, else the first voice, else nothing for an empty catalog.
    /// Safe to run any number of times; an unchanged catalog yields the
    /// same options and selection.
    pub fn refresh_voices(&mut self) {
        self.voices = self.capability.voices();

        let language_match = self.voices.iter().position(|v| v.locale == self.language);
        self.selected = if self.voices.is_empty() {
            None
        } else {
            Some(language_match.unwrap_or(0))
        };

        let options: Vec<String> = self.voices.iter().map(Voice::label).collect();
        debug!(
            count = options.len(),
            selected = ?self.selected,
            "voice catalog refreshed"
        );
        self.presenter.set_voice_options(&options, self.selected);
    }

    /// The play toggle. Speaking: interrupt, text ignored. Idle: start an
    /// utterance for non-empty text with the selected voice.
    pub fn speak(&mut self, text: &str) {
        if self.speaking {
            self.presenter.set_play_label("Play");
            self.capability.cancel();
            self.speaking = false;
            debug!("utterance cancelled");
        } else if !text.is_empty() {
            let Some(voice) = self.selected.and_then(|i| self.voices.get(i)).cloned() else {
                warn!("speak requested but no voice is selectable, ignoring");
                return;
            };
            self.presenter.set_play_label("Stop");
            self.capability.speak(text, &voice);
            self.speaking = true;
            debug!(voice = %voice.name, chars = text.len(), "utterance started");
        }
    }

    /// The user picked a different voice: remember it, mirror it, then
    /// re-run the speak toggle with the current text so switching voices
    /// while speaking interrupts under the same rules.
    pub fn select_voice(&mut self, index: usize, text: &str) {
        if index < self.voices.len() {
            self.selected = Some(index);
            let options: Vec<String> = self.voices.iter().map(Voice::label).collect();
            self.presenter.set_voice_options(&options, self.selected);
        } else {
            warn!(index, "voice index out of range, keeping selection");
        }
        self.speak(text);
    }

    /// Form submission: run the speak toggle, then drop input focus.
    pub fn submit(&mut self, text: &str) {
        self.speak(text);
        self.presenter.clear_input_focus();
    }

    /// Feed one engine event through the state machine.
    pub fn handle_event(&mut self, event: SynthesisEvent) {
        match event {
            SynthesisEvent::VoicesChanged => self.refresh_voices(),
            SynthesisEvent::Ended => {
                debug!("utterance ended");
                self.utterance_done();
            }
            SynthesisEvent::Error(message) => {
                // Synthesis failures reset the UI but are never shown.
                error!("utterance failed: {message}");
                self.utterance_done();
            }
        }
    }

    fn utterance_done(&mut self) {
        self.speaking = false;
        self.presenter.set_play_label("Play");
    }

    /// Voice catalog as currently known to the controller.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Status snapshot.
    pub fn status(&self) -> SynthesisStatus {
        SynthesisStatus {
            state: if self.speaking {
                SpeakState::Speaking
            } else {
                SpeakState::Idle
            },
            voice: self
                .selected
                .and_then(|i| self.voices.get(i))
                .map(|v| v.name.clone()),
            voice_count: self.voices.len(),
            engine_speaking: self.capability.is_speaking(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSynth {
        catalog: Mutex<Vec<Voice>>,
        spoken: Mutex<Vec<(String, String)>>,
        cancels: AtomicUsize,
    }

    impl FakeSynth {
        fn with_catalog(voices: &[(&str, &str)]) -> Arc<Self> {
            let fake = Self::default();
            *fake.catalog.lock().unwrap() = voices
                .iter()
                .map(|&(name, locale)| Voice {
                    name: name.to_string(),
                    locale: locale.to_string(),
                })
                .collect();
            Arc::new(fake)
        }

        fn spoken(&self) -> Vec<(String, String)> {
            self.spoken.lock().unwrap().clone()
        }
    }

    impl SynthesisCapability for FakeSynth {
        fn voices(&self) -> Vec<Voice> {
            self.catalog.lock().unwrap().clone()
        }

        fn speak(&self, text: &str, voice: &Voice) {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), voice.name.clone()));
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }

        fn is_speaking(&self) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        play_labels: Mutex<Vec<String>>,
        voice_calls: Mutex<Vec<(Vec<String>, Option<usize>)>>,
        focus_clears: AtomicUsize,
    }

    impl Presenter for RecordingPresenter {
        fn set_copy(&self, _: &str, _: &str, _: &str) {}

        fn set_voice_options(&self, options: &[String], selected: Option<usize>) {
            self.voice_calls
                .lock()
                .unwrap()
                .push((options.to_vec(), selected));
        }

        fn set_play_label(&self, label: &str) {
            self.play_labels.lock().unwrap().push(label.to_string());
        }

        fn set_capture_button(&self, _: &str, _: bool) {}
        fn show_transcript(&self, _: &str) {}
        fn alert(&self, _: &str) {}

        fn clear_input_focus(&self) {
            self.focus_clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller(
        catalog: &[(&str, &str)],
        language: &str,
    ) -> (SynthesisController, Arc<FakeSynth>, Arc<RecordingPresenter>) {
        let synth = FakeSynth::with_catalog(catalog);
        let presenter = Arc::new(RecordingPresenter::default());
        let mut ctrl = SynthesisController::new(synth.clone(), presenter.clone(), language);
        ctrl.refresh_voices();
        (ctrl, synth, presenter)
    }

    #[test]
    fn refresh_selects_first_language_match() {
        let (ctrl, _, presenter) = controller(
            &[("a_one", "en-US"), ("r_one", "ru-RU"), ("r_two", "ru-RU")],
            "ru-RU",
        );
        assert_eq!(ctrl.selected, Some(1));
        let calls = presenter.voice_calls.lock().unwrap();
        assert_eq!(
            calls.last().unwrap().0,
            vec![
                "a_one (en-US)".to_string(),
                "r_one (ru-RU)".to_string(),
                "r_two (ru-RU)".to_string()
            ]
        );
    }

    #[test]
    fn refresh_falls_back_to_first_voice() {
        let (ctrl, _, _) = controller(&[("a_one", "en-US"), ("b_one", "en-GB")], "fr-FR");
        assert_eq!(ctrl.selected, Some(0));
    }

    #[test]
    fn refresh_with_empty_catalog_selects_nothing() {
        let (ctrl, _, presenter) = controller(&[], "en-US");
        assert_eq!(ctrl.selected, None);
        let calls = presenter.voice_calls.lock().unwrap();
        assert!(calls.last().unwrap().0.is_empty());
    }

    #[test]
    fn refresh_is_idempotent_for_unchanged_catalog() {
        let (mut ctrl, _, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.refresh_voices();
        let calls = presenter.voice_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[test]
    fn empty_text_while_idle_does_nothing() {
        let (mut ctrl, synth, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.speak("");
        assert!(synth.spoken().is_empty());
        assert!(presenter.play_labels.lock().unwrap().is_empty());
        assert_eq!(ctrl.status().state, SpeakState::Idle);
    }

    #[test]
    fn speak_starts_utterance_with_selected_voice() {
        let (mut ctrl, synth, presenter) = controller(
            &[("a_one", "en-US"), ("r_one", "ru-RU")],
            "ru-RU",
        );
        ctrl.speak("привет");
        assert_eq!(synth.spoken(), vec![("привет".to_string(), "r_one".to_string())]);
        assert_eq!(
            presenter.play_labels.lock().unwrap().as_slice(),
            ["Stop".to_string()]
        );
        assert_eq!(ctrl.status().state, SpeakState::Speaking);
    }

    #[test]
    fn speak_while_speaking_cancels_instead() {
        let (mut ctrl, synth, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.speak("hello");
        ctrl.speak("ignored");
        assert_eq!(synth.spoken().len(), 1);
        assert_eq!(synth.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(
            presenter.play_labels.lock().unwrap().as_slice(),
            ["Stop".to_string(), "Play".to_string()]
        );
        assert_eq!(ctrl.status().state, SpeakState::Idle);
    }

    #[test]
    fn speak_with_no_selectable_voice_is_noop() {
        let (mut ctrl, synth, presenter) = controller(&[], "en-US");
        ctrl.speak("hello");
        assert!(synth.spoken().is_empty());
        assert!(presenter.play_labels.lock().unwrap().is_empty());
        assert_eq!(ctrl.status().state, SpeakState::Idle);
    }

    #[test]
    fn ended_event_returns_to_idle() {
        let (mut ctrl, _, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.speak("hello");
        ctrl.handle_event(SynthesisEvent::Ended);
        assert_eq!(ctrl.status().state, SpeakState::Idle);
        assert_eq!(
            presenter.play_labels.lock().unwrap().last().unwrap(),
            "Play"
        );
    }

    #[test]
    fn error_event_also_returns_to_idle() {
        let (mut ctrl, synth, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.speak("hello");
        ctrl.handle_event(SynthesisEvent::Error("engine exploded".into()));
        assert_eq!(ctrl.status().state, SpeakState::Idle);
        assert_eq!(
            presenter.play_labels.lock().unwrap().last().unwrap(),
            "Play"
        );
        // And the next speak starts fresh
        ctrl.speak("again");
        assert_eq!(synth.spoken().len(), 2);
    }

    #[test]
    fn select_voice_previews_with_new_voice() {
        let (mut ctrl, synth, _) = controller(
            &[("a_one", "en-US"), ("b_one", "en-GB")],
            "en-US",
        );
        ctrl.select_voice(1, "hello");
        assert_eq!(ctrl.selected, Some(1));
        assert_eq!(synth.spoken(), vec![("hello".to_string(), "b_one".to_string())]);
    }

    #[test]
    fn select_voice_while_speaking_interrupts() {
        let (mut ctrl, synth, _) = controller(
            &[("a_one", "en-US"), ("b_one", "en-GB")],
            "en-US",
        );
        ctrl.speak("hello");
        ctrl.select_voice(1, "hello");
        // The toggle lands on its interrupt branch, no second utterance
        assert_eq!(synth.spoken().len(), 1);
        assert_eq!(synth.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(ctrl.selected, Some(1));
    }

    #[test]
    fn select_voice_out_of_range_keeps_selection() {
        let (mut ctrl, synth, _) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.select_voice(7, "hello");
        assert_eq!(ctrl.selected, Some(0));
        // Still previews with the surviving selection
        assert_eq!(synth.spoken(), vec![("hello".to_string(), "a_one".to_string())]);
    }

    #[test]
    fn submit_speaks_and_clears_focus() {
        let (mut ctrl, synth, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.submit("hello");
        assert_eq!(synth.spoken().len(), 1);
        assert_eq!(presenter.focus_clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn submit_empty_text_still_clears_focus() {
        let (mut ctrl, synth, presenter) = controller(&[("a_one", "en-US")], "en-US");
        ctrl.submit("");
        assert!(synth.spoken().is_empty());
        assert_eq!(presenter.focus_clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_reports_selected_voice() {
        let (ctrl, _, _) = controller(&[("a_one", "en-US"), ("r_one", "ru-RU")], "ru-RU");
        let status = ctrl.status();
        assert_eq!(status.voice.as_deref(), Some("r_one"));
        assert_eq!(status.voice_count, 2);
        assert!(!status.engine_speaking);
    }
}
