//! Presentation seam — logical state lives in the controllers, labels and
//! markup land here.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, error};

/// The page surface the controllers paint onto.
///
/// Implementations only mirror state; they never call back into the
/// controllers.
pub trait Presenter: Send + Sync {
    /// Fill the three static text regions. Runs once at startup.
    fn set_copy(&self, synthesis: &str, recognition: &str, language_line: &str);

    /// Rebuild the voice selector wholesale.
    fn set_voice_options(&self, options: &[String], selected: Option<usize>);

    /// Label on the synthesis play toggle.
    fn set_play_label(&self, label: &str);

    /// Label and active styling on the capture toggle.
    fn set_capture_button(&self, label: &str, active: bool);

    /// Replace the rendered transcript wholesale.
    fn show_transcript(&self, markup: &str);

    /// Surface an error notification to the user.
    fn alert(&self, message: &str);

    /// Drop focus from the synthesis text input.
    fn clear_input_focus(&self);
}

/// Complete presentation state of the console page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub synthesis_copy: String,
    pub recognition_copy: String,
    pub language_line: String,
    pub voice_options: Vec<String>,
    pub selected_voice: Option<usize>,
    pub play_label: String,
    pub capture_label: String,
    pub capture_active: bool,
    pub transcript: String,
    pub last_alert: Option<String>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            synthesis_copy: String::new(),
            recognition_copy: String::new(),
            language_line: String::new(),
            voice_options: Vec::new(),
            selected_voice: None,
            play_label: "Play".into(),
            capture_label: "Start".into(),
            capture_active: false,
            transcript: String::new(),
            last_alert: None,
        }
    }
}

/// Presenter that keeps the whole page in memory, for serving over the
/// HTTP API. Every mutation is traced.
#[derive(Default)]
pub struct PageView {
    state: Mutex<PageState>,
}

impl PageView {
    /// Clone the current page state.
    pub fn snapshot(&self) -> PageState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Presenter for PageView {
    fn set_copy(&self, synthesis: &str, recognition: &str, language_line: &str) {
        let mut s = self.lock();
        s.synthesis_copy = synthesis.to_string();
        s.recognition_copy = recognition.to_string();
        s.language_line = language_line.to_string();
    }

    fn set_voice_options(&self, options: &[String], selected: Option<usize>) {
        debug!(count = options.len(), ?selected, "page: voice options rebuilt");
        let mut s = self.lock();
        s.voice_options = options.to_vec();
        s.selected_voice = selected;
    }

    fn set_play_label(&self, label: &str) {
        debug!(label, "page: play label");
        self.lock().play_label = label.to_string();
    }

    fn set_capture_button(&self, label: &str, active: bool) {
        debug!(label, active, "page: capture button");
        let mut s = self.lock();
        s.capture_label = label.to_string();
        s.capture_active = active;
    }

    fn show_transcript(&self, markup: &str) {
        self.lock().transcript = markup.to_string();
    }

    fn alert(&self, message: &str) {
        error!("page alert: {message}");
        self.lock().last_alert = Some(message.to_string());
    }

    fn clear_input_focus(&self) {
        debug!("page: input focus cleared");
    }
}
