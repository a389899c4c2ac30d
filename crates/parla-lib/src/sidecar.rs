//! Sidecar recognizer adapter — an external continuous recognizer process
//! turned into [`RecognitionEvent`]s.
//!
//! The engine process owns the microphone and the decoding; this adapter
//! only does lifecycle and line parsing. The engine writes one JSON object
//! per stdout line:
//!
//! ```text
//! {"type":"start"}
//! {"type":"result","resumeIndex":0,"results":[{"alternatives":[{"transcript":"red car"}],"isFinal":true}]}
//! {"type":"speechEnd"}
//! {"type":"error","code":"no-speech"}
//! {"type":"end"}
//! ```
//!
//! Stdout EOF reaps the child; if the engine never printed its end line, a
//! synthetic end event is emitted so termination always reaches the
//! controller.

use std::process::Stdio;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use parla_core::types::{RecognitionConfig, RecognitionResult, ResultBatch};

use crate::capability::{RecognitionCapability, RecognitionEvent};

/// Recognition engine behind a spawned sidecar process.
pub struct SidecarRecognizer {
    program: String,
    extra_args: Vec<String>,
    config: RecognitionConfig,
    events: mpsc::UnboundedSender<RecognitionEvent>,
    child: Arc<Mutex<Option<Child>>>,
}

impl SidecarRecognizer {
    pub fn new(
        program: &str,
        extra_args: Vec<String>,
        config: RecognitionConfig,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            program: program.to_string(),
            extra_args,
            config,
            events,
            child: Arc::new(Mutex::new(None)),
        })
    }
}

impl RecognitionCapability for SidecarRecognizer {
    fn start(&self) {
        let mut slot = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            warn!("recognizer already running, start ignored");
            return;
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .args(engine_args(&self.config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("recognizer: spawn failed: {e}");
                let _ = self
                    .events
                    .send(RecognitionEvent::Error(format!("recognizer spawn failed: {e}")));
                return;
            }
        };

        debug!(program = %self.program, language = %self.config.language, "recognizer spawned");

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[recognizer] {line}");
                }
            });
        }

        if let Some(stdout) = child.stdout.take() {
            let events = self.events.clone();
            let slot_handle = self.child.clone();
            tokio::spawn(async move {
                read_engine_events(stdout, events, slot_handle).await;
            });
        }

        *slot = Some(child);
    }

    fn stop(&self) {
        let mut slot = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(child) = slot.as_mut() {
            debug!("recognizer: kill requested");
            let _ = child.start_kill();
        }
    }
}

async fn read_engine_events(
    stdout: ChildStdout,
    events: mpsc::UnboundedSender<RecognitionEvent>,
    slot: Arc<Mutex<Option<Child>>>,
) {
    let mut lines = BufReader::new(stdout).lines();
    let mut saw_end = false;

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(event) => {
                if matches!(event, RecognitionEvent::Ended) {
                    saw_end = true;
                }
                let _ = events.send(event);
            }
            Err(e) => warn!("recognizer: unparseable line ({e}): {line}"),
        }
    }

    // Engine went away. Reap the child so stop() cannot find a zombie.
    let child = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(mut child) = child {
        let _ = child.wait().await;
    }
    if !saw_end {
        debug!("recognizer: stdout closed without end, synthesizing one");
        let _ = events.send(RecognitionEvent::Ended);
    }
}

/// Session config as engine command-line flags.
fn engine_args(config: &RecognitionConfig) -> Vec<String> {
    let mut args = vec!["--language".to_string(), config.language.clone()];
    if config.continuous {
        args.push("--continuous".to_string());
    }
    if config.interim_results {
        args.push("--interim-results".to_string());
    }
    args.push("--max-alternatives".to_string());
    args.push(config.max_alternatives.to_string());
    args
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum EngineLine {
    Start,
    #[serde(rename_all = "camelCase")]
    Result {
        resume_index: usize,
        results: Vec<RecognitionResult>,
    },
    SpeechEnd,
    Error {
        code: String,
    },
    End,
}

fn parse_line(line: &str) -> Result<RecognitionEvent, String> {
    let parsed: EngineLine = serde_json::from_str(line).map_err(|e| e.to_string())?;
    Ok(match parsed {
        EngineLine::Start => RecognitionEvent::Started,
        EngineLine::Result {
            resume_index,
            results,
        } => RecognitionEvent::Result(ResultBatch {
            resume_index,
            results,
        }),
        EngineLine::SpeechEnd => RecognitionEvent::SpeechEnded,
        EngineLine::Error { code } => RecognitionEvent::Error(code),
        EngineLine::End => RecognitionEvent::Ended,
    })
}
