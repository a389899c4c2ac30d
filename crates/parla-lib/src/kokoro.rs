//! Kokoro synthesis adapter — voice catalog over HTTP, utterance fetch,
//! rodio playback.
//!
//! One utterance at a time. `speak` POSTs the OpenAI-compatible speech
//! endpoint, buffers the WAV response, and hands it to a dedicated
//! playback OS thread (rodio's `OutputStream` is `!Send`). Cancellation is
//! epoch-based: `cancel()` bumps an [`AtomicU64`] so in-flight fetches and
//! queued clips for the previous epoch are silently discarded, and no
//! trailing end event escapes a cancelled utterance.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use rodio::{Decoder, OutputStream, Sink};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use parla_core::types::Voice;

use crate::capability::{SynthesisCapability, SynthesisEvent};

/// How often the playback thread checks for a stop command while a clip
/// drains.
const DRAIN_POLL: Duration = Duration::from_millis(25);

enum PlayCmd {
    Play { wav: Vec<u8>, epoch: u64 },
    Stop,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<String>,
}

/// Synthesis engine backed by a Kokoro TTS server.
pub struct KokoroSynthesis {
    base_url: String,
    speed: f32,
    client: reqwest::Client,
    voices: Mutex<Vec<Voice>>,
    events: mpsc::UnboundedSender<SynthesisEvent>,
    play_tx: Mutex<std::sync::mpsc::Sender<PlayCmd>>,
    epoch: Arc<AtomicU64>,
    speaking: Arc<AtomicBool>,
}

impl KokoroSynthesis {
    /// Spawn the playback thread and the initial catalog fetch. Requires a
    /// running tokio runtime.
    pub fn new(
        base_url: &str,
        speed: f32,
        events: mpsc::UnboundedSender<SynthesisEvent>,
    ) -> Arc<Self> {
        let epoch = Arc::new(AtomicU64::new(0));
        let speaking = Arc::new(AtomicBool::new(false));

        // Playback OS thread (rodio OutputStream is !Send)
        let (play_tx, play_rx) = std::sync::mpsc::channel::<PlayCmd>();
        let thread_events = events.clone();
        let thread_epoch = epoch.clone();
        let thread_speaking = speaking.clone();
        std::thread::Builder::new()
            .name("parla-playback".into())
            .spawn(move || {
                playback_thread(play_rx, thread_events, thread_epoch, thread_speaking);
            })
            .expect("failed to spawn playback thread");

        let engine = Arc::new(Self {
            base_url: base_url.to_string(),
            speed,
            client: reqwest::Client::new(),
            voices: Mutex::new(Vec::new()),
            events,
            play_tx: Mutex::new(play_tx),
            epoch,
            speaking,
        });

        tokio::spawn(engine.clone().fetch_catalog());
        engine
    }

    /// Load the voice catalog once. A failure leaves the catalog empty and
    /// never signals VoicesChanged, the same as an engine whose list just
    /// never arrives.
    async fn fetch_catalog(self: Arc<Self>) {
        let url = format!("{}/v1/audio/voices", self.base_url);

        let resp = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!("kokoro: voice list failed ({})", resp.status());
                return;
            }
            Err(e) => {
                warn!("kokoro: voice list unreachable: {e}");
                return;
            }
        };

        let parsed: VoicesResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!("kokoro: invalid voice list: {e}");
                return;
            }
        };

        let voices: Vec<Voice> = parsed
            .voices
            .into_iter()
            .map(|name| {
                let locale = voice_locale(&name).to_string();
                Voice { name, locale }
            })
            .collect();

        debug!(count = voices.len(), "kokoro: voice catalog loaded");
        *self.voices.lock().unwrap_or_else(|e| e.into_inner()) = voices;
        let _ = self.events.send(SynthesisEvent::VoicesChanged);
    }
}

impl SynthesisCapability for KokoroSynthesis {
    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn speak(&self, text: &str, voice: &Voice) {
        let job_epoch = self.epoch.load(Ordering::SeqCst);
        let client = self.client.clone();
        let url = format!("{}/v1/audio/speech", self.base_url);
        let body = serde_json::json!({
            "model": "kokoro",
            "input": text,
            "voice": voice.name,
            "response_format": "wav",
            "speed": self.speed,
        });
        let epoch = self.epoch.clone();
        let events = self.events.clone();
        let play_tx = self
            .play_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        debug!(voice = %voice.name, "kokoro: utterance requested (epoch {job_epoch})");

        tokio::spawn(async move {
            match fetch_wav(client, url, body, job_epoch, &epoch).await {
                Ok(Some(wav)) => {
                    let _ = play_tx.send(PlayCmd::Play {
                        wav,
                        epoch: job_epoch,
                    });
                }
                Ok(None) => {} // cancelled mid-fetch, discarded
                Err(message) => {
                    // A stale failure must not disturb a newer utterance
                    if epoch.load(Ordering::SeqCst) == job_epoch {
                        let _ = events.send(SynthesisEvent::Error(message));
                    }
                }
            }
        });
    }

    fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self
            .play_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send(PlayCmd::Stop);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// POST the utterance and buffer the WAV body, checking the epoch between
/// chunks. `Ok(None)` means the job went stale and was discarded.
async fn fetch_wav(
    client: reqwest::Client,
    url: String,
    body: serde_json::Value,
    job_epoch: u64,
    epoch: &AtomicU64,
) -> Result<Option<Vec<u8>>, String> {
    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("kokoro request failed: {e}"))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(format!("kokoro error {status}: {text}"));
    }

    let mut wav: Vec<u8> = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        if epoch.load(Ordering::SeqCst) != job_epoch {
            debug!("kokoro: stale fetch, discarding");
            return Ok(None);
        }
        let bytes = chunk.map_err(|e| format!("kokoro stream error: {e}"))?;
        wav.extend_from_slice(&bytes);
    }

    if epoch.load(Ordering::SeqCst) != job_epoch {
        debug!("kokoro: stale fetch, discarding");
        return Ok(None);
    }

    debug!(bytes = wav.len(), "kokoro: utterance fetched");
    Ok(Some(wav))
}

// ─── Playback OS thread ───────────────────────────────────────────────────

fn playback_thread(
    cmd_rx: std::sync::mpsc::Receiver<PlayCmd>,
    events: mpsc::UnboundedSender<SynthesisEvent>,
    epoch: Arc<AtomicU64>,
    speaking: Arc<AtomicBool>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            error!("playback: failed to open audio output: {e}");
            return;
        }
    };

    let mut sink = Sink::try_new(&stream_handle).expect("failed to create sink");

    loop {
        let cmd = match cmd_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => break,
        };

        let (wav, job_epoch) = match cmd {
            PlayCmd::Play { wav, epoch } => (wav, epoch),
            PlayCmd::Stop => continue, // nothing playing
        };

        if job_epoch != epoch.load(Ordering::SeqCst) {
            debug!("playback: discarding stale clip");
            continue;
        }

        let source = match Decoder::new(Cursor::new(wav)) {
            Ok(s) => s,
            Err(e) => {
                let _ = events.send(SynthesisEvent::Error(format!("wav decode failed: {e}")));
                continue;
            }
        };

        sink.append(source);
        speaking.store(true, Ordering::SeqCst);
        debug!("playback: clip started (epoch {job_epoch})");

        // Drain while watching for a stop command
        let mut cancelled = false;
        while !sink.empty() {
            match cmd_rx.recv_timeout(DRAIN_POLL) {
                Ok(PlayCmd::Stop) => {
                    sink.stop();
                    sink = Sink::try_new(&stream_handle).expect("failed to create sink");
                    cancelled = true;
                    break;
                }
                Ok(PlayCmd::Play { .. }) => {
                    // The controller cancels before speaking again, so a
                    // clip arriving mid-drain is always stale
                    debug!("playback: discarding stale clip");
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    sink.stop();
                    speaking.store(false, Ordering::SeqCst);
                    return;
                }
            }
        }

        speaking.store(false, Ordering::SeqCst);
        if !cancelled && job_epoch == epoch.load(Ordering::SeqCst) {
            debug!("playback: clip finished");
            let _ = events.send(SynthesisEvent::Ended);
        }
    }
}

/// Map a Kokoro voice name to a locale tag via its prefix. The first
/// letter encodes the accent (`af_heart` → American English), the second
/// the speaker.
fn voice_locale(name: &str) -> &'static str {
    match name.as_bytes().first() {
        Some(b'b') => "en-GB",
        Some(b'e') => "es-ES",
        Some(b'f') => "fr-FR",
        Some(b'h') => "hi-IN",
        Some(b'i') => "it-IT",
        Some(b'j') => "ja-JP",
        Some(b'p') => "pt-BR",
        Some(b'z') => "zh-CN",
        _ => "en-US",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_locale_prefixes() {
        assert_eq!(voice_locale("af_heart"), "en-US");
        assert_eq!(voice_locale("am_adam"), "en-US");
        assert_eq!(voice_locale("bf_emma"), "en-GB");
        assert_eq!(voice_locale("jf_alpha"), "ja-JP");
        assert_eq!(voice_locale("zf_xiaobei"), "zh-CN");
    }

    #[test]
    fn voice_locale_unknown_prefix_defaults_to_american() {
        assert_eq!(voice_locale("x_mystery"), "en-US");
        assert_eq!(voice_locale(""), "en-US");
    }

    #[test]
    fn voices_response_shape() {
        let parsed: VoicesResponse =
            serde_json::from_str(r#"{"voices":["af_heart","bf_emma"]}"#).unwrap();
        assert_eq!(parsed.voices, vec!["af_heart", "bf_emma"]);
    }
}
