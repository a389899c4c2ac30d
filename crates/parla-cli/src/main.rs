//! parla CLI — speech console server and client.
//!
//! ```text
//! parla serve [--port 2005] [--host 127.0.0.1] [--language ru-RU] [--recognizer parla-recognizer]
//! parla speak "hello world" [--server http://localhost:2005]
//! parla voice 2 / voices / toggle / transcript [--raw] / status [--server ...]
//! ```

use clap::{Parser, Subcommand};

/// parla — voice synthesis and speech recognition console
#[derive(Parser)]
#[command(name = "parla", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the parla speech console server
    Serve {
        /// Listen port
        #[arg(long, default_value = "2005")]
        port: u16,
        /// Listen host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Console language tag (defaults to $LANG)
        #[arg(long)]
        language: Option<String>,
        /// Kokoro TTS server URL
        #[arg(long, default_value = "http://localhost:8880")]
        kokoro_url: String,
        /// Synthesis playback speed
        #[arg(long, default_value = "1.0")]
        speed: f32,
        /// Recognizer sidecar command
        #[arg(long, default_value = "parla-recognizer")]
        recognizer: String,
    },
    /// Send text to the synthesis input and press play
    Speak {
        /// Text to speak
        text: String,
        /// Server URL
        #[arg(long, default_value = "http://localhost:2005")]
        server: String,
    },
    /// Select a voice by catalog index (previews with the current text)
    Voice {
        /// Voice index
        index: usize,
        #[arg(long, default_value = "http://localhost:2005")]
        server: String,
    },
    /// List the voice catalog
    Voices {
        #[arg(long, default_value = "http://localhost:2005")]
        server: String,
    },
    /// Toggle speech capture
    Toggle {
        #[arg(long, default_value = "http://localhost:2005")]
        server: String,
    },
    /// Print the transcript (ANSI-highlighted unless --raw)
    Transcript {
        /// Print the raw transcript markup
        #[arg(long)]
        raw: bool,
        #[arg(long, default_value = "http://localhost:2005")]
        server: String,
    },
    /// Get console status
    Status {
        #[arg(long, default_value = "http://localhost:2005")]
        server: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            language,
            kokoro_url,
            speed,
            recognizer,
        } => {
            let language = language.unwrap_or_else(|| {
                std::env::var("LANG")
                    .ok()
                    .map(|raw| parla_lib::parla_core::locale::normalize_tag(&raw))
                    .filter(|tag| !tag.is_empty())
                    .unwrap_or_else(|| "en-US".to_string())
            });

            let (synth_tx, synth_rx) = tokio::sync::mpsc::unbounded_channel();
            let (recog_tx, recog_rx) = tokio::sync::mpsc::unbounded_channel();

            let synthesis = parla_lib::kokoro::KokoroSynthesis::new(&kokoro_url, speed, synth_tx);

            let mut engine_cmd = recognizer.split_whitespace().map(str::to_string);
            let program = engine_cmd
                .next()
                .unwrap_or_else(|| "parla-recognizer".to_string());
            let recognition = parla_lib::sidecar::SidecarRecognizer::new(
                &program,
                engine_cmd.collect(),
                parla_lib::parla_core::types::RecognitionConfig::continuous(&language),
                recog_tx,
            );

            let console = parla_lib::console::SpeechConsole::new(
                &language,
                synthesis,
                synth_rx,
                recognition,
                recog_rx,
            );
            let app = parla_lib::server::router(console);

            let addr = format!("{host}:{port}");
            eprintln!("parla listening on {addr}");

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .expect("failed to bind");

            axum::serve(listener, app).await.expect("server error");
        }

        Command::Speak { text, server } => {
            let resp = reqwest::Client::new()
                .post(format!("{server}/speak"))
                .json(&serde_json::json!({ "text": text }))
                .send()
                .await
                .expect("request failed");
            println!("{}", resp.text().await.unwrap_or_default());
        }

        Command::Voice { index, server } => {
            let resp = reqwest::Client::new()
                .post(format!("{server}/voice"))
                .json(&serde_json::json!({ "index": index }))
                .send()
                .await
                .expect("request failed");
            println!("{}", resp.text().await.unwrap_or_default());
        }

        Command::Voices { server } => get_simple(&server, "voices").await,
        Command::Toggle { server } => post_simple(&server, "toggle").await,

        Command::Transcript { raw, server } => {
            let resp = reqwest::Client::new()
                .get(format!("{server}/transcript"))
                .send()
                .await
                .expect("request failed");
            let body = resp.text().await.unwrap_or_default();
            if raw {
                println!("{body}");
                return;
            }
            let markup = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("markup").and_then(|m| m.as_str()).map(str::to_string));
            match markup {
                Some(markup) => println!("{}", parla_lib::parla_core::highlight::to_ansi(&markup)),
                None => println!("{body}"),
            }
        }

        Command::Status { server } => get_simple(&server, "status").await,
    }
}

async fn post_simple(server: &str, endpoint: &str) {
    let resp = reqwest::Client::new()
        .post(format!("{server}/{endpoint}"))
        .send()
        .await
        .expect("request failed");
    println!("{}", resp.text().await.unwrap_or_default());
}

async fn get_simple(server: &str, endpoint: &str) {
    let resp = reqwest::Client::new()
        .get(format!("{server}/{endpoint}"))
        .send()
        .await
        .expect("request failed");
    println!("{}", resp.text().await.unwrap_or_default());
}
