//! Voxboard application binary - composition root.
//!
//! Ties together all Voxboard crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the text surface, status reporter, and session manager
//! 3. Start the domain event logger
//! 4. Drive the keyboard from a line-based terminal REPL
//!
//! Real speech input depends on a platform recognition backend; this binary
//! ships with a simulated engine that streams canned phrases through the
//! whole stack (interim results, restarts, status messages included), which
//! exercises everything except the microphone itself.

mod cli;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use voxboard_core::config::VoxboardConfig;
use voxboard_core::scheduler::{Scheduler, TokioScheduler};
use voxboard_core::types::StatusKind;
use voxboard_dictation::{
    EngineEvent, EngineSession, EventSink, RecognitionConfig, RecognitionEngine, ResultBatch,
    ResultEntry, SessionManager,
};
use voxboard_status::{StatusReporter, StatusSurface};
use voxboard_text::{EditBuffer, KeyAction, KeyDispatcher, TextSurface};

use cli::CliArgs;

/// Status surface that renders to the terminal.
struct ConsoleStatus;

impl StatusSurface for ConsoleStatus {
    fn display(&self, message: &str, kind: StatusKind) {
        println!("  [{}] {}", kind.as_str(), message);
    }

    fn set_faded(&self, faded: bool) {
        if faded {
            tracing::debug!("Status fading out");
        }
    }

    fn hide(&self) {
        tracing::debug!("Status hidden");
    }
}

/// Simulated recognition engine. Each session streams one canned phrase as
/// growing interim results followed by a finalized fragment, then idles
/// until stopped or restarted, mimicking a streaming backend closely enough
/// to demo the full dictation flow.
struct SimulatedEngine {
    phrases: Vec<&'static str>,
    next_phrase: AtomicUsize,
}

impl SimulatedEngine {
    fn new() -> Self {
        Self {
            phrases: vec![
                "hello from the voice keyboard",
                "the quick brown fox jumps over the lazy dog",
                "speech arrives in fragments and settles into text",
            ],
            next_phrase: AtomicUsize::new(0),
        }
    }
}

struct SimulatedSession {
    stopping: Arc<AtomicBool>,
}

impl EngineSession for SimulatedSession {
    fn stop(&self) -> voxboard_core::Result<()> {
        self.stopping.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl RecognitionEngine for SimulatedEngine {
    fn open(
        &self,
        _config: &RecognitionConfig,
        sink: EventSink,
    ) -> voxboard_core::Result<Box<dyn EngineSession>> {
        let phrase = self.phrases[self.next_phrase.fetch_add(1, Ordering::SeqCst) % self.phrases.len()];
        let stopping = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopping);

        tokio::spawn(async move {
            sink(EngineEvent::Started);

            let words: Vec<&str> = phrase.split_whitespace().collect();
            let mut heard = String::new();
            for word in &words {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(400)).await;
                if !heard.is_empty() {
                    heard.push(' ');
                }
                heard.push_str(word);
                sink(EngineEvent::Result(ResultBatch {
                    start_index: 0,
                    entries: vec![ResultEntry::interim(&heard)],
                }));
            }

            if !flag.load(Ordering::SeqCst) && !heard.is_empty() {
                sink(EngineEvent::Result(ResultBatch {
                    start_index: 0,
                    entries: vec![ResultEntry::final_text(&heard)],
                }));
            }

            // Idle until stopped, like a real session waiting for audio.
            while !flag.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            sink(EngineEvent::Ended);
        });

        Ok(Box::new(SimulatedSession { stopping }))
    }
}

fn print_help() {
    println!("Commands:");
    println!("  key <c>   type a character");
    println!("  space     insert a space");
    println!("  enter     insert a newline");
    println!("  back      delete before the cursor");
    println!("  voice     toggle dictation on/off");
    println!("  show      print the buffer and session state");
    println!("  quit      exit");
}

fn show_buffer(surface: &EditBuffer, manager: Option<&SessionManager>) {
    let (start, end) = surface.selection();
    println!("  buffer: {:?} (cursor {}..{})", surface.value(), start, end);
    if let Some(manager) = manager {
        println!("  session: {}", manager.state());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let default_level = args.resolve_log_level().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::info!("Starting Voxboard v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = VoxboardConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");
    config.recognition.locale = args.resolve_locale(&config.recognition.locale);
    tracing::info!(locale = %config.recognition.locale, "Recognition locale");

    // Components.
    let surface = Arc::new(EditBuffer::new());
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new());
    let status = StatusReporter::new(
        Arc::new(ConsoleStatus),
        Arc::clone(&scheduler),
        config.status.fade(),
    );
    let keys = KeyDispatcher::new();

    let manager = if args.no_engine {
        tracing::warn!("Running without a speech engine");
        None
    } else {
        let engine: Arc<dyn RecognitionEngine> = Arc::new(SimulatedEngine::new());
        Some(SessionManager::new(
            engine,
            Arc::clone(&surface) as Arc<dyn TextSurface>,
            status.clone(),
            Arc::clone(&scheduler),
            config.clone(),
        ))
    };

    // Domain event logger.
    if let Some(ref manager) = manager {
        let mut events = manager.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => tracing::info!(event = event.event_name(), "Keyboard event"),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event logger lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    print_help();

    // REPL.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "key" => match rest.chars().next() {
                Some(ch) => keys.dispatch(surface.as_ref(), KeyAction::Char(ch)),
                None => println!("  usage: key <c>"),
            },
            "space" => keys.dispatch(surface.as_ref(), KeyAction::Space),
            "enter" => keys.dispatch(surface.as_ref(), KeyAction::Return),
            "back" => keys.dispatch(surface.as_ref(), KeyAction::Backspace),
            "voice" => match manager {
                Some(ref manager) => {
                    if manager.is_listening() {
                        manager.stop_dictation();
                    } else {
                        manager.start_dictation();
                    }
                }
                None => {
                    status.show("Speech recognition not supported", StatusKind::Error);
                    status.hide_after(config.status.error_hide());
                }
            },
            "show" => show_buffer(&surface, manager.as_deref()),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("  unknown command: {other} (try 'help')"),
        }
    }

    if let Some(ref manager) = manager {
        if manager.is_listening() {
            manager.stop_dictation();
        }
    }
    tracing::info!("Voxboard shutting down");
    Ok(())
}
