// pcapterm - scrolling packet viewer for the terminal
//
// Tails packets from a live device or a recorded pcap file into an
// append-only table and lets the operator inspect any packet's decoded
// layers and raw bytes while capture keeps running.

mod app;
mod capture;
mod decode;
mod event;
mod ingest;
mod store;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::config::{AppConfig, CaptureConfig, TICK_INTERVAL_MS};
use app::event::handle_key_event;
use app::App;
use capture::{CaptureMode, PacketSource};
use event::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "pcapterm", version, about = "Scrolling packet viewer for the terminal")]
struct Cli {
    /// Capture device. If unspecified, use the first enumerated device.
    #[arg(short, long)]
    interface: Option<String>,

    /// Read packets from a pcap file instead of a live device.
    #[arg(short = 'r', long = "read", value_name = "FILE")]
    read: Option<PathBuf>,

    /// Log diagnostics to stderr.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn capture_mode(&self) -> CaptureMode {
        // a capture file takes precedence over device selection
        match &self.read {
            Some(path) => CaptureMode::Offline { path: path.clone() },
            None => CaptureMode::Live {
                device: self.interface.clone(),
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = AppConfig {
        capture: CaptureConfig::new(cli.capture_mode()),
        debug: cli.debug,
    };

    // Without --debug no subscriber is installed and diagnostics are
    // discarded.
    if config.debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pcapterm=debug")),
            )
            .with_writer(io::stderr)
            .init();
    }

    if let Err(err) = run(&config) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<()> {
    // Open the source before touching the terminal so acquisition
    // failures print normally.
    let source = PacketSource::open(&config.capture).context("cannot open capture source")?;

    let mut terminal = setup_terminal()?;

    let res = run_app(&mut terminal, source);

    // Restore the terminal on every path before reporting errors.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

/// Enter raw mode and the alternate screen. A failure partway through
/// undoes the steps already taken, so an error never leaves the shell
/// in raw mode.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }
    match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => Ok(terminal),
        Err(err) => {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            Err(err.into())
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    source: PacketSource,
) -> Result<()> {
    let mut app = App::new(source.describe());

    // The ingestion thread is deliberately not joined: it may be blocked
    // in a capture read, and the shutdown flag keeps it from writing once
    // the loop below exits.
    let _ingest = ingest::spawn(
        source,
        app.store.clone(),
        app.dirty.clone(),
        app.shutdown.clone(),
        app.failure.clone(),
    );
    let events = EventHandler::new(TICK_INTERVAL_MS);

    terminal.draw(|f| ui::draw(f, &mut app))?;

    while app.running {
        match events.next()? {
            AppEvent::Tick => {
                if app.take_dirty() {
                    terminal.draw(|f| ui::draw(f, &mut app))?;
                }
            }
            AppEvent::Key(key) => {
                handle_key_event(&mut app, key);
                if app.take_dirty() {
                    terminal.draw(|f| ui::draw(f, &mut app))?;
                }
            }
        }

        if app.shutdown.load(Ordering::Acquire) {
            app.running = false;
        }
    }
    app.shutdown.store(true, Ordering::Release);

    // A capture read failure deposited by the ingestion thread becomes a
    // nonzero exit once the terminal is restored.
    if let Some(err) = app.failure.lock().unwrap().take() {
        return Err(anyhow::Error::new(err).context("capture terminated"));
    }
    Ok(())
}
