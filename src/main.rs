//! QB Scanner - Command-line controller
//!
//! Toggles the capture loop from stdin and delivers finished reports to the
//! clipboard.
//!
//! # Usage
//!
//! ```bash
//! # Interactive: press Enter to start or stop scanning, `q` to quit
//! qb-scanner
//!
//! # Scan once and exit when the run ends
//! qb-scanner --once
//!
//! # Machine-readable events
//! qb-scanner --json --no-clipboard
//! ```

use qb_scanner::{Config, RunOutcome, ScanController, ScanEvent, ScanServices, SystemClipboard};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line options
#[derive(Debug, Clone, Default)]
struct CliOptions {
    config_path: Option<PathBuf>,
    once: bool,
    json: bool,
    no_clipboard: bool,
}

/// Parse command line arguments
fn parse_args() -> CliOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut options = CliOptions::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-v" => {
                println!("qb-scanner v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--once" => options.once = true,
            "--json" => options.json = true,
            "--no-clipboard" => options.no_clipboard = true,
            "--config" | "-c" => {
                i += 1;
                match args.get(i) {
                    Some(path) => options.config_path = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--config requires a path");
                        std::process::exit(1);
                    }
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_help() {
    println!(
        r#"QB Scanner - Turns on-screen build error reports into /qbissue commands

USAGE:
    qb-scanner [OPTIONS]

OPTIONS:
    -h, --help              Show this help message
    -v, --version           Show version
    -c, --config <PATH>     Path to configuration file
    --once                  Start scanning immediately and exit when the run ends
    --json                  Print events as JSON lines
    --no-clipboard          Do not copy results to the clipboard

CONTROLS:
    Enter                   Start scanning, or stop a running scan
    q, quit                 Exit

PERMISSIONS REQUIRED (macOS):
    - Screen Recording: System Settings > Privacy & Security > Screen Recording
    - Accessibility: System Settings > Privacy & Security > Accessibility
"#
    );
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Print an event and deliver results
fn handle_event(event: &ScanEvent, options: &CliOptions, clipboard: &SystemClipboard) {
    if options.json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to serialize event: {}", e),
        }
    }

    match event {
        ScanEvent::State(state) => {
            debug!("Scanner is {}", state.as_str());
            if !options.json {
                println!("[{}]", state.as_str());
            }
        }
        ScanEvent::Result(message) => {
            if !options.json {
                println!("{}", message);
            }
            if !options.no_clipboard {
                match clipboard.write_text(&message.text()) {
                    Ok(()) => info!("Report copied to clipboard"),
                    Err(e) => warn!("Failed to copy report to clipboard: {}", e),
                }
            }
        }
        ScanEvent::Notify(text) => {
            if !options.json {
                println!("{}", text);
            }
        }
        ScanEvent::ResolverFailed(record) => {
            if !options.json {
                println!(
                    "Report found but no browser URL could be read (qb_id: {})",
                    record.reference_id.as_deref().unwrap_or("?")
                );
            }
        }
    }
}

/// A run has ended on its own once its state returns to idle
fn ends_run(event: &ScanEvent) -> bool {
    matches!(event, ScanEvent::State(qb_scanner::WorkerState::Idle))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args();

    let config = match &options.config_path {
        Some(path) => Config::load_from_path(path.clone()),
        None => Config::load(),
    };
    init_logging(&config);

    info!("Starting QB Scanner");
    info!(
        "Capture region: {:?}, interval {}ms",
        config.capture.region, config.capture.interval_ms
    );

    // Setup shutdown signal
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        let _ = shutdown_tx.send(true);
    })?;

    let services = ScanServices::platform(&config);
    let (mut controller, mut events) = ScanController::new(config, services);
    let clipboard = SystemClipboard::new();

    // Stdin is read on its own task so a closed stdin does not end the loop
    let (line_tx, mut lines) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    if options.once {
        controller.start();
    } else if !options.json {
        println!("Press Enter to start or stop scanning, `q` to quit.");
    }

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            Some(event) = events.recv() => {
                handle_event(&event, &options, &clipboard);
                if options.once && ends_run(&event) {
                    break;
                }
            }
            Some(line) = lines.recv() => {
                match line.trim() {
                    "q" | "quit" => break,
                    _ => {
                        if controller.toggle().await {
                            info!("Scanning started");
                        } else {
                            info!("Scanning stopped");
                        }
                    }
                }
            }
        }
    }

    if let Some(outcome) = controller.stop().await {
        if outcome == RunOutcome::Cancelled {
            debug!("Stopped an active scan on exit");
        }
    }

    // Drain events emitted while stopping
    while let Ok(event) = events.try_recv() {
        handle_event(&event, &options, &clipboard);
    }

    info!("QB Scanner stopped");
    Ok(())
}
