//! # PayScan CLI Library
//!
//! Command parsing, logging setup and scanner wiring for the `payscan`
//! binary.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                             │
//! │  2. Initialize tracing (RUST_LOG or --verbose)                         │
//! │  3. Load ScannerConfig (defaults < scanner.toml < PAYSCAN_* env)       │
//! │  4. Build Scanner with host adapters:                                  │
//! │       RqrrDecoder  ─► Decoder                                          │
//! │       ConsoleSink  ─► NotificationSink                                 │
//! │       SharedForm   ─► HostForm                                         │
//! │       ReplayCamera ─► CameraBackend (camera command only)              │
//! │  5. Run the command, print the filled-in form                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod host;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use payscan_core::PaymentFields;
use payscan_scanner::{CameraBackend, Scanner, ScannerConfig, SharedForm};

use crate::host::{ConsoleSink, RqrrDecoder};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "payscan")]
#[command(about = "Scan payment QR codes from images or a replayed camera", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to scanner.toml (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a single image file (one decode attempt)
    Image {
        /// Image file to scan
        path: PathBuf,

        /// MIME type to declare (guessed from the extension by default)
        #[arg(long)]
        mime: Option<String>,

        /// Amount already typed into the form
        #[arg(long)]
        amount: Option<String>,

        /// Print the form as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay the images in a directory as a live camera
    Camera {
        /// Directory of frames, played in file name order
        dir: PathBuf,

        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Amount already typed into the form
        #[arg(long)]
        amount: Option<String>,

        /// Print the form as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

// =============================================================================
// Entry Point
// =============================================================================

/// Parses arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ScannerConfig::load(cli.config.clone())
        .context("Failed to load scanner configuration")?;

    info!(
        poll_interval_ms = config.scanner.poll_interval_ms,
        max_dimension = config.scanner.max_dimension,
        "Starting PayScan"
    );

    match cli.command {
        Commands::Image {
            path,
            mime,
            amount,
            json,
        } => commands::image::execute(config, &path, mime, amount, json).await,

        Commands::Camera {
            dir,
            timeout,
            amount,
            json,
        } => commands::camera::execute(config, &dir, timeout, amount, json).await,

        Commands::Config { save } => commands::config::execute(&config, cli.config, save),
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=payscan_scanner=trace` - Trace the scanner only
/// - `--verbose` - Debug for every crate
/// - Default: INFO, DEBUG for payscan crates
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,payscan_core=debug,payscan_scanner=debug,payscan_cli=debug")
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Scanner Wiring
// =============================================================================

/// Builds a scanner with the host adapters.
pub fn build_scanner(
    config: ScannerConfig,
    backend: Option<Arc<dyn CameraBackend>>,
    amount: Option<String>,
) -> anyhow::Result<(Scanner, Arc<SharedForm>)> {
    let form = Arc::new(SharedForm::new(match amount {
        Some(amount) => PaymentFields::with_amount(amount),
        None => PaymentFields::new(),
    }));

    let sink = ConsoleSink::from_config(&config);
    let mut builder = Scanner::builder(config)
        .with_decoder(Arc::new(RqrrDecoder::new()))
        .with_sink(Arc::new(sink))
        .with_form(form.clone());

    if let Some(backend) = backend {
        builder = builder.with_backend(backend);
    }

    let scanner = builder.build().context("Failed to build scanner")?;
    Ok((scanner, form))
}

/// Prints the form after a scan.
pub fn print_form(fields: &PaymentFields, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(fields)?);
    } else {
        println!("reference: {}", fields.reference);
        if fields.amount.is_empty() {
            println!("amount:    (empty)");
        } else {
            println!("amount:    {}", fields.amount);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_image_command() {
        let cli = Cli::parse_from(["payscan", "image", "receipt.png", "--amount", "12"]);
        match cli.command {
            Commands::Image { path, amount, json, .. } => {
                assert_eq!(path, PathBuf::from("receipt.png"));
                assert_eq!(amount.as_deref(), Some("12"));
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_camera_timeout_default() {
        let cli = Cli::parse_from(["payscan", "-v", "camera", "./frames"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Camera { timeout: 30, .. }));
    }
}
