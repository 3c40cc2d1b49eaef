//! ghostwriterd — caret context and text injection for a remote-input bridge.

mod bridge;
mod config;
mod context;
mod platform;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::bridge::{Bridge, TextInjector};
use crate::config::{BridgeSettings, EngineSettings, Timings};
use crate::context::{ContextEngine, ContextRequest};
use crate::platform::{AccessibilityProvider, PlatformError};
use crate::platform::atspi::AtSpiAccessibility;
use crate::platform::headless::NoAccessibility;
use crate::platform::x11::X11Desktop;
use crate::platform::xclip::XclipClipboard;

#[derive(Parser)]
#[command(name = "ghostwriterd", about = "Caret context and text injection for a remote-input bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Acquire context around the caret once and print it as JSON.
    Grab {
        /// Characters of lookbehind.
        #[arg(long, default_value_t = 50)]
        before: usize,
        /// Characters of lookahead.
        #[arg(long, default_value_t = 50)]
        after: usize,
        /// Allow select-all capture (moves the target's caret).
        #[arg(long)]
        force: bool,
        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },
    /// Serve one remote session as line-delimited JSON on stdin/stdout.
    Serve {
        /// Characters of lookbehind.
        #[arg(long, default_value_t = 50)]
        before: usize,
        /// Characters of lookahead.
        #[arg(long, default_value_t = 50)]
        after: usize,
        /// Delay before pushing context after an injection.
        #[arg(long, default_value_t = 100)]
        push_delay_ms: u64,
    },
}

fn init_tracing() {
    // stdout carries JSON; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine<A: AccessibilityProvider>(
    accessibility: A,
    desktop: &Arc<X11Desktop>,
    clipboard: &Arc<XclipClipboard>,
) -> ContextEngine<A> {
    ContextEngine::new(
        accessibility,
        clipboard.clone(),
        desktop.clone(),
        desktop.clone(),
        EngineSettings::default(),
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let desktop = match X11Desktop::connect() {
        Ok(desktop) => Arc::new(desktop),
        Err(e) => {
            tracing::error!(error = %e, "cannot open display");
            return ExitCode::FAILURE;
        }
    };
    let clipboard = Arc::new(XclipClipboard::new());

    let accessibility = match tokio::task::spawn_blocking(AtSpiAccessibility::connect).await {
        Ok(connected) => connected,
        Err(e) => Err(PlatformError::Accessibility(format!("connect worker failed: {e}"))),
    };
    match accessibility {
        Ok(accessibility) => {
            tracing::info!("using AT-SPI accessibility");
            let engine = build_engine(accessibility, &desktop, &clipboard);
            run(cli.command, engine, &desktop, &clipboard).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "accessibility bus unavailable, clipboard tiers only");
            let engine = build_engine(NoAccessibility, &desktop, &clipboard);
            run(cli.command, engine, &desktop, &clipboard).await
        }
    }
}

async fn run<A: AccessibilityProvider + 'static>(
    command: Command,
    engine: ContextEngine<A>,
    desktop: &Arc<X11Desktop>,
    clipboard: &Arc<XclipClipboard>,
) -> ExitCode {
    match command {
        Command::Grab {
            before,
            after,
            force,
            pretty,
        } => {
            let request = ContextRequest {
                chars_before: before,
                chars_after: after,
                force,
            };
            let result = match tokio::task::spawn_blocking(move || engine.acquire(request)).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "acquisition worker failed");
                    return ExitCode::FAILURE;
                }
            };
            let json = if pretty {
                serde_json::to_string_pretty(&result)
            } else {
                serde_json::to_string(&result)
            };
            match json {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode result");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Serve {
            before,
            after,
            push_delay_ms,
        } => {
            let injector = TextInjector::new(clipboard.clone(), desktop.clone(), Timings::default());
            let bridge = Bridge::new(
                engine,
                injector,
                BridgeSettings {
                    chars_before: before,
                    chars_after: after,
                    push_delay: Duration::from_millis(push_delay_ms),
                },
            );

            tracing::info!("serving on stdin/stdout");
            match crate::bridge::stdio::serve(&bridge, tokio::io::stdin(), tokio::io::stdout()).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "output writer failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
