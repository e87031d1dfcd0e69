//! Interactive chat with the DeepSeek web proxy.
//!
//! # Usage
//!
//! ```bash
//! # Pick a model from the menu
//! seekproxy-chat
//!
//! # Skip the menu
//! seekproxy-chat --model DeepSeek-R1
//!
//! # Disable colors (useful for piping output)
//! seekproxy-chat --no-color
//! ```
//!
//! Type `exit`, `quit` or `خروج` to leave.  Set `SEEKPROXY_LOG=debug` to see
//! the handshake and requests on stderr.
//!
//! Exit status is 0 on a normal exit, 1 for a bad option or terminal failure,
//! 2 when the session handshake fails and 130 after Ctrl+C or a termination
//! signal.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use tracing_subscriber::EnvFilter;

use seekproxy::chat::{ChatArgs, ChatConfig, PlainTextRenderer, Renderer, run_app};
use seekproxy::input::EditorInput;

const LOG_ENV: &str = "SEEKPROXY_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let (args, _) = ChatArgs::from_command_line_relaxed("seekproxy-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    }) {
        renderer.print_error(&format!("failed to install Ctrl+C handler: {err}"));
        return ExitCode::FAILURE;
    }

    let mut input = match EditorInput::new() {
        Ok(input) => input,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return ExitCode::from(err.exit_code());
        }
    };

    match run_app(&config, &mut input, &mut renderer, &interrupted).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            renderer.print_error(&err.to_string());
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
