//! Chat application module for talking to the proxy from a terminal.
//!
//! This module provides the REPL built on top of [`crate::client`]:
//!
//! - A numbered model menu; the chosen model is fixed for the session
//! - The challenge handshake before the first message
//! - A prompt loop that posts each message and shows the extracted reply
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the bound model, the backend seam and per-turn reply handling
//! - [`commands`]: exit words and blank-line handling
//! - [`runner`]: the menu, handshake and loop wired together

mod commands;
mod config;
mod runner;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{EXIT_WORDS, InputAction, classify_input, help_text};
pub use config::{ChatArgs, ChatConfig};
pub use runner::{LoopOutcome, Selection, chat_loop, run_app, select_model};
pub use session::{ChatBackend, ChatSession, SessionStats, Turn};
