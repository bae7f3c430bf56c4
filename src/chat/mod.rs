//! Interactive chat with a Gemini backend.
//!
//! This module provides the REPL-facing pieces of relaychat:
//!
//! - [`config`]: CLI argument parsing and environment configuration
//! - [`session`]: the [`Chat`] driver that records turns and relays them
//! - [`commands`]: slash command parsing
//!
//! The terminal loop itself lives in the `relaychat` binary.

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{API_KEY_VAR, ChatArgs, ChatConfig, MODEL_VAR, USE_UV_VAR};
pub use session::{Chat, SessionStats};
