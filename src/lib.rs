//! relaychat: a terminal chat client that relays a flattened conversation to
//! Gemini while holding connections to external tool servers.

pub mod assembler;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod render;
pub mod servers;
pub mod service;
pub mod store;
pub mod types;

pub use assembler::flatten;
pub use chat::{Chat, SessionStats};
pub use client::GeminiService;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use servers::{ConnectionStack, ServerCommand, ServerConnection, ServerHandle};
pub use service::AiService;
pub use store::ConversationStore;
pub use types::*;
