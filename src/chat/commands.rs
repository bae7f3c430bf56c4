//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to inspect the chat session without sending messages
//! to the backend.

/// A parsed chat command.
///
/// These commands inspect the chat session and are never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// List the turns recorded so far.
    History,

    /// Show the prompt the next request would be built from.
    Prompt,

    /// List connected tool servers.
    Servers,

    /// Display session statistics.
    Stats,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use relaychat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("Hello, Gemini!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "history" => ChatCommand::History,
        "prompt" => ChatCommand::Prompt,
        "servers" => ChatCommand::Servers,
        "stats" | "status" => ChatCommand::Stats,
        "" => ChatCommand::Invalid("empty command; try /help".to_string()),
        other => ChatCommand::Invalid(format!("unknown command /{other}; try /help")),
    };

    if let Some(argument) = argument {
        if !matches!(result, ChatCommand::Invalid(_)) {
            return Some(ChatCommand::Invalid(format!(
                "/{command} takes no argument (got {argument:?})"
            )));
        }
    }

    Some(result)
}

/// Returns the help text for available commands.
pub fn help_text() -> &'static str {
    r#"Commands:
  /help, /?          Show this help message
  /history           List the turns sent so far
  /prompt            Show the prompt the next request builds on
  /servers           List connected tool servers
  /stats             Show session statistics
  /quit, /exit, /q   Exit the chat

Anything else is sent to the model. Ctrl+C abandons a pending reply; Ctrl+D exits."#
}
