//! Interactive chat application that relays a conversation to Gemini.
//!
//! # Usage
//!
//! ```bash
//! # Document server only, launched as `python mcp_server.py`
//! GEMINI_API_KEY=... relaychat
//!
//! # Launch the document server with uv and add two script servers
//! USE_UV=1 GEMINI_API_KEY=... relaychat weather.py search.py
//!
//! # Pick a model and disable colors
//! relaychat --model gemini-1.5-pro --no-color
//! ```
//!
//! Type `/help` at the prompt for the list of commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use relaychat::chat::{
    Chat, ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, help_text, parse_command,
};
use relaychat::{AiService, ConnectionStack};

/// How often a pending request checks for Ctrl+C.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, scripts) =
        ChatArgs::from_command_line_relaxed("relaychat [OPTIONS] [SERVER_SCRIPTS]...");
    let config = ChatConfig::from_env(args, scripts)?;
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let stack = match ConnectionStack::launch_all(config.server_commands()).await {
        Ok(stack) => stack,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return Err(err.into());
        }
    };

    let chat = Chat::with_clients(config.service()?, stack.handles());
    let outcome = repl(&config, chat, &mut renderer).await;
    let closed = stack.close().await;
    outcome?;
    closed?;
    Ok(())
}

async fn repl<S: AiService>(
    config: &ChatConfig,
    mut chat: Chat<S>,
    renderer: &mut PlainTextRenderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Gemini Chat (model: {})", config.model);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("Query: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => print_history(&chat),
                        ChatCommand::Prompt => {
                            let prompt = chat.prompt();
                            if prompt.is_empty() {
                                renderer.print_info("(empty conversation)");
                            } else {
                                print!("{prompt}");
                            }
                        }
                        ChatCommand::Servers => print_servers(&chat),
                        ChatCommand::Stats => print_stats(config, &chat),
                        ChatCommand::Invalid(message) => renderer.print_error(&message),
                    }
                    continue;
                }

                tokio::select! {
                    result = chat.run(line) => match result {
                        Ok(text) => renderer.print_response(&text),
                        Err(err) => renderer.print_error(&err.to_string()),
                    },
                    _ = wait_for_interrupt(&interrupted) => renderer.print_interrupted(),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn wait_for_interrupt(flag: &AtomicBool) {
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

fn print_history<S: AiService>(chat: &Chat<S>) {
    println!("    Turns: {}", chat.message_count());
    for (index, turn) in chat.messages().iter().enumerate() {
        println!("      {index}: {}", turn.role);
    }
}

fn print_servers<S: AiService>(chat: &Chat<S>) {
    if chat.clients().is_empty() {
        println!("    Servers: (none)");
        return;
    }
    println!("    Servers:");
    for (id, handle) in chat.clients() {
        let state = if handle.is_open() { "open" } else { "closed" };
        println!("      {id}: {} ({state})", handle.command());
    }
}

fn print_stats<S: AiService>(config: &ChatConfig, chat: &Chat<S>) {
    let stats = chat.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", config.model);
    println!("      Temperature: {:.2}", config.temperature);
    println!("      Max output tokens: {}", config.max_output_tokens);
    println!("      Turns: {}", stats.message_count);
    println!(
        "      Requests: {} ({} failed)",
        stats.total_requests, stats.failed_requests
    );
    match stats.last_prompt_bytes {
        Some(bytes) => println!("      Last prompt: {bytes} bytes"),
        None => println!("      Last prompt: (none)"),
    }
    println!("      Servers: {}", stats.server_ids.join(", "));
}
