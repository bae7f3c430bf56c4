//! Prompt assembly.
//!
//! The backend takes a single text prompt rather than a structured message
//! list, so the conversation is degraded to one `role: text` line per turn:
//!
//! ```
//! use relaychat::{ContentBlock, Role, Turn, flatten};
//!
//! let turns = vec![
//!     Turn::user("hi"),
//!     Turn::with_blocks(Role::Assistant, vec![ContentBlock::text("hello"), ContentBlock::text("there")]),
//! ];
//! assert_eq!(flatten(&turns), "user: hi\nassistant: hello there\n");
//! ```
//!
//! Only text blocks contribute.  Images, tool calls, tool results and
//! unrecognized blocks are skipped without leaving a placeholder.

use std::borrow::Cow;

use crate::types::{Turn, TurnContent};

/// Flattens every turn, in order, into one newline-terminated prompt.
pub fn flatten<'a, I>(turns: I) -> String
where
    I: IntoIterator<Item = &'a Turn>,
{
    let mut prompt = String::new();
    for turn in turns {
        push_turn(&mut prompt, turn);
    }
    prompt
}

/// Appends the `role: text\n` line for a single turn.
pub fn push_turn(prompt: &mut String, turn: &Turn) {
    prompt.push_str(turn.role.as_str());
    prompt.push_str(": ");
    prompt.push_str(&content_text(&turn.content));
    prompt.push('\n');
}

/// The text a turn contributes to the prompt.
///
/// String content is returned verbatim; block content is the text of each
/// text block joined by a single space.
pub fn content_text(content: &TurnContent) -> Cow<'_, str> {
    match content {
        TurnContent::Text(text) => Cow::Borrowed(text),
        TurnContent::Blocks(blocks) => {
            let texts: Vec<&str> = blocks.iter().filter_map(|block| block.as_text()).collect();
            Cow::Owned(texts.join(" "))
        }
    }
}
