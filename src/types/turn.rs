use serde::{Deserialize, Serialize};

use crate::types::{ContentBlock, Role};

/// The content of a turn, which can be either a string or an array of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TurnContent {
    /// A simple string content.
    Text(String),

    /// An array of content blocks.
    Blocks(Vec<ContentBlock>),
}

/// One role-tagged message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// The role of the turn.
    pub role: Role,

    /// The content of the turn.
    pub content: TurnContent,
}

impl Turn {
    /// Create a new `Turn` with the given role and content.
    pub fn new(role: Role, content: impl Into<TurnContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new `Turn` with an array of content blocks.
    pub fn with_blocks(role: Role, blocks: Vec<ContentBlock>) -> Self {
        Self::new(role, TurnContent::Blocks(blocks))
    }

    /// Create a new user `Turn` with a string content.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, TurnContent::Text(content.into()))
    }

    /// Create a new assistant `Turn` with a string content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, TurnContent::Text(content.into()))
    }
}

impl From<&str> for Turn {
    fn from(content: &str) -> Self {
        Self::user(content)
    }
}

impl From<String> for Turn {
    fn from(content: String) -> Self {
        Self::user(content)
    }
}

impl From<&str> for TurnContent {
    fn from(content: &str) -> Self {
        TurnContent::Text(content.to_string())
    }
}

impl From<String> for TurnContent {
    fn from(content: String) -> Self {
        TurnContent::Text(content)
    }
}

impl From<Vec<ContentBlock>> for TurnContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        TurnContent::Blocks(blocks)
    }
}
