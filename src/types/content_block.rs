use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ImageBlock, TextBlock, ToolResultBlock, ToolUseBlock};

/// A block of content in a turn.
///
/// Blocks whose `type` we recognize deserialize into [`KnownBlock`].  Anything
/// else, including values that are not JSON objects at all, is kept verbatim
/// as [`ContentBlock::Other`] so that a transcript never fails to load because
/// of a block type we have not heard of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentBlock {
    /// A block with a recognized `type` tag.
    Known(KnownBlock),

    /// Any other block, kept as raw JSON.
    Other(Value),
}

/// The content blocks relaychat understands, keyed by their `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum KnownBlock {
    /// A block of text content
    #[serde(rename = "text")]
    Text(TextBlock),

    /// An image block
    #[serde(rename = "image")]
    Image(ImageBlock),

    /// A block representing a tool use request
    #[serde(rename = "tool_use")]
    ToolUse(ToolUseBlock),

    /// A tool result block
    #[serde(rename = "tool_result")]
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    /// Creates a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Known(KnownBlock::Text(TextBlock::new(text)))
    }

    /// Creates an image block.
    pub fn image(image: ImageBlock) -> Self {
        ContentBlock::Known(KnownBlock::Image(image))
    }

    /// Returns the text of a text block, or `None` for every other kind.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Known(KnownBlock::Text(block)) => Some(&block.text),
            _ => None,
        }
    }

    /// Returns true if this block is a text block
    pub fn is_text(&self) -> bool {
        self.as_text().is_some()
    }

    /// Returns true if this block is an image block
    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Known(KnownBlock::Image(_)))
    }

    /// Returns true if this block is a tool use block
    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::Known(KnownBlock::ToolUse(_)))
    }

    /// Returns true if this block is a tool result block
    pub fn is_tool_result(&self) -> bool {
        matches!(self, ContentBlock::Known(KnownBlock::ToolResult(_)))
    }

    /// Returns true if this block was not recognized.
    pub fn is_other(&self) -> bool {
        matches!(self, ContentBlock::Other(_))
    }
}

impl From<TextBlock> for ContentBlock {
    fn from(block: TextBlock) -> Self {
        ContentBlock::Known(KnownBlock::Text(block))
    }
}

impl From<ImageBlock> for ContentBlock {
    fn from(block: ImageBlock) -> Self {
        ContentBlock::Known(KnownBlock::Image(block))
    }
}

impl From<ToolUseBlock> for ContentBlock {
    fn from(block: ToolUseBlock) -> Self {
        ContentBlock::Known(KnownBlock::ToolUse(block))
    }
}

impl From<ToolResultBlock> for ContentBlock {
    fn from(block: ToolResultBlock) -> Self {
        ContentBlock::Known(KnownBlock::ToolResult(block))
    }
}
