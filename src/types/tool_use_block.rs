use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A block recording that the model asked for a tool.
///
/// relaychat does not invoke tools; the block is carried so transcripts that
/// contain one still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolUseBlock {
    /// A unique identifier for this tool use request.
    pub id: String,

    /// The name of the tool being invoked.
    pub name: String,

    /// The input data for the tool, can be any valid JSON.
    #[serde(default)]
    pub input: Value,
}

impl ToolUseBlock {
    /// Creates a new ToolUseBlock with the specified id, name, and input.
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, name: S2, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}
