use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who produced a turn.
///
/// The chat core only ever records [`Role::User`]; the other roles exist so
/// that transcripts built elsewhere can be flattened unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User role.
    User,

    /// Assistant role.
    Assistant,

    /// System role.
    System,

    /// Tool role.
    Tool,
}

impl Role {
    /// The lowercase label used on the wire and in flattened prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            "tool" => Ok(Role::Tool),
            _ => Err(format!(
                "Invalid role: {s}. Valid options: user, assistant, system, tool"
            )),
        }
    }
}
