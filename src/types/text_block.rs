use serde::{Deserialize, Serialize};

/// A block of text content in a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBlock {
    /// The text content.  A block that arrives without it reads as empty.
    #[serde(default)]
    pub text: String,
}

impl TextBlock {
    /// Creates a new TextBlock with the specified text.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for TextBlock {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextBlock {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_text_defaults_to_empty() {
        let block: TextBlock = serde_json::from_str("{}").unwrap();
        assert_eq!(block.text, "");
    }
}
