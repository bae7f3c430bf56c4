//! In-memory conversation history.
//!
//! A [`ConversationStore`] is owned by exactly one chat session.  It is
//! append-only: turns are kept in the order they arrived and are never
//! reordered, deduplicated, or filtered by role.

use std::slice;

use crate::types::{Role, Turn, TurnContent};

/// Ordered, append-only sequence of turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a turn at the end of the conversation.  Always succeeds.
    pub fn append(&mut self, role: Role, content: impl Into<TurnContent>) {
        self.push(Turn::new(role, content));
    }

    /// Adds an already-built turn at the end of the conversation.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The full conversation in insertion order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns the number of turns in the conversation.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterates the turns in conversation order.
    pub fn iter(&self) -> slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a ConversationStore {
    type Item = &'a Turn;
    type IntoIter = slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentBlock;

    #[test]
    fn new_store_empty() {
        let store = ConversationStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.last().is_none());
        assert!(store.all().is_empty());
    }

    #[test]
    fn append_keeps_order_and_duplicates() {
        let mut store = ConversationStore::new();
        store.append(Role::User, "hi");
        store.append(Role::Assistant, "hello");
        store.append(Role::User, "hi");

        let roles: Vec<Role> = store.iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(store.all()[0], store.all()[2]);
        assert_eq!(store.last(), Some(&Turn::user("hi")));
    }

    #[test]
    fn append_accepts_both_content_shapes() {
        let mut store = ConversationStore::new();
        store.append(Role::User, "plain");
        store.append(Role::Tool, vec![ContentBlock::text("block")]);

        assert!(matches!(store.all()[0].content, TurnContent::Text(_)));
        assert!(matches!(store.all()[1].content, TurnContent::Blocks(_)));
    }

    #[test]
    fn all_does_not_mutate() {
        let mut store = ConversationStore::new();
        store.push(Turn::user("once"));
        let before = store.clone();
        let _ = store.all();
        let _ = store.all();
        assert_eq!(store, before);
    }
}
