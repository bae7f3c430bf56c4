//! Core chat session management.
//!
//! This module provides the [`Chat`] struct, which owns the conversation for
//! one session and relays it to an [`AiService`].

use std::collections::BTreeMap;

use crate::assembler::flatten;
use crate::error::Result;
use crate::observability::{CHAT_BACKEND_ERRORS, CHAT_PROMPT_BYTES, CHAT_TURNS};
use crate::servers::ServerHandle;
use crate::service::AiService;
use crate::store::ConversationStore;
use crate::types::{Role, Turn};

/// A chat session: one conversation, one backend, and the tool servers that
/// were connected for it.
///
/// Every call to [`Chat::run`] sends the whole conversation so far, flattened
/// into a single prompt.  Replies are returned to the caller but are not
/// recorded, so later prompts contain only user turns.
pub struct Chat<S: AiService> {
    ai_service: S,
    clients: BTreeMap<String, ServerHandle>,
    store: ConversationStore,
    request_count: u64,
    error_count: u64,
    last_prompt_bytes: Option<usize>,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The number of turns in the conversation.
    pub message_count: usize,
    /// Total number of backend requests made.
    pub total_requests: u64,
    /// Backend requests that failed.
    pub failed_requests: u64,
    /// Size of the most recent prompt, if any was sent.
    pub last_prompt_bytes: Option<usize>,
    /// Ids of the connected tool servers.
    pub server_ids: Vec<String>,
}

impl<S: AiService> Chat<S> {
    /// Creates a new chat session with no tool servers.
    pub fn new(ai_service: S) -> Self {
        Self::with_clients(ai_service, BTreeMap::new())
    }

    /// Creates a new chat session holding the given tool-server handles.
    pub fn with_clients(ai_service: S, clients: BTreeMap<String, ServerHandle>) -> Self {
        Self {
            ai_service,
            clients,
            store: ConversationStore::new(),
            request_count: 0,
            error_count: 0,
            last_prompt_bytes: None,
        }
    }

    /// Sends `query` and returns the backend's reply.
    ///
    /// The query is recorded as a user turn before the backend is called, so
    /// it stays in the conversation even when the backend fails or the
    /// returned future is dropped before completing.
    ///
    /// # Errors
    ///
    /// Returns whatever error the backend produced, unchanged.
    pub async fn run(&mut self, query: &str) -> Result<String> {
        self.store.append(Role::User, query);
        CHAT_TURNS.click();

        let prompt = self.prompt();
        CHAT_PROMPT_BYTES.count(prompt.len() as u64);
        self.last_prompt_bytes = Some(prompt.len());
        self.request_count += 1;

        match self.ai_service.generate(&prompt).await {
            Ok(text) => Ok(text),
            Err(err) => {
                CHAT_BACKEND_ERRORS.click();
                self.error_count += 1;
                Err(err)
            }
        }
    }

    /// The conversation flattened the way it is sent to the backend.
    pub fn prompt(&self) -> String {
        flatten(&self.store)
    }

    /// The recorded turns, in conversation order.
    pub fn messages(&self) -> &[Turn] {
        self.store.all()
    }

    /// The conversation store.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Returns the number of turns in the conversation.
    pub fn message_count(&self) -> usize {
        self.store.len()
    }

    /// The tool-server handles this session was given.
    pub fn clients(&self) -> &BTreeMap<String, ServerHandle> {
        &self.clients
    }

    /// The backend this session relays to.
    pub fn ai_service(&self) -> &S {
        &self.ai_service
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.message_count(),
            total_requests: self.request_count,
            failed_requests: self.error_count,
            last_prompt_bytes: self.last_prompt_bytes,
            server_ids: self.clients.keys().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    /// Records every prompt and replies with a canned answer.
    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl AiService for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("noted".to_string())
        }
    }

    struct Unavailable;

    #[async_trait::async_trait]
    impl AiService for Unavailable {
        async fn generate(&self, _: &str) -> Result<String> {
            Err(Error::service_unavailable("backend down", Some(5)))
        }
    }

    #[test]
    fn new_session_empty() {
        let chat = Chat::new(Recorder::default());
        assert_eq!(chat.message_count(), 0);
        assert_eq!(chat.prompt(), "");
        assert!(chat.clients().is_empty());
        assert_eq!(
            chat.stats(),
            SessionStats {
                message_count: 0,
                total_requests: 0,
                failed_requests: 0,
                last_prompt_bytes: None,
                server_ids: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn each_prompt_carries_all_user_turns() {
        let mut chat = Chat::new(Recorder::default());
        assert_eq!(chat.run("hi").await.unwrap(), "noted");
        assert_eq!(chat.run("and again").await.unwrap(), "noted");

        let prompts = chat.ai_service().prompts.lock().unwrap().clone();
        assert_eq!(prompts, vec!["user: hi\n", "user: hi\nuser: and again\n"]);
    }

    #[tokio::test]
    async fn replies_are_not_recorded() {
        let mut chat = Chat::new(Recorder::default());
        chat.run("one").await.unwrap();
        chat.run("two").await.unwrap();
        chat.run("three").await.unwrap();

        assert_eq!(chat.message_count(), 3);
        assert!(chat.messages().iter().all(|turn| turn.role == Role::User));
        assert_eq!(chat.messages()[2], Turn::user("three"));
    }

    #[tokio::test]
    async fn failure_keeps_user_turn() {
        let mut chat = Chat::new(Unavailable);
        let err = chat.run("ping").await.unwrap_err();
        assert!(err.is_server_error());
        assert_eq!(chat.messages(), &[Turn::user("ping")]);

        let stats = chat.stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.last_prompt_bytes, Some("user: ping\n".len()));
    }

    #[tokio::test]
    async fn dropped_request_keeps_user_turn() {
        struct Never;

        #[async_trait::async_trait]
        impl AiService for Never {
            async fn generate(&self, _: &str) -> Result<String> {
                std::future::pending().await
            }
        }

        let mut chat = Chat::new(Never);
        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(10), chat.run("hello")).await;
        assert!(outcome.is_err());
        assert_eq!(chat.messages(), &[Turn::user("hello")]);
    }
}
