use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, HistoryEntry, SaveMessageRequest};
use crate::error::ApiError;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: Option<String>,
    /// Base64-encoded PNG.
    pub graph: Option<String>,
    pub is_sender: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            graph: None,
            is_sender: true,
        }
    }

    pub fn bot_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            graph: None,
            is_sender: false,
        }
    }

    pub fn bot_graph(graph: impl Into<String>) -> Self {
        Self {
            text: None,
            graph: Some(graph.into()),
            is_sender: false,
        }
    }

    /// `src` attribute for the graph image.
    pub fn graph_src(&self) -> Option<String> {
        self.graph
            .as_deref()
            .filter(|g| !g.is_empty())
            .map(|g| format!("data:image/png;base64,{g}"))
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.as_deref().map(|t| t.split('\n').collect()).unwrap_or_default()
    }
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            text: entry.message.filter(|m| !m.is_empty()),
            graph: entry.graph.filter(|g| !g.is_empty()),
            is_sender: entry.is_sender,
        }
    }
}

/// Whether `messages[index]` continues a run from the same side.
pub fn continues_run(messages: &[ChatMessage], index: usize) -> bool {
    index > 0
        && messages
            .get(index)
            .zip(messages.get(index - 1))
            .is_some_and(|(current, previous)| current.is_sender == previous.is_sender)
}

/// Avatar text: the first two characters of the email, upper-cased.
pub fn initials(email: &str) -> String {
    email.chars().take(2).collect::<String>().to_uppercase()
}

/// Returns the prompt to send, or `None` for blank input.
pub fn prompt_from_input(input: &str) -> Option<&str> {
    if input.trim().is_empty() {
        None
    } else {
        Some(input)
    }
}

#[derive(Debug, Clone)]
pub struct ChatService {
    api: ApiClient,
    session: SessionStore,
}

impl ChatService {
    pub fn new(api: ApiClient) -> Self {
        let session = api.http().session().clone();
        Self { api, session }
    }

    pub async fn load_history(&self) -> Result<Vec<ChatMessage>, ApiError> {
        let Some(session_id) = self.session.session_id() else {
            tracing::warn!("no chat session id stored, skipping history");
            return Ok(Vec::new());
        };
        let history = self.api.chat_history(&session_id).await?;
        Ok(history.messages.into_iter().map(ChatMessage::from).collect())
    }

    /// Sends `prompt` and returns the bot's reply messages.
    ///
    /// The turn is persisted afterwards; persistence failures are logged and
    /// do not discard the reply.
    pub async fn send_prompt(&self, prompt: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let user_id = self.session.user_id().unwrap_or_default();
        let reply = self.api.chatbot(&user_id, prompt).await?;

        let mut messages = Vec::new();
        if let Some(text) = reply.description.as_deref() {
            messages.push(ChatMessage::bot_text(text));
        }
        if let Some(graph) = reply.graph.as_deref().filter(|g| !g.is_empty()) {
            messages.push(ChatMessage::bot_graph(graph));
        }

        if let Err(e) = self.persist_turn(prompt, &messages).await {
            tracing::warn!(error = %e, "failed to persist chat turn");
        }
        Ok(messages)
    }

    async fn persist_turn(&self, prompt: &str, replies: &[ChatMessage]) -> Result<(), ApiError> {
        let session_id = self.session.session_id().unwrap_or_default();
        self.api
            .save_message(&SaveMessageRequest {
                message_text: Some(prompt),
                graph: None,
                session_id: &session_id,
                is_sender: true,
            })
            .await?;
        for reply in replies {
            self.api
                .save_message(&SaveMessageRequest {
                    message_text: reply.text.as_deref(),
                    graph: reply.graph.as_deref(),
                    session_id: &session_id,
                    is_sender: false,
                })
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_use_the_first_two_characters() {
        assert_eq!(initials("ana@example.com"), "AN");
        assert_eq!(initials("é"), "É");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn blank_prompts_are_dropped() {
        assert_eq!(prompt_from_input("  \n"), None);
        assert_eq!(prompt_from_input(" hi "), Some(" hi "));
    }

    #[test]
    fn runs_group_consecutive_messages_from_one_side() {
        let messages = vec![
            ChatMessage::user("a"),
            ChatMessage::bot_text("b"),
            ChatMessage::bot_graph("iVBOR"),
        ];
        assert!(!continues_run(&messages, 0));
        assert!(!continues_run(&messages, 1));
        assert!(continues_run(&messages, 2));
        assert!(!continues_run(&messages, 3));
    }

    #[test]
    fn history_entries_become_messages() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"message":"","graph":"iVBOR","is_sender":false}"#).unwrap();
        let message = ChatMessage::from(entry);
        assert_eq!(message.text, None);
        assert_eq!(message.graph_src().as_deref(), Some("data:image/png;base64,iVBOR"));
        assert_eq!(ChatMessage::user("one\ntwo").lines(), vec!["one", "two"]);
    }
}
