//! Conversational collaborators: the intent classifier and the chat responder.

pub mod http;

pub use http::{HttpChatResponder, HttpIntentClassifier};

use crate::search::tokenize::{normalize, strip_punctuation};
use crate::types::{SearchFilters, SearchIntent};
use async_trait::async_trait;
use thiserror::Error;

/// Error returned by a classifier or responder call.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant request timed out")]
    Timeout,
    #[error("assistant transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant returned status {status}")]
    Status { status: u16 },
    #[error("failed to decode assistant payload: {0}")]
    Decode(String),
}

pub type AssistantResult<T> = std::result::Result<T, AssistantError>;

/// Turns an utterance into a structured intent. One attempt per request.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, utterance: &str) -> AssistantResult<SearchIntent>;
}

/// Free-form reply for utterances that are not searches.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, utterance: &str) -> AssistantResult<String>;
}

/// Treats every non-greeting utterance as a filterless search over its own text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughClassifier;

const GREETINGS: &[&str] = &["xin chao", "chao shop", "chao ban", "hello", "hi", "cam on"];

#[async_trait]
impl IntentClassifier for PassthroughClassifier {
    async fn classify(&self, utterance: &str) -> AssistantResult<SearchIntent> {
        let query = strip_punctuation(utterance);
        let normalized = normalize(&query);
        if normalized.is_empty() || GREETINGS.contains(&normalized.as_str()) {
            return Ok(SearchIntent::chat());
        }
        Ok(SearchIntent::search(query, SearchFilters::default()))
    }
}

/// Reply used when no chat responder is configured or the configured one fails.
pub const DEFAULT_GREETING: &str =
    "Chào bạn! Mình là trợ lý của shop. Bạn đang tìm nến thơm, tinh dầu hay quà tặng nào ạ?";

/// Replies with a fixed text.
#[derive(Debug, Clone)]
pub struct CannedResponder {
    reply: String,
}

impl CannedResponder {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}

#[async_trait]
impl ChatResponder for CannedResponder {
    async fn respond(&self, _utterance: &str) -> AssistantResult<String> {
        Ok(self.reply.clone())
    }
}
