//! Classifier and chat responder over JSON HTTP.

use super::{AssistantError, AssistantResult, ChatResponder, IntentClassifier};
use crate::types::SearchIntent;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    reply: String,
}

/// Shared POST-JSON plumbing for both collaborators.
#[derive(Debug, Clone)]
struct JsonEndpoint {
    client: reqwest::Client,
    url: String,
}

impl JsonEndpoint {
    fn new(url: &str, timeout: Duration) -> AssistantResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: DeserializeOwned>(&self, message: &str) -> AssistantResult<T> {
        tracing::trace!("POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&MessageBody { message })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AssistantError::Timeout
                } else {
                    AssistantError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| AssistantError::Decode(e.to_string()))
    }
}

/// Intent classifier service: `POST {"message"}` answered with a `SearchIntent` object.
#[derive(Debug, Clone)]
pub struct HttpIntentClassifier {
    endpoint: JsonEndpoint,
}

impl HttpIntentClassifier {
    pub fn new(url: &str, timeout: Duration) -> AssistantResult<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new(url, timeout)?,
        })
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(&self, utterance: &str) -> AssistantResult<SearchIntent> {
        self.endpoint.post(utterance).await
    }
}

/// Chat service: `POST {"message"}` answered with `{"reply": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpChatResponder {
    endpoint: JsonEndpoint,
}

impl HttpChatResponder {
    pub fn new(url: &str, timeout: Duration) -> AssistantResult<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new(url, timeout)?,
        })
    }
}

#[async_trait]
impl ChatResponder for HttpChatResponder {
    async fn respond(&self, utterance: &str) -> AssistantResult<String> {
        let reply: ChatReply = self.endpoint.post(utterance).await?;
        Ok(reply.reply)
    }
}
