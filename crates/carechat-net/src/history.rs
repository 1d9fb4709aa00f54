//! Conversation history API client.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;
use url::Url;

use carechat_shared::types::{Conversation, ConversationId, Message};

use crate::error::ApiError;

/// Read side of the REST history API.
pub trait HistoryApi: Send + Sync {
    /// `GET conversations`
    fn list_conversations(&self) -> BoxFuture<'_, Result<Vec<Conversation>, ApiError>>;

    /// `GET conversations/{id}/messages`
    fn list_messages<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, ApiError>>;
}

/// [`HistoryApi`] over HTTP + JSON.
#[derive(Debug, Clone)]
pub struct HttpHistoryApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpHistoryApi {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::NotABase(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::NotABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl HistoryApi for HttpHistoryApi {
    fn list_conversations(&self) -> BoxFuture<'_, Result<Vec<Conversation>, ApiError>> {
        async move {
            let url = self.endpoint(&["conversations"])?;
            debug!(url = %url, "Fetching conversation list");

            let conversations = self
                .client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<Conversation>>()
                .await?;
            Ok(conversations)
        }
        .boxed()
    }

    fn list_messages<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, ApiError>> {
        async move {
            let url = self.endpoint(&["conversations", conversation_id.as_str(), "messages"])?;
            debug!(url = %url, conversation = %conversation_id, "Fetching message history");

            let messages = self
                .client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<Message>>()
                .await?;
            Ok(messages)
        }
        .boxed()
    }
}
