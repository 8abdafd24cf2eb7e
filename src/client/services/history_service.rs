use log::{debug, warn};

use crate::common::error::ChatError;
use crate::common::models::{ChatMessage, WireMessage};

/// Fetches the persisted chat history of a group over REST, before the live
/// subscription takes over.
pub struct HistoryService {
    http: reqwest::Client,
    api_base_url: String,
}

impl HistoryService {
    pub fn new(api_base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url,
        }
    }

    /// Load the messages of `group_id`, oldest first.
    ///
    /// The backend already orders by creation time; we sort again rather
    /// than trust it. Any network failure or non-2xx status maps to
    /// [`ChatError::Fetch`] and the caller treats the group as having no
    /// usable history until a retry.
    pub async fn fetch(&self, group_id: i64) -> Result<Vec<ChatMessage>, ChatError> {
        let url = format!(
            "{}/api/v1/groups/{}/chat/messages",
            self.api_base_url.trim_end_matches('/'),
            group_id
        );
        debug!("[HISTORY] GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Fetch(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!(
                "[HISTORY] group {}: server returned {}",
                group_id,
                response.status()
            );
            return Err(ChatError::Fetch(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let wire: Vec<WireMessage> = response
            .json()
            .await
            .map_err(|e| ChatError::Fetch(format!("invalid response body: {}", e)))?;

        let mut messages: Vec<ChatMessage> = wire
            .into_iter()
            .map(|w| ChatMessage::from_wire(w, group_id))
            .collect();
        messages.sort_by_key(|m| m.sort_key());

        debug!(
            "[HISTORY] group {}: loaded {} messages",
            group_id,
            messages.len()
        );
        Ok(messages)
    }
}
