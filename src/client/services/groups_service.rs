use log::debug;

use crate::common::error::ChatError;
use crate::common::models::GroupSummary;

/// Read-only group listing, enough to pick a group and open its chat.
pub struct GroupsService {
    http: reqwest::Client,
    api_base_url: String,
}

impl GroupsService {
    pub fn new(api_base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url,
        }
    }

    pub async fn list(&self) -> Result<Vec<GroupSummary>, ChatError> {
        let url = format!("{}/api/groups", self.api_base_url.trim_end_matches('/'));
        debug!("[GROUPS] GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Fetch(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatError::Fetch(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChatError::Fetch(format!("invalid response body: {}", e)))
    }
}
