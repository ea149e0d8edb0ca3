use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use standup_core::config::BackendConfig;
use standup_core::{Channel, ChannelPreference, SavedSelection, Workspace, WorkspaceId};
use tracing::debug;

use crate::store::{PreferenceStore, StoreError};

/// `PreferenceStore` backed by the backend HTTP API.
#[derive(Clone, Debug)]
pub struct HttpPreferenceStore {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelsBody {
    #[serde(default)]
    channels: Option<Vec<Channel>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelectionBody {
    #[serde(default)]
    selected_channel: Option<SavedSelection>,
}

impl HttpPreferenceStore {
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|_| StoreError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(base_url.to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|error| StoreError::Unreachable(error.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        Self::new(&config.base_url, config.request_timeout_secs.map(Duration::from_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Percent-encodes each segment, so workspace ids can never alter the route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response, StoreError> {
        debug!(event_name = "client.http.request", method = "GET", url = %url, "backend request");
        self.client.get(url).send().await.map_err(|error| StoreError::Unreachable(error.to_string()))
    }

    /// Root health probe used by `doctor`.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let response = self.get(self.base_url.clone()).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}

async fn rejection(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let reason = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|reason| !reason.trim().is_empty());
    StoreError::Rejected { status, reason }
}

#[async_trait]
impl PreferenceStore for HttpPreferenceStore {
    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError> {
        let url = self.endpoint(&["workspaces", workspace_id.as_str()])?;
        let response = self.get(url).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        response.json::<Workspace>().await.map_err(|error| StoreError::Malformed(error.to_string()))
    }

    async fn list_channels(&self, workspace_id: &WorkspaceId) -> Result<Vec<Channel>, StoreError> {
        let url = self.endpoint(&["api", "channels", workspace_id.as_str()])?;
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let body = response
            .json::<ChannelsBody>()
            .await
            .map_err(|error| StoreError::Malformed(error.to_string()))?;
        match body.channels {
            Some(channels) => Ok(channels),
            None => Err(StoreError::Rejected { status: status.as_u16(), reason: body.error }),
        }
    }

    async fn get_saved_selection(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Option<SavedSelection>, StoreError> {
        let url = self.endpoint(&["api", "workspace", workspace_id.as_str(), "channel"])?;
        let response = self.get(url).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response
            .json::<SelectionBody>()
            .await
            .map_err(|error| StoreError::Malformed(error.to_string()))?;
        Ok(body.selected_channel.filter(|selection| !selection.id.trim().is_empty()))
    }

    async fn save_preference(
        &self,
        workspace_id: &WorkspaceId,
        preference: &ChannelPreference,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "channels", workspace_id.as_str()])?;
        debug!(event_name = "client.http.request", method = "POST", url = %url, "backend request");
        let response = self
            .client
            .post(url)
            .json(preference)
            .send()
            .await
            .map_err(|error| StoreError::Unreachable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}
