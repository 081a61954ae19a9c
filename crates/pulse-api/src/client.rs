//! REST client backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{ConversationId, MessagePair};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::errors::ApiError;
use crate::traits::{ChatApi, NotificationPreferences, PreferencesApi};

/// Talks to the backend under `{origin}/api/`.
#[derive(Clone, Debug)]
pub struct RestClient {
    client: reqwest::Client,
    base: Url,
}

impl RestClient {
    /// Client for `origin` with a per-request `timeout`.
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(origin).map_err(|e| ApiError::Request(format!("{origin:?}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::Request(format!(
                "{origin:?}: unsupported scheme {}",
                base.scheme()
            )));
        }
        base.set_path("/api/");
        base.set_query(None);
        base.set_fragment(None);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Base URL every request path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Request(format!("{path}: {e}")))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return serde_json::from_value(Value::Null).map_err(|e| ApiError::Decode(e.to_string()));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatApi for RestClient {
    async fn send_message(
        &self,
        conversation: ConversationId,
        content: &str,
    ) -> Result<MessagePair, ApiError> {
        let url = self.url(&format!("v1/chat/conversations/{conversation}/message"))?;
        debug!(%conversation, "sending chat message over HTTP");
        self.execute(self.client.post(url).json(&json!({ "content": content })))
            .await
    }
}

#[async_trait]
impl PreferencesApi for RestClient {
    async fn load_notification_preferences(&self) -> Result<NotificationPreferences, ApiError> {
        let url = self.url("v1/settings")?;
        let settings: Value = self.execute(self.client.get(url)).await?;
        Ok(NotificationPreferences::from_settings(&settings))
    }

    async fn save_preference(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let url = self.url("v1/settings")?;
        let mut body = serde_json::Map::new();
        let _ = body.insert(key.to_string(), Value::String(value.to_string()));
        let _: Value = self.execute(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}
