use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::Message, protocol::NewMessage};
use tracing::debug;
use url::Url;

use crate::error::{Operation, SyncError};

/// The remote board as seen by the sync controller.
#[async_trait]
pub trait BoardTransport: Send + Sync {
    async fn list_messages(&self) -> Result<Vec<Message>, SyncError>;
    async fn post_message(&self, message: &NewMessage) -> Result<(), SyncError>;
}

/// `BoardTransport` over plain HTTP/JSON against a single endpoint.
pub struct HttpBoardTransport {
    http: Client,
    endpoint: Url,
}

impl HttpBoardTransport {
    pub fn new(endpoint: Url, request_timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl BoardTransport for HttpBoardTransport {
    async fn list_messages(&self) -> Result<Vec<Message>, SyncError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                operation: Operation::Fetch,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(SyncError::from_transport)?;
        let messages = decode_snapshot(&bytes)?;
        debug!(count = messages.len(), "decoded message snapshot");
        Ok(messages)
    }

    async fn post_message(&self, message: &NewMessage) -> Result<(), SyncError> {
        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                operation: Operation::Submit,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Decodes a `GET` body. Anything other than a JSON array is rejected before
/// individual records are looked at.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Vec<Message>, SyncError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|err| SyncError::Decode(err.to_string()))?;
    if !value.is_array() {
        return Err(SyncError::UnexpectedShape);
    }
    serde_json::from_value(value).map_err(|err| SyncError::Decode(err.to_string()))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
