//! # API Client
//!
//! Provides a high-level API for talking to the [`ApiServer`](crate::api_actor::ApiServer).
//! It wraps the request channel and is the [`RemoteApi`] the write actions are given.
use crate::api_actor::{ApiError, ApiRequest};
use async_trait::async_trait;
use record_store::{RemoteApi, SubmitError};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for interacting with the API server.
#[derive(Clone)]
pub struct ApiClient {
    sender: mpsc::Sender<ApiRequest>,
}

impl ApiClient {
    pub fn new(sender: mpsc::Sender<ApiRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self, params))]
    pub async fn write(&self, command: &str, params: Value) -> Result<(), ApiError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ApiRequest::Write {
                command: command.to_string(),
                params,
                respond_to,
            })
            .await
            .map_err(|_| ApiError::ServerClosed)?;
        response.await.map_err(|_| ApiError::ServerDropped)?
    }

    /// Makes every later write of `command` fail with `message`.
    pub async fn fail_command(&self, command: &str, message: &str) -> Result<(), ApiError> {
        self.set_failure(command, Some(message.to_string())).await
    }

    pub async fn clear_failure(&self, command: &str) -> Result<(), ApiError> {
        self.set_failure(command, None).await
    }

    /// Accepted writes, oldest first.
    pub async fn history(&self) -> Result<Vec<(String, Value)>, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ApiRequest::History { respond_to })
            .await
            .map_err(|_| ApiError::ServerClosed)?;
        response.await.map_err(|_| ApiError::ServerDropped)?
    }

    async fn set_failure(&self, command: &str, message: Option<String>) -> Result<(), ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ApiRequest::SetFailure {
                command: command.to_string(),
                message,
                respond_to,
            })
            .await
            .map_err(|_| ApiError::ServerClosed)?;
        response.await.map_err(|_| ApiError::ServerDropped)?
    }
}

#[async_trait]
impl RemoteApi for ApiClient {
    async fn write(&self, command: &str, params: Value) -> Result<(), SubmitError> {
        ApiClient::write(self, command, params)
            .await
            .map_err(|e| match e {
                ApiError::Rejected { message, .. } => SubmitError::new(message),
                other => SubmitError::new(other.to_string()),
            })
    }
}
