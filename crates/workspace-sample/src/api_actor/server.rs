use super::commands;
use super::error::ApiError;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// One-shot reply channel carried by every request.
pub type Response<T> = oneshot::Sender<Result<T, ApiError>>;

/// Messages the API server understands.
#[derive(Debug)]
pub enum ApiRequest {
    Write {
        command: String,
        params: Value,
        respond_to: Response<()>,
    },
    /// Makes every later `command` fail with `message`; `None` lifts it.
    SetFailure {
        command: String,
        message: Option<String>,
        respond_to: Response<()>,
    },
    History {
        respond_to: Response<Vec<(String, Value)>>,
    },
}

/// Stand-in for the remote backend: validates commands, records them, and answers.
///
/// Requests are handled one at a time in arrival order, so the history is the order the
/// server accepted writes in.
pub struct ApiServer {
    receiver: mpsc::Receiver<ApiRequest>,
    failures: HashMap<String, String>,
    history: Vec<(String, Value)>,
    latency: Duration,
}

impl ApiServer {
    pub fn new(receiver: mpsc::Receiver<ApiRequest>, latency: Duration) -> Self {
        Self {
            receiver,
            failures: HashMap::new(),
            history: Vec::new(),
            latency,
        }
    }

    /// Runs until every client has been dropped.
    pub async fn run(mut self) {
        info!(latency_ms = self.latency.as_millis() as u64, "API server started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ApiRequest::Write {
                    command,
                    params,
                    respond_to,
                } => {
                    debug!(%command, %params, "Write");
                    if !self.latency.is_zero() {
                        tokio::time::sleep(self.latency).await;
                    }
                    let result = self.handle_write(&command, params);
                    match &result {
                        Ok(()) => info!(%command, accepted = self.history.len(), "Write ok"),
                        Err(e) => warn!(%command, error = %e, "Write failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ApiRequest::SetFailure {
                    command,
                    message,
                    respond_to,
                } => {
                    match message {
                        Some(message) => {
                            debug!(%command, %message, "Failure injected");
                            self.failures.insert(command, message);
                        }
                        None => {
                            debug!(%command, "Failure cleared");
                            self.failures.remove(&command);
                        }
                    }
                    let _ = respond_to.send(Ok(()));
                }
                ApiRequest::History { respond_to } => {
                    let _ = respond_to.send(Ok(self.history.clone()));
                }
            }
        }

        info!(accepted = self.history.len(), "API server stopped");
    }

    fn handle_write(&mut self, command: &str, params: Value) -> Result<(), ApiError> {
        let required = commands::required_params(command)
            .ok_or_else(|| ApiError::UnknownCommand(command.to_string()))?;
        for name in required {
            match params.get(*name) {
                Some(Value::Null) | None => {
                    return Err(ApiError::InvalidParams {
                        command: command.to_string(),
                        reason: format!("missing {}", name),
                    })
                }
                Some(_) => {}
            }
        }
        if let Some(message) = self.failures.get(command) {
            return Err(ApiError::Rejected {
                command: command.to_string(),
                message: message.clone(),
            });
        }
        self.history.push((command.to_string(), params));
        Ok(())
    }
}
