//! # Optimistic Writes
//!
//! A [`WriteRequest`] pairs a remote command with three batches of local store updates:
//!
//! 1. **optimistic** - applied before the command is sent, so subscribers see the change at once
//! 2. **success** - applied when the remote accepts the command
//! 3. **failure** - applied when it rejects it, or when the store rejects an optimistic
//!    update (usually rolling back and attaching an error)
//!
//! ```rust
//! use record_store::api::{self, PendingAction, StoreUpdate, WriteRequest};
//! use record_store::{KeyKind, Patch, RecordStore};
//! use record_store::mock::MockRemote;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! const POLICY: KeyKind = KeyKind::new("policy");
//! let store = RecordStore::new();
//! let key = POLICY.member("P1");
//!
//! let remote = MockRemote::new();
//! remote.expect_write("RenamePolicy").return_ok();
//!
//! let request = WriteRequest::new("RenamePolicy", json!({"policyID": "P1", "name": "Team"}))
//!     .optimistic(StoreUpdate::merge(key.clone(), Patch::new()
//!         .with("name", "Team")
//!         .with("pendingAction", PendingAction::Update.as_str())))
//!     .on_success(StoreUpdate::merge(key.clone(), Patch::new().with("pendingAction", json!(null))));
//!
//! api::write(&store, &remote, request).await.unwrap();
//! assert_eq!(store.get(&key), Some(json!({"name": "Team"})));
//! remote.verify();
//! # }
//! ```

use crate::error::{StoreError, SubmitError};
use crate::key::RecordKey;
use crate::store::RecordStore;
use crate::value::Patch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outstanding server round-trip recorded on a record or one of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    Add,
    Update,
    Delete,
}

impl PendingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingAction::Add => "add",
            PendingAction::Update => "update",
            PendingAction::Delete => "delete",
        }
    }
}

/// `{ "<microsecond timestamp>": message }`, the shape stored under `errors`/`errorFields`.
pub fn error_entry(message: &str) -> Value {
    let mut entry = serde_json::Map::new();
    entry.insert(error_key(), Value::String(message.to_string()));
    Value::Object(entry)
}

fn error_key() -> String {
    chrono::Utc::now().timestamp_micros().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    Set(Value),
    Merge(Patch),
    Delete,
}

/// One local store mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreUpdate {
    pub key: RecordKey,
    pub op: UpdateOp,
}

impl StoreUpdate {
    pub fn set(key: RecordKey, value: Value) -> Self {
        Self {
            key,
            op: UpdateOp::Set(value),
        }
    }

    pub fn merge(key: RecordKey, patch: Patch) -> Self {
        Self {
            key,
            op: UpdateOp::Merge(patch),
        }
    }

    pub fn delete(key: RecordKey) -> Self {
        Self {
            key,
            op: UpdateOp::Delete,
        }
    }

    pub fn apply(&self, store: &RecordStore) -> Result<(), StoreError> {
        match &self.op {
            UpdateOp::Set(value) => store.set(&self.key, value.clone()),
            UpdateOp::Merge(patch) => store.merge(&self.key, patch),
            UpdateOp::Delete => {
                store.delete(&self.key);
                Ok(())
            }
        }
    }
}

/// A remote command plus the store updates around it.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub command: String,
    pub params: Value,
    pub optimistic: Vec<StoreUpdate>,
    pub success: Vec<StoreUpdate>,
    pub failure: Vec<StoreUpdate>,
}

impl WriteRequest {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
            optimistic: Vec::new(),
            success: Vec::new(),
            failure: Vec::new(),
        }
    }

    pub fn optimistic(mut self, update: StoreUpdate) -> Self {
        self.optimistic.push(update);
        self
    }

    pub fn on_success(mut self, update: StoreUpdate) -> Self {
        self.success.push(update);
        self
    }

    pub fn on_failure(mut self, update: StoreUpdate) -> Self {
        self.failure.push(update);
        self
    }
}

/// The server side of a [`WriteRequest`].
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn write(&self, command: &str, params: Value) -> Result<(), SubmitError>;
}

#[async_trait]
impl<T: RemoteApi + ?Sized> RemoteApi for Arc<T> {
    async fn write(&self, command: &str, params: Value) -> Result<(), SubmitError> {
        (**self).write(command, params).await
    }
}

/// Applies the optimistic updates, sends the command, then applies the success or failure updates.
///
/// An optimistic update the store rejects aborts the write before anything is sent; the
/// failure updates then run so the updates already applied are rolled back. A success
/// update the store rejects is reported as an error even though the server accepted the
/// command.
pub async fn write<A>(store: &RecordStore, api: &A, request: WriteRequest) -> Result<(), SubmitError>
where
    A: RemoteApi + ?Sized,
{
    let WriteRequest {
        command,
        params,
        optimistic,
        success,
        failure,
    } = request;

    if let Err(e) = apply_all(store, &optimistic) {
        warn!(%command, error = %e, "Optimistic update rejected");
        roll_back(store, &command, &failure);
        return Err(SubmitError::new(e.to_string()));
    }
    debug!(%command, updates = optimistic.len(), "Sending");

    match api.write(&command, params).await {
        Ok(()) => {
            info!(%command, "Write accepted");
            apply_all(store, &success).map_err(|e| {
                warn!(%command, error = %e, "Success update rejected");
                SubmitError::new(e.to_string())
            })
        }
        Err(e) => {
            warn!(%command, error = %e, "Write failed");
            roll_back(store, &command, &failure);
            Err(e)
        }
    }
}

// Each failure update is independent: one rejected rollback must not skip the rest.
fn roll_back(store: &RecordStore, command: &str, failure: &[StoreUpdate]) {
    for update in failure {
        if let Err(e) = update.apply(store) {
            warn!(%command, key = %update.key, error = %e, "Failure update rejected");
        }
    }
}

fn apply_all(store: &RecordStore, updates: &[StoreUpdate]) -> Result<(), StoreError> {
    updates.iter().try_for_each(|update| update.apply(store))
}

/// JSON params helper: most commands carry a handful of string fields.
pub fn params<const N: usize>(fields: [(&str, Value); N]) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in fields {
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}
