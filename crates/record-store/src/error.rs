//! # Store Errors
//!
//! Error types shared by the store, the form layer and the remote collaborators.
//! A record that simply doesn't exist is *not* an error: reads return `None` and
//! bindings hold an absent snapshot. [`StoreError::NotFound`] only comes from
//! [`RecordStore::require`](crate::RecordStore::require).

use crate::form::{FieldErrors, FormState};
use crate::key::RecordKey;

/// Errors raised by [`RecordStore`](crate::RecordStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record {key} rejected by schema: {reason}")]
    Validation { key: RecordKey, reason: String },
    #[error("Record not found: {0}")]
    NotFound(RecordKey),
    #[error("Record {key} could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by an external submit or write collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SubmitError {
    message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`Form`](crate::Form) operations.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Form has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("Submit failed: {0}")]
    Submit(#[from] SubmitError),
    #[error("Cannot {action} while the form is {state}")]
    InvalidState {
        action: &'static str,
        state: FormState,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
