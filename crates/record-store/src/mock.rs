//! # Mocks & Testing Guide
//!
//! [`MockRemote`] and [`MockSubmit`] stand in for the server behind [`api::write`](crate::api::write)
//! and [`Form::submit`](crate::Form::submit). Each answers from a queue of expectations set up
//! front, records what it received, and [`verify`](MockRemote::verify)s that nothing is left over.
//! [`Recorder`] collects the snapshots a subscription receives.
//!
//! ## When to use what
//!
//! | Need | Tool |
//! |------|------|
//! | Succeed or fail a remote write | `MockRemote::expect_write(cmd).return_ok()` / `.return_err(e)` |
//! | Hold a write in flight | `MockRemote::expect_write(cmd).respond_later()` |
//! | Succeed or fail a form submit | `MockSubmit::expect_submit().return_ok()` / `.return_err(e)` |
//! | Assert deliveries | `Recorder::callback()` passed to `subscribe` |
//!
//! ## Example
//!
//! ```rust
//! use record_store::mock::{MockSubmit, Recorder};
//! use record_store::{Form, KeyKind, RecordStore, SubmitError};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! const RATE: KeyKind = KeyKind::new("rate");
//! let store = RecordStore::new();
//! let key = RATE.member("r1");
//! store.set(&key, json!({"rate": 100})).unwrap();
//!
//! let recorder = Recorder::new();
//! let _sub = store.subscribe(key.clone(), recorder.callback());
//!
//! let submit = MockSubmit::new();
//! submit.expect_submit().return_err(SubmitError::new("offline"));
//! submit.expect_submit().return_ok();
//!
//! let mut form = Form::new("rate", &store, submit.clone()).bound_to(key.clone());
//! form.set_field("rate", 120);
//! assert!(form.submit().await.is_err());
//! form.submit().await.unwrap();
//!
//! // Initial delivery + one commit; the failed attempt wrote nothing.
//! assert_eq!(recorder.len(), 2);
//! assert_eq!(submit.received().len(), 2);
//! submit.verify();
//! # }
//! ```

use crate::api::RemoteApi;
use crate::error::SubmitError;
use crate::form::FormSubmit;
use crate::store::Snapshot;
use crate::value::Patch;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Reply = Result<(), SubmitError>;

enum Response {
    Ready(Reply),
    Later(oneshot::Receiver<Reply>),
}

impl Response {
    async fn resolve(self) -> Reply {
        match self {
            Response::Ready(reply) => reply,
            Response::Later(rx) => rx
                .await
                .unwrap_or_else(|_| Err(SubmitError::new("mock response dropped"))),
        }
    }
}

struct Expectation {
    command: Option<String>,
    response: Response,
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder returned by `expect_*`; finish it with one of the `return_*` methods.
pub struct ExpectationBuilder {
    command: Option<String>,
    expectations: Queue,
}

impl ExpectationBuilder {
    pub fn return_ok(self) {
        self.push(Response::Ready(Ok(())));
    }

    pub fn return_err(self, error: SubmitError) {
        self.push(Response::Ready(Err(error)));
    }

    /// The call stays pending until the returned sender is used (or dropped, which fails it).
    pub fn respond_later(self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.push(Response::Later(rx));
        tx
    }

    fn push(self, response: Response) {
        lock(&self.expectations).push_back(Expectation {
            command: self.command,
            response,
        });
    }
}

fn next_expectation(expectations: &Queue, command: Option<&str>) -> Response {
    let expectation = lock(expectations).pop_front();
    match expectation {
        Some(exp) if exp.command.is_none() || exp.command.as_deref() == command => exp.response,
        Some(exp) => panic!(
            "Unexpected request {:?}, expected {:?}",
            command, exp.command
        ),
        None => panic!("Unexpected request {:?}: no expectations left", command),
    }
}

fn verify_queue(expectations: &Queue) {
    let remaining = lock(expectations).len();
    if remaining > 0 {
        panic!("Not all expectations were met. {} remaining", remaining);
    }
}

/// In-memory [`RemoteApi`].
#[derive(Clone, Default)]
pub struct MockRemote {
    expectations: Queue,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a write of `command`.
    pub fn expect_write(&self, command: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            command: Some(command.to_string()),
            expectations: self.expectations.clone(),
        }
    }

    /// Every `(command, params)` received so far.
    pub fn received(&self) -> Vec<(String, Value)> {
        lock(&self.received).clone()
    }

    pub fn verify(&self) {
        verify_queue(&self.expectations);
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn write(&self, command: &str, params: Value) -> Result<(), SubmitError> {
        lock(&self.received).push((command.to_string(), params));
        next_expectation(&self.expectations, Some(command)).resolve().await
    }
}

/// In-memory [`FormSubmit`].
#[derive(Clone, Default)]
pub struct MockSubmit {
    expectations: Queue,
    received: Arc<Mutex<Vec<Patch>>>,
}

impl MockSubmit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_submit(&self) -> ExpectationBuilder {
        ExpectationBuilder {
            command: None,
            expectations: self.expectations.clone(),
        }
    }

    pub fn received(&self) -> Vec<Patch> {
        lock(&self.received).clone()
    }

    pub fn verify(&self) {
        verify_queue(&self.expectations);
    }
}

#[async_trait]
impl FormSubmit for MockSubmit {
    async fn submit(&self, patch: Patch) -> Result<(), SubmitError> {
        lock(&self.received).push(patch);
        next_expectation(&self.expectations, None).resolve().await
    }
}

/// Collects every snapshot delivered to a subscription.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber callback feeding this recorder.
    pub fn callback(&self) -> impl FnMut(&Snapshot) + Send + 'static {
        let seen = self.seen.clone();
        move |snapshot: &Snapshot| lock(&seen).push(snapshot.clone())
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        lock(&self.seen).clone()
    }

    pub fn last(&self) -> Option<Snapshot> {
        lock(&self.seen).last().cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.seen).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.seen).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_remote_answers_in_order() {
        let remote = MockRemote::new();
        remote.expect_write("A").return_ok();
        remote.expect_write("B").return_err(SubmitError::new("nope"));

        assert!(remote.write("A", json!({"x": 1})).await.is_ok());
        assert_eq!(remote.write("B", json!({})).await, Err(SubmitError::new("nope")));
        assert_eq!(remote.received()[0], ("A".to_string(), json!({"x": 1})));
        remote.verify();
    }

    #[tokio::test]
    async fn test_respond_later_holds_the_call() {
        let remote = MockRemote::new();
        let release = remote.expect_write("Slow").respond_later();

        let api = remote.clone();
        let call = tokio::spawn(async move { api.write("Slow", json!(null)).await });
        tokio::task::yield_now().await;
        assert!(!call.is_finished());

        release.send(Ok(())).unwrap();
        assert!(call.await.unwrap().is_ok());
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_verify_reports_leftovers() {
        let submit = MockSubmit::new();
        submit.expect_submit().return_ok();
        submit.verify();
    }
}
