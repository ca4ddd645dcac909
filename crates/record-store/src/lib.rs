//! # Record Store
//!
//! A keyed, in-memory store of JSON records that views subscribe to, plus the two layers
//! built on top of it:
//!
//! - **bindings** ([`Consumer`]) resolve store keys from route parameters and keep each
//!   mounted view supplied with the current value of the records it depends on;
//! - **forms** ([`Form`]) edit a private draft of a record and commit it in one merge once
//!   an external submit succeeds.
//!
//! ## Why a subscribed store?
//!
//! Views never fetch. They declare which keys they read and the store pushes every change
//! to them, so any number of views showing the same record stay in step without talking
//! to each other. Writes come from anywhere (user actions, server responses, other views)
//! and all go through the same three mutations: `set`, `merge` and `delete`.
//!
//! **Further Reading**:
//! - [Observer pattern (Wikipedia)](https://en.wikipedia.org/wiki/Observer_pattern)
//! - [Optimistic UI](https://www.apollographql.com/docs/react/performance/optimistic-ui/) - the write flow [`api::write`] implements
//!
//! ## Architecture Overview
//!
//! 1. **Store Layer** ([`RecordStore`]) - committed records, subscriber registry, FIFO delivery
//! 2. **Binding Layer** ([`Consumer`], [`LiveValue`]) - per-view subscriptions keyed by route params
//! 3. **Form Layer** ([`Form`]) - drafts, validation, submit-then-commit
//! 4. **Remote Layer** ([`api`]) - optimistic/success/failure updates around a server command
//!
//! ## Keys
//!
//! Record kinds are declared once as constants. A kind with an id is a collection member
//! (`policy_P1`); a kind without one is a single record (`session`).
//!
//! ```rust
//! use record_store::{KeyKind, KeySpec, RecordKey, RecordStore};
//! use serde_json::json;
//!
//! const POLICY: KeyKind = KeyKind::new("policy");
//! const SESSION: KeyKind = KeyKind::new("session");
//!
//! let store = RecordStore::new();
//! store.set(&POLICY.member("P1"), json!({"name": "Team"})).unwrap();
//! store.set(&RecordKey::single(SESSION), json!({"email": "a@b.c"})).unwrap();
//!
//! let all = store.collection(&POLICY);
//! assert_eq!(all.len(), 1);
//! assert!(KeySpec::from(POLICY).matches(&POLICY.member("P2")));
//! ```
//!
//! ## Binding a view
//!
//! ```rust
//! use record_store::{Consumer, KeyKind, KeyResolver, RecordStore, RouteParams};
//! use serde_json::json;
//!
//! const POLICY: KeyKind = KeyKind::new("policy");
//!
//! let store = RecordStore::new();
//! store.set(&POLICY.member("P1"), json!({"name": "Team"})).unwrap();
//!
//! let params = RouteParams::from([("policyID".to_string(), "P1".to_string())]);
//! let mut view = Consumer::mount(&store, "PolicyPage", params);
//! let policy = view.bind(KeyResolver::from_param("policyID", POLICY));
//! assert_eq!(policy.record(), Some(json!({"name": "Team"})));
//!
//! view.unmount();
//! assert_eq!(store.subscriber_count(), 0);
//! ```
//!
//! ## Concurrency Model
//!
//! - The store is a cloneable handle around one mutex; every mutation is atomic
//! - Callbacks run outside the lock, one at a time, in commit order
//! - A callback may write to the store; that write is delivered after the current callback returns
//! - [`LiveValue`] is a `tokio::sync::watch` receiver, so async tasks can `await` changes
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockRemote`](mock::MockRemote), [`MockSubmit`](mock::MockSubmit)
//! and [`Recorder`](mock::Recorder) for deterministic tests without a server.

pub mod api;
pub mod binding;
pub mod config;
pub mod error;
pub mod form;
pub mod key;
pub mod mock;
pub mod schema;
pub mod store;
pub mod subscription;
pub mod tracing;
pub mod value;

// Re-export core types for convenience
pub use api::{PendingAction, RemoteApi, StoreUpdate, UpdateOp, WriteRequest};
pub use binding::{Bound, Consumer, KeyResolver, LiveValue, RouteParams};
pub use config::StoreConfig;
pub use error::{FormError, StoreError, SubmitError};
pub use form::{
    submit_fn, CommitLocally, FieldErrors, FieldState, Form, FormState, FormSubmit, SubmitFn,
    Validator,
};
pub use key::{KeyKind, KeySpec, RecordKey};
pub use schema::{RecordSchema, TypedSchema};
pub use store::{RecordStore, Snapshot};
pub use subscription::SubscriptionHandle;
pub use value::{Draft, Fields, Patch};
