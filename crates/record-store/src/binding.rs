//! # Consumers and Live Values
//!
//! A [`Consumer`] is the subscription scope of one mounted screen. Each call to
//! [`Consumer::bind`] subscribes to a key and returns a [`LiveValue`]: a cache of the
//! latest snapshot that can be read synchronously or awaited for changes. The cache holds
//! the current value as soon as `bind` returns, even while another thread is delivering.
//!
//! Keys may depend on route parameters. A binding created from a [`KeyResolver`] is
//! re-resolved whenever [`Consumer::set_params`] is called; if the resolved key changed,
//! the old subscription is disposed before the new one delivers its first value, so the
//! live value never goes stale and never sees the old key again.
//!
//! Unmounting (or dropping) the consumer disposes every subscription it holds.
//!
//! ```rust
//! use record_store::{Consumer, KeyKind, KeyResolver, RecordStore, RouteParams};
//! use serde_json::json;
//!
//! const POLICY: KeyKind = KeyKind::new("policy");
//!
//! let store = RecordStore::new();
//! store.set(&POLICY.member("A1"), json!({"name": "Team A"})).unwrap();
//! store.set(&POLICY.member("B2"), json!({"name": "Team B"})).unwrap();
//!
//! let params = RouteParams::from([("policyID".to_string(), "A1".to_string())]);
//! let mut page = Consumer::mount(&store, "PolicyPage", params);
//! let policy = page.bind(KeyResolver::from_param("policyID", POLICY));
//! assert_eq!(policy.record(), Some(json!({"name": "Team A"})));
//!
//! page.set_params(RouteParams::from([("policyID".to_string(), "B2".to_string())]));
//! assert_eq!(policy.record(), Some(json!({"name": "Team B"})));
//!
//! page.unmount();
//! assert_eq!(store.subscriber_count(), 0);
//! ```

use crate::error::StoreError;
use crate::key::{KeyKind, KeySpec, RecordKey};
use crate::store::{RecordStore, Snapshot};
use crate::subscription::SubscriptionHandle;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Navigation parameters of the mounted screen (`policyID` → `"123"`).
pub type RouteParams = BTreeMap<String, String>;

type Resolve = Box<dyn Fn(&RouteParams) -> Option<KeySpec> + Send + Sync>;

/// How a binding finds its key.
pub enum KeyResolver {
    Fixed(KeySpec),
    FromParams(Resolve),
}

impl KeyResolver {
    pub fn from_params<F>(resolve: F) -> Self
    where
        F: Fn(&RouteParams) -> Option<KeySpec> + Send + Sync + 'static,
    {
        KeyResolver::FromParams(Box::new(resolve))
    }

    /// Member of `kind` whose id is the route parameter `param`.
    pub fn from_param(param: &'static str, kind: KeyKind) -> Self {
        Self::from_params(move |params| {
            params
                .get(param)
                .filter(|id| !id.is_empty())
                .map(|id| KeySpec::Record(kind.member(id.as_str())))
        })
    }

    fn resolve(&self, params: &RouteParams) -> Option<KeySpec> {
        match self {
            KeyResolver::Fixed(spec) => Some(spec.clone()),
            KeyResolver::FromParams(resolve) => resolve(params),
        }
    }
}

impl From<KeySpec> for KeyResolver {
    fn from(spec: KeySpec) -> Self {
        KeyResolver::Fixed(spec)
    }
}

impl From<RecordKey> for KeyResolver {
    fn from(key: RecordKey) -> Self {
        KeyResolver::Fixed(KeySpec::Record(key))
    }
}

impl From<KeyKind> for KeyResolver {
    fn from(kind: KeyKind) -> Self {
        KeyResolver::Fixed(KeySpec::Collection(kind))
    }
}

/// Latest snapshot of a binding together with the key it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub key: Option<KeySpec>,
    pub snapshot: Snapshot,
}

impl Bound {
    fn absent(key: Option<KeySpec>) -> Self {
        Self {
            key,
            snapshot: Snapshot::Record(None),
        }
    }
}

/// Read side of a binding. Cheap to clone; every clone sees the same cache.
#[derive(Debug, Clone)]
pub struct LiveValue {
    rx: watch::Receiver<Bound>,
}

impl LiveValue {
    pub fn current(&self) -> Bound {
        self.rx.borrow().clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().snapshot.clone()
    }

    /// Key currently bound, `None` when the route doesn't name one.
    pub fn key(&self) -> Option<KeySpec> {
        self.rx.borrow().key.clone()
    }

    pub fn record(&self) -> Option<Value> {
        self.rx.borrow().snapshot.record().cloned()
    }

    pub fn is_absent(&self) -> bool {
        self.rx.borrow().snapshot.is_absent()
    }

    /// Current record decoded into `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        let bound = self.rx.borrow();
        match bound.snapshot.record() {
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: bound
                        .key
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Waits for the next update. Returns `false` once the owning consumer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

struct Binding {
    resolver: KeyResolver,
    key: Option<KeySpec>,
    handle: Option<SubscriptionHandle>,
    sink: Arc<watch::Sender<Bound>>,
}

impl Binding {
    fn attach(&mut self, store: &RecordStore, key: Option<KeySpec>) {
        if let Some(old) = self.handle.take() {
            old.dispose();
        }
        self.key = key.clone();
        match key {
            Some(spec) => {
                let sink = Arc::clone(&self.sink);
                let bound_key = spec.clone();
                self.handle = Some(store.subscribe_in_place(spec, move |snapshot: &Snapshot| {
                    sink.send_replace(Bound {
                        key: Some(bound_key.clone()),
                        snapshot: snapshot.clone(),
                    });
                }));
            }
            None => {
                self.sink.send_replace(Bound::absent(None));
            }
        }
    }
}

/// Subscription scope of one mounted screen.
pub struct Consumer {
    name: String,
    store: RecordStore,
    params: RouteParams,
    bindings: Vec<Binding>,
}

impl Consumer {
    pub fn mount(store: &RecordStore, name: impl Into<String>, params: RouteParams) -> Self {
        let name = name.into();
        info!(store = %store.name(), consumer = %name, ?params, "Mounted");
        Self {
            name,
            store: store.clone(),
            params,
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Subscribes for the lifetime of this consumer.
    pub fn bind(&mut self, resolver: impl Into<KeyResolver>) -> LiveValue {
        let resolver = resolver.into();
        let key = resolver.resolve(&self.params);
        let (tx, mut rx) = watch::channel(Bound::absent(key.clone()));
        let mut binding = Binding {
            resolver,
            key: None,
            handle: None,
            sink: Arc::new(tx),
        };
        binding.attach(&self.store, key);
        // The value read on attach is the starting point, not a change.
        rx.borrow_and_update();
        debug!(consumer = %self.name, key = ?binding.key, "Bound");
        self.bindings.push(binding);
        LiveValue { rx }
    }

    /// Replaces the route parameters and re-targets every binding whose key changed.
    pub fn set_params(&mut self, params: RouteParams) {
        self.params = params;
        for binding in &mut self.bindings {
            let next = binding.resolver.resolve(&self.params);
            if next == binding.key {
                continue;
            }
            debug!(consumer = %self.name, from = ?binding.key, to = ?next, "Rebinding");
            binding.attach(&self.store, next);
        }
    }

    /// Live subscriptions held by this consumer.
    pub fn subscription_count(&self) -> usize {
        self.bindings
            .iter()
            .filter(|binding| binding.handle.as_ref().is_some_and(|h| h.is_active()))
            .count()
    }

    /// Tears the scope down, disposing every subscription.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.bindings.is_empty() {
            return;
        }
        let released = self.bindings.len();
        for binding in self.bindings.drain(..) {
            if let Some(handle) = binding.handle {
                handle.dispose();
            }
        }
        info!(store = %self.store.name(), consumer = %self.name, released, "Unmounted");
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.teardown();
    }
}
