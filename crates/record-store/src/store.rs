//! # Record Store
//!
//! The [`RecordStore`] owns every committed record and the registry of subscribers.
//! It is a cheap-to-clone handle: construct one per application and pass it to every
//! consumer that needs it.
//!
//! ## Mutation and delivery
//!
//! `set`, `merge` and `delete` each commit under the store lock and enqueue one
//! [`Snapshot`] per interested subscriber onto a FIFO dispatch queue. The queue is then
//! drained outside the lock, one callback at a time:
//!
//! - deliveries for a key arrive in the order the mutations were committed;
//! - callbacks may call back into the store (read, write, subscribe, dispose); their
//!   own deliveries are queued behind the current one instead of nesting;
//! - a subscription disposed while a delivery for it is still queued never sees it;
//! - a panicking callback is logged and skipped, the other subscribers still run.
//!
//! When another thread is already draining the queue, a mutation returns once it has
//! committed; that thread delivers the queued snapshots. Bindings do not wait for it:
//! a [`Consumer`](crate::Consumer) reads its first value under the lock when it binds.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::key::{KeyKind, KeySpec, RecordKey};
use crate::schema::RecordSchema;
use crate::subscription::{Callback, Slot, SubscriptionHandle};
use crate::value::Patch;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Value handed to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Current value of one record; `None` when it doesn't exist.
    Record(Option<Value>),
    /// Every member of a collection, by id.
    Collection(BTreeMap<String, Value>),
}

impl Snapshot {
    pub fn record(&self) -> Option<&Value> {
        match self {
            Snapshot::Record(value) => value.as_ref(),
            Snapshot::Collection(_) => None,
        }
    }

    pub fn members(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Snapshot::Collection(members) => Some(members),
            Snapshot::Record(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Snapshot::Record(None))
    }
}

struct Delivery {
    slot: Arc<Slot>,
    snapshot: Snapshot,
}

#[derive(Default)]
struct State {
    records: HashMap<RecordKey, Value>,
    subscribers: BTreeMap<u64, Arc<Slot>>,
    schemas: HashMap<KeyKind, Arc<dyn RecordSchema>>,
    queue: VecDeque<Delivery>,
    dispatching: bool,
    next_subscriber: u64,
}

impl State {
    fn snapshot(&self, spec: &KeySpec) -> Snapshot {
        match spec {
            KeySpec::Record(key) => Snapshot::Record(self.records.get(key).cloned()),
            KeySpec::Collection(kind) => Snapshot::Collection(self.members(kind)),
        }
    }

    fn members(&self, kind: &KeyKind) -> BTreeMap<String, Value> {
        self.records
            .iter()
            .filter_map(|(key, value)| match key.id() {
                Some(id) if key.belongs_to(kind) => Some((id.to_string(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Queues one delivery per live subscriber interested in `key`.
    fn enqueue_for(&mut self, key: &RecordKey) -> usize {
        let interested: Vec<Arc<Slot>> = self
            .subscribers
            .values()
            .filter(|slot| slot.is_active() && slot.spec().matches(key))
            .cloned()
            .collect();
        for slot in &interested {
            let snapshot = self.snapshot(slot.spec());
            self.queue.push_back(Delivery {
                slot: Arc::clone(slot),
                snapshot,
            });
        }
        interested.len()
    }

    fn check_schema(
        &self,
        enforce: bool,
        key: &RecordKey,
        value: &Value,
    ) -> Result<(), StoreError> {
        if !enforce {
            return Ok(());
        }
        match self.schemas.get(key.kind()) {
            Some(schema) => schema
                .validate(key, value)
                .map_err(|reason| StoreError::Validation {
                    key: key.clone(),
                    reason,
                }),
            None => Ok(()),
        }
    }
}

pub(crate) struct Shared {
    config: StoreConfig,
    state: Mutex<State>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Callbacks never run under this lock, so a poisoned guard still holds a
        // consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn remove_subscriber(&self, id: u64) -> usize {
        let mut state = self.lock();
        state.subscribers.remove(&id);
        state.subscribers.len()
    }

    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }
}

/// Keyed reactive record store.
///
/// # Example
///
/// ```rust
/// use record_store::{KeyKind, Patch, RecordStore, Snapshot};
/// use serde_json::json;
/// use std::sync::{Arc, Mutex};
///
/// const RATE: KeyKind = KeyKind::new("rate");
///
/// let store = RecordStore::new();
/// let key = RATE.member("1");
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let handle = store.subscribe(key.clone(), move |snapshot: &Snapshot| {
///     sink.lock().unwrap().push(snapshot.record().cloned());
/// });
///
/// store.set(&key, json!({"value": 10})).unwrap();
/// store.merge(&key, &Patch::new().with("value", 12)).unwrap();
/// store.delete(&key);
/// handle.dispose();
///
/// assert_eq!(
///     *seen.lock().unwrap(),
///     vec![None, Some(json!({"value": 10})), Some(json!({"value": 12})), None]
/// );
/// ```
#[derive(Clone)]
pub struct RecordStore {
    shared: Arc<Shared>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        info!(store = %config.name, enforce_schemas = config.enforce_schemas, "Store created");
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Registers (or replaces) the schema checked for every record of `kind`.
    pub fn register_schema(&self, kind: KeyKind, schema: impl RecordSchema + 'static) {
        debug!(store = %self.name(), %kind, "Schema registered");
        self.shared.lock().schemas.insert(kind, Arc::new(schema));
    }

    // --- Reads ---

    /// Last committed value of `key`.
    pub fn get(&self, key: &RecordKey) -> Option<Value> {
        let value = self.shared.lock().records.get(key).cloned();
        debug!(store = %self.name(), %key, found = value.is_some(), "Get");
        value
    }

    /// Like [`get`](Self::get), decoded into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &RecordKey) -> Result<Option<T>, StoreError> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Like [`get`](Self::get), but a missing record is an error.
    pub fn require(&self, key: &RecordKey) -> Result<Value, StoreError> {
        self.get(key).ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    /// Every member of the `kind` collection, by id.
    pub fn collection(&self, kind: &KeyKind) -> BTreeMap<String, Value> {
        self.shared.lock().members(kind)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.shared.lock().records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.shared.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriptions. Used to check that consumers don't leak.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    // --- Writes ---

    /// Replaces the record wholesale. Writing `null` deletes it.
    pub fn set(&self, key: &RecordKey, value: Value) -> Result<(), StoreError> {
        if value.is_null() {
            self.delete(key);
            return Ok(());
        }
        {
            let mut state = self.shared.lock();
            if let Err(e) = state.check_schema(self.shared.config.enforce_schemas, key, &value) {
                warn!(store = %self.name(), %key, error = %e, "Set rejected");
                return Err(e);
            }
            let created = state.records.insert(key.clone(), value).is_none();
            let notified = state.enqueue_for(key);
            if created {
                info!(store = %self.name(), %key, size = state.records.len(), notified, "Created");
            } else {
                debug!(store = %self.name(), %key, notified, "Set");
            }
        }
        self.dispatch();
        Ok(())
    }

    /// Serializes `value` and [`set`](Self::set)s it.
    pub fn set_as<T: Serialize>(&self, key: &RecordKey, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value)
    }

    /// Applies `patch` over the current record, creating it if absent.
    pub fn merge(&self, key: &RecordKey, patch: &Patch) -> Result<(), StoreError> {
        {
            let mut state = self.shared.lock();
            let existing = state.records.get(key).cloned();
            let created = existing.is_none();
            let merged = patch.apply_to(existing);
            if let Err(e) = state.check_schema(self.shared.config.enforce_schemas, key, &merged) {
                warn!(store = %self.name(), %key, error = %e, "Merge rejected");
                return Err(e);
            }
            state.records.insert(key.clone(), merged);
            let notified = state.enqueue_for(key);
            if created {
                info!(store = %self.name(), %key, size = state.records.len(), notified, "Created");
            } else {
                debug!(store = %self.name(), %key, fields = patch.fields().len(), notified, "Merged");
            }
        }
        self.dispatch();
        Ok(())
    }

    /// Merges several members of one collection. Either every member passes its schema
    /// and all are committed, or nothing is written.
    pub fn merge_collection(
        &self,
        kind: &KeyKind,
        patches: BTreeMap<String, Patch>,
    ) -> Result<(), StoreError> {
        {
            let mut state = self.shared.lock();
            let mut merged = Vec::with_capacity(patches.len());
            for (id, patch) in &patches {
                let key = kind.member(id.as_str());
                let value = patch.apply_to(state.records.get(&key).cloned());
                if let Err(e) =
                    state.check_schema(self.shared.config.enforce_schemas, &key, &value)
                {
                    warn!(store = %self.name(), %kind, error = %e, "Collection merge rejected");
                    return Err(e);
                }
                merged.push((key, value));
            }
            for (key, value) in merged {
                state.records.insert(key.clone(), value);
                state.enqueue_for(&key);
            }
            debug!(store = %self.name(), %kind, members = patches.len(), "Collection merged");
        }
        self.dispatch();
        Ok(())
    }

    /// Removes the record. Subscribers receive an absent snapshot.
    pub fn delete(&self, key: &RecordKey) {
        {
            let mut state = self.shared.lock();
            let existed = state.records.remove(key).is_some();
            let notified = state.enqueue_for(key);
            if existed {
                info!(store = %self.name(), %key, size = state.records.len(), notified, "Deleted");
            } else {
                debug!(store = %self.name(), %key, notified, "Delete of missing record");
            }
        }
        self.dispatch();
    }

    // --- Subscriptions ---

    /// Registers `callback` for `spec` and immediately delivers the current value.
    ///
    /// The returned handle disposes the subscription when dropped.
    pub fn subscribe<F>(&self, spec: impl Into<KeySpec>, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let spec = spec.into();
        let slot = {
            let mut state = self.shared.lock();
            let snapshot = state.snapshot(&spec);
            let slot = self.register(&mut state, spec, Box::new(callback));
            state.queue.push_back(Delivery {
                slot: Arc::clone(&slot),
                snapshot,
            });
            slot
        };
        self.dispatch();
        SubscriptionHandle::new(slot, Arc::downgrade(&self.shared))
    }

    /// Like [`subscribe`](Self::subscribe), but `callback` receives the current value
    /// before this returns, even while another thread is draining deliveries.
    ///
    /// That first call runs under the store lock, so `callback` must not touch the store.
    pub(crate) fn subscribe_in_place<F>(&self, spec: KeySpec, mut callback: F) -> SubscriptionHandle
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let mut state = self.shared.lock();
        callback(&state.snapshot(&spec));
        let slot = self.register(&mut state, spec, Box::new(callback));
        drop(state);
        SubscriptionHandle::new(slot, Arc::downgrade(&self.shared))
    }

    fn register(&self, state: &mut State, spec: KeySpec, callback: Callback) -> Arc<Slot> {
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        let slot = Arc::new(Slot::new(id, spec, callback));
        state.subscribers.insert(id, Arc::clone(&slot));
        debug!(store = %self.name(), key = %slot.spec(), subscriber = id, subscribers = state.subscribers.len(), "Subscribed");
        slot
    }

    /// Drains the dispatch queue unless another caller is already doing so.
    fn dispatch(&self) {
        {
            let mut state = self.shared.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        loop {
            let delivery = {
                let mut state = self.shared.lock();
                match state.queue.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        state.dispatching = false;
                        return;
                    }
                }
            };
            self.deliver(delivery);
        }
    }

    fn deliver(&self, delivery: Delivery) {
        let Delivery { slot, snapshot } = delivery;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| slot.invoke(&snapshot)));
        if outcome.is_err() {
            warn!(store = %self.name(), key = %slot.spec(), subscriber = slot.id(), "Subscriber callback panicked");
        }
    }
}
