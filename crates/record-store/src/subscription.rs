//! # Subscriptions
//!
//! A [`SubscriptionHandle`] is returned by [`RecordStore::subscribe`](crate::RecordStore::subscribe).
//! Disposing it (explicitly or by dropping it) removes the registration; it is safe to
//! dispose more than once, from any thread, and from inside the subscriber's own callback.

use crate::key::KeySpec;
use crate::store::{Shared, Snapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

pub(crate) type Callback = Box<dyn FnMut(&Snapshot) + Send>;

/// One registered subscriber.
pub(crate) struct Slot {
    id: u64,
    spec: KeySpec,
    active: AtomicBool,
    callback: Mutex<Callback>,
}

impl Slot {
    pub(crate) fn new(id: u64, spec: KeySpec, callback: Callback) -> Self {
        Self {
            id,
            spec,
            active: AtomicBool::new(true),
            callback: Mutex::new(callback),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn spec(&self) -> &KeySpec {
        &self.spec
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Runs the callback unless the slot was disposed after the delivery was queued.
    pub(crate) fn invoke(&self, snapshot: &Snapshot) {
        // A previous callback panic poisons this lock; the closure itself is still usable.
        let mut callback = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_active() {
            (callback)(snapshot);
        }
    }

    /// Returns `true` only for the call that actually deactivated the slot.
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

/// Registration handle. Dropping it disposes the subscription.
pub struct SubscriptionHandle {
    slot: Arc<Slot>,
    store: Weak<Shared>,
}

impl SubscriptionHandle {
    pub(crate) fn new(slot: Arc<Slot>, store: Weak<Shared>) -> Self {
        Self { slot, store }
    }

    pub fn key(&self) -> &KeySpec {
        self.slot.spec()
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    /// Removes the registration. No callback starts after this returns.
    pub fn dispose(&self) {
        if !self.slot.deactivate() {
            return;
        }
        if let Some(shared) = self.store.upgrade() {
            let remaining = shared.remove_subscriber(self.slot.id());
            debug!(store = %shared.name(), key = %self.slot.spec(), subscriber = self.slot.id(), subscribers = remaining, "Disposed");
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.slot.id())
            .field("key", self.slot.spec())
            .field("active", &self.slot.is_active())
            .finish()
    }
}
