//! # Pages
//!
//! Each page is a [`Consumer`](record_store::Consumer) mounted with its route params. It binds
//! the records it shows, renders them into a plain view struct, and turns user input into
//! form edits or [actions](crate::actions).
//!
//! | Page | Binds | Guards |
//! |------|-------|--------|
//! | [`CreateDistanceRatePage`] | `policy_<policyID>` | admin, paid |
//! | [`DistanceRatesSettingsPage`] | `policy_<policyID>` | admin, paid, distance rates enabled |
//! | [`NotFoundPage`] | nothing | none |
//!
//! A page whose guards fail renders [`Screen::NotFound`] instead of its content.

pub mod access;
pub mod create_distance_rate;
pub mod distance_rates_settings;
pub mod not_found;

pub use access::{check_access, AccessDenied, AccessGuard};
pub use create_distance_rate::{CreateDistanceRatePage, CreateRateView};
pub use distance_rates_settings::{DistanceRatesSettingsPage, SelectorRow, SettingsView};
pub use not_found::{NotFoundPage, NotFoundView};

use crate::localize::Localizer;
use crate::model::Policy;
use crate::navigation::Navigator;
use record_store::{FormError, LiveValue, RecordStore, RemoteApi, StoreError, SubmitError};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Collaborators every page is mounted with.
#[derive(Clone)]
pub struct PageContext {
    pub store: RecordStore,
    pub remote: Arc<dyn RemoteApi>,
    pub navigator: Arc<dyn Navigator>,
    pub localizer: Arc<dyn Localizer>,
}

impl PageContext {
    pub fn translate(&self, key: &str) -> String {
        self.localizer.translate(key)
    }

    pub fn not_found<T>(&self) -> Screen<T> {
        Screen::NotFound(NotFoundPage::render(self.localizer.as_ref()))
    }
}

/// The bound policy, or `None` when it is absent or malformed.
pub(crate) fn load_policy(live: &LiveValue) -> Option<Policy> {
    live.get_as::<Policy>().unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable policy record");
        None
    })
}

/// What a page shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen<T> {
    Content(T),
    NotFound(NotFoundView),
}

impl<T> Screen<T> {
    pub fn content(&self) -> Option<&T> {
        match self {
            Screen::Content(view) => Some(view),
            Screen::NotFound(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Screen::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
