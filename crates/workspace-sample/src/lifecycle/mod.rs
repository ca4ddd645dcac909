//! # System Lifecycle
//!
//! Starting, wiring and stopping the sample app.
//!
//! [`WorkspaceSystem::new`] creates the shared [`RecordStore`](record_store::RecordStore),
//! registers the schemas of the record kinds the app writes, spawns the
//! [API actor](crate::api_actor) and keeps the collaborators every page needs. Pages are
//! mounted with [`WorkspaceSystem::context`].
//!
//! ## Shutdown
//!
//! The API server stops when its last client is dropped, exactly like the other actors in
//! this codebase. [`WorkspaceSystem::shutdown`] drops the system's client and awaits the
//! task, so every page (and every [`PageContext`](crate::pages::PageContext) clone) must be
//! closed first or the shutdown waits for them.
//!
//! ```rust,ignore
//! let system = WorkspaceSystem::new(SystemConfig::default());
//! let page = CreateDistanceRatePage::mount(system.context(), route.params());
//! // ...
//! page.close();
//! system.shutdown().await?;
//! ```

pub mod workspace_system;

pub use workspace_system::*;
