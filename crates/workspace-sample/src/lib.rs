//! # Workspace Sample
//!
//! Workspace distance-rate screens built on [`record_store`].
//!
//! - **[model]**: serde structs for policies, custom units, rates and transactions.
//! - **[actions]**: optimistic writes (create a rate, change the unit or default category,
//!   split a bill).
//! - **[api_actor]** and **[clients]**: the in-process backend those writes go to.
//! - **[pages]**: mounted consumers that bind policy records, render views and run forms.
//! - **[lifecycle]**: [`WorkspaceSystem`](lifecycle::WorkspaceSystem) wires it all together.
//!
//! [navigation], [localize] and [validation] are the small collaborators pages need.

pub mod actions;
pub mod api_actor;
pub mod clients;
pub mod lifecycle;
pub mod localize;
pub mod model;
pub mod navigation;
pub mod pages;
pub mod validation;
