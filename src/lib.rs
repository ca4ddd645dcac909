//! # Record Store Recipe
//!
//! > **A keyed reactive record store for screen-driven Rust apps.**
//!
//! Screens read records by key, subscribe while they are mounted, and edit through forms
//! that commit one patch per successful submit. This workspace has two crates:
//!
//! ### 1. The Engine ([`record_store`])
//! - **Role**: the store itself, subscriptions scoped to a mounted [`Consumer`](record_store::Consumer),
//!   the [`Form`](record_store::Form) state machine and optimistic
//!   [`api::write`](record_store::api::write) requests.
//! - **Key items**: [`RecordStore`](record_store::RecordStore),
//!   [`LiveValue`](record_store::LiveValue), [`mock`](record_store::mock).
//!
//! ### 2. The Sample ([`workspace_sample`])
//! - **Role**: workspace distance-rate screens on top of the engine, with an in-process
//!   API actor standing in for the backend.
//! - **Key items**: [`WorkspaceSystem`](workspace_sample::lifecycle::WorkspaceSystem),
//!   [`CreateDistanceRatePage`](workspace_sample::pages::CreateDistanceRatePage).
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the sample with info logs
//! RUST_LOG=info cargo run -p workspace-sample
//!
//! # Run every test in the workspace
//! cargo test --workspace
//! ```

pub use record_store;
pub use workspace_sample;
