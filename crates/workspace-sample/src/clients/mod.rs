//! # Clients
//!
//! Cloneable handles to the actors in this crate.

pub mod api_client;

pub use api_client::ApiClient;
