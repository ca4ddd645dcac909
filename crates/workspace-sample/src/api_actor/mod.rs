//! # API Actor
//!
//! An in-process stand-in for the backend the write actions talk to. It is an actor in the
//! usual shape: an [`ApiServer`] task owning its state and an `mpsc` receiver, and a
//! cloneable [`ApiClient`](crate::clients::ApiClient) that sends [`ApiRequest`]s and awaits
//! the `oneshot` reply.
//!
//! ## Usage
//!
//! ```rust
//! use workspace_sample::api_actor::{self, commands};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (server, client) = api_actor::new(16, Duration::ZERO);
//!     let handle = tokio::spawn(server.run());
//!
//!     let params = json!({"policyID": "P1", "customUnitID": "U1", "customUnitRate": "{}"});
//!     client.write(commands::CREATE_POLICY_DISTANCE_RATE, params).await.unwrap();
//!     assert_eq!(client.history().await.unwrap().len(), 1);
//!
//!     drop(client);
//!     handle.await.unwrap();
//! }
//! ```

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{ApiRequest, ApiServer, Response};

use crate::clients::ApiClient;
use std::time::Duration;
use tokio::sync::mpsc;

/// Command names and the params each one requires.
pub mod commands {
    pub const CREATE_POLICY_DISTANCE_RATE: &str = "CreatePolicyDistanceRate";
    pub const SET_POLICY_DISTANCE_RATES_UNIT: &str = "SetPolicyDistanceRatesUnit";
    pub const SET_POLICY_DISTANCE_RATES_DEFAULT_CATEGORY: &str =
        "SetPolicyDistanceRatesDefaultCategory";
    pub const SPLIT_BILL: &str = "SplitBill";

    pub fn required_params(command: &str) -> Option<&'static [&'static str]> {
        match command {
            CREATE_POLICY_DISTANCE_RATE => Some(&["policyID", "customUnitID", "customUnitRate"]),
            SET_POLICY_DISTANCE_RATES_UNIT | SET_POLICY_DISTANCE_RATES_DEFAULT_CATEGORY => {
                Some(&["policyID", "customUnit"])
            }
            SPLIT_BILL => Some(&["reportID", "amount", "splits", "transactionID"]),
            _ => None,
        }
    }
}

/// Creates the server and its client. Spawn `server.run()` to start it.
pub fn new(buffer_size: usize, latency: Duration) -> (ApiServer, ApiClient) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ApiServer::new(receiver, latency), ApiClient::new(sender))
}
