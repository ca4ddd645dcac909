//! # Actions
//!
//! Writes the pages trigger. Every action takes the store and a [`RemoteApi`](record_store::RemoteApi)
//! explicitly, so tests can hand in a mock and the pages the running [`ApiClient`](crate::clients::ApiClient).

pub mod policy;
pub mod split_bill;

pub use policy::{
    clear_policy_distance_rates_error_fields, create_policy_distance_rate,
    generate_custom_unit_id, set_policy_distance_rates_default_category,
    set_policy_distance_rates_unit,
};
pub use split_bill::{split_amount, split_bill, SplitBillRequest};
