//! # Domain Model
//!
//! Plain serde structs for the records the pages read, plus the key kinds they live under.
//! Field names follow the server's camelCase JSON so records round-trip through the
//! store unchanged.

pub mod policy;
pub mod split_bill;

pub use policy::*;
pub use split_bill::*;

use record_store::{KeyKind, RecordKey};

/// `policy_<policyID>`
pub const POLICY: KeyKind = KeyKind::new("policy");
/// `transactions_<transactionID>`
pub const TRANSACTION: KeyKind = KeyKind::new("transactions");
/// `report_<reportID>`
pub const REPORT: KeyKind = KeyKind::new("report");
/// The signed-in account; a single record.
pub const SESSION: KeyKind = KeyKind::new("session");

pub fn policy_key(policy_id: &str) -> RecordKey {
    POLICY.member(policy_id)
}

pub fn session_key() -> RecordKey {
    RecordKey::single(SESSION)
}

/// Stored under [`SESSION`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub email: String,
    #[serde(rename = "accountID")]
    pub account_id: u64,
}
