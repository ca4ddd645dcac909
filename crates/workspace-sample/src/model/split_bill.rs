//! Bill splitting: the parameters sent to the server and the per-participant transactions.

use record_store::PendingAction;
use serde::{Deserialize, Serialize};

use super::Errors;

/// Parameters of the `SplitBill` command. `splits` is the JSON-encoded list of [`Split`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitBillParams {
    #[serde(rename = "reportID")]
    pub report_id: String,
    pub amount: i64,
    pub splits: String,
    pub comment: String,
    pub currency: String,
    pub merchant: String,
    pub created: String,
    pub category: String,
    pub tag: String,
    pub billable: bool,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "reportActionID")]
    pub report_action_id: String,
    #[serde(rename = "createdReportActionID", skip_serializing_if = "Option::is_none")]
    pub created_report_action_id: Option<String>,
    #[serde(rename = "policyID", skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}

/// One participant's share, in the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub email: String,
    pub amount: i64,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
}

/// Stored under [`TRANSACTION`](super::TRANSACTION).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "reportID")]
    pub report_id: String,
    pub amount: i64,
    pub currency: String,
    pub comment: String,
    pub merchant: String,
    pub created: String,
    pub category: String,
    pub tag: String,
    pub billable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Errors>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_use_server_field_names() {
        let params = SplitBillParams {
            report_id: "R1".into(),
            amount: 3000,
            transaction_id: "T1".into(),
            report_action_id: "A1".into(),
            policy_id: Some("P1".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["reportID"], json!("R1"));
        assert_eq!(value["transactionID"], json!("T1"));
        assert_eq!(value["policyID"], json!("P1"));
        assert!(value.get("createdReportActionID").is_none());
    }
}
