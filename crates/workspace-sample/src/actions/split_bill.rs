//! # Split Bill
//!
//! Splits an expense evenly between the payer and the other participants. The payer's
//! share absorbs the rounding remainder so the shares always add up to the total.

use crate::api_actor::commands;
use crate::model::{Split, SplitBillParams, Transaction, GENERIC_ERROR, TRANSACTION};
use record_store::api::{self, error_entry, StoreUpdate, WriteRequest};
use record_store::{Patch, PendingAction, RecordStore, RemoteApi, SubmitError};
use serde_json::json;
use tracing::{debug, instrument};

use super::policy::to_json;

/// Everything the user entered for the split.
#[derive(Debug, Clone, Default)]
pub struct SplitBillRequest {
    pub report_id: String,
    pub payer_email: String,
    /// Other participants; the payer is implied.
    pub participants: Vec<String>,
    /// Total in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub comment: String,
    pub merchant: String,
    pub created: String,
    pub category: String,
    pub tag: String,
    pub billable: bool,
    pub policy_id: Option<String>,
}

/// One share of `total` split `participants + 1` ways (the `+ 1` is the payer).
pub fn split_amount(total: i64, participants: usize, is_payer: bool) -> i64 {
    let people = participants as i64 + 1;
    let per_person = (total as f64 / people as f64).round() as i64;
    if is_payer {
        per_person + (total - per_person * people)
    } else {
        per_person
    }
}

fn generate_id() -> String {
    rand::random::<u64>().to_string()
}

/// Records one pending transaction per share and sends `SplitBill`.
///
/// Returns the params that were sent.
#[instrument(skip(store, remote, request), fields(report_id = %request.report_id, amount = request.amount))]
pub async fn split_bill(
    store: &RecordStore,
    remote: &dyn RemoteApi,
    request: SplitBillRequest,
) -> Result<SplitBillParams, SubmitError> {
    if request.participants.is_empty() {
        return Err(SubmitError::new("iou.error.noParticipants"));
    }
    let others = request.participants.len();
    let shares = std::iter::once((request.payer_email.clone(), true))
        .chain(request.participants.iter().map(|email| (email.clone(), false)));
    let splits: Vec<Split> = shares
        .map(|(email, is_payer)| Split {
            email,
            amount: split_amount(request.amount, others, is_payer),
            transaction_id: generate_id(),
        })
        .collect();

    let params = SplitBillParams {
        report_id: request.report_id.clone(),
        amount: request.amount,
        splits: serde_json::to_string(&splits).map_err(|e| SubmitError::new(e.to_string()))?,
        comment: request.comment.clone(),
        currency: request.currency.clone(),
        merchant: request.merchant.clone(),
        created: request.created.clone(),
        category: request.category.clone(),
        tag: request.tag.clone(),
        billable: request.billable,
        transaction_id: generate_id(),
        report_action_id: generate_id(),
        created_report_action_id: None,
        policy_id: request.policy_id.clone(),
    };

    let mut write = WriteRequest::new(commands::SPLIT_BILL, to_json(&params)?);
    let whole = std::iter::once((params.transaction_id.clone(), request.amount));
    let parts = splits.iter().map(|s| (s.transaction_id.clone(), s.amount));
    for (transaction_id, amount) in whole.chain(parts) {
        let key = TRANSACTION.member(&transaction_id);
        let transaction = Transaction {
            transaction_id,
            report_id: request.report_id.clone(),
            amount,
            currency: request.currency.clone(),
            comment: request.comment.clone(),
            merchant: request.merchant.clone(),
            created: request.created.clone(),
            category: request.category.clone(),
            tag: request.tag.clone(),
            billable: request.billable,
            pending_action: Some(PendingAction::Add),
            errors: None,
        };
        write = write
            .optimistic(StoreUpdate::set(key.clone(), to_json(&transaction)?))
            .on_success(StoreUpdate::merge(
                key.clone(),
                Patch::new().with("pendingAction", json!(null)),
            ))
            .on_failure(StoreUpdate::merge(
                key,
                Patch::new().with("errors", error_entry(GENERIC_ERROR)),
            ));
    }

    debug!(shares = splits.len(), "Splitting bill");
    api::write(store, remote, write).await?;
    Ok(params)
}
