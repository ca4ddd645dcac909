//! # Policy Actions
//!
//! Distance-rate writes. Each one is an optimistic [`WriteRequest`]: the store changes at
//! once (marked pending), the server command follows, and the pending marker is cleared
//! on success or replaced by an error on failure.

use crate::api_actor::commands;
use crate::model::{policy_key, CustomUnit, CustomUnitField, Rate, GENERIC_ERROR};
use rand::Rng;
use record_store::api::{self, error_entry, StoreUpdate, WriteRequest};
use record_store::{Fields, Patch, PendingAction, RecordStore, RemoteApi, StoreError, SubmitError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// 13 random uppercase hex digits, the id format of custom units and their rates.
pub fn generate_custom_unit_id() -> String {
    let mut rng = rand::thread_rng();
    (0..13)
        .map(|_| {
            char::from_digit(rng.gen_range(0..16), 16)
                .unwrap_or('0')
                .to_ascii_uppercase()
        })
        .collect()
}

/// Adds `rate` to the policy's custom unit.
#[instrument(skip(store, remote, rate), fields(rate_id = %rate.custom_unit_rate_id))]
pub async fn create_policy_distance_rate(
    store: &RecordStore,
    remote: &dyn RemoteApi,
    policy_id: &str,
    custom_unit_id: &str,
    rate: &Rate,
) -> Result<(), SubmitError> {
    let path = [
        "customUnits",
        custom_unit_id,
        "rates",
        rate.custom_unit_rate_id.as_str(),
    ];
    let mut optimistic = to_json(rate)?;
    optimistic["errors"] = Value::Null;
    optimistic["pendingAction"] = json!(PendingAction::Add);

    let params = api::params([
        ("policyID", json!(policy_id)),
        ("customUnitID", json!(custom_unit_id)),
        ("customUnitRate", json!(to_json_string(rate)?)),
    ]);
    let key = policy_key(policy_id);
    let request = WriteRequest::new(commands::CREATE_POLICY_DISTANCE_RATE, params)
        .optimistic(StoreUpdate::merge(key.clone(), nested_patch(&path, optimistic)))
        .on_success(StoreUpdate::merge(
            key.clone(),
            nested_patch(&path, json!({"pendingAction": null})),
        ))
        .on_failure(StoreUpdate::merge(
            key,
            nested_patch(&path, json!({"errors": error_entry(GENERIC_ERROR)})),
        ));

    debug!(%policy_id, %custom_unit_id, rate = rate.rate, "Creating distance rate");
    api::write(store, remote, request).await
}

/// Switches the custom unit between miles and kilometers.
#[instrument(skip(store, remote, current, updated))]
pub async fn set_policy_distance_rates_unit(
    store: &RecordStore,
    remote: &dyn RemoteApi,
    policy_id: &str,
    current: &CustomUnit,
    updated: &CustomUnit,
) -> Result<(), SubmitError> {
    update_custom_unit_field(
        store,
        remote,
        commands::SET_POLICY_DISTANCE_RATES_UNIT,
        policy_id,
        current,
        updated,
        CustomUnitField::Attributes,
    )
    .await
}

/// Sets the category new distance expenses default to.
#[instrument(skip(store, remote, current, updated))]
pub async fn set_policy_distance_rates_default_category(
    store: &RecordStore,
    remote: &dyn RemoteApi,
    policy_id: &str,
    current: &CustomUnit,
    updated: &CustomUnit,
) -> Result<(), SubmitError> {
    update_custom_unit_field(
        store,
        remote,
        commands::SET_POLICY_DISTANCE_RATES_DEFAULT_CATEGORY,
        policy_id,
        current,
        updated,
        CustomUnitField::DefaultCategory,
    )
    .await
}

/// Dismisses the errors shown for `fields`. Local only.
pub fn clear_policy_distance_rates_error_fields(
    store: &RecordStore,
    policy_id: &str,
    custom_unit_id: &str,
    fields: &[CustomUnitField],
) -> Result<(), StoreError> {
    let mut cleared = Fields::new();
    for field in fields {
        cleared.insert(field.as_str().to_string(), Value::Null);
    }
    let patch = nested_patch(
        &["customUnits", custom_unit_id, "errorFields"],
        Value::Object(cleared),
    );
    store.merge(&policy_key(policy_id), &patch)
}

async fn update_custom_unit_field(
    store: &RecordStore,
    remote: &dyn RemoteApi,
    command: &str,
    policy_id: &str,
    current: &CustomUnit,
    updated: &CustomUnit,
    field: CustomUnitField,
) -> Result<(), SubmitError> {
    let name = field.as_str();

    let mut optimistic = to_json(updated)?;
    let mut failure = to_json(current)?;
    null_added_fields(&mut failure, &optimistic);
    optimistic["pendingFields"] = single_field(name, json!(PendingAction::Update));

    failure["pendingFields"] = single_field(name, Value::Null);
    failure["errorFields"] = single_field(name, error_entry(GENERIC_ERROR));

    let mut sent = updated.clone();
    sent.pending_fields.clear();
    sent.error_fields.clear();
    let params = api::params([
        ("policyID", json!(policy_id)),
        ("customUnit", json!(to_json_string(&sent)?)),
    ]);

    let key = policy_key(policy_id);
    let unit_path = ["customUnits", current.custom_unit_id.as_str()];
    let request = WriteRequest::new(command, params)
        .optimistic(StoreUpdate::merge(key.clone(), nested_patch(&unit_path, optimistic)))
        .on_success(StoreUpdate::merge(
            key.clone(),
            nested_patch(&unit_path, json!({"pendingFields": single_field(name, Value::Null)})),
        ))
        .on_failure(StoreUpdate::merge(key, nested_patch(&unit_path, failure)));

    api::write(store, remote, request).await
}

/// Marks with `null` every field `applied` has and `rollback` lacks, so merging
/// `rollback` removes what merging `applied` added.
fn null_added_fields(rollback: &mut Value, applied: &Value) {
    let (Value::Object(rollback), Value::Object(applied)) = (rollback, applied) else {
        return;
    };
    for (field, value) in applied {
        match rollback.get_mut(field) {
            None => {
                rollback.insert(field.clone(), Value::Null);
            }
            Some(existing) => null_added_fields(existing, value),
        }
    }
}

fn single_field(name: &str, value: Value) -> Value {
    let mut fields = Fields::new();
    fields.insert(name.to_string(), value);
    Value::Object(fields)
}

/// Patch setting `leaf` at `path`, e.g. `customUnits.<id>.rates.<rateID>`.
pub(crate) fn nested_patch(path: &[&str], leaf: Value) -> Patch {
    let value = path
        .iter()
        .rev()
        .fold(leaf, |inner, segment| single_field(segment, inner));
    Patch::try_from(value).unwrap_or_default()
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, SubmitError> {
    serde_json::to_value(value).map_err(|e| SubmitError::new(e.to_string()))
}

fn to_json_string<T: Serialize>(value: &T) -> Result<String, SubmitError> {
    serde_json::to_string(value).map_err(|e| SubmitError::new(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DistanceUnit, Policy, UnitAttributes};
    use record_store::mock::MockRemote;
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::Poll;

    fn seed(store: &RecordStore) -> CustomUnit {
        let unit = CustomUnit {
            custom_unit_id: "U1".into(),
            name: "Distance".into(),
            attributes: UnitAttributes {
                unit: DistanceUnit::Mi,
            },
            ..Default::default()
        };
        let policy = Policy {
            id: "P1".into(),
            custom_units: BTreeMap::from([("U1".to_string(), unit.clone())]),
            ..Default::default()
        };
        store.set_as(&policy_key("P1"), &policy).unwrap();
        unit
    }

    fn policy(store: &RecordStore) -> Policy {
        store.get_as(&policy_key("P1")).unwrap().unwrap()
    }

    #[test]
    fn test_custom_unit_id_format() {
        let id = generate_custom_unit_id();
        assert_eq!(id.len(), 13);
        assert!(id.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[tokio::test]
    async fn test_created_rate_is_pending_until_accepted() {
        let store = RecordStore::new();
        seed(&store);
        let remote = MockRemote::new();
        let release = remote
            .expect_write(commands::CREATE_POLICY_DISTANCE_RATE)
            .respond_later();

        let rate = Rate {
            custom_unit_rate_id: "R1".into(),
            name: "Default Rate".into(),
            rate: 6700.0,
            currency: "USD".into(),
            enabled: true,
            ..Default::default()
        };
        let write = create_policy_distance_rate(&store, &remote, "P1", "U1", &rate);
        tokio::pin!(write);

        // Drive the write until it waits for the server.
        assert!(poll_once(write.as_mut()).await.is_none());
        let pending = policy(&store).custom_units["U1"].rates["R1"].clone();
        assert_eq!(pending.pending_action, Some(PendingAction::Add));
        assert_eq!(pending.rate, 6700.0);

        release.send(Ok(())).unwrap();
        write.await.unwrap();
        let done = policy(&store).custom_units["U1"].rates["R1"].clone();
        assert_eq!(done.pending_action, None);

        let (_, params) = &remote.received()[0];
        let sent: Rate =
            serde_json::from_str(params["customUnitRate"].as_str().unwrap()).unwrap();
        assert_eq!(sent, rate);
        remote.verify();
    }

    #[tokio::test]
    async fn test_rejected_unit_change_rolls_back_with_error() {
        let store = RecordStore::new();
        let current = seed(&store);
        let remote = MockRemote::new();
        remote
            .expect_write(commands::SET_POLICY_DISTANCE_RATES_UNIT)
            .return_err(SubmitError::new("denied"));

        let mut updated = current.clone();
        updated.attributes.unit = DistanceUnit::Km;
        let result = set_policy_distance_rates_unit(&store, &remote, "P1", &current, &updated).await;
        assert!(result.is_err());

        let unit = policy(&store).custom_units["U1"].clone();
        assert_eq!(unit.attributes.unit, DistanceUnit::Mi);
        assert_eq!(unit.pending(CustomUnitField::Attributes), None);
        assert_eq!(unit.errors(CustomUnitField::Attributes).map(|e| e.len()), Some(1));

        clear_policy_distance_rates_error_fields(&store, "P1", "U1", &[CustomUnitField::Attributes])
            .unwrap();
        assert!(policy(&store).custom_units["U1"]
            .errors(CustomUnitField::Attributes)
            .is_none());
    }

    #[tokio::test]
    async fn test_default_category_sent_without_bookkeeping_fields() {
        let store = RecordStore::new();
        let current = seed(&store);
        let remote = MockRemote::new();
        remote
            .expect_write(commands::SET_POLICY_DISTANCE_RATES_DEFAULT_CATEGORY)
            .return_ok();

        let mut updated = current.clone();
        updated.default_category = Some("Car".into());
        updated.pending_fields.insert("attributes".into(), PendingAction::Update);
        set_policy_distance_rates_default_category(&store, &remote, "P1", &current, &updated)
            .await
            .unwrap();

        let unit = policy(&store).custom_units["U1"].clone();
        assert_eq!(unit.default_category.as_deref(), Some("Car"));
        assert_eq!(unit.pending(CustomUnitField::DefaultCategory), None);
        let (_, params) = &remote.received()[0];
        assert!(!params["customUnit"].as_str().unwrap().contains("pendingFields"));
    }

    #[tokio::test]
    async fn test_rejected_first_default_category_is_removed() {
        let store = RecordStore::new();
        let current = seed(&store);
        assert_eq!(current.default_category, None);
        let remote = MockRemote::new();
        remote
            .expect_write(commands::SET_POLICY_DISTANCE_RATES_DEFAULT_CATEGORY)
            .return_err(SubmitError::new("Category does not exist"));

        let mut updated = current.clone();
        updated.default_category = Some("Car".into());
        let result =
            set_policy_distance_rates_default_category(&store, &remote, "P1", &current, &updated)
                .await;
        assert!(result.is_err());

        let unit = policy(&store).custom_units["U1"].clone();
        assert_eq!(unit.default_category, None);
        assert_eq!(unit.pending(CustomUnitField::DefaultCategory), None);
        assert_eq!(unit.errors(CustomUnitField::DefaultCategory).map(|e| e.len()), Some(1));
        remote.verify();
    }

    #[test]
    fn test_rollback_nulls_nested_additions() {
        let mut rollback = json!({"name": "Distance", "rates": {"R1": {"rate": 100}}});
        let applied = json!({"name": "Miles", "defaultCategory": "Car", "rates": {"R1": {"rate": 100}, "R2": {"rate": 50}}});
        null_added_fields(&mut rollback, &applied);
        assert_eq!(
            rollback,
            json!({"name": "Distance", "defaultCategory": null, "rates": {"R1": {"rate": 100}, "R2": null}})
        );
    }

    async fn poll_once<F: Future + Unpin>(mut fut: F) -> Option<F::Output> {
        std::future::poll_fn(|cx| match Pin::new(&mut fut).poll(cx) {
            Poll::Ready(out) => Poll::Ready(Some(out)),
            Poll::Pending => Poll::Ready(None),
        })
        .await
    }
}
