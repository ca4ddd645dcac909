use record_store::mock::{MockRemote, MockSubmit, Recorder};
use record_store::{
    api, Consumer, Form, FormError, FormState, KeyKind, KeyResolver, KeySpec, Patch, PendingAction,
    RecordStore, RouteParams, Snapshot, StoreUpdate, SubmitError, WriteRequest,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

const POLICY: KeyKind = KeyKind::new("policy");
const REPORT: KeyKind = KeyKind::new("report");

fn params(pairs: &[(&str, &str)]) -> RouteParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_two_views_share_one_record() {
    record_store::tracing::setup_tracing();
    let store = RecordStore::new();
    store.set(&POLICY.member("P1"), json!({"name": "Team"})).unwrap();

    let mut list = Consumer::mount(&store, "PolicyList", params(&[]));
    let mut detail = Consumer::mount(&store, "PolicyDetail", params(&[("policyID", "P1")]));
    let all = list.bind(POLICY);
    let one = detail.bind(KeyResolver::from_param("policyID", POLICY));
    assert_eq!(store.subscriber_count(), 2);

    store
        .merge(&POLICY.member("P1"), &Patch::new().with("name", "Team A"))
        .unwrap();

    assert_eq!(one.record(), Some(json!({"name": "Team A"})));
    assert_eq!(
        all.snapshot().members().unwrap().get("P1"),
        Some(&json!({"name": "Team A"}))
    );

    list.unmount();
    drop(detail);
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_route_change_rebinds_view() {
    let store = RecordStore::new();
    store.set(&REPORT.member("1"), json!({"total": 10})).unwrap();
    store.set(&REPORT.member("2"), json!({"total": 20})).unwrap();

    let mut view = Consumer::mount(&store, "ReportPage", params(&[("reportID", "1")]));
    let report = view.bind(KeyResolver::from_param("reportID", REPORT));
    assert_eq!(report.record(), Some(json!({"total": 10})));

    view.set_params(params(&[("reportID", "2")]));
    assert_eq!(report.record(), Some(json!({"total": 20})));
    assert_eq!(view.subscription_count(), 1);

    // The old record no longer reaches this view.
    store.set(&REPORT.member("1"), json!({"total": 11})).unwrap();
    assert_eq!(report.record(), Some(json!({"total": 20})));

    view.set_params(params(&[]));
    assert!(report.is_absent());
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_live_value_wakes_async_task() {
    let store = RecordStore::new();
    let key = POLICY.member("P1");
    let mut view = Consumer::mount(&store, "Watcher", params(&[]));
    let mut live = view.bind(key.clone());

    let waiter = tokio::spawn(async move {
        while live.changed().await {
            if let Some(policy) = live.record() {
                return policy;
            }
        }
        json!(null)
    });

    let writer = store.clone();
    let writer_key = key.clone();
    thread::spawn(move || writer.set(&writer_key, json!({"name": "Remote"})))
        .join()
        .unwrap()
        .unwrap();

    assert_eq!(waiter.await.unwrap(), json!({"name": "Remote"}));
    view.unmount();
}

#[test]
fn test_concurrent_writers_deliver_in_commit_order() {
    let store = RecordStore::new();
    let key = POLICY.member("P1");
    let recorder = Recorder::new();
    let _sub = store.subscribe(key.clone(), recorder.callback());

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let store = store.clone();
            let key = key.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let field = format!("w{}", writer);
                    store.merge(&key, &Patch::new().with(field, i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Initial delivery plus one per merge.
    assert_eq!(recorder.len(), 101);
    assert_eq!(
        recorder.last(),
        Some(Snapshot::Record(Some(json!({"w0": 24, "w1": 24, "w2": 24, "w3": 24}))))
    );
    // Each writer's counter never goes backwards.
    let mut last_seen = BTreeMap::new();
    for snapshot in recorder.snapshots() {
        if let Some(fields) = snapshot.record().and_then(|v| v.as_object()) {
            for (field, value) in fields {
                let value = value.as_i64().unwrap();
                let previous = last_seen.insert(field.clone(), value).unwrap_or(-1);
                assert!(value >= previous);
            }
        }
    }
}

#[tokio::test]
async fn test_form_commit_reaches_bound_views() {
    let store = RecordStore::new();
    let key = POLICY.member("P1");
    store.set(&key, json!({"rate": 100, "name": "Default Rate"})).unwrap();

    let mut view = Consumer::mount(&store, "RateDetail", params(&[]));
    let rate = view.bind(key.clone());

    let submit = MockSubmit::new();
    submit.expect_submit().return_ok();
    let mut form = Form::new("editRate", &store, submit.clone()).bound_to(key.clone());

    form.set_field("rate", 120);
    assert_eq!(rate.record(), Some(json!({"rate": 100, "name": "Default Rate"})));

    form.submit().await.unwrap();
    assert_eq!(form.state(), FormState::Submitted);
    assert_eq!(rate.record(), Some(json!({"rate": 120, "name": "Default Rate"})));
    submit.verify();
    view.unmount();
}

#[tokio::test]
async fn test_view_sees_optimistic_then_rolled_back_write() {
    let store = RecordStore::new();
    let key = POLICY.member("P1");
    store.set(&key, json!({"name": "Old"})).unwrap();

    let recorder = Recorder::new();
    let _sub = store.subscribe(KeySpec::from(key.clone()), recorder.callback());

    let remote = Arc::new(MockRemote::new());
    let release = remote.expect_write("RenamePolicy").respond_later();

    let request = WriteRequest::new("RenamePolicy", json!({"policyID": "P1", "name": "New"}))
        .optimistic(StoreUpdate::merge(
            key.clone(),
            Patch::new()
                .with("name", "New")
                .with("pendingAction", PendingAction::Update.as_str()),
        ))
        .on_failure(StoreUpdate::merge(
            key.clone(),
            Patch::new()
                .with("name", "Old")
                .with("pendingAction", json!(null))
                .with("errors", api::error_entry("common.genericErrorMessage")),
        ));

    let task_store = store.clone();
    let task_remote = remote.clone();
    let write = tokio::spawn(async move { api::write(&task_store, &task_remote, request).await });

    tokio::task::yield_now().await;
    assert_eq!(store.get(&key).unwrap()["name"], "New");

    release.send(Err(SubmitError::new("server error"))).unwrap();
    assert!(write.await.unwrap().is_err());

    let record = store.get(&key).unwrap();
    assert_eq!(record["name"], "Old");
    assert!(record.get("pendingAction").is_none());
    assert_eq!(recorder.len(), 3);
    remote.verify();
}

#[tokio::test]
async fn test_validation_blocks_submit() {
    let store = RecordStore::new();
    let submit = MockSubmit::new();
    let mut form = Form::new("createRate", &store, submit.clone()).with_validator(
        |values: &record_store::Draft| {
            let mut errors = record_store::FieldErrors::new();
            if values.text("rate").is_empty() {
                errors.insert("rate".to_string(), "required".to_string());
            }
            errors
        },
    );

    form.set_field("rate", "");
    assert!(matches!(form.submit().await, Err(FormError::Validation(_))));
    assert!(submit.received().is_empty());
    submit.verify();
}
