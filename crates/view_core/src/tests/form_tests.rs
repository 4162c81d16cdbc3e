use super::*;
use crate::{
    drawer::Drawer,
    testing::{Harness, RecordingFetcher},
};
use serde_json::json;
use shared::{
    protocol::FetchResponse,
    schema::{ApiEndpoint, ApiRegistry},
};
use tokio::sync::Notify;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().expect("record literal")
}

fn registry() -> ApiRegistry {
    [
        ("create", ApiEndpoint::new("POST", "")),
        ("update", ApiEndpoint::new("PUT", ":id")),
    ]
    .into_iter()
    .collect()
}

fn view(harness: &Harness) -> Arc<ViewController> {
    Arc::new(ViewController::new(
        "/api/contacts",
        registry(),
        Drawer::new(),
        harness.collaborators(),
    ))
}

fn contact_form_element(use_active_record: bool) -> Element {
    serde_json::from_value(json!({
        "type": "form",
        "use_active_record": use_active_record,
        "notification": {"success": "Saved", "error": "Failed"},
        "elements": [
            {"type": "input", "name": "name", "required": true},
            {"type": "group", "elements": [
                {"type": "input", "name": "email", "required": true}
            ]},
            {"type": "input", "name": "notes"}
        ]
    }))
    .expect("form element")
}

fn spec(use_active_record: bool) -> FormSpec {
    FormSpec::from_element(&contact_form_element(use_active_record)).expect("form spec")
}

#[test]
fn spec_collects_nested_required_fields_and_defaults_to_save() {
    let spec = spec(false);
    assert_eq!(spec.required_fields, vec!["name", "email"]);
    assert_eq!(spec.action(), "save");
    assert!(FormSpec::from_element(&Element::input("name")).is_none());
}

#[test]
fn seeds_from_default_values() {
    let harness = Harness::new();
    let mut spec = spec(false);
    spec.default_values = Some(record(json!({"name": "Jane"})));

    let form = FormController::new(view(&harness), spec);

    assert_eq!(form.value("name"), Some(json!("Jane")));
    assert!(!form.is_dirty());
    assert_eq!(form.phase(), FormPhase::Pristine);
}

#[test]
fn active_record_form_seeds_from_drawer_payload() {
    let harness = Harness::new();
    let view = view(&harness);
    view.drawer()
        .open("edit", Some(record(json!({"id": 4, "name": "Ann"}))));

    let form = FormController::new(view, spec(true));

    assert_eq!(form.values(), record(json!({"id": 4, "name": "Ann"})));
}

#[test]
fn editing_marks_dirty_and_reverting_clears_it() {
    let harness = Harness::new();
    let mut spec = spec(false);
    spec.default_values = Some(record(json!({"name": "Jane"})));
    let form = FormController::new(view(&harness), spec);

    form.set_value("name", json!("Janet"));
    assert!(form.is_dirty());
    assert_eq!(form.phase(), FormPhase::Editing);

    form.set_value("name", json!("Jane"));
    assert!(!form.is_dirty());
}

#[tokio::test]
async fn missing_required_field_blocks_submit() {
    let harness = Harness::new();
    let form = FormController::new(view(&harness), spec(false));
    form.set_value("name", json!("Jane"));
    form.set_value("email", json!(""));

    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::Invalid(vec!["email".to_string()]));
    assert!(!form.is_submitting());
    assert_eq!(form.error("email"), Some("[This field is required]".to_string()));
    assert!(form.is_touched("email"));
    assert_eq!(form.error("name"), None);
    assert!(harness.fetcher.calls().is_empty());
}

#[tokio::test]
async fn set_value_clears_field_error() {
    let harness = Harness::new();
    let form = FormController::new(view(&harness), spec(false));

    form.validate();
    assert!(form.error("name").is_some());

    form.set_value("name", json!("Jane"));
    assert_eq!(form.error("name"), None);
    assert!(form.error("email").is_some());
}

#[test]
fn errors_are_only_visible_once_touched() {
    let harness = Harness::new();
    let form = FormController::new(view(&harness), spec(false));
    let missing = form.validate();
    assert_eq!(missing, vec!["name", "email"]);

    form.set_value("email", json!(null));
    form.validate();
    assert!(form.visible_error("email").is_some());

    assert_eq!(form.visible_error("notes"), None);
}

#[test]
fn untouched_field_hides_its_error() {
    let harness = Harness::new();
    let form = FormController::new(view(&harness), spec(false));
    {
        let mut inner = form.lock();
        inner
            .state
            .errors
            .insert("notes".into(), "too long".into());
    }
    assert_eq!(form.visible_error("notes"), None);
    form.set_touched("notes");
    assert_eq!(form.visible_error("notes"), Some("too long".to_string()));
}

#[tokio::test]
async fn submit_uses_form_values_as_item() {
    let harness = Harness::new();
    let mut spec = spec(false);
    spec.default_values = Some(record(json!({"id": 9, "name": "Jane", "email": "j@x.io"})));
    let form = FormController::new(view(&harness), spec);

    let outcome = form.submit().await;

    assert!(outcome.is_success());
    let calls = harness.fetcher.calls();
    assert_eq!(calls[0].0, "/api/contacts/9");
    assert_eq!(calls[0].1.method, "PUT");
    assert_eq!(
        calls[0].1.body,
        Some(json!({"id": 9, "name": "Jane", "email": "j@x.io"}))
    );
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn create_then_save_again_updates_the_new_record() {
    let harness = Harness::new();
    harness.fetcher.respond(FetchResponse::with_data(
        json!({"id": 31, "name": "Jane", "email": "j@x.io"}),
    ));
    let view = view(&harness);
    view.drawer().open("create", None);
    let form = FormController::new(view.clone(), spec(true));
    form.set_value("name", json!("Jane"));
    form.set_value("email", json!("j@x.io"));

    let first = form.submit().await;
    assert!(first.is_success());
    assert_eq!(form.value("id"), Some(json!(31)));
    assert!(!form.is_dirty());

    form.set_value("name", json!("Janet"));
    form.submit().await;

    let calls = harness.fetcher.calls();
    assert_eq!(calls[0].0, "/api/contacts");
    assert_eq!(calls[0].1.method, "POST");
    assert_eq!(calls[1].0, "/api/contacts/31");
    assert_eq!(calls[1].1.method, "PUT");
    assert_eq!(
        harness.notifier.toasts().len(),
        2,
        "one success toast per save"
    );
}

#[tokio::test]
async fn failed_submit_leaves_submitting_state() {
    let harness = Harness::new();
    harness.fetcher.fail("timed out");
    let mut spec = spec(false);
    spec.default_values = Some(record(json!({"name": "Jane", "email": "j@x.io"})));
    let form = FormController::new(view(&harness), spec);
    form.set_value("notes", json!("draft"));

    let outcome = form.submit().await;

    assert!(!outcome.is_success());
    assert!(!form.is_submitting());
    assert!(form.is_dirty(), "values survive a failed submit");
    assert_eq!(
        outcome.into_outcome().error.map(|e| e.code),
        Some(ErrorCode::Remote)
    );
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let harness = Harness::with_fetcher(RecordingFetcher::gated(started.clone(), release.clone()));
    let mut spec = spec(false);
    spec.default_values = Some(record(json!({"name": "Jane", "email": "j@x.io"})));
    let form = FormController::new(view(&harness), spec);

    let (first, second) = tokio::join!(form.submit(), async {
        started.notified().await;
        assert_eq!(form.phase(), FormPhase::Submitting);
        let second = form.submit().await;
        release.notify_one();
        second
    });

    assert!(first.is_success());
    assert_eq!(second, SubmitOutcome::Busy);
    assert_eq!(harness.fetcher.calls().len(), 1);
    assert!(!form.is_submitting());
}

#[test]
fn refresh_seed_follows_drawer_payload() {
    let harness = Harness::new();
    let view = view(&harness);
    view.drawer().open("edit", Some(record(json!({"id": 1, "name": "A"}))));
    let form = FormController::new(view.clone(), spec(true));
    form.set_value("name", json!("changed"));

    assert!(!form.refresh_seed());
    assert!(form.is_dirty());

    view.drawer().set_payload(Some(record(json!({"id": 2, "name": "B"}))));
    assert!(form.refresh_seed());
    assert_eq!(form.values(), record(json!({"id": 2, "name": "B"})));
    assert!(!form.is_dirty());
    assert_eq!(form.phase(), FormPhase::Pristine);
}

#[tokio::test]
async fn reopening_drawer_on_another_row_reseeds_before_submit() {
    let harness = Harness::new();
    let view = view(&harness);
    view.drawer().open(
        "edit",
        Some(record(json!({"id": 1, "name": "Ann", "email": "ann@x.io"}))),
    );
    let form = FormController::new(view.clone(), spec(true));
    form.set_value("name", json!("Annie"));
    form.set_touched("name");

    view.drawer().open(
        "edit",
        Some(record(json!({"id": 2, "name": "Bob", "email": "bob@x.io"}))),
    );

    let state = form.state();
    assert_eq!(state.values.get("id"), Some(&json!(2)));
    assert!(state.touched.is_empty());
    assert!(!form.is_dirty());

    assert!(form.submit().await.is_success());
    let calls = harness.fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/api/contacts/2");
    assert_eq!(
        calls[0].1.body,
        Some(json!({"id": 2, "name": "Bob", "email": "bob@x.io"}))
    );
}

#[test]
fn picker_selection_reseeds_without_an_explicit_refresh() {
    let harness = Harness::new();
    let view = view(&harness);
    view.drawer().open("edit", Some(record(json!({"id": 1, "name": "A"}))));
    let form = FormController::new(view.clone(), spec(true));
    form.validate();
    assert!(form.error("email").is_some());

    view.drawer()
        .set_payload(Some(record(json!({"id": 3, "name": "C"}))));

    assert_eq!(form.value("name"), Some(json!("C")));
    assert_eq!(form.error("email"), None);
    assert!(!form.refresh_seed());
}
