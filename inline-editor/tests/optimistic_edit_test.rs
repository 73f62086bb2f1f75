//! Optimistic Edit Integration Tests
//!
//! Drives the reconciliation controller against a scripted client whose
//! writes resolve only when the test says so, so the window between the
//! speculative display and the store's verdict can be inspected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use inline_editor::{
    Document, DocumentSurface, EditResolution, EditSession, EditorConfig, EditorPage, NodeId,
    OperationOutcome, ReconciliationController, RemoteAttributeClient, RemoteError,
    StatusIndicator, WritePolicy,
};
use shared_types::{AttributePath, StatusState};

const ITEM: &str = "//userdata/alice";

struct WriteCall {
    path: AttributePath,
    value: Value,
    reply: oneshot::Sender<OperationOutcome<()>>,
}

struct ScriptedClient {
    writes: mpsc::UnboundedSender<WriteCall>,
    reads: StdMutex<HashMap<String, OperationOutcome<Value>>>,
    commit_outcome: StdMutex<OperationOutcome<()>>,
}

#[async_trait]
impl RemoteAttributeClient for ScriptedClient {
    async fn read(&self, path: &AttributePath) -> OperationOutcome<Value> {
        self.reads
            .lock()
            .unwrap()
            .get(&path.attribute)
            .cloned()
            .unwrap_or_else(|| Err(RemoteError::new("attribute not found")))
    }

    async fn write(&self, path: &AttributePath, value: Value) -> OperationOutcome<()> {
        let (reply, verdict) = oneshot::channel();
        self.writes
            .send(WriteCall {
                path: path.clone(),
                value,
                reply,
            })
            .map_err(|_| RemoteError::new("test harness dropped"))?;
        verdict
            .await
            .unwrap_or_else(|_| Err(RemoteError::new("write abandoned")))
    }

    async fn delete(&self, _path: &AttributePath) -> OperationOutcome<()> {
        Ok(())
    }

    async fn commit_all(&self) -> OperationOutcome<()> {
        self.commit_outcome.lock().unwrap().clone()
    }
}

struct Fixture {
    controller: ReconciliationController<ScriptedClient, Document>,
    writes: mpsc::UnboundedReceiver<WriteCall>,
    status_region: NodeId,
    name_cell: NodeId,
    name_text: NodeId,
    age_cell: NodeId,
    age_text: NodeId,
}

struct Table {
    doc: Document,
    status_region: NodeId,
    name_cell: NodeId,
    name_text: NodeId,
    age_cell: NodeId,
    age_text: NodeId,
}

/// A one-row attribute table:
/// `<div status/> <table><tr><td><div editable attr-displayName>Alice</div></td>
/// <td><div editable attr-age>33</div></td></tr></table>`
fn table() -> Table {
    let mut doc = Document::new();
    let status_region = doc.append_element(doc.root(), "div", "idle").unwrap();
    let table = doc.append_element(doc.root(), "table", "").unwrap();
    let row = doc.append_element(table, "tr", "oddrow").unwrap();

    let name_cell = doc.append_element(row, "td", "").unwrap();
    let name_value = doc
        .append_element(name_cell, "div", "editable type-str attr-displayName")
        .unwrap();
    let name_text = doc.append_text_node(name_value, "Alice").unwrap();

    let age_cell = doc.append_element(row, "td", "").unwrap();
    let age_value = doc
        .append_element(age_cell, "div", "editable type-int attr-age")
        .unwrap();
    let age_text = doc.append_text_node(age_value, "33").unwrap();

    Table {
        doc,
        status_region,
        name_cell,
        name_text,
        age_cell,
        age_text,
    }
}

fn fixture(policy: WritePolicy) -> Fixture {
    fixture_with(EditSession::with_policy(ITEM, policy))
}

fn fixture_with(session: EditSession) -> Fixture {
    let t = table();
    let (tx, rx) = mpsc::unbounded_channel();
    let client = ScriptedClient {
        writes: tx,
        reads: StdMutex::new(HashMap::new()),
        commit_outcome: StdMutex::new(Ok(())),
    };

    let page = EditorPage::new(t.doc, StatusIndicator::bound_to(t.status_region), session);

    Fixture {
        controller: ReconciliationController::new(page, Arc::new(client)),
        writes: rx,
        status_region: t.status_region,
        name_cell: t.name_cell,
        name_text: t.name_text,
        age_cell: t.age_cell,
        age_text: t.age_text,
    }
}

impl Fixture {
    async fn text_of(&self, node: NodeId) -> String {
        self.controller.page().lock().await.document.text_content(node)
    }

    async fn type_into(&self, editor: NodeId, text: &str) {
        let mut page = self.controller.page().lock().await;
        page.document.set_text(editor, text).unwrap();
    }

    async fn first_child(&self, node: NodeId) -> NodeId {
        self.controller.page().lock().await.document.children(node)[0]
    }

    async fn next_write(&mut self) -> WriteCall {
        self.writes.recv().await.expect("No write was dispatched")
    }
}

#[tokio::test]
async fn test_successful_edit_keeps_speculative_value() {
    let mut f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    assert_eq!(f.text_of(f.name_cell).await, "Alice");
    f.type_into(editor, "Alicia").await;

    let pending = f.controller.blur().await.unwrap().unwrap();

    // Shown before the store answers
    assert_eq!(f.text_of(f.name_cell).await, "Alicia");
    assert_eq!(f.controller.status().await.state, StatusState::Busy);

    let call = f.next_write().await;
    assert_eq!(call.path, AttributePath::new(ITEM, "displayName").unwrap());
    assert_eq!(call.value, json!("Alicia"));
    assert!(!pending.is_settled());
    call.reply.send(Ok(())).unwrap();

    let resolution = pending.settled().await;
    assert_eq!(
        resolution,
        EditResolution::Confirmed {
            path: AttributePath::new(ITEM, "displayName").unwrap(),
            value: "Alicia".to_string(),
        }
    );
    assert_eq!(f.text_of(f.name_cell).await, "Alicia");

    let status = f.controller.status().await;
    assert_eq!(status.state, StatusState::Idle);
    assert!(status.log.is_empty());
}

#[tokio::test]
async fn test_rejected_edit_rolls_back_and_reports() {
    let mut f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "Alicia").await;
    let pending = f.controller.blur().await.unwrap().unwrap();
    assert_eq!(f.text_of(f.name_cell).await, "Alicia");

    let call = f.next_write().await;
    call.reply.send(Err(RemoteError::new("conflict"))).unwrap();

    match pending.settled().await {
        EditResolution::RolledBack {
            restored, error, ..
        } => {
            assert_eq!(restored, "Alice");
            assert_eq!(error.message, "conflict");
        }
        other => panic!("Expected rollback, got {other:?}"),
    }

    assert_eq!(f.text_of(f.name_cell).await, "Alice");
    let status = f.controller.status().await;
    assert_eq!(status.state, StatusState::Error);
    assert_eq!(status.log, vec!["conflict".to_string()]);

    let page = f.controller.page().lock().await;
    assert_eq!(page.document.class_name(f.status_region), Some("error"));
    assert_eq!(page.document.text_content(f.status_region), "conflict");
}

#[tokio::test]
async fn test_display_node_stays_editable_after_write() {
    let mut f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "Alicia").await;
    let pending = f.controller.blur().await.unwrap().unwrap();
    f.next_write().await.reply.send(Ok(())).unwrap();
    assert!(pending.settled().await.is_confirmed());

    let display = f.first_child(f.name_cell).await;
    let editor = f.controller.interact(display).await.unwrap().unwrap();
    assert_eq!(f.text_of(editor).await, "Alicia");
}

#[tokio::test]
async fn test_overlapping_edits_roll_back_independently() {
    let mut f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "Alicia").await;
    let name_write = f.controller.blur().await.unwrap().unwrap();

    // A second edit starts while the first write is outstanding
    let editor = f
        .controller
        .interact(f.age_text)
        .await
        .unwrap()
        .expect("Overlapping policy should allow a new session");
    f.type_into(editor, "34").await;
    let age_write = f.controller.blur().await.unwrap().unwrap();

    let first = f.next_write().await;
    let second = f.next_write().await;
    assert_eq!(first.path.attribute, "displayName");
    assert_eq!(second.path.attribute, "age");

    second.reply.send(Ok(())).unwrap();
    assert!(age_write.settled().await.is_confirmed());
    first.reply.send(Err(RemoteError::new("conflict"))).unwrap();
    assert!(!name_write.settled().await.is_confirmed());

    assert_eq!(f.text_of(f.name_cell).await, "Alice");
    assert_eq!(f.text_of(f.age_cell).await, "34");

    // Last resolution wins
    let status = f.controller.status().await;
    assert_eq!(status.state, StatusState::Error);
    assert_eq!(status.log, vec!["conflict".to_string()]);
}

#[tokio::test]
async fn test_rollback_under_reopened_editor_leaves_editor_alone() {
    let mut f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "Alicia").await;
    let pending = f.controller.blur().await.unwrap().unwrap();

    let display = f.first_child(f.name_cell).await;
    let editor = f.controller.interact(display).await.unwrap().unwrap();
    f.type_into(editor, "Alicja").await;

    f.next_write()
        .await
        .reply
        .send(Err(RemoteError::new("conflict")))
        .unwrap();
    assert!(!pending.settled().await.is_confirmed());

    assert_eq!(f.text_of(f.name_cell).await, "Alicja");
    assert!(f.controller.page().lock().await.session.is_active());
}

#[tokio::test]
async fn test_serialized_policy_waits_for_write() {
    let mut f = fixture(WritePolicy::Serialized);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "Alicia").await;
    let pending = f.controller.blur().await.unwrap().unwrap();

    assert_eq!(f.controller.interact(f.age_text).await.unwrap(), None);

    f.next_write().await.reply.send(Ok(())).unwrap();
    pending.settled().await;

    assert!(f.controller.interact(f.age_text).await.unwrap().is_some());
}

#[tokio::test]
async fn test_serialized_policy_from_config() {
    let config = EditorConfig::from_lookup(|key| match key {
        "INLINE_EDIT_WRITE_POLICY" => Some("serialized".to_string()),
        _ => None,
    })
    .unwrap();
    let mut f = fixture_with(EditSession::from_config(ITEM, &config));

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "Alicia").await;
    let pending = f.controller.blur().await.unwrap().unwrap();

    assert_eq!(f.controller.interact(f.age_text).await.unwrap(), None);

    f.next_write().await.reply.send(Ok(())).unwrap();
    assert!(pending.settled().await.is_confirmed());
    assert!(f.controller.interact(f.age_text).await.unwrap().is_some());
}

/// Writes blow up inside the client instead of returning an outcome.
struct PanickingClient;

#[async_trait]
impl RemoteAttributeClient for PanickingClient {
    async fn read(&self, _path: &AttributePath) -> OperationOutcome<Value> {
        Ok(Value::Null)
    }

    async fn write(&self, _path: &AttributePath, _value: Value) -> OperationOutcome<()> {
        panic!("client bug")
    }

    async fn delete(&self, _path: &AttributePath) -> OperationOutcome<()> {
        Ok(())
    }

    async fn commit_all(&self) -> OperationOutcome<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_panicking_write_still_settles_page() {
    let t = table();
    let page = EditorPage::new(
        t.doc,
        StatusIndicator::bound_to(t.status_region),
        EditSession::with_policy(ITEM, WritePolicy::Serialized),
    );
    let controller = ReconciliationController::new(page, Arc::new(PanickingClient));

    let editor = controller.interact(t.name_text).await.unwrap().unwrap();
    controller
        .page()
        .lock()
        .await
        .document
        .set_text(editor, "Alicia")
        .unwrap();
    let pending = controller.blur().await.unwrap().unwrap();

    match pending.settled().await {
        EditResolution::RolledBack { restored, .. } => assert_eq!(restored, "Alice"),
        other => panic!("Expected rollback, got {other:?}"),
    }

    {
        let page = controller.page().lock().await;
        assert_eq!(page.document.text_content(t.name_cell), "Alice");
        assert_eq!(page.session.pending_writes(), 0);
    }
    let status = controller.status().await;
    assert_eq!(status.state, StatusState::Error);
    assert_eq!(status.log.len(), 1);

    // The pending write was accounted for, so the page accepts new edits
    assert!(controller.interact(t.age_text).await.unwrap().is_some());
}

#[tokio::test]
async fn test_second_interaction_while_active_is_ignored() {
    let f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    assert_eq!(f.controller.interact(f.age_text).await.unwrap(), None);
    assert_eq!(f.controller.interact(editor).await.unwrap(), None);
    assert_eq!(f.text_of(f.age_text).await, "33");
}

#[tokio::test]
async fn test_non_editable_target_is_ignored() {
    let f = fixture(WritePolicy::Overlapping);
    assert_eq!(f.controller.interact(f.status_region).await.unwrap(), None);
    assert!(!f.controller.page().lock().await.session.is_active());
}

#[tokio::test]
async fn test_unchanged_blur_still_writes_original() {
    let mut f = fixture(WritePolicy::Overlapping);

    f.controller.interact(f.name_text).await.unwrap().unwrap();
    let pending = f.controller.blur().await.unwrap().unwrap();
    assert_eq!(f.text_of(f.name_cell).await, "Alice");

    let call = f.next_write().await;
    assert_eq!(call.value, json!("Alice"));
    call.reply.send(Ok(())).unwrap();
    assert!(pending.settled().await.is_confirmed());
}

#[tokio::test]
async fn test_blur_without_session_dispatches_nothing() {
    let mut f = fixture(WritePolicy::Overlapping);
    assert!(f.controller.blur().await.unwrap().is_none());
    assert!(f.writes.try_recv().is_err());
    assert_eq!(f.controller.status().await.state, StatusState::Idle);
}

#[tokio::test]
async fn test_cancel_discards_edit_without_writing() {
    let mut f = fixture(WritePolicy::Overlapping);

    let editor = f.controller.interact(f.name_text).await.unwrap().unwrap();
    f.type_into(editor, "scratch").await;

    assert!(f.controller.cancel().await.unwrap());
    assert_eq!(f.text_of(f.name_cell).await, "Alice");
    assert!(f.writes.try_recv().is_err());
    assert!(!f.controller.cancel().await.unwrap());
}

#[tokio::test]
async fn test_commit_all_drives_status() {
    let f = fixture(WritePolicy::Overlapping);

    f.controller.commit_all().await.unwrap();
    assert_eq!(f.controller.status().await.state, StatusState::Idle);

    *f.controller.client().commit_outcome.lock().unwrap() =
        Err(RemoteError::new("repository is read-only"));
    let err = f.controller.commit_all().await.unwrap_err();
    assert_eq!(err.message, "repository is read-only");

    let status = f.controller.status().await;
    assert_eq!(status.state, StatusState::Error);
    assert_eq!(status.log, vec!["repository is read-only".to_string()]);
}

#[tokio::test]
async fn test_refresh_shows_stored_value() {
    let f = fixture(WritePolicy::Overlapping);
    f.controller
        .client()
        .reads
        .lock()
        .unwrap()
        .insert("displayName".to_string(), Ok(json!("Alicia")));

    assert!(f.controller.refresh(f.name_text).await.unwrap());
    assert_eq!(f.text_of(f.name_cell).await, "Alicia");
    assert_eq!(f.controller.status().await.state, StatusState::Idle);
}

#[tokio::test]
async fn test_failed_refresh_leaves_text_alone() {
    let f = fixture(WritePolicy::Overlapping);

    assert!(!f.controller.refresh(f.age_text).await.unwrap());
    assert_eq!(f.text_of(f.age_text).await, "33");

    let status = f.controller.status().await;
    assert_eq!(status.state, StatusState::Error);
    assert_eq!(status.log, vec!["attribute not found".to_string()]);
}
