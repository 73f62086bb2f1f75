//! Reconciliation of speculative edits with the attribute store.
//!
//! The page lock is held only for document and status updates, never while a
//! remote call is awaited. Each write continuation captures its own display
//! node and original value, so a failed write rolls back exactly the edit it
//! belongs to even when several writes are outstanding.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shared_types::{AttributePath, StatusSnapshot};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::client::{HttpAttributeClient, OperationOutcome, RemoteAttributeClient, RemoteError};
use crate::config::EditorConfig;
use crate::document::{DocumentSurface, NodeId};
use crate::error::EditorError;
use crate::session::{CommittedEdit, EditSession, EditTarget};
use crate::status::StatusIndicator;

/// One document together with its status indicator and edit session.
#[derive(Debug)]
pub struct EditorPage<D> {
    pub document: D,
    pub status: StatusIndicator,
    pub session: EditSession,
}

impl<D: DocumentSurface> EditorPage<D> {
    pub fn new(document: D, status: StatusIndicator, session: EditSession) -> Self {
        Self {
            document,
            status,
            session,
        }
    }
}

/// How a dispatched write ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditResolution {
    /// The store accepted the value; the speculative text stands.
    Confirmed { path: AttributePath, value: String },
    /// The store refused the value; the display node shows `restored` again.
    RolledBack {
        path: AttributePath,
        restored: String,
        error: RemoteError,
    },
    /// The reconciling task itself never reported back, e.g. the runtime
    /// shut down before the write resolved.
    Abandoned { path: AttributePath, reason: String },
}

impl EditResolution {
    pub fn path(&self) -> &AttributePath {
        match self {
            Self::Confirmed { path, .. }
            | Self::RolledBack { path, .. }
            | Self::Abandoned { path, .. } => path,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Handle on a write that is in flight.
#[derive(Debug)]
pub struct PendingWrite {
    path: AttributePath,
    handle: JoinHandle<EditResolution>,
}

impl PendingWrite {
    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn is_settled(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the store's verdict and the resulting page update.
    pub async fn settled(self) -> EditResolution {
        match self.handle.await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!(path = %self.path, error = %e, "Write task did not complete");
                EditResolution::Abandoned {
                    path: self.path,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Drives edit sessions on one page and reconciles them with the store.
///
/// Writes are spawned onto the current tokio runtime, so `blur` must be
/// called from within one.
pub struct ReconciliationController<C, D> {
    page: Arc<Mutex<EditorPage<D>>>,
    client: Arc<C>,
}

impl<C, D> Clone for ReconciliationController<C, D> {
    fn clone(&self) -> Self {
        Self {
            page: Arc::clone(&self.page),
            client: Arc::clone(&self.client),
        }
    }
}

impl<C, D> ReconciliationController<C, D>
where
    C: RemoteAttributeClient + 'static,
    D: DocumentSurface + Send + 'static,
{
    pub fn new(page: EditorPage<D>, client: Arc<C>) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            client,
        }
    }

    pub fn page(&self) -> &Arc<Mutex<EditorPage<D>>> {
        &self.page
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub async fn status(&self) -> StatusSnapshot {
        self.page.lock().await.status.snapshot()
    }

    /// A click or focus on `target`. Returns the editor node when a session
    /// started.
    pub async fn interact(&self, target: NodeId) -> Result<Option<NodeId>, EditorError> {
        let mut guard = self.page.lock().await;
        let page = &mut *guard;
        page.session.begin(&mut page.document, target)
    }

    /// Leave the active session and write its value to the store.
    ///
    /// The display node shows the new value before this returns. `None` when
    /// no session was active.
    pub async fn blur(&self) -> Result<Option<PendingWrite>, EditorError> {
        let edit = {
            let mut guard = self.page.lock().await;
            let page = &mut *guard;
            let Some(edit) = page.session.finish(&mut page.document)? else {
                return Ok(None);
            };
            page.status.set_busy(&mut page.document);
            page.session.write_dispatched();
            edit
        };

        let path = edit.path.clone();
        let page = Arc::clone(&self.page);
        let client = Arc::clone(&self.client);
        let write_path = edit.path.clone();
        let value = Value::String(edit.new_value.clone());
        let handle = tokio::spawn(async move {
            // A panicking client still settles the status and pending-write count
            let outcome = tokio::spawn(async move { client.write(&write_path, value).await })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(path = %edit.path, error = %e, "Write call did not complete");
                    Err(RemoteError::new(format!("Write did not complete: {e}")))
                });
            let mut guard = page.lock().await;
            reconcile_write(&mut guard, edit, outcome)
        });

        Ok(Some(PendingWrite { path, handle }))
    }

    /// Leave the active session without writing. Returns whether one was active.
    pub async fn cancel(&self) -> Result<bool, EditorError> {
        let mut guard = self.page.lock().await;
        let page = &mut *guard;
        page.session.cancel(&mut page.document)
    }

    /// Make the store's working view durable.
    pub async fn commit_all(&self) -> OperationOutcome<()> {
        {
            let mut guard = self.page.lock().await;
            let page = &mut *guard;
            page.status.set_busy(&mut page.document);
        }

        let outcome = self.client.commit_all().await;

        let mut guard = self.page.lock().await;
        let page = &mut *guard;
        page.status.resolve(&outcome, &mut page.document);
        outcome
    }

    /// Re-read the attribute behind the editable region containing `target`
    /// and show the stored value.
    ///
    /// Returns whether the region's text was replaced. A failed read only
    /// shows up in the status indicator.
    pub async fn refresh(&self, target: NodeId) -> Result<bool, EditorError> {
        let EditTarget { node, path, .. } = {
            let mut guard = self.page.lock().await;
            let page = &mut *guard;
            let Some(found) = page.session.resolve_target(&page.document, target) else {
                return Ok(false);
            };
            page.status.set_busy(&mut page.document);
            found
        };

        let outcome = self.client.read(&path).await;

        let mut guard = self.page.lock().await;
        let page = &mut *guard;
        page.status.resolve(&outcome, &mut page.document);
        let Ok(value) = outcome else {
            return Ok(false);
        };
        if !page.document.is_attached(node) {
            tracing::debug!(%path, %node, "Refreshed region left the document; dropping value");
            return Ok(false);
        }
        page.document.set_text(node, &display_text(&value))?;
        tracing::debug!(%path, %node, "Refreshed attribute value");
        Ok(true)
    }
}

impl<D> ReconciliationController<HttpAttributeClient, D>
where
    D: DocumentSurface + Send + 'static,
{
    /// A controller for one page, talking to the store and using the write
    /// policy named in `config`.
    pub fn from_config(
        document: D,
        status: StatusIndicator,
        item_path: impl Into<String>,
        config: &EditorConfig,
    ) -> Result<Self, EditorError> {
        let client = HttpAttributeClient::from_config(config)?;
        let session = EditSession::from_config(item_path, config);
        Ok(Self::new(
            EditorPage::new(document, status, session),
            Arc::new(client),
        ))
    }
}

fn reconcile_write<D: DocumentSurface>(
    page: &mut EditorPage<D>,
    edit: CommittedEdit,
    outcome: OperationOutcome<()>,
) -> EditResolution {
    page.session.write_resolved();
    page.status.resolve(&outcome, &mut page.document);

    let CommittedEdit {
        path,
        original_value,
        new_value,
        display_node,
    } = edit;

    match outcome {
        Ok(()) => {
            tracing::debug!(%path, "Write confirmed");
            EditResolution::Confirmed {
                path,
                value: new_value,
            }
        }
        Err(error) => {
            tracing::warn!(%path, error = %error, "Write rejected; restoring original value");
            if let Err(e) = page.document.set_text(display_node, &original_value) {
                tracing::warn!(%path, node = %display_node, error = %e, "Failed to restore display node");
            } else if !page.document.is_attached(display_node) {
                tracing::debug!(%path, node = %display_node, "Restored a display node no longer in the document");
            }
            EditResolution::RolledBack {
                path,
                restored: original_value,
                error,
            }
        }
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
