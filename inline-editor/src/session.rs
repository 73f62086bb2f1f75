//! Inline edit session.
//!
//! At most one session is active per page. While active, the session owns
//! the editor node spliced into the document in place of the display node.
//! Leaving the session (blur) always completes synchronously and puts a
//! display node back, whatever the remote write later does.

use shared_types::AttributePath;

use crate::config::{EditorConfig, WritePolicy};
use crate::document::{DocumentSurface, NodeId};
use crate::error::EditorError;
use crate::marker::{locate_editable, parse_marker, EditMetadata};

pub const EDITOR_TAG: &str = "textarea";
pub const EDITOR_CLASS: &str = "inline-editor";

#[derive(Debug, Clone)]
struct ActiveEdit {
    path: AttributePath,
    original_value: String,
    original_node: NodeId,
    editor_node: NodeId,
    metadata: EditMetadata,
}

#[derive(Debug, Clone, Default)]
enum SessionState {
    #[default]
    Inactive,
    Active(ActiveEdit),
}

/// An editable region and the remote attribute behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub node: NodeId,
    pub path: AttributePath,
    pub metadata: EditMetadata,
}

/// What a closed session hands over for reconciliation with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEdit {
    pub path: AttributePath,
    pub original_value: String,
    pub new_value: String,
    /// Freshly inserted node showing `new_value`
    pub display_node: NodeId,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    item_path: String,
    policy: WritePolicy,
    state: SessionState,
    pending_writes: usize,
}

impl EditSession {
    /// A session editing attributes of the item at `item_path`.
    pub fn new(item_path: impl Into<String>) -> Self {
        Self::with_policy(item_path, WritePolicy::default())
    }

    pub fn with_policy(item_path: impl Into<String>, policy: WritePolicy) -> Self {
        Self {
            item_path: item_path.into(),
            policy,
            state: SessionState::Inactive,
            pending_writes: 0,
        }
    }

    /// A session whose write policy comes from `config`.
    pub fn from_config(item_path: impl Into<String>, config: &EditorConfig) -> Self {
        Self::with_policy(item_path, config.write_policy)
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn item_path(&self) -> &str {
        &self.item_path
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn pending_writes(&self) -> usize {
        self.pending_writes
    }

    pub fn editor_node(&self) -> Option<NodeId> {
        match &self.state {
            SessionState::Active(edit) => Some(edit.editor_node),
            SessionState::Inactive => None,
        }
    }

    pub fn metadata(&self) -> Option<&EditMetadata> {
        match &self.state {
            SessionState::Active(edit) => Some(&edit.metadata),
            SessionState::Inactive => None,
        }
    }

    fn accepts_new_session(&self) -> bool {
        match self.policy {
            WritePolicy::Overlapping => !self.is_active(),
            WritePolicy::Serialized => !self.is_active() && self.pending_writes == 0,
        }
    }

    /// Find the editable region containing `target` and the attribute it shows.
    pub fn resolve_target<D: DocumentSurface + ?Sized>(
        &self,
        doc: &D,
        target: NodeId,
    ) -> Option<EditTarget> {
        let Some(node) = locate_editable(doc, target) else {
            tracing::debug!(%target, "No editable region at interaction target");
            return None;
        };

        let metadata = parse_marker(doc.class_name(node).unwrap_or_default());
        let Some(path) = metadata
            .attribute()
            .and_then(|attr| AttributePath::new(self.item_path.as_str(), attr).ok())
        else {
            tracing::debug!(%node, "Editable region names no attribute");
            return None;
        };

        Some(EditTarget {
            node,
            path,
            metadata,
        })
    }

    /// Enter edit mode for the editable region containing `target`.
    ///
    /// Returns the editor node, or `None` when the interaction is ignored:
    /// a session is already active, no editable region contains `target`, or
    /// the region's marker names no attribute. Ignored interactions leave the
    /// document untouched.
    pub fn begin<D: DocumentSurface + ?Sized>(
        &mut self,
        doc: &mut D,
        target: NodeId,
    ) -> Result<Option<NodeId>, EditorError> {
        if !self.accepts_new_session() {
            tracing::debug!(
                %target,
                active = self.is_active(),
                pending_writes = self.pending_writes,
                "Edit already in progress; ignoring interaction"
            );
            return Ok(None);
        }

        let Some(EditTarget {
            node: original_node,
            path,
            metadata,
        }) = self.resolve_target(doc, target)
        else {
            return Ok(None);
        };

        let original_value = doc.text_content(original_node);
        let dims = doc.dimensions(original_node);

        let editor_node = doc.create_element(EDITOR_TAG, EDITOR_CLASS);
        doc.set_dimensions(editor_node, dims)?;
        doc.set_text(editor_node, &original_value)?;
        doc.replace_node(original_node, editor_node)?;

        tracing::debug!(%path, node = %original_node, editor = %editor_node, "Edit session started");
        self.state = SessionState::Active(ActiveEdit {
            path,
            original_value,
            original_node,
            editor_node,
            metadata,
        });
        Ok(Some(editor_node))
    }

    /// Leave edit mode, keeping whatever the editor now holds.
    ///
    /// The editor is swapped for a new display node carrying the original's
    /// tag and markers. Returns `None` when no session is active.
    pub fn finish<D: DocumentSurface + ?Sized>(
        &mut self,
        doc: &mut D,
    ) -> Result<Option<CommittedEdit>, EditorError> {
        let SessionState::Active(edit) = std::mem::take(&mut self.state) else {
            return Ok(None);
        };

        let new_value = doc.text_content(edit.editor_node);
        let tag = doc
            .tag(edit.original_node)
            .unwrap_or("span")
            .to_string();
        let class_name = doc
            .class_name(edit.original_node)
            .unwrap_or_default()
            .to_string();

        let dims = doc.dimensions(edit.original_node);

        let display_node = doc.create_element(&tag, &class_name);
        doc.set_dimensions(display_node, dims)?;
        doc.set_text(display_node, &new_value)?;
        doc.replace_node(edit.editor_node, display_node)?;

        tracing::debug!(path = %edit.path, display = %display_node, "Edit session finished");
        Ok(Some(CommittedEdit {
            path: edit.path,
            original_value: edit.original_value,
            new_value,
            display_node,
        }))
    }

    /// Leave edit mode discarding the editor's text; the original node
    /// goes back where it was. Returns whether a session was active.
    pub fn cancel<D: DocumentSurface + ?Sized>(&mut self, doc: &mut D) -> Result<bool, EditorError> {
        let SessionState::Active(edit) = std::mem::take(&mut self.state) else {
            return Ok(false);
        };
        doc.replace_node(edit.editor_node, edit.original_node)?;
        tracing::debug!(path = %edit.path, "Edit session cancelled");
        Ok(true)
    }

    pub fn write_dispatched(&mut self) {
        self.pending_writes += 1;
    }

    pub fn write_resolved(&mut self) {
        self.pending_writes = self.pending_writes.saturating_sub(1);
    }
}
