//! Inline Editor - optimistic in-place editing of remote attributes
//!
//! A rendered value cell is swapped for a text editor on interaction. On
//! blur the new value is shown immediately and written to the attribute
//! store in the background; a refused write puts the old value back and
//! reports the error through the page's status indicator.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod marker;
pub mod reconcile;
pub mod session;
pub mod status;

pub use client::{HttpAttributeClient, OperationOutcome, RemoteAttributeClient, RemoteError};
pub use config::{EditorConfig, WritePolicy};
pub use document::{Document, DocumentSurface, NodeId};
pub use error::EditorError;
pub use reconcile::{EditResolution, EditorPage, PendingWrite, ReconciliationController};
pub use session::{CommittedEdit, EditSession};
pub use status::StatusIndicator;
