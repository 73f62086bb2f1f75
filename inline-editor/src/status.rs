//! Page-wide status indicator.
//!
//! There is no outstanding-call counter: every transition overwrites the
//! previous one. Two remote calls in flight at once can therefore leave the
//! indicator showing whichever resolved last, even if the other failed.

use shared_types::{StatusSnapshot, StatusState};

use crate::client::OperationOutcome;
use crate::document::{DocumentSurface, NodeId};

#[derive(Debug, Clone, Default)]
pub struct StatusIndicator {
    state: StatusState,
    log: Vec<String>,
    region: Option<NodeId>,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every transition into `region` of the document.
    pub fn bound_to(region: NodeId) -> Self {
        Self {
            region: Some(region),
            ..Self::default()
        }
    }

    pub fn state(&self) -> StatusState {
        self.state
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            log: self.log.clone(),
        }
    }

    /// Must precede every remote call.
    pub fn set_busy<D: DocumentSurface + ?Sized>(&mut self, doc: &mut D) {
        self.state = StatusState::Busy;
        self.render(doc, None);
    }

    /// Success clears the log; failure appends to it.
    pub fn resolve<T, D: DocumentSurface + ?Sized>(
        &mut self,
        outcome: &OperationOutcome<T>,
        doc: &mut D,
    ) {
        match outcome {
            Ok(_) => {
                self.state = StatusState::Idle;
                self.log.clear();
                self.render(doc, None);
            }
            Err(err) => {
                self.state = StatusState::Error;
                self.log.push(err.message.clone());
                self.render(doc, Some(&err.message));
            }
        }
    }

    fn render<D: DocumentSurface + ?Sized>(&self, doc: &mut D, appended: Option<&str>) {
        let Some(region) = self.region else {
            return;
        };
        let result = doc
            .set_class_name(region, self.state.as_class())
            .and_then(|_| match (self.state, appended) {
                (StatusState::Idle, _) => doc.clear_children(region),
                (_, Some(message)) => doc.append_text(region, message),
                _ => Ok(()),
            });
        if let Err(e) = result {
            tracing::warn!(%region, error = %e, "Failed to render status region");
        }
    }
}
