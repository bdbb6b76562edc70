//! Entry points the host calls when a view is saved, closed or focused

use super::{RecordEditor, SaveOutcome};
use crate::error::Result;
use crate::host::FocusedView;
use crate::model::session::SurfaceId;

/// Status line description of a tracked surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceStatus {
    pub text: String,
    pub tooltip: String,
}

impl RecordEditor {
    /// The host saved a view
    ///
    /// Returns `Ok(None)` for views this instance does not track.
    pub async fn on_view_saved(&mut self, surface: &SurfaceId, text: &str) -> Result<Option<SaveOutcome>> {
        if !self.registry.contains(surface) {
            return Ok(None);
        }
        tracing::debug!(instance = %self.instance(), "Handling surface save: {}", surface);

        let result = self.save(surface, text).await;
        self.report(result, "Failed to save changes").map(Some)
    }

    /// The host closed a view
    ///
    /// Returns whether the view was a tracked surface.
    pub async fn on_view_closed(&mut self, surface: &SurfaceId) -> Result<bool> {
        let owned = self
            .registry
            .get(surface)
            .is_some_and(|session| session.is_owned_by(self.instance()));
        if !owned {
            return Ok(false);
        }
        tracing::debug!(instance = %self.instance(), "Tracked surface closed: {}", surface);

        let result = self.close(surface).await;
        self.report(result, "Failed to clean up closed surface")
            .map(|_| true)
    }

    /// Focus moved; returns the status to display, or `None` to hide it
    pub fn on_focus_changed(&self, view: Option<&FocusedView>) -> Option<SurfaceStatus> {
        match view {
            Some(FocusedView::Surface(surface)) => self.status_for(surface),
            _ => None,
        }
    }

    /// Status description for a tracked surface
    pub fn status_for(&self, surface: &SurfaceId) -> Option<SurfaceStatus> {
        let session = self.registry.get(surface)?;
        Some(SurfaceStatus {
            text: format!(
                "Editing JSONL: {} (Line {})",
                session.source_name(),
                session.line_number
            ),
            tooltip: format!(
                "Original: {} | Instance: {}...",
                session.source_file.display(),
                session.owner_instance_id.short()
            ),
        })
    }

    /// Whether the focused view is a surface this instance tracks
    pub fn is_editing_surface(&self) -> bool {
        self.focused_surface().is_some()
    }
}
