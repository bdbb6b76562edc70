//! Editor host interface
//!
//! The record editor never renders anything. It asks the host to show and
//! close surfaces, to prompt the user, and to display messages. The host in
//! turn reports focus changes, saves and closes through the notification
//! entry points on [`RecordEditor`](crate::app::RecordEditor).

use crate::model::session::SurfaceId;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

/// Content type of the editing surfaces
pub const SURFACE_CONTENT_TYPE: &str = "json";

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
    /// Transient confirmation, typically shown in a status area
    Status,
}

/// What the host currently has focused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusedView {
    /// An editing surface (tracked or not)
    Surface(SurfaceId),
    /// A JSONL source document with the cursor on `cursor_line` (1-based)
    Source { path: PathBuf, cursor_line: usize },
    /// Anything else
    Other,
}

/// Validation callback for text prompts; returns an error message to reject input
pub type InputValidator = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Operations the record editor needs from its host
#[async_trait]
pub trait EditorHost: Send + Sync {
    /// Show the surface backed by the file `surface` as an editable document
    async fn open_view(&self, surface: &SurfaceId, content_type: &str) -> io::Result<()>;

    /// Close the view of `surface`
    async fn close_view(&self, surface: &SurfaceId) -> io::Result<()>;

    /// Currently focused view, if any
    fn focused_view(&self) -> Option<FocusedView>;

    /// Ask the user for text; `None` means the prompt was cancelled
    async fn prompt_for_text(
        &self,
        prompt: &str,
        default_value: &str,
        validator: &InputValidator,
    ) -> Option<String>;

    /// Display a message to the user
    fn show_message(&self, level: MessageLevel, message: &str);
}
