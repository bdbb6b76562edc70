//! User-facing commands: preview-line, next-line, previous-line, go-to-line
//!
//! Commands work from whatever the host has focused. Failures are shown to the
//! user through the host and also returned to the caller.

use super::{Direction, NavigateOutcome, OpenedRecord, RecordEditor};
use crate::error::Result;
use crate::host::{FocusedView, MessageLevel};
use crate::model::session::SurfaceId;
use std::path::{Path, PathBuf};

const NO_SOURCE_MESSAGE: &str = "Open a JSON Lines file (.jsonl) to show a preview.";
const NOT_EDITING_MESSAGE: &str =
    "Not currently editing a JSONL line preview. Use 'JSONL: Preview Line' first.";
const NO_CONTEXT_MESSAGE: &str =
    "Please open a JSON Lines file (.jsonl) or a JSONL line preview first.";
const INVALID_LINE_MESSAGE: &str = "Please enter a positive number.";

/// Result of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A new surface was opened
    Opened(OpenedRecord),
    /// Nothing to do; the message was shown to the user
    Info(String),
    /// The user dismissed the prompt
    Cancelled,
    /// The requested line is the one already shown
    Unchanged,
}

impl From<NavigateOutcome> for CommandOutcome {
    fn from(outcome: NavigateOutcome) -> Self {
        match outcome {
            NavigateOutcome::Opened(opened) => CommandOutcome::Opened(opened),
            NavigateOutcome::AlreadyAtFirstLine => {
                CommandOutcome::Info("Already at the first line.".to_string())
            }
        }
    }
}

/// Prompt validator for line numbers: accepts positive integers only
pub fn validate_line_number(text: &str) -> Option<String> {
    match parse_line_number(text) {
        Some(_) => None,
        None => Some(INVALID_LINE_MESSAGE.to_string()),
    }
}

fn parse_line_number(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

impl RecordEditor {
    /// preview-line: open a surface for a line of `target` or of the focused source
    ///
    /// When the focused view is the same source file, its cursor line is used.
    pub async fn preview_line(&mut self, target: Option<PathBuf>) -> Result<CommandOutcome> {
        let focused = self.host.focused_view();

        let (source, hint) = match (target, focused) {
            (Some(path), Some(FocusedView::Source { path: focused_path, cursor_line }))
                if same_file(&path, &focused_path) =>
            {
                (path, Some(cursor_line))
            }
            (Some(path), _) => (path, None),
            (None, Some(FocusedView::Source { path, cursor_line })) => (path, Some(cursor_line)),
            (None, _) => return Ok(self.inform(NO_SOURCE_MESSAGE)),
        };

        let result = self.open(&source, None, hint).await;
        self.report(result, "Failed to open preview")
            .map(CommandOutcome::Opened)
    }

    /// next-line: replace the focused surface with the following line
    pub async fn next_line(&mut self) -> Result<CommandOutcome> {
        self.step(Direction::Next).await
    }

    /// previous-line: replace the focused surface with the preceding line
    pub async fn previous_line(&mut self) -> Result<CommandOutcome> {
        self.step(Direction::Previous).await
    }

    async fn step(&mut self, direction: Direction) -> Result<CommandOutcome> {
        let Some(surface) = self.focused_surface() else {
            return Ok(self.inform(NOT_EDITING_MESSAGE));
        };
        let result = self.navigate(direction, &surface).await;
        self.report(result, "Failed to navigate").map(CommandOutcome::from)
    }

    /// go-to-line: prompt for a line number and show that line
    ///
    /// Works from a tracked surface (which is replaced) or from a source
    /// document. Entering the current line does nothing.
    pub async fn go_to_line(&mut self) -> Result<CommandOutcome> {
        let (source, current, surface) = match self.host.focused_view() {
            Some(FocusedView::Surface(surface)) => match self.registry.get(&surface) {
                Some(session) => (
                    session.source_file.clone(),
                    Some(session.line_number),
                    Some(surface),
                ),
                None => return Ok(self.inform(NO_CONTEXT_MESSAGE)),
            },
            Some(FocusedView::Source { path, cursor_line }) => (path, Some(cursor_line), None),
            _ => return Ok(self.inform(NO_CONTEXT_MESSAGE)),
        };

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());
        let prompt = format!("Go to line in {}", name);
        let default_value = current.map(|line| line.to_string()).unwrap_or_default();

        let Some(input) = self
            .host
            .prompt_for_text(&prompt, &default_value, &validate_line_number)
            .await
        else {
            return Ok(CommandOutcome::Cancelled);
        };

        let Some(target) = parse_line_number(&input) else {
            return Ok(self.inform(INVALID_LINE_MESSAGE));
        };
        if Some(target) == current {
            return Ok(CommandOutcome::Unchanged);
        }

        match surface {
            Some(surface) => {
                let result = self.navigate(Direction::GoTo(target), &surface).await;
                self.report(result, "Failed to navigate").map(CommandOutcome::from)
            }
            None => {
                let result = self.open(&source, Some(target), None).await;
                self.report(result, "Failed to open preview")
                    .map(CommandOutcome::Opened)
            }
        }
    }

    /// Focused surface, if it is one this instance tracks
    pub(super) fn focused_surface(&self) -> Option<SurfaceId> {
        match self.host.focused_view() {
            Some(FocusedView::Surface(surface)) if self.registry.contains(&surface) => Some(surface),
            _ => None,
        }
    }

    fn inform(&self, message: &str) -> CommandOutcome {
        self.host.show_message(MessageLevel::Info, message);
        CommandOutcome::Info(message.to_string())
    }

    /// Show an error to the user before handing it back
    pub(super) fn report<T>(&self, result: Result<T>, context: &str) -> Result<T> {
        if let Err(e) = &result {
            tracing::error!(instance = %self.instance(), "{}: {}", context, e);
            self.host
                .show_message(MessageLevel::Error, &format!("{}: {}", context, e));
        }
        result
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
