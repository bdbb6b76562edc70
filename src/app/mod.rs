//! Record editor controller
//!
//! Orchestrates the line locator, the rewriter and the session registry:
//! - `open` materializes a surface for one source line
//! - `save` writes an edited surface back to its line
//! - `navigate` closes the current surface and opens a neighbouring line
//! - `close` evicts the session and deletes the backing file
//!
//! Every operation takes `&mut self`, so at most one runs at a time. The host
//! drives the editor; there is no internal event loop.

mod commands;
mod notifications;

pub use commands::{validate_line_number, CommandOutcome};
pub use notifications::SurfaceStatus;

use crate::config::Config;
use crate::error::{RecordError, Result};
use crate::host::{EditorHost, MessageLevel, SURFACE_CONTENT_TYPE};
use crate::model::line_locator;
use crate::model::line_rewriter;
use crate::model::record::{self, Formatted};
use crate::model::session::{InstanceId, Session, SurfaceId};
use crate::services::scratch::{ClearReport, ScratchDir};
use crate::services::session_registry::SessionRegistry;
use crate::services::state_store::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Phase of the current navigation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Opening,
    Open,
    Saving,
    Closing,
    Closed,
}

/// Navigation request relative to the current surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
    GoTo(usize),
}

/// A surface that was just materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedRecord {
    pub surface: SurfaceId,
    /// Pretty-printed content shown in the surface
    pub content: String,
    /// Source line the surface is bound to
    pub line: usize,
    /// Set when the line was blank and the placeholder was used
    pub warning: Option<String>,
}

/// Result of a save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { source_file: PathBuf, line: usize },
    /// The session belongs to another instance; nothing was written
    NotOwned,
}

/// Result of a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
    Opened(OpenedRecord),
    /// `Previous` was requested on line 1; nothing changed
    AlreadyAtFirstLine,
}

/// What teardown cleaned up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub scratch: ClearReport,
    pub mappings_removed: usize,
}

/// Controller for record editing within one instance
pub struct RecordEditor {
    config: Config,
    registry: SessionRegistry,
    scratch: ScratchDir,
    host: Arc<dyn EditorHost>,
    state: FlowState,
}

impl RecordEditor {
    /// Start a new instance with a freshly generated id
    pub async fn activate(
        config: Config,
        store: Arc<dyn StateStore>,
        host: Arc<dyn EditorHost>,
    ) -> Result<Self> {
        Self::with_instance(InstanceId::generate(), config, store, host).await
    }

    /// Start (or restart) the instance `instance`
    ///
    /// Recovers this instance's sessions from the store, prunes those whose
    /// surface file is gone and makes sure the scratch directory exists.
    pub async fn with_instance(
        instance: InstanceId,
        config: Config,
        store: Arc<dyn StateStore>,
        host: Arc<dyn EditorHost>,
    ) -> Result<Self> {
        tracing::info!(instance = %instance, "Activating record editor");

        let scratch = ScratchDir::new(config.scratch_dir(&instance));
        let mut registry = SessionRegistry::new(instance, store, config.store_key.clone());
        registry.load().await?;
        registry.validate_and_prune().await?;

        if let Err(e) = scratch.ensure().await {
            tracing::error!(
                instance = %registry.instance(),
                "Failed to create scratch directory {:?}: {}",
                scratch.path(),
                e
            );
            host.show_message(
                MessageLevel::Error,
                "Unable to create temporary directory. Record editing may not work properly.",
            );
        }

        let state = if registry.is_empty() {
            FlowState::Idle
        } else {
            FlowState::Open
        };

        Ok(Self {
            config,
            registry,
            scratch,
            host,
            state,
        })
    }

    pub fn instance(&self) -> &InstanceId {
        self.registry.instance()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Session bound to `surface`, if tracked
    pub fn session(&self, surface: &SurfaceId) -> Option<&Session> {
        self.registry.get(surface)
    }

    /// Open line `requested_line` (or `hint_line`, or line 1) of `source_file`
    ///
    /// A positive `requested_line` wins over the hint. Blank lines open with the
    /// placeholder and a warning; lines that are not JSON fail with
    /// `InvalidRecord` and leave no session or surface behind.
    pub async fn open(
        &mut self,
        source_file: &Path,
        requested_line: Option<usize>,
        hint_line: Option<usize>,
    ) -> Result<OpenedRecord> {
        let target = match requested_line {
            Some(line) if line > 0 => line,
            _ => hint_line.filter(|line| *line > 0).unwrap_or(1),
        };

        let previous = self.state;
        self.state = FlowState::Opening;
        let result = self.open_line(source_file, target).await;
        self.state = match &result {
            Ok(_) => FlowState::Open,
            Err(_) => previous,
        };
        result
    }

    async fn open_line(&mut self, source_file: &Path, target: usize) -> Result<OpenedRecord> {
        let located = line_locator::locate(source_file, target).await?;
        let line = located.line;
        let source_file = std::path::absolute(source_file)?;

        let formatted = record::format_line(line, &located.content, &self.config.empty_line_placeholder)
            .inspect_err(|e| {
                tracing::warn!(
                    instance = %self.instance(),
                    "Invalid JSON on line {} of {:?}: {}",
                    line,
                    source_file,
                    e
                );
            })?;

        let warning = match &formatted {
            Formatted::Blank(placeholder) => {
                let message = format!("Line {} is empty. Opening with '{}'.", line, placeholder);
                self.host.show_message(MessageLevel::Warning, &message);
                Some(message)
            }
            Formatted::Record(_) => None,
        };
        let content = formatted.into_text();

        let session = Session::new(source_file.clone(), line, self.instance().clone());
        let path = self
            .scratch
            .create_surface(&source_file, line, session.created_at, &content)
            .await?;
        let surface = SurfaceId::from_path(&path);

        if let Err(e) = self.registry.put(surface.clone(), session).await {
            discard_surface_file(&path).await;
            return Err(e);
        }
        tracing::info!(
            instance = %self.instance(),
            "Created mapping: {} -> {:?}#{}",
            surface,
            source_file,
            line
        );

        if let Err(e) = self.host.open_view(&surface, SURFACE_CONTENT_TYPE).await {
            tracing::error!(instance = %self.instance(), "Host failed to open {}: {}", surface, e);
            if let Err(cleanup) = self.registry.delete(&surface).await {
                tracing::warn!(instance = %self.instance(), "Failed to drop mapping for {}: {}", surface, cleanup);
            }
            discard_surface_file(&path).await;
            return Err(RecordError::Io(e));
        }

        Ok(OpenedRecord {
            surface,
            content,
            line,
            warning,
        })
    }

    /// Write the edited content of `surface` back to its source line
    ///
    /// Invalid JSON fails with `InvalidRecord` and leaves the source untouched;
    /// the surface stays open so the user can fix it and retry.
    pub async fn save(&mut self, surface: &SurfaceId, edited_text: &str) -> Result<SaveOutcome> {
        let session = self
            .registry
            .get(surface)
            .cloned()
            .ok_or_else(|| RecordError::UnknownSurface(surface.clone()))?;

        if !session.is_owned_by(self.instance()) {
            tracing::info!(
                instance = %self.instance(),
                "Ignoring save of surface owned by another instance ({}...): {}",
                session.owner_instance_id.short(),
                surface
            );
            return Ok(SaveOutcome::NotOwned);
        }

        self.state = FlowState::Saving;
        let result = self.write_back(&session, edited_text).await;
        self.state = FlowState::Open;
        result?;

        let message = format!(
            "Saved line {} to {}",
            session.line_number,
            session.source_name()
        );
        self.host.show_message(MessageLevel::Status, &message);
        tracing::info!(instance = %self.instance(), "{}", message);

        Ok(SaveOutcome::Saved {
            source_file: session.source_file,
            line: session.line_number,
        })
    }

    async fn write_back(&self, session: &Session, edited_text: &str) -> Result<()> {
        let single_line = record::compact(session.line_number, edited_text)?;
        line_rewriter::rewrite(&session.source_file, session.line_number, &single_line).await
    }

    /// Close `surface` and open the line `direction` points at
    ///
    /// The current surface is closed before the new one is opened, so a flow
    /// never holds two live surfaces.
    pub async fn navigate(&mut self, direction: Direction, surface: &SurfaceId) -> Result<NavigateOutcome> {
        let session = self
            .registry
            .get(surface)
            .cloned()
            .ok_or_else(|| RecordError::UnknownSurface(surface.clone()))?;

        let target = match direction {
            Direction::Next => session.line_number + 1,
            Direction::Previous if session.line_number <= 1 => {
                self.host
                    .show_message(MessageLevel::Info, "Already at the first line.");
                return Ok(NavigateOutcome::AlreadyAtFirstLine);
            }
            Direction::Previous => session.line_number - 1,
            Direction::GoTo(line) => line.max(1),
        };

        tracing::info!(
            instance = %self.instance(),
            "Navigating: from line {} to {} in {:?}",
            session.line_number,
            target,
            session.source_file
        );

        if let Err(e) = self.host.close_view(surface).await {
            tracing::warn!(instance = %self.instance(), "Host failed to close {}: {}", surface, e);
        }
        self.close(surface).await?;

        let opened = self.open(&session.source_file, Some(target), None).await?;
        Ok(NavigateOutcome::Opened(opened))
    }

    /// Forget `surface` and delete its backing file
    ///
    /// The mapping removal is authoritative and fails loudly. Deleting the
    /// file is best-effort: a file that is already gone is fine and any other
    /// failure is logged. Leftover files are swept at the next start.
    pub async fn close(&mut self, surface: &SurfaceId) -> Result<()> {
        let previous = self.state;
        self.state = FlowState::Closing;

        let removed = match self.registry.delete(surface).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.state = previous;
                return Err(RecordError::UnknownSurface(surface.clone()));
            }
            Err(e) => {
                self.state = previous;
                return Err(e);
            }
        };
        tracing::info!(
            instance = %self.instance(),
            "Removed mapping: {} (line {} of {:?})",
            surface,
            removed.line_number,
            removed.source_file
        );

        // Give the host a moment to release the file
        tokio::time::sleep(self.config.close_delay()).await;

        let path = surface.path();
        match ScratchDir::remove_surface(&path).await {
            Ok(true) => tracing::debug!(instance = %self.instance(), "Deleted surface file {:?}", path),
            Ok(false) => {
                tracing::debug!(instance = %self.instance(), "Surface file already gone: {:?}", path)
            }
            Err(e) => tracing::warn!(
                instance = %self.instance(),
                "Failed to delete surface file {:?}: {}",
                path,
                e
            ),
        }

        self.state = if self.registry.is_empty() {
            FlowState::Closed
        } else {
            FlowState::Open
        };
        Ok(())
    }

    /// Tear down this instance
    ///
    /// Deletes the scratch files, removes the scratch directory when empty,
    /// drops this instance's partition from the store and clears the table.
    /// Other instances' sessions are left alone.
    pub async fn deactivate(&mut self) -> Result<TeardownReport> {
        tracing::info!(instance = %self.instance(), "Deactivating, cleaning up resources");

        let scratch = match self.scratch.clear().await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(
                    instance = %self.instance(),
                    "Failed to clean scratch directory {:?}: {}",
                    self.scratch.path(),
                    e
                );
                ClearReport::default()
            }
        };
        let mappings_removed = self.registry.remove_partition().await?;
        self.state = FlowState::Closed;

        tracing::info!(
            instance = %self.instance(),
            "Deactivation complete: {} files, {} mappings removed",
            scratch.removed,
            mappings_removed
        );
        Ok(TeardownReport {
            scratch,
            mappings_removed,
        })
    }
}

async fn discard_surface_file(path: &Path) {
    if let Err(e) = ScratchDir::remove_surface(path).await {
        tracing::warn!("Failed to remove surface file {:?}: {}", path, e);
    }
}
