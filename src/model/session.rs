//! Session model
//!
//! A session binds one editing surface to one `(source_file, line_number)` pair.
//! Sessions are immutable: navigation discards a session and creates a new one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of an editing surface
///
/// The identity is the absolute path of the surface's backing file, which makes
/// it stable across restarts and unique among live surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Surface identity for a backing file
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the backing file
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a running instance (one per process / editor window)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Generate a fresh random instance id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for status tooltips
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live binding between a surface and a source line
///
/// Serialized with camelCase keys; this is the persisted record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Absolute path of the JSONL source file
    pub source_file: PathBuf,
    /// 1-based line number, always >= 1
    pub line_number: usize,
    /// Unix milliseconds at creation
    pub created_at: i64,
    /// Instance that created this session
    pub owner_instance_id: InstanceId,
}

impl Session {
    /// Create a session stamped with the current time
    ///
    /// A `line_number` of 0 is raised to 1.
    pub fn new(source_file: PathBuf, line_number: usize, owner: InstanceId) -> Self {
        Self {
            source_file,
            line_number: line_number.max(1),
            created_at: chrono::Utc::now().timestamp_millis(),
            owner_instance_id: owner,
        }
    }

    pub fn is_owned_by(&self, instance: &InstanceId) -> bool {
        &self.owner_instance_id == instance
    }

    /// File name of the source, for user-facing messages
    pub fn source_name(&self) -> String {
        self.source_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_file.to_string_lossy().into_owned())
    }
}
