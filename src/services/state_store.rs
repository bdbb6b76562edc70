//! Durable key-value stores for session state
//!
//! The store is shared by every instance working on the same workspace. It holds
//! plain JSON values; partitioning by instance is the registry's job.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key-value store that survives process restarts
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> io::Result<Option<Value>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: Value) -> io::Result<()>;
}

/// In-process store; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> io::Result<Option<Value>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> io::Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file
///
/// Writes go to a sibling temporary file which is then renamed over the
/// original, so readers never observe a partially written store. Reading a
/// file that is not a JSON object fails with `InvalidData`; the next write
/// replaces it.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> io::Result<Map<String, Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        {
            Value::Object(map) => Ok(map),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("state file {} is not a JSON object", self.path.display()),
            )),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        self.path
            .with_file_name(format!(".{}-{}.tmp", file_name, std::process::id()))
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self, key: &str) -> io::Result<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> io::Result<()> {
        let mut all = match self.read_all().await {
            Ok(all) => all,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!("Replacing unreadable state file {}: {}", self.path.display(), e);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        all.insert(key.to_string(), value);

        let serialized = serde_json::to_vec_pretty(&Value::Object(all))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, serialized).await?;
        tokio::fs::rename(&temp, &self.path).await
    }
}
