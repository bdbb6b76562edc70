//! Session Registry - crash-recoverable surface -> source line mapping
//!
//! This module provides the registry that:
//! - Keeps the live sessions of one instance in memory
//! - Writes through to a durable store shared by all instances
//! - Only ever replaces or deletes the current instance's partition of that store
//! - Prunes sessions whose backing surface vanished while the process was down
//!
//! Concurrent saves from two instances are not locked against each other; a
//! read-merge-write that interleaves with another instance's can drop that
//! instance's latest update.

use crate::error::Result;
use crate::model::session::{InstanceId, Session, SurfaceId};
use crate::services::state_store::StateStore;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

/// Field of a persisted session naming its owner
const OWNER_FIELD: &str = "ownerInstanceId";

/// Registry of live sessions for one instance
pub struct SessionRegistry {
    /// Instance whose partition this registry manages
    instance: InstanceId,

    /// Durable store shared across instances
    store: Arc<dyn StateStore>,

    /// Key of the session map inside the store
    store_key: String,

    /// Live sessions of this instance
    sessions: HashMap<SurfaceId, Session>,
}

impl SessionRegistry {
    /// Create an empty registry; call [`load`](Self::load) to recover persisted state
    pub fn new(instance: InstanceId, store: Arc<dyn StateStore>, store_key: impl Into<String>) -> Self {
        Self {
            instance,
            store,
            store_key: store_key.into(),
            sessions: HashMap::new(),
        }
    }

    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, surface: &SurfaceId) -> Option<&Session> {
        self.sessions.get(surface)
    }

    pub fn contains(&self, surface: &SurfaceId) -> bool {
        self.sessions.contains_key(surface)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SurfaceId, &Session)> {
        self.sessions.iter()
    }

    /// Replace the in-memory table with this instance's persisted partition
    ///
    /// Returns the number of sessions loaded. Entries of other instances,
    /// entries that fail to parse and entries with line 0 are skipped. An
    /// unreadable store counts as empty; the next save replaces it.
    pub async fn load(&mut self) -> Result<usize> {
        let stored = self.read_stored().await?;
        self.sessions.clear();

        for (key, value) in stored {
            if !self.owns(&value) {
                continue;
            }
            match serde_json::from_value::<Session>(value) {
                Ok(session) if session.line_number == 0 => {
                    tracing::warn!(
                        instance = %self.instance,
                        surface = %key,
                        "Skipping persisted session with line number 0"
                    );
                }
                Ok(session) => {
                    self.sessions.insert(SurfaceId::new(key), session);
                }
                Err(e) => {
                    tracing::warn!(
                        instance = %self.instance,
                        surface = %key,
                        "Skipping unreadable persisted session: {}",
                        e
                    );
                }
            }
        }

        tracing::info!(
            instance = %self.instance,
            "Loaded {} session mappings from storage",
            self.sessions.len()
        );
        Ok(self.sessions.len())
    }

    /// Write this instance's partition back to the store
    ///
    /// Other instances' entries are read and written back unchanged.
    pub async fn save(&self) -> Result<()> {
        let mut stored = self.read_stored().await?;
        stored.retain(|_, value| !self.owns(value));

        for (surface, session) in &self.sessions {
            let value = serde_json::to_value(session)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            stored.insert(surface.as_str().to_string(), value);
        }

        self.store.set(&self.store_key, Value::Object(stored)).await?;
        tracing::debug!(
            instance = %self.instance,
            "Saved {} session mappings to storage",
            self.sessions.len()
        );
        Ok(())
    }

    /// Evict sessions whose backing surface no longer exists
    ///
    /// Returns the evicted surfaces. The store is re-saved only when something
    /// was evicted.
    pub async fn validate_and_prune(&mut self) -> Result<Vec<SurfaceId>> {
        let mut missing = Vec::new();

        for surface in self.sessions.keys() {
            match tokio::fs::try_exists(surface.path()).await {
                Ok(true) => {
                    tracing::trace!(instance = %self.instance, surface = %surface, "Surface exists");
                }
                Ok(false) => missing.push(surface.clone()),
                Err(e) => {
                    tracing::debug!(
                        instance = %self.instance,
                        surface = %surface,
                        "Cannot check surface, treating as missing: {}",
                        e
                    );
                    missing.push(surface.clone());
                }
            }
        }

        if missing.is_empty() {
            return Ok(missing);
        }

        for surface in &missing {
            self.sessions.remove(surface);
        }
        tracing::info!(
            instance = %self.instance,
            "Removed {} session mappings with missing surfaces",
            missing.len()
        );
        self.save().await?;
        Ok(missing)
    }

    /// Insert a session and persist immediately
    ///
    /// If persisting fails the table is left as it was before the call.
    pub async fn put(&mut self, surface: SurfaceId, session: Session) -> Result<()> {
        let previous = self.sessions.insert(surface.clone(), session);
        if let Err(e) = self.save().await {
            match previous {
                Some(previous) => {
                    self.sessions.insert(surface, previous);
                }
                None => {
                    self.sessions.remove(&surface);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a session and persist immediately
    ///
    /// Returns the removed session, or `None` if the surface was not tracked.
    /// If persisting fails the session is restored and the error returned.
    pub async fn delete(&mut self, surface: &SurfaceId) -> Result<Option<Session>> {
        let Some(removed) = self.sessions.remove(surface) else {
            return Ok(None);
        };
        if let Err(e) = self.save().await {
            self.sessions.insert(surface.clone(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Drop this instance's partition from the store and clear the table
    ///
    /// Used on teardown. Returns the number of persisted entries removed.
    pub async fn remove_partition(&mut self) -> Result<usize> {
        let mut stored = self.read_stored().await?;
        let before = stored.len();
        stored.retain(|_, value| !self.owns(value));
        let removed = before - stored.len();

        if removed > 0 {
            self.store.set(&self.store_key, Value::Object(stored)).await?;
            tracing::info!(
                instance = %self.instance,
                "Removed {} mappings from workspace state",
                removed
            );
        }
        self.sessions.clear();
        Ok(removed)
    }

    async fn read_stored(&self) -> Result<Map<String, Value>> {
        let stored = match self.store.get(&self.store_key).await {
            Ok(stored) => stored,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(
                    instance = %self.instance,
                    "Persisted session state is unreadable ({}), starting empty",
                    e
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        match stored {
            Some(Value::Object(map)) => Ok(map),
            Some(Value::Null) | None => Ok(Map::new()),
            Some(other) => {
                tracing::warn!(
                    instance = %self.instance,
                    "Persisted session map is not an object ({}), starting empty",
                    type_name(&other)
                );
                Ok(Map::new())
            }
        }
    }

    fn owns(&self, value: &Value) -> bool {
        value.get(OWNER_FIELD).and_then(Value::as_str) == Some(self.instance.as_str())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
