//! State manager implementation
//!
//! Holds the state of the run behind a shared lock and provides file-based
//! persistence with atomic writes.

use super::types::State;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for loading, updating and persisting state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state output file (empty for in-memory)
    path: PathBuf,
    /// Current state, shared by clones
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(State::new())
    }

    /// Create an in-memory state manager seeded with a state
    pub fn with_state(state: State) -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load state from a file. A missing file yields empty state.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Create a state manager from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(parse_state(json)?))
    }

    /// Persist state to `path`, writing a temp file first and renaming it
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;

        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Persist state to the file it was loaded from (no-op in memory)
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.save_to_file(&self.path).await
    }

    /// Get a read lock on the current state
    pub async fn state(&self) -> tokio::sync::RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Export state as JSON value
    pub async fn to_value(&self) -> Result<JsonValue> {
        let state = self.state.read().await;
        serde_json::to_value(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Stored bookmark for a stream or partition
    pub async fn get_bookmark(&self, stream: &str, partition_id: Option<&str>) -> Option<JsonValue> {
        let state = self.state.read().await;
        state.get_bookmark(stream, partition_id).cloned()
    }

    /// Update the bookmark for a stream or partition
    pub async fn set_bookmark(
        &self,
        stream: &str,
        replication_key: &str,
        partition_id: Option<&str>,
        value: JsonValue,
    ) {
        let mut state = self.state.write().await;
        state.set_bookmark(stream, replication_key, partition_id, value);
    }

    /// Clear state for a specific stream
    pub async fn clear_stream(&self, stream: &str) {
        let mut state = self.state.write().await;
        state.bookmarks.remove(stream);
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

/// Parse a state document. Accepts both `{"bookmarks": ...}` and the
/// wrapped form `{"value": {"bookmarks": ...}}` of a Singer STATE message.
fn parse_state(json: &str) -> Result<State> {
    let value: JsonValue = serde_json::from_str(json)
        .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;

    let inner = match value.get("value") {
        Some(v) if value.get("bookmarks").is_none() => v.clone(),
        _ => value,
    };

    serde_json::from_value(inner).map_err(|e| Error::state(format!("Invalid state layout: {e}")))
}
