//! Local filesystem state store.
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so an interrupted run leaves the previous state intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::State;
use crate::storage::StateStore;

/// JSON file state store.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file: the state file name with `.tmp` appended.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read and parse the state document, surfacing every failure.
    async fn try_load(&self) -> Result<Option<State>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> State {
        match self.try_load().await {
            Ok(Some(state)) => {
                log::debug!(
                    "Loaded {} signatures from {}",
                    state.len(),
                    self.path.display()
                );
                state
            }
            Ok(None) => {
                log::info!("No state at {}, starting fresh", self.path.display());
                State::new()
            }
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable state at {}: {}",
                    self.path.display(),
                    e
                );
                State::new()
            }
        }
    }

    async fn save(&self, state: &State) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Saved {} signatures to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> State {
        let mut state = State::new();
        state.insert("https://example.com/a", "ab12");
        state.insert("https://example.com/ö", "");
        state
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));

        store.save(&sample_state()).await.unwrap();
        let loaded = store.load().await;
        assert_eq!(loaded, sample_state());

        store.save(&loaded).await.unwrap();
        assert_eq!(store.load().await, sample_state());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, b"{\"sources\": {\"https://exa").unwrap();

        let store = JsonStateStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("state.json");
        let store = JsonStateStore::new(&path);

        store.save(&sample_state()).await.unwrap();
        let mut smaller = State::new();
        smaller.insert("https://example.com/b", "cd34");
        store.save(&smaller).await.unwrap();

        assert_eq!(store.load().await, smaller);
        assert!(!tmp.path().join("nested").join("state.json.tmp").exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"sources\""));
    }

    #[tokio::test]
    async fn test_save_leaves_same_stem_sibling_alone() {
        let tmp = TempDir::new().unwrap();
        let sibling = tmp.path().join("data.tmp");
        std::fs::write(&sibling, b"user file").unwrap();
        let store = JsonStateStore::new(tmp.path().join("data.json"));

        store.save(&sample_state()).await.unwrap();

        assert_eq!(std::fs::read(&sibling).unwrap(), b"user file");
        assert_eq!(store.load().await, sample_state());
    }

    #[tokio::test]
    async fn test_state_file_with_tmp_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.tmp");
        let store = JsonStateStore::new(&path);

        store.save(&sample_state()).await.unwrap();

        assert_eq!(store.load().await, sample_state());
        assert!(!tmp.path().join("state.tmp.tmp").exists());
    }
}
