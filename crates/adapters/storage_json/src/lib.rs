//! # zonehub-adapter-storage-json
//!
//! [`StateStore`] backed by one JSON file per configuration entry. Writes
//! go to a temporary file first and are renamed into place, so a crash
//! mid-write never corrupts the previous snapshot.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::debug;

use zonehub_app::ports::StateStore;
use zonehub_domain::error::{StorageError, ZoneHubError};
use zonehub_domain::id::EntryId;
use zonehub_domain::persistence::PersistedState;

/// File-per-entry JSON state store.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    dir: PathBuf,
}

impl JsonStateStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, entry: &EntryId) -> PathBuf {
        self.dir.join(format!("{entry}.json"))
    }

    async fn read(path: &Path) -> Result<Option<PersistedState>, ZoneHubError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::from(err).into()),
        };
        let state = serde_json::from_slice(&bytes).map_err(StorageError::from)?;
        Ok(Some(state))
    }

    async fn write(&self, path: &Path, state: &PersistedState) -> Result<(), ZoneHubError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(StorageError::from)?;
        let payload = serde_json::to_vec_pretty(state).map_err(StorageError::from)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload)
            .await
            .map_err(StorageError::from)?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(
        &self,
        entry: &EntryId,
    ) -> impl Future<Output = Result<Option<PersistedState>, ZoneHubError>> + Send {
        let path = self.path_for(entry);
        async move {
            let state = Self::read(&path).await?;
            debug!(path = %path.display(), found = state.is_some(), "loaded persisted state");
            Ok(state)
        }
    }

    fn save(
        &self,
        entry: &EntryId,
        state: &PersistedState,
    ) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
        let path = self.path_for(entry);
        let state = state.clone();
        async move {
            self.write(&path, &state).await?;
            debug!(path = %path.display(), "saved persisted state");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use zonehub_domain::contact::{PausePhase, PauseState};
    use zonehub_domain::time::now;

    fn state() -> PersistedState {
        PersistedState::new(
            now(),
            PauseState {
                phase: PausePhase::Paused,
                ..PauseState::default()
            },
            BTreeMap::new(),
        )
    }

    #[tokio::test]
    async fn should_return_none_when_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path());
        let loaded = store.load(&EntryId::from("entry-1")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn should_roundtrip_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path());
        let entry = EntryId::from("entry-1");
        let saved = state();

        store.save(&entry, &saved).await.unwrap();
        let loaded = store.load(&entry).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn should_replace_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path());
        let entry = EntryId::from("entry-1");

        store.save(&entry, &state()).await.unwrap();
        let mut second = state();
        second.pause.phase = PausePhase::Running;
        store.save(&entry, &second).await.unwrap();

        let loaded = store.load(&entry).await.unwrap().unwrap();
        assert_eq!(loaded.pause.phase, PausePhase::Running);
    }

    #[tokio::test]
    async fn should_keep_entries_separate() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path());

        store.save(&EntryId::from("a"), &state()).await.unwrap();
        assert!(store.load(&EntryId::from("b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_error_on_corrupt_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path());
        let entry = EntryId::from("entry-1");
        tokio::fs::write(dir.path().join("entry-1.json"), b"not json")
            .await
            .unwrap();

        let result = store.load(&entry).await;
        assert!(matches!(result, Err(ZoneHubError::Storage(_))));
    }
}
