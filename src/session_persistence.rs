use crate::history::ScrobbleHistory;
use crate::types::LastFmSession;
use crate::{LastFmError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const APP_DIR: &str = "lastfm-scrobble";
const SESSION_FILE: &str = "session.json";
const HISTORY_FILE: &str = "history.json";

/// Storage for the state a front end keeps between runs: the current
/// session and the local submission history.
///
/// Stores are injected wherever state must survive, so nothing in the crate
/// reaches for global storage. Callers load once at startup and save after
/// every change.
pub trait SessionStore {
    /// Load the stored session, if any.
    ///
    /// Unreadable or incomplete data is treated as "no session".
    fn load_session(&self) -> Result<Option<LastFmSession>>;

    fn save_session(&self, session: &LastFmSession) -> Result<()>;

    /// Remove the stored session. Removing a missing session is not an error.
    fn clear_session(&self) -> Result<()>;

    /// Load the history. Missing or unreadable data yields an empty history.
    fn load_history(&self) -> Result<ScrobbleHistory>;

    fn save_history(&self, history: &ScrobbleHistory) -> Result<()>;
}

/// Session persistence in the XDG data directory.
///
/// Files are stored as `~/.local/share/lastfm-scrobble/session.json` and
/// `~/.local/share/lastfm-scrobble/history.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Use an explicit directory for the store files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use the XDG data directory.
    pub fn xdg() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            LastFmError::Storage("Cannot determine XDG data directory".to_string())
        })?;
        Ok(Self::new(data_dir.join(APP_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            LastFmError::Storage(format!("Failed to create store directory: {e}"))
        })?;
        fs::write(path, contents).map_err(|e| {
            LastFmError::Storage(format!("Failed to write {}: {e}", path.display()))
        })?;
        log::debug!("Saved {}", path.display());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|e| {
            LastFmError::Storage(format!("Failed to read {}: {e}", path.display()))
        })?;
        Ok(Some(contents))
    }
}

impl SessionStore for FileSessionStore {
    fn load_session(&self) -> Result<Option<LastFmSession>> {
        let path = self.session_path();
        let Some(json) = self.read(&path)? else {
            return Ok(None);
        };

        match LastFmSession::from_json(&json) {
            Ok(session) if session.is_valid() => {
                log::debug!("Session loaded from: {}", path.display());
                Ok(Some(session))
            }
            Ok(_) => {
                log::warn!("Ignoring incomplete session in {}", path.display());
                Ok(None)
            }
            Err(e) => {
                log::warn!("Ignoring malformed session in {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    fn save_session(&self, session: &LastFmSession) -> Result<()> {
        let json = session
            .to_json()
            .map_err(|e| LastFmError::Storage(format!("Failed to serialize session: {e}")))?;
        self.write(&self.session_path(), &json)
    }

    fn clear_session(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                LastFmError::Storage(format!("Failed to remove session file: {e}"))
            })?;
            log::debug!("Session removed from: {}", path.display());
        }
        Ok(())
    }

    fn load_history(&self) -> Result<ScrobbleHistory> {
        let path = self.history_path();
        let Some(json) = self.read(&path)? else {
            return Ok(ScrobbleHistory::new());
        };

        Ok(serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed history in {}: {e}", path.display());
            ScrobbleHistory::new()
        }))
    }

    fn save_history(&self, history: &ScrobbleHistory) -> Result<()> {
        let json = serde_json::to_string_pretty(history)
            .map_err(|e| LastFmError::Storage(format!("Failed to serialize history: {e}")))?;
        self.write(&self.history_path(), &json)
    }
}

/// In-memory store, for tests and embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<LastFmSession>>,
    history: Mutex<ScrobbleHistory>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: LastFmSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            history: Mutex::new(ScrobbleHistory::new()),
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> LastFmError {
    LastFmError::Storage("store lock poisoned".to_string())
}

impl SessionStore for MemorySessionStore {
    fn load_session(&self) -> Result<Option<LastFmSession>> {
        Ok(self.session.lock().map_err(poisoned)?.clone())
    }

    fn save_session(&self, session: &LastFmSession) -> Result<()> {
        *self.session.lock().map_err(poisoned)? = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        *self.session.lock().map_err(poisoned)? = None;
        Ok(())
    }

    fn load_history(&self) -> Result<ScrobbleHistory> {
        Ok(self.history.lock().map_err(poisoned)?.clone())
    }

    fn save_history(&self, history: &ScrobbleHistory) -> Result<()> {
        *self.history.lock().map_err(poisoned)? = history.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use crate::types::Scrobble;

    fn session() -> LastFmSession {
        LastFmSession::new("key123".to_string(), "testuser".to_string())
    }

    #[test]
    fn test_file_store_round_trips_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested"));

        assert_eq!(store.load_session().unwrap(), None);
        store.save_session(&session()).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session()));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);
        // Clearing twice is fine.
        store.clear_session().unwrap();
    }

    #[test]
    fn test_file_store_ignores_malformed_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        fs::write(store.session_path(), "{not json").unwrap();
        assert_eq!(store.load_session().unwrap(), None);

        fs::write(store.session_path(), r#"{"key":"","username":"someone"}"#).unwrap();
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn test_file_store_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert!(store.load_history().unwrap().is_empty());

        let mut history = ScrobbleHistory::new();
        history.record(HistoryEntry::from_scrobble(
            &Scrobble::new("Artist", "Track", 1_700_000_000),
            chrono::Utc::now(),
        ));
        store.save_history(&history).unwrap();
        assert_eq!(store.load_history().unwrap(), history);

        fs::write(store.history_path(), "garbage").unwrap();
        assert!(store.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_xdg_paths() {
        if let Ok(store) = FileSessionStore::xdg() {
            assert!(store
                .session_path()
                .to_string_lossy()
                .contains("lastfm-scrobble"));
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load_session().unwrap(), None);

        store.save_session(&session()).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session()));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);

        let store = MemorySessionStore::with_session(session());
        assert!(store.load_session().unwrap().is_some());
    }
}
