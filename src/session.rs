//! The signed-in session: an access token plus the cached user, restored
//! from persistent storage at start-up and wiped on logout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::user::User;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk shape of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub access_token: String,
    pub user: User,
}

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, SessionError>;
    fn save(&self, session: &PersistedSession) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// A JSON file, by default under the user's data directory.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        match serde_json::from_str(&data) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let data = serde_json::to_string_pretty(session)?;
        let mut file = owner_only()
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        restrict_permissions(&file).map_err(|e| self.io_error(e))?;
        file.write_all(data.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// The file holds a bearer token: readable by its owner only.
fn owner_only() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

// `mode` only applies on creation; tighten files left by older versions.
#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

#[derive(Default)]
pub struct MemoryStorage {
    session: Mutex<Option<PersistedSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<PersistedSession>> {
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Owned session state handed to whoever needs it.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    token: Option<SecretString>,
    user: Option<User>,
}

impl SessionStore {
    /// Restores a session only when both the token and the user are present.
    pub fn hydrate(storage: Box<dyn SessionStorage>) -> Result<Self, SessionError> {
        let (token, user) = match storage.load()? {
            Some(PersistedSession { access_token, user }) if !access_token.is_empty() => {
                debug!(user_id = %user.id, "restored session");
                (Some(SecretString::from(access_token)), Some(user))
            }
            _ => (None, None),
        };
        Ok(Self {
            storage,
            token,
            user,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn token(&self) -> Option<SecretString> {
        self.token.clone()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn begin(&mut self, token: SecretString, user: User) -> Result<(), SessionError> {
        self.token = Some(token);
        self.user = Some(user);
        self.persist()
    }

    /// Replaces the cached user, e.g. after a profile fetch or edit.
    pub fn set_user(&mut self, user: User) -> Result<(), SessionError> {
        self.user = Some(user);
        self.persist()
    }

    pub fn end(&mut self) -> Result<(), SessionError> {
        self.token = None;
        self.user = None;
        self.storage.clear()
    }

    fn persist(&self) -> Result<(), SessionError> {
        let (Some(token), Some(user)) = (&self.token, &self.user) else {
            return Ok(());
        };
        self.storage.save(&PersistedSession {
            access_token: token.expose_secret().to_string(),
            user: user.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "ann@example.com".into(),
            username: "ann".into(),
            full_name: "Ann Lee".into(),
            is_verified: false,
            is_active: None,
            created_at: None,
        }
    }

    #[test]
    fn empty_storage_hydrates_signed_out() {
        let store = SessionStore::hydrate(Box::new(MemoryStorage::new())).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
    }

    #[test]
    fn file_storage_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = SessionStore::hydrate(Box::new(FileStorage::new(&path))).unwrap();
        store.begin(SecretString::from("tok".to_string()), user()).unwrap();
        assert!(path.exists());

        let restored = SessionStore::hydrate(Box::new(FileStorage::new(&path))).unwrap();
        assert!(restored.is_authenticated());
        assert_eq!(restored.token().unwrap().expose_secret(), "tok");
        assert_eq!(restored.user().unwrap().username, "ann");

        let mut restored = restored;
        restored.end().unwrap();
        assert!(!path.exists());
        assert!(!restored.is_authenticated());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private_to_its_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut store = SessionStore::hydrate(Box::new(FileStorage::new(&path))).unwrap();
        store.begin(SecretString::from("tok".to_string()), user()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_treated_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::hydrate(Box::new(FileStorage::new(&path))).unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn set_user_without_token_does_not_persist() {
        let mut store = SessionStore::hydrate(Box::new(MemoryStorage::new())).unwrap();
        store.set_user(user()).unwrap();
        assert!(!store.is_authenticated());
    }
}
