use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    error::SessionError,
    models::{Role, Session},
};

/// SessionStore
///
/// The only place session state is read or written. Every screen, the access
/// gate and the API layer go through this trait, so they all observe the same
/// token/role pairing.
///
/// Implementations must uphold the pairing invariant: `save` never persists a
/// role without a token (or a token without a role); such a session is
/// stored as anonymous.
pub trait SessionStore: Send + Sync {
    /// Current session. A missing or unreadable store yields an anonymous one.
    fn load(&self) -> Session;

    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Removes token, role and username together.
    fn clear(&self) -> Result<(), SessionError>;

    fn token(&self) -> Option<String> {
        self.load().token
    }

    fn role(&self) -> Option<Role> {
        self.load().role
    }
}

/// Shared handle used across the client.
pub type SessionState = Arc<dyn SessionStore>;

/// Drops half-populated sessions down to anonymous, keeping the username.
fn normalize(session: &Session) -> Session {
    if session.is_authenticated() {
        session.clone()
    } else {
        Session {
            token: None,
            role: None,
            username: session.username.clone(),
        }
    }
}

/// FileSessionStore
///
/// Durable storage: one JSON file that survives restarts. Writes go to a
/// sibling temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Session>, SessionError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Session {
        match self.read() {
            Ok(Some(session)) => normalize(&session),
            Ok(None) => Session::anonymous(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session: {e}");
                Session::anonymous()
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_vec_pretty(&normalize(session))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// MemorySessionStore
///
/// In-process store for tests and embedders that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(normalize(&session)),
        }
    }

    /// Writes the session verbatim, bypassing the pairing invariant. Lets
    /// tests reproduce storage that was tampered with outside the client.
    pub fn force(&self, session: Session) {
        *self.lock() = session;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Session {
        self.lock().clone()
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.lock() = normalize(session);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.lock() = Session::anonymous();
        Ok(())
    }
}
