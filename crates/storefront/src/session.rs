//! The shopper's session identity, shared by every user-scoped component.
//!
//! The identity lives in memory behind a lock and, for a file-backed
//! context, in a small JSON file so it survives restarts. Components only
//! read it; login and logout write it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use petalshop_core::SessionIdentity;

/// Errors that can occur when persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove session file {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Shared handle to the current session identity.
///
/// Cheap to clone; every clone sees the same identity.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    identity: RwLock<Option<SessionIdentity>>,
    path: Option<PathBuf>,
}

impl SessionContext {
    /// Session kept in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Session backed by `path`, starting from whatever the file holds.
    ///
    /// A missing file means nobody is signed in. A file that cannot be read
    /// or decoded is treated the same way and logged.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let identity = read_identity(&path);

        Self {
            inner: Arc::new(SessionInner {
                identity: RwLock::new(identity),
                path: Some(path),
            }),
        }
    }

    /// The identifier to send as `username`, or `None` when signed out.
    #[must_use]
    pub fn current_user_id(&self) -> Option<String> {
        self.current_identity()
            .map(|identity| identity.user_id().to_string())
    }

    /// Snapshot of the signed-in identity.
    #[must_use]
    pub fn current_identity(&self) -> Option<SessionIdentity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether anyone is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the identity and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session file cannot be written. The
    /// in-memory identity is updated either way.
    pub fn sign_in(&self, identity: SessionIdentity) -> Result<(), SessionError> {
        let persisted = self
            .inner
            .path
            .as_deref()
            .map(|path| write_identity(path, &identity))
            .transpose();

        *self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(identity);

        persisted.map(|_| ())
    }

    /// Forget the identity and delete the session file.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if an existing session file cannot be removed.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(path) = self.inner.path.as_deref() else {
            return Ok(());
        };

        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn read_identity(path: &Path) -> Option<SessionIdentity> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No session file");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read session file");
            return None;
        }
    };

    serde_json::from_str(&raw)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "Ignoring corrupt session file"))
        .ok()
}

fn write_identity(path: &Path, identity: &SessionIdentity) -> Result<(), SessionError> {
    let json = serde_json::to_string_pretty(identity)?;

    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)
    };

    write().map_err(|source| SessionError::Write {
        path: path.to_path_buf(),
        source,
    })
}
