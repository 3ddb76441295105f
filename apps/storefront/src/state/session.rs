//! Saved session cookie.
//!
//! The backend session is an HTTP-only cookie. A browser keeps it between
//! page loads; the CLI keeps it in a file between invocations.
//!
//! - **Linux**: `~/.local/share/pupuk-storefront/session`
//! - **macOS**: `~/Library/Application Support/id.pupuk.storefront/session`
//! - **Windows**: `%APPDATA%\pupuk\storefront\data\session`
//!
//! `PUPUK_SESSION_FILE` overrides the location.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// Platform data dir, or `PUPUK_SESSION_FILE`.
    pub fn default_location() -> ApiResult<Self> {
        if let Ok(path) = std::env::var("PUPUK_SESSION_FILE") {
            return Ok(Self::new(path));
        }

        let dirs = ProjectDirs::from("id", "pupuk", "storefront")
            .ok_or_else(|| ApiError::config("Could not determine app data directory"))?;
        Ok(Self::new(dirs.data_dir().join("session")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved `Cookie` header, if any.
    pub fn load(&self) -> ApiResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let header = contents.trim();
                Ok((!header.is_empty()).then(|| header.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, cookie_header: &str) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = open_private(&self.path)?;
        file.write_all(cookie_header.as_bytes())?;
        debug!(path = ?self.path, "Session saved");
        Ok(())
    }

    pub fn clear(&self) -> ApiResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "Session removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Opens `path` for writing, owner-only, before any byte is written.
///
/// A new file is created 0600; an existing one is narrowed to 0600 and
/// only then truncated.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new().write(true).create(true).mode(0o600).open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.set_len(0)?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session"));

        assert_eq!(store.load().unwrap(), None);

        store.save("session=abc123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("session=abc123"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_blank_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(SessionStore::new(path).load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session"));
        store.save("session=abc123").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_readable_file_is_narrowed_and_replaced() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        fs::write(&path, "session=an-older-and-much-longer-cookie-value").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = SessionStore::new(path);
        store.save("session=abc123").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().as_deref(), Some("session=abc123"));
    }
}
