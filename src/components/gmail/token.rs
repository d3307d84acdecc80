use super::models::StoredCredentials;
use crate::error::AppResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed credential storage
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store credentials at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored credentials.
    ///
    /// A missing file gives `None`. So does a file that cannot be parsed,
    /// which then gets replaced by the next successful authorization.
    pub fn load(&self) -> AppResult<Option<StoredCredentials>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&json) {
            Ok(credentials) => {
                debug!(path = %self.path.display(), "loaded credentials");
                Ok(Some(credentials))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable credential file");
                Ok(None)
            }
        }
    }

    /// Persist credentials, replacing the previous file
    pub fn save(&self, credentials: &StoredCredentials) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(credentials)?;

        // Write to a temp file first, then rename over the old one
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        set_owner_only(&tmp_path)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), "stored credentials");
        Ok(())
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> AppResult<()> {
    Ok(())
}
