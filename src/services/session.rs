//! Session token store
//!
//! Keeps the opaque identity token in `~/.prestatrack/session.json`.
//! The token is never inspected, only stored, returned and removed.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::BaseDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::types::{PrestaError, Result};

/// Environment variable that takes precedence over the stored token
pub const ENV_TOKEN: &str = "PRESTATRACK_TOKEN";

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
    saved_at: DateTime<Utc>,
}

/// File-backed session token store
pub struct SessionStore {
    path: PathBuf,
    honor_env: bool,
}

impl SessionStore {
    /// Store at the default location (~/.prestatrack/session.json)
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| PrestaError::Session("Cannot determine home directory".into()))?;
        let path = base_dirs.home_dir().join(".prestatrack").join("session.json");
        Ok(Self {
            path,
            honor_env: true,
        })
    }

    /// Store at a custom path, ignoring the environment override
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            honor_env: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current token, or None when signed out.
    /// An unreadable or corrupt session file counts as signed out.
    pub fn get_token(&self) -> Option<String> {
        if self.honor_env {
            if let Some(token) = std::env::var(ENV_TOKEN).ok().filter(|t| !t.trim().is_empty()) {
                return Some(token);
            }
        }

        match self.read_session() {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    /// When the stored token was saved
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.read_session().ok().flatten().map(|s| s.saved_at)
    }

    /// Persist a new token, replacing any previous one
    pub fn set_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PrestaError::Validation("Jeton de session vide.".into()));
        }

        let session = SessionFile {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&session)
            .map_err(|e| PrestaError::Session(format!("Serialization failed: {}", e)))?;

        self.write_atomic(content.as_bytes())?;
        tracing::info!(path = %self.path.display(), "session token saved");
        Ok(())
    }

    /// Remove the stored token. Clearing an absent session is not an error.
    pub fn clear_token(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.lock_exclusive()
            .map_err(|e| PrestaError::Session(format!("Failed to acquire write lock: {}", e)))?;
        let removed = fs::remove_file(&self.path);
        let _ = file.unlock();
        removed?;

        tracing::info!(path = %self.path.display(), "session token cleared");
        Ok(())
    }

    /// Read the session file under a shared lock
    fn read_session(&self) -> Result<Option<SessionFile>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()
            .map_err(|e| PrestaError::Session(format!("Failed to acquire read lock: {}", e)))?;

        let mut content = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut content);
        let _ = file.unlock();
        read?;

        let session: SessionFile = serde_json::from_str(&content)
            .map_err(|e| PrestaError::Session(format!("Corrupted session file: {}", e)))?;
        if session.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Write via temp file + rename while holding an exclusive lock
    fn write_atomic(&self, content: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| PrestaError::Session(format!("Failed to create temp file: {}", e)))?;
            file.write_all(content)
                .map_err(|e| PrestaError::Session(format!("Failed to write temp file: {}", e)))?;
            file.sync_all()
                .map_err(|e| PrestaError::Session(format!("Failed to sync temp file: {}", e)))?;
        }

        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        target
            .lock_exclusive()
            .map_err(|e| PrestaError::Session(format!("Failed to acquire write lock: {}", e)))?;

        let renamed = fs::rename(&temp_path, &self.path)
            .map_err(|e| PrestaError::Session(format!("Failed to rename temp file: {}", e)));
        let _ = target.unlock();
        renamed
    }
}
