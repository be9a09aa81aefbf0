//! Best-effort persistence of the browsing session between runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::criteria::FilterCriteria;
use crate::selection::SelectionSet;
use crate::view_state::ViewSettings;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything needed to restore the view except the records themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub city: Option<String>,
    pub criteria: FilterCriteria,
    pub selection: SelectionSet,
    pub view: ViewSettings,
    pub page_index: usize,
    pub page_size: usize,
}

pub trait SessionStore {
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if stored data exists but cannot be read.
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError>;

    /// # Errors
    ///
    /// Returns [`SessionError`] if the snapshot cannot be written.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError>;
}

/// Stores the session as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes to a sibling temp file and renames it over the target so a
    /// crash mid-write never leaves a truncated session behind.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_vec_pretty(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "saved session snapshot");
        Ok(())
    }
}
