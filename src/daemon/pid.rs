// PID file management for the daemon process

use crate::error::{DaemonError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Manages the pidfile of one service
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write `pid` to the file, replacing any previous content
    pub fn write(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.error(e))?;
            }
        }
        fs::write(&self.path, pid.to_string()).map_err(|e| self.error(e))
    }

    /// Read the PID from the file
    pub fn read(&self) -> Result<u32> {
        let content = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;

        let trimmed = content.trim();
        trimmed
            .parse::<u32>()
            .map_err(|_| DaemonError::InvalidPid(trimmed.to_string()))
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the file. An already missing file counts as removed.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    /// Remove the file only if it still records `pid`.
    ///
    /// Returns whether a file was removed. Errors are swallowed: this runs from
    /// the exit hook, where nothing can be reported anymore.
    pub fn remove_if_owned(&self, pid: u32) -> bool {
        match self.read() {
            Ok(recorded) if recorded == pid => fs::remove_file(&self.path).is_ok(),
            _ => false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: std::io::Error) -> DaemonError {
        DaemonError::PidFile {
            path: self.path.clone(),
            source,
        }
    }
}
