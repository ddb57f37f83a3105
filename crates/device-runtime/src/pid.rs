//! # PID File
//!
//! Keeps two runtimes from hosting the same device. The file is held with an
//! exclusive `fs2` lock for the life of the process and removed on drop.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("Failed to open PID file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Device runtime already running{} ({})",
        pid.map(|p| format!(" as process {p}")).unwrap_or_default(),
        path.display()
    )]
    AlreadyRunning { pid: Option<u32>, path: PathBuf },

    #[error("Failed to write PID file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive PID file, released on drop.
#[derive(Debug)]
pub struct PidFile {
    file: File,
    path: PathBuf,
    pid: u32,
}

impl PidFile {
    pub fn acquire(path: &Path) -> Result<Self, PidFileError> {
        // Not truncated on open: the current holder's PID must survive a
        // failed attempt.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|source| PidFileError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        if file.try_lock_exclusive().is_err() {
            return Err(PidFileError::AlreadyRunning {
                pid: Self::read_pid(path),
                path: path.to_path_buf(),
            });
        }

        let pid = std::process::id();
        let write_err = |source| PidFileError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut file = file;
        file.set_len(0).map_err(write_err)?;
        writeln!(file, "{pid}").map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        debug!(path = %path.display(), pid, "PID file acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove PID file");
        }
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.pid");

        let pid_file = PidFile::acquire(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), pid_file.pid().to_string());
    }

    #[test]
    fn test_second_acquire_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.pid");

        let first = PidFile::acquire(&path).unwrap();
        let err = PidFile::acquire(&path).unwrap_err();

        match err {
            PidFileError::AlreadyRunning { pid, .. } => assert_eq!(pid, Some(first.pid())),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.pid");

        drop(PidFile::acquire(&path).unwrap());
        assert!(!path.exists());

        let again = PidFile::acquire(&path).unwrap();
        assert_eq!(again.path(), path.as_path());
    }
}
