//! Single-writer guard for the state document
//!
//! Every `mxl` run, shell or one-shot, holds an exclusive advisory lock on
//! `<state>.lock` while it works on the state document, so two processes
//! never overwrite each other's state.

use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::{MatrixError, Result};

pub struct InstanceLock {
    _file: std::fs::File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn lock_path(state_path: &Path) -> PathBuf {
        state_path.with_extension("lock")
    }

    fn is_contended_lock_error(e: &std::io::Error) -> bool {
        if e.kind() == std::io::ErrorKind::WouldBlock {
            return true;
        }

        // On Windows, file locking returns OS error codes rather than WouldBlock.
        #[cfg(windows)]
        {
            match e.raw_os_error() {
                // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
                Some(32) | Some(33) => return true,
                _ => {}
            }
        }

        // fs2 maps EWOULDBLOCK through its own error on some platforms
        e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
    }

    pub fn acquire(state_path: &Path) -> Result<Self> {
        let path = Self::lock_path(state_path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| MatrixError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| MatrixError::InstanceLock {
                path: path.clone(),
                source: e,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { _file: file, path }),
            Err(e) if Self::is_contended_lock_error(&e) => {
                Err(MatrixError::InstanceAlreadyRunning { lock_path: path })
            }
            Err(e) => Err(MatrixError::InstanceLock { path, source: e }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
