use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

const LOCK_FILE_NAME: &str = "display-switch.lock";

/// Exclusive lock ensuring only one agent reacts to hotplug events
///
/// Held for the lifetime of the value; the kernel drops the `flock` when the
/// file is closed.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Lock in the user's runtime directory (`/tmp` when there is none)
    pub fn acquire_default() -> Result<Self> {
        let dir = dirs::runtime_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::acquire(&dir)
    }

    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        let file = File::create(&path)?;

        // Non-blocking: a second agent fails fast instead of waiting
        let lock_result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };

        if lock_result != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(AppError::AlreadyRunning(path));
            }
            return Err(AppError::Io(err));
        }

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
