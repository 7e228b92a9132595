// concord-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Single-writer guard over a publication directory.
///
/// Created with `create_new`, so a second holder fails instead of waiting.
/// The file is removed when the guard drops, including on error paths.
#[derive(Debug)]
pub struct PublishLock {
    path: PathBuf,
}

impl PublishLock {
    pub const FILE_NAME: &'static str = ".concord.lock";

    pub fn acquire(dir: &Path) -> Result<Self, InfrastructureError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::FILE_NAME);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "pid={}", std::process::id())?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(
                InfrastructureError::PublishLockBusy(path.display().to_string()),
            ),
            Err(e) => Err(InfrastructureError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PublishLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = ?self.path, "Failed to release publication lock: {}", e);
        }
    }
}
