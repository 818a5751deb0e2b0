use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Advisory lock marking a device as owned by one session. Released when
/// dropped.
pub struct DeviceClaim {
    _lock: fd_lock::RwLock<File>,
    path: PathBuf,
}

impl DeviceClaim {
    pub fn acquire(lock_dir: &Path, device_path: &str) -> Result<Self> {
        std::fs::create_dir_all(lock_dir)?;
        let digest = Sha256::digest(device_path.as_bytes());
        let path = lock_dir.join(format!("onlykey-{}.lock", hex::encode(&digest[..8])));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        let mut lock = fd_lock::RwLock::new(file);
        match lock.try_write() {
            // The lock lives as long as the file handle; the guard would
            // release it on drop.
            Ok(guard) => std::mem::forget(guard),
            Err(_) => return Err(Error::DeviceBusy(device_path.to_string())),
        }
        tracing::debug!(lock = %path.display(), device = device_path, "device claimed");
        Ok(Self { _lock: lock, path })
    }

    pub fn lock_path(&self) -> &Path {
        &self.path
    }
}
