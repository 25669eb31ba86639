//! Filesystem usage for a mount point via statvfs.

use crate::error::CollectionError;
use serde::{Deserialize, Serialize};

/// Disk usage reading carried in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskReading {
    /// Mount point that was measured
    pub mount: String,
    pub total: u64,
    pub used: u64,
    /// Bytes available to unprivileged users
    pub free: u64,
    /// `used / (used + free)`, which ignores blocks reserved for root
    pub percent: f64,
}

/// Disk usage collector for a single mount point
pub struct DiskCollector {
    mount: String,
}

impl DiskCollector {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
        }
    }

    /// Collect current disk usage
    pub fn collect(&mut self) -> Result<DiskReading, CollectionError> {
        statvfs_usage(&self.mount)
    }
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new("/")
    }
}

pub(crate) fn usage_from_blocks(
    mount: &str,
    block_size: u64,
    total_blocks: u64,
    free_blocks: u64,
    available_blocks: u64,
) -> DiskReading {
    let total = total_blocks * block_size;
    let used = total_blocks.saturating_sub(free_blocks) * block_size;
    let free = available_blocks * block_size;
    let percent = if used + free > 0 {
        100.0 * used as f64 / (used + free) as f64
    } else {
        0.0
    };

    DiskReading {
        mount: mount.to_string(),
        total,
        used,
        free,
        percent,
    }
}

#[cfg(unix)]
fn statvfs_usage(mount: &str) -> Result<DiskReading, CollectionError> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let c_path = CString::new(mount)
        .map_err(|_| CollectionError::parse(mount, "mount path contains a NUL byte"))?;
    let mut statvfs = MaybeUninit::<libc::statvfs>::uninit();

    let result = unsafe { libc::statvfs(c_path.as_ptr(), statvfs.as_mut_ptr()) };
    if result != 0 {
        return Err(CollectionError::Statvfs {
            path: mount.to_string(),
            source: std::io::Error::last_os_error(),
        });
    }

    let statvfs = unsafe { statvfs.assume_init() };
    Ok(usage_from_blocks(
        mount,
        statvfs.f_frsize as u64,
        statvfs.f_blocks as u64,
        statvfs.f_bfree as u64,
        statvfs.f_bavail as u64,
    ))
}

#[cfg(not(unix))]
fn statvfs_usage(_mount: &str) -> Result<DiskReading, CollectionError> {
    Err(CollectionError::Unsupported("disk usage"))
}
