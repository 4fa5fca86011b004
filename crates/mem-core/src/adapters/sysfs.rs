//! # Sysfs Attribute Store
//!
//! Filesystem implementation of the `AttrStore` port. Attributes are small
//! text files; reads come back trimmed, writes carry a newline terminator
//! and report the byte count the kernel accepted.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use mem_types::MemError;

use crate::ports::outbound::{AttrEntry, AttrStore};

/// Default root of the kernel memory block tree.
pub const DEFAULT_MEMORY_ROOT: &str = "/sys/devices/system/memory";

/// `AttrStore` over a directory of single-value text attributes.
#[derive(Debug, Clone)]
pub struct SysfsAttrStore {
    root: PathBuf,
}

impl SysfsAttrStore {
    /// Store rooted at the kernel memory block directory.
    pub fn memory_root() -> Self {
        Self::new(DEFAULT_MEMORY_ROOT)
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

impl AttrStore for SysfsAttrStore {
    fn read(&self, path: &str) -> Result<String, MemError> {
        let full = self.resolve(path);
        let text = fs::read_to_string(&full)
            .map_err(|e| MemError::unavailable(full.display().to_string(), e))?;
        Ok(text.trim_end().to_string())
    }

    fn write(&self, path: &str, value: &str) -> Result<usize, MemError> {
        let full = self.resolve(path);
        let mut file = OpenOptions::new()
            .write(true)
            .open(&full)
            .map_err(|e| MemError::unavailable(full.display().to_string(), e))?;

        let payload = format!("{value}\n");
        let written = file
            .write(payload.as_bytes())
            .map_err(|e| MemError::unavailable(full.display().to_string(), e))?;

        debug!("wrote {:?} to {} ({} bytes)", value, full.display(), written);
        Ok(written)
    }

    fn list(&self, path: &str) -> Result<Vec<AttrEntry>, MemError> {
        let full = self.resolve(path);
        let dir = fs::read_dir(&full)
            .map_err(|e| MemError::unavailable(full.display().to_string(), e))?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry =
                entry.map_err(|e| MemError::unavailable(full.display().to_string(), e))?;
            // file_type() does not follow symlinks, which is what the
            // node-link scan needs
            let ftype = entry
                .file_type()
                .map_err(|e| MemError::unavailable(full.display().to_string(), e))?;
            entries.push(AttrEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: ftype.is_dir(),
                is_symlink: ftype.is_symlink(),
            });
        }
        Ok(entries)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

// =============================================================================
// TESTS
// =============================================================================
