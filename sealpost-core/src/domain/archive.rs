//! Encrypted archive domain model

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A password-protected single-member ZIP written to the staging directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedArchive {
    /// Location of the archive file
    pub path: PathBuf,
    /// Name of the one member inside the archive (the original file name)
    pub member: String,
    /// When the archive was built
    pub created_at: DateTime<Local>,
    /// Archive size in bytes
    pub size_bytes: u64,
}

impl EncryptedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive file name (e.g., "resume_20250115_103000.zip")
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
