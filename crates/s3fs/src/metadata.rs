use crate::EntryType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes of one file or directory, as observed at a point in time.
///
/// A `FileInfo` is built fresh by every stat or listing and never updated
/// afterwards; nothing here is cached between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Final path segment, or "." for the directory being listed
    pub name: String,

    /// Object size in bytes; always 0 for directories
    pub size: u64,

    /// Store modification time; observation time for directories
    pub modified: DateTime<Utc>,

    pub entry_type: EntryType,
}

impl FileInfo {
    /// A directory entry. The store keeps no directory metadata, so the
    /// modification time is "now".
    #[must_use]
    pub fn directory<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified: Utc::now(),
            entry_type: EntryType::Directory,
        }
    }

    /// A file entry; a missing modification time defaults to "now".
    #[must_use]
    pub fn file<S: Into<String>>(name: S, size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            size,
            modified: modified.unwrap_or_else(Utc::now),
            entry_type: EntryType::File,
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }
}
