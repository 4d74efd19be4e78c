use crate::Fs;
use crate::error::{Error, Result};
use crate::metadata::FileInfo;

/// An open directory. Listing always goes back to the store.
#[derive(Debug, Clone)]
pub struct Directory {
    fs: Fs,
    path: String,
    info: FileInfo,
}

impl Directory {
    pub(crate) fn new(fs: Fs, path: String, info: FileInfo) -> Self {
        Self { fs, path, info }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub async fn list(&self) -> Result<Vec<FileInfo>> {
        self.fs.list(&self.path).await
    }

    /// Directories have no byte content.
    pub fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::is_a_directory(&self.path))
    }

    pub fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
