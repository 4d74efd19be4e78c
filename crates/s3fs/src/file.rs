use std::io::SeekFrom;

use crate::bridge::{ReadBridge, WriteBridge};
use crate::error::{Error, Result};
use crate::metadata::FileInfo;

/// Buffer size used by [`File::read_to_end`].
const READ_CHUNK: usize = 64 * 1024;

/// An open file handle.
///
/// A handle opened with [`crate::Fs::open`] only reads; one returned by
/// [`crate::Fs::create`] only writes, sequentially from offset 0. Calls in
/// the wrong mode, or after close, fail with [`Error::NotOpen`].
#[derive(Debug)]
pub struct File {
    path: String,
    info: FileInfo,
    mode: Mode,
}

#[derive(Debug)]
enum Mode {
    Reading(ReadBridge),
    Writing(WriteBridge),
    Closed,
}

impl File {
    pub(crate) fn reading(path: String, info: FileInfo, bridge: ReadBridge) -> Self {
        Self {
            path,
            info,
            mode: Mode::Reading(bridge),
        }
    }

    pub(crate) fn writing(path: String, info: FileInfo, bridge: WriteBridge) -> Self {
        Self {
            path,
            info,
            mode: Mode::Writing(bridge),
        }
    }

    /// Normalized path this handle was opened with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Attributes at open time; for a written file, as committed by close.
    #[must_use]
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Current offset: read position, or bytes written so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        match &self.mode {
            Mode::Reading(bridge) => bridge.offset(),
            Mode::Writing(bridge) => bridge.written(),
            Mode::Closed => 0,
        }
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reader()?.read(buf).await
    }

    /// Reads at `offset` until `buf` is full or the file ends, leaving the
    /// position just past the bytes read.
    pub async fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.reader()?.read_at(buf, offset).await
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.reader()?.seek(pos)
    }

    /// Reads from the current position to the end.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let remaining = self.info.size.saturating_sub(self.position());
        let mut data = Vec::with_capacity(usize::try_from(remaining).unwrap_or_default());
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                return Ok(data);
            }
            data.extend_from_slice(&buf[..n]);
        }
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.writer()?.write(buf).await
    }

    /// Writes at `offset`, which must be the current end of the file.
    pub async fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        self.writer()?.write_at(buf, offset).await
    }

    /// Releases the handle. For a written file this commits the upload and
    /// reports its failure; a failed commit can be retried for the same
    /// result. Closing a closed handle succeeds.
    pub async fn close(&mut self) -> Result<()> {
        match &mut self.mode {
            Mode::Reading(bridge) => {
                bridge.stop();
            }
            Mode::Writing(bridge) => {
                let size = bridge.finish().await?;
                self.info = FileInfo::file(self.info.name.clone(), size, None);
                let path = &self.path;
                diagnostics::info!("Committed {path} ({size} bytes)", path: path, size: size);
            }
            Mode::Closed => return Ok(()),
        }
        self.mode = Mode::Closed;
        Ok(())
    }

    fn reader(&mut self) -> Result<&mut ReadBridge> {
        match &mut self.mode {
            Mode::Reading(bridge) => Ok(bridge),
            _ => Err(Error::not_open(&self.path, "reading")),
        }
    }

    fn writer(&mut self) -> Result<&mut WriteBridge> {
        match &mut self.mode {
            Mode::Writing(bridge) => Ok(bridge),
            _ => Err(Error::not_open(&self.path, "writing")),
        }
    }
}
