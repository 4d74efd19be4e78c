//! Bounded, disk-backed pipe between a background transfer and its caller.
//!
//! Bytes are spooled through an unlinked temporary file used as a ring
//! buffer of fixed capacity. The writer waits while the ring is full and the
//! reader waits while it is empty, so local storage never exceeds the
//! capacity however large the object is. The reader only touches
//! `[consumed, written)` and the writer only `[written, consumed + capacity)`,
//! so the two never share a byte of the file.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// How the writing end finished.
#[derive(Debug, Clone)]
enum WriterState {
    Open,
    Closed,
    Failed(io::ErrorKind, String),
}

#[derive(Debug)]
struct State {
    /// Total bytes ever written
    written: u64,
    /// Total bytes ever read
    consumed: u64,
    writer: WriterState,
    reader_closed: bool,
}

#[derive(Debug)]
struct Shared {
    spool: Arc<File>,
    capacity: u64,
    state: Mutex<State>,
    readable: Notify,
    writable: Notify,
}

/// Writing end of a pipe. Dropping it without [`PipeWriter::close`] fails
/// the pipe, so the reader never mistakes an abandoned transfer for EOF.
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

/// Reading end of a pipe. Dropping it closes the pipe for the writer.
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Shared>,
}

/// Creates a pipe spooling at most `capacity` bytes in a temporary file
/// under `dir` (the system temporary directory when `None`).
pub fn pipe_in(dir: Option<&Path>, capacity: usize) -> io::Result<(PipeWriter, PipeReader)> {
    if capacity == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "pipe capacity must be positive",
        ));
    }
    let spool = match dir {
        Some(dir) => tempfile::tempfile_in(dir)?,
        None => tempfile::tempfile()?,
    };
    let shared = Arc::new(Shared {
        spool: Arc::new(spool),
        capacity: capacity as u64,
        state: Mutex::new(State {
            written: 0,
            consumed: 0,
            writer: WriterState::Open,
            reader_closed: false,
        }),
        readable: Notify::new(),
        writable: Notify::new(),
    });
    Ok((
        PipeWriter {
            shared: shared.clone(),
        },
        PipeReader { shared },
    ))
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies `data` into the ring at absolute position `pos`.
    async fn store(&self, pos: u64, data: Vec<u8>) -> io::Result<()> {
        let spool = self.spool.clone();
        let capacity = self.capacity;
        tokio::task::spawn_blocking(move || {
            let start = pos % capacity;
            let first = data.len().min((capacity - start) as usize);
            write_all_at(&spool, &data[..first], start)?;
            if first < data.len() {
                write_all_at(&spool, &data[first..], 0)?;
            }
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Reads `len` bytes from the ring at absolute position `pos`.
    async fn load(&self, pos: u64, len: usize) -> io::Result<Vec<u8>> {
        let spool = self.spool.clone();
        let capacity = self.capacity;
        tokio::task::spawn_blocking(move || {
            let mut data = vec![0u8; len];
            let start = pos % capacity;
            let first = len.min((capacity - start) as usize);
            read_exact_at(&spool, &mut data[..first], start)?;
            if first < len {
                read_exact_at(&spool, &mut data[first..], 0)?;
            }
            Ok(data)
        })
        .await
        .map_err(io::Error::other)?
    }
}

impl PipeWriter {
    /// Writes some of `buf`, waiting while the pipe is full. Fails with
    /// `BrokenPipe` once the reader has gone away.
    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let slot = {
                let state = self.shared.lock();
                if state.reader_closed {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "pipe reader closed",
                    ));
                }
                let free = self.shared.capacity - (state.written - state.consumed);
                (free > 0).then_some((state.written, free))
            };

            if let Some((pos, free)) = slot {
                let n = buf.len().min(free as usize);
                self.shared.store(pos, buf[..n].to_vec()).await?;
                self.shared.lock().written += n as u64;
                self.shared.readable.notify_one();
                return Ok(n);
            }
            self.shared.writable.notified().await;
        }
    }

    pub async fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            buf = &buf[n..];
        }
        Ok(())
    }

    /// Marks the end of the data; the reader sees EOF after draining.
    pub fn close(self) {
        self.finish(WriterState::Closed);
    }

    /// Fails the pipe; the reader gets `err` after draining buffered data.
    pub fn close_with_error(self, err: &io::Error) {
        self.finish(WriterState::Failed(err.kind(), err.to_string()));
    }

    fn finish(&self, end: WriterState) {
        let mut state = self.shared.lock();
        if matches!(state.writer, WriterState::Open) {
            state.writer = end;
        }
        drop(state);
        self.shared.readable.notify_one();
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.finish(WriterState::Failed(
            io::ErrorKind::BrokenPipe,
            "pipe writer dropped before close".to_string(),
        ));
    }
}

impl PipeReader {
    /// Reads up to `buf.len()` bytes, waiting while the pipe is empty.
    /// Returns 0 at EOF and the writer's error if it failed.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let slot = {
                let state = self.shared.lock();
                if state.reader_closed {
                    return Err(io::Error::other("pipe reader closed"));
                }
                let available = state.written - state.consumed;
                if available > 0 {
                    Some((state.consumed, available))
                } else {
                    match &state.writer {
                        WriterState::Open => None,
                        WriterState::Closed => return Ok(0),
                        WriterState::Failed(kind, message) => {
                            return Err(io::Error::new(*kind, message.clone()));
                        }
                    }
                }
            };

            if let Some((pos, available)) = slot {
                let n = (buf.len() as u64).min(available) as usize;
                let data = self.shared.load(pos, n).await?;
                buf[..n].copy_from_slice(&data);
                self.shared.lock().consumed += n as u64;
                self.shared.writable.notify_one();
                return Ok(n);
            }
            self.shared.readable.notified().await;
        }
    }

    /// Bytes written but not yet read.
    #[must_use]
    pub fn buffered(&self) -> u64 {
        let state = self.shared.lock();
        state.written - state.consumed
    }

    /// Closes the pipe for both ends; idempotent.
    pub fn close(&mut self) {
        self.shared.lock().reader_closed = true;
        self.shared.writable.notify_one();
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::write_all_at(file, buf, offset)
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        let n = file.seek_write(buf, offset)?;
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        buf = &buf[n..];
        offset += n as u64;
    }
    Ok(())
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        let n = file.seek_read(buf, offset)?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf = &mut buf[n..];
        offset += n as u64;
    }
    Ok(())
}
