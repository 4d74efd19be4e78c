use std::io::{self, SeekFrom};
use std::sync::Arc;

use futures::TryStreamExt;
use tokio::task::JoinHandle;

use super::Spool;
use crate::client::ObjectClient;
use crate::error::{Error, Result};
use crate::pipe::{PipeReader, PipeWriter};

/// Sequential, seekable reads of one object.
///
/// A background task streams the object body from the current offset into
/// the pipe. Seeking discards that task and starts a new one at the target,
/// so each seek costs one ranged request and nothing is cached.
#[derive(Debug)]
pub(crate) struct ReadBridge {
    client: Arc<dyn ObjectClient>,
    path: String,
    key: String,
    size: u64,
    spool: Spool,
    offset: u64,
    reader: PipeReader,
    task: Option<JoinHandle<Result<()>>>,
}

impl ReadBridge {
    pub(crate) fn open(
        client: Arc<dyn ObjectClient>,
        path: String,
        key: String,
        size: u64,
        spool: Spool,
    ) -> Result<Self> {
        let (reader, task) = start(&client, &key, size, 0, &spool)?;
        Ok(Self {
            client,
            path,
            key,
            size,
            spool,
            offset: 0,
            reader,
            task: Some(task),
        })
    }

    #[must_use]
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads from the current offset; 0 means EOF.
    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.reader.read(buf).await {
            Ok(n) => {
                self.offset += n as u64;
                Ok(n)
            }
            Err(e) => Err(self.failure(e).await),
        }
    }

    /// Fills `buf` from `offset` until it is full or the object ends.
    pub(crate) async fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        _ = self.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Moves the offset, restarting the transfer unless it is unchanged.
    /// Targets outside `0..=size` are rejected without any request.
    pub(crate) fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.offset.checked_add_signed(delta),
            SeekFrom::End(delta) => self.size.checked_add_signed(delta),
        }
        .filter(|target| *target <= self.size)
        .ok_or_else(|| {
            Error::invalid(
                &self.path,
                format!("seek to {pos:?} outside 0..={}", self.size),
            )
        })?;

        if target != self.offset {
            self.stop();
            let (reader, task) = start(&self.client, &self.key, self.size, target, &self.spool)?;
            self.reader = reader;
            self.task = Some(task);
            self.offset = target;
        }
        Ok(target)
    }

    /// Abandons the transfer; idempotent.
    pub(crate) fn stop(&mut self) {
        self.reader.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// The pipe only carries a summary; the task holds the typed cause.
    async fn failure(&mut self, pipe_error: io::Error) -> Error {
        match self.task.take() {
            Some(task) => match task.await {
                Ok(Err(cause)) => cause,
                Ok(Ok(())) => Error::Io(pipe_error),
                Err(join) => Error::transfer(&self.path, join.to_string()),
            },
            None => Error::transfer(&self.path, pipe_error.to_string()),
        }
    }
}

impl Drop for ReadBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

fn start(
    client: &Arc<dyn ObjectClient>,
    key: &str,
    size: u64,
    offset: u64,
    spool: &Spool,
) -> Result<(PipeReader, JoinHandle<Result<()>>)> {
    let (writer, reader) = spool.pipe()?;
    let task = tokio::spawn(fetch(client.clone(), key.to_string(), size, offset, writer));
    Ok((reader, task))
}

async fn fetch(
    client: Arc<dyn ObjectClient>,
    key: String,
    size: u64,
    offset: u64,
    mut writer: PipeWriter,
) -> Result<()> {
    let outcome = copy_body(client.as_ref(), &key, size, offset, &mut writer).await;
    match &outcome {
        Ok(()) => writer.close(),
        Err(e) => writer.close_with_error(&io::Error::other(e.to_string())),
    }
    outcome
}

async fn copy_body(
    client: &dyn ObjectClient,
    key: &str,
    size: u64,
    offset: u64,
    writer: &mut PipeWriter,
) -> Result<()> {
    // Stores reject ranges starting at or past the end.
    if offset > 0 && offset >= size {
        return Ok(());
    }
    diagnostics::debug!("Fetching {key} from offset {offset}", key: key, offset: offset);

    let from = (offset > 0).then_some(offset);
    let mut body = client.get(key, from).await?;
    while let Some(chunk) = body.try_next().await? {
        writer.write_all(&chunk).await?;
    }
    Ok(())
}
