use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::Spool;
use crate::client::{ByteStream, ObjectClient};
use crate::error::{Error, Result};
use crate::pipe::{PipeReader, PipeWriter};

/// Bytes pulled from the pipe per body chunk handed to the upload.
const BODY_CHUNK: usize = 256 * 1024;

/// Sequential writes streamed into one multipart upload.
///
/// Writes wait whenever the spool is full, so memory and disk stay bounded
/// by the spool capacity. The object only becomes visible when
/// [`WriteBridge::finish`] succeeds; a bridge dropped before then aborts the
/// upload.
#[derive(Debug)]
pub(crate) struct WriteBridge {
    path: String,
    writer: Option<PipeWriter>,
    task: Option<JoinHandle<Result<()>>>,
    written: u64,
    failed: Option<String>,
}

impl WriteBridge {
    pub(crate) fn open(
        client: Arc<dyn ObjectClient>,
        path: String,
        key: String,
        spool: Spool,
        part_size: usize,
    ) -> Result<Self> {
        let (writer, reader) = spool.pipe()?;
        let task = tokio::spawn(upload(client, key, reader, part_size));
        Ok(Self {
            path,
            writer: Some(writer),
            task: Some(task),
            written: 0,
            failed: None,
        })
    }

    #[must_use]
    pub(crate) fn written(&self) -> u64 {
        self.written
    }

    pub(crate) async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(self.closed_error());
        };
        // Counted per chunk: a caller may drop this future between chunks.
        let mut rest = buf;
        while !rest.is_empty() {
            match writer.write(rest).await {
                Ok(n) => {
                    self.written += n as u64;
                    rest = &rest[n..];
                }
                Err(e) => {
                    self.writer = None;
                    return Err(self.failure(e).await);
                }
            }
        }
        Ok(buf.len())
    }

    /// Only the next sequential offset is accepted.
    pub(crate) async fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        if offset != self.written {
            return Err(Error::invalid(
                &self.path,
                format!(
                    "write at offset {offset} but the upload is at {}",
                    self.written
                ),
            ));
        }
        self.write(buf).await
    }

    /// Ends the body and waits for the upload to commit. Returns the object
    /// size. Calling it again repeats the first outcome.
    pub(crate) async fn finish(&mut self) -> Result<u64> {
        if let Some(writer) = self.writer.take() {
            writer.close();
        }
        match self.task.take() {
            Some(task) => match task.await {
                Ok(Ok(())) => Ok(self.written),
                Ok(Err(cause)) => {
                    self.failed = Some(cause.to_string());
                    Err(cause)
                }
                Err(join) => {
                    self.failed = Some(join.to_string());
                    Err(Error::transfer(&self.path, join.to_string()))
                }
            },
            None => match &self.failed {
                Some(reason) => Err(Error::transfer(&self.path, reason.clone())),
                None => Ok(self.written),
            },
        }
    }

    fn closed_error(&self) -> Error {
        match &self.failed {
            Some(reason) => Error::transfer(&self.path, reason.clone()),
            None => Error::not_open(&self.path, "writing"),
        }
    }

    /// The pipe only reports that the upload went away; the task knows why.
    async fn failure(&mut self, pipe_error: io::Error) -> Error {
        let cause = match self.task.take() {
            Some(task) => match task.await {
                Ok(Err(cause)) => cause,
                Ok(Ok(())) => Error::Io(pipe_error),
                Err(join) => Error::transfer(&self.path, join.to_string()),
            },
            None => Error::Io(pipe_error),
        };
        self.failed = Some(cause.to_string());
        cause
    }
}

async fn upload(
    client: Arc<dyn ObjectClient>,
    key: String,
    reader: PipeReader,
    part_size: usize,
) -> Result<()> {
    diagnostics::debug!("Starting multipart upload of {key}", key: key);
    client
        .put_multipart(&key, body_stream(reader), part_size)
        .await?;
    diagnostics::debug!("Committed multipart upload of {key}", key: key);
    Ok(())
}

/// Drains the pipe as an upload body. A pipe failure fails the body, which
/// makes the upload abort instead of committing a truncated object.
fn body_stream(reader: PipeReader) -> ByteStream {
    futures::stream::try_unfold(reader, |mut reader| async move {
        let mut chunk = vec![0u8; BODY_CHUNK];
        let n = match reader.read(&mut chunk).await {
            Ok(n) => n,
            Err(e) => {
                return Err(object_store::Error::Generic {
                    store: "spool",
                    source: Box::new(e),
                });
            }
        };
        if n == 0 {
            return Ok(None);
        }
        chunk.truncate(n);
        Ok(Some((Bytes::from(chunk), reader)))
    })
    .boxed()
}
