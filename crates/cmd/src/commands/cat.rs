use std::path::Path;

use anyhow::{Context, Result};
use s3fs::{File, Fs};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Read buffer for streaming file contents out.
const COPY_CHUNK: usize = 1024 * 1024;

/// Streams the rest of `file` into `out`, returning the bytes copied.
pub async fn copy_out<W>(file: &mut File, out: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    out.flush().await?;
    Ok(total)
}

/// Writes a file's contents to stdout.
pub async fn cat_command(fs: &Fs, path: &str) -> Result<()> {
    let mut file = fs.open(path).await?.into_file()?;
    let mut stdout = tokio::io::stdout();
    let copied = copy_out(&mut file, &mut stdout).await?;
    file.close().await?;
    diagnostics::debug!("Wrote {copied} bytes of {path} to stdout", copied: copied, path: path);
    Ok(())
}

/// Downloads `remote` into the local file `local`.
pub async fn get_command(fs: &Fs, remote: &str, local: &Path) -> Result<u64> {
    let mut file = fs.open(remote).await?.into_file()?;
    let mut out = tokio::fs::File::create(local)
        .await
        .with_context(|| format!("Failed to create {}", local.display()))?;
    let copied = copy_out(&mut file, &mut out).await?;
    file.close().await?;
    diagnostics::info!("Downloaded {remote} ({copied} bytes)", remote: remote, copied: copied);
    Ok(copied)
}
