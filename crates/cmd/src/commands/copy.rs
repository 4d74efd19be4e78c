use std::path::Path;

use anyhow::{Context, Result};
use s3fs::{FileInfo, Fs};
use tokio::io::AsyncReadExt;

/// Read buffer for uploads; the filesystem spools and splits into parts.
const UPLOAD_CHUNK: usize = 1024 * 1024;

/// Uploads the local file `local` to `remote`, replacing any existing file.
pub async fn put_command(fs: &Fs, local: &Path, remote: &str) -> Result<FileInfo> {
    let mut source = tokio::fs::File::open(local)
        .await
        .with_context(|| format!("Failed to open {}", local.display()))?;
    let mut file = fs.create(remote).await?;

    let mut buf = vec![0u8; UPLOAD_CHUNK];
    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        _ = file.write(&buf[..n]).await?;
    }
    file.close()
        .await
        .with_context(|| format!("Upload of {} to '{remote}' failed", local.display()))?;

    let size = file.info().size;
    diagnostics::info!("Uploaded {remote} ({size} bytes)", remote: remote, size: size);
    Ok(file.info().clone())
}
