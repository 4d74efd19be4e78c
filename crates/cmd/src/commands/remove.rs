use anyhow::{Context, Result};
use s3fs::Fs;

pub async fn rm_command(fs: &Fs, path: &str) -> Result<()> {
    fs.remove(path).await?;
    Ok(())
}

/// Renames a file. A half-done rename (copied, source still present) is
/// reported with both paths so the caller can finish it with `rm`.
pub async fn mv_command(fs: &Fs, from: &str, to: &str) -> Result<()> {
    fs.rename(from, to)
        .await
        .with_context(|| format!("Failed to move '{from}' to '{to}'"))
}
