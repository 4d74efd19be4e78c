use anyhow::Result;
use s3fs::Fs;

pub async fn mkdir_command(fs: &Fs, path: &str) -> Result<()> {
    let dir = fs.make_directory(path).await?;
    let path = dir.path();
    diagnostics::info!("Directory ready: {path}", path: path);
    Ok(())
}

pub async fn rmdir_command(fs: &Fs, path: &str) -> Result<()> {
    fs.remove_directory(path).await?;
    Ok(())
}
