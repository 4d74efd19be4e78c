use anyhow::Result;
use s3fs::Fs;

use crate::common::format_entry;

/// Lists a directory, one entry per line or as a JSON array.
pub async fn list_command(fs: &Fs, path: &str, json: bool) -> Result<String> {
    diagnostics::debug!("Listing {path}", path: path);
    let entries = fs.list(path).await?;
    if entries.is_empty() {
        return Err(s3fs::Error::not_found(s3fs::normalize(path)).into());
    }

    if json {
        return Ok(serde_json::to_string_pretty(&entries)?);
    }
    let mut out = String::new();
    for entry in &entries {
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    Ok(out)
}

pub async fn stat_command(fs: &Fs, path: &str, json: bool) -> Result<String> {
    let info = fs.stat(path).await?;
    if json {
        Ok(serde_json::to_string_pretty(&info)?)
    } else {
        Ok(format!("{}\n", format_entry(&info)))
    }
}
