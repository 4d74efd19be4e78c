use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use object_store::ObjectStore;
use object_store::local::LocalFileSystem;
use s3fs::{Config, FileInfo, Fs};
use url::Url;

/// Where the filesystem lives and how it is accessed.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store URL: s3://bucket/prefix, file:///some/dir or memory://
    #[arg(long, env = "S3FS_URL", global = true, default_value = "memory://")]
    pub url: String,

    /// Key prefix below the URL path
    #[arg(long, env = "S3FS_PREFIX", global = true, default_value = "")]
    pub prefix: String,

    /// Bound on each metadata and listing request, e.g. "30s"
    #[arg(long, env = "S3FS_TIMEOUT", global = true, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Multipart part size in bytes (at least 5 MiB)
    #[arg(long, env = "S3FS_PART_SIZE", global = true)]
    pub part_size: Option<usize>,

    /// Directory for transfer spool files
    #[arg(long, env = "S3FS_SCRATCH_DIR", global = true)]
    pub scratch_dir: Option<PathBuf>,

    /// Name of the empty-directory marker object
    #[arg(long, env = "S3FS_MARKER", global = true)]
    pub marker: Option<String>,

    /// Extra store option as key=value, e.g. aws_region=us-west-2
    #[arg(long = "option", global = true, value_parser = parse_option)]
    pub options: Vec<(String, String)>,
}

impl StoreArgs {
    /// Filesystem configuration, with `base` (the URL's path) ahead of the
    /// configured prefix.
    #[must_use]
    pub fn config(&self, base: &str) -> Config {
        let mut config =
            Config::new().with_prefix(s3fs::path::with_prefix(base, &[self.prefix.as_str()]));
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(part_size) = self.part_size {
            config = config.with_part_size(part_size);
        }
        if let Some(dir) = &self.scratch_dir {
            config = config.with_scratch_dir(dir);
        }
        if let Some(marker) = &self.marker {
            config = config.with_directory_marker(marker);
        }
        config
    }

    pub fn open(&self) -> Result<Fs> {
        let (store, base) = build_object_store(&self.url, &self.options)?;
        let config = self.config(&base);
        let url = &self.url;
        let prefix = config.prefix();
        diagnostics::debug!("Opened {url} with prefix {prefix}", url: url, prefix: prefix);
        Ok(Fs::from_object_store(store, config))
    }
}

/// Builds a store from its URL. Returns the store and the key prefix named
/// by the URL path; a local directory is used as the store root instead.
pub fn build_object_store(
    raw: &str,
    options: &[(String, String)],
) -> Result<(Arc<dyn ObjectStore>, String)> {
    let url = Url::parse(raw).with_context(|| format!("Invalid store URL '{raw}'"))?;

    if url.scheme() == "file" {
        let path = url
            .to_file_path()
            .map_err(|()| anyhow!("Invalid file URL '{raw}'"))?;
        let store = LocalFileSystem::new_with_prefix(&path)
            .with_context(|| format!("Failed to open local store at {}", path.display()))?;
        return Ok((Arc::new(store), String::new()));
    }

    let (store, path) = object_store::parse_url_opts(
        &url,
        options.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )
    .with_context(|| format!("Failed to build store for '{raw}'"))?;
    Ok((Arc::from(store), path.to_string()))
}

fn parse_timeout(text: &str) -> Result<Duration, String> {
    parse_duration::parse(text).map_err(|e| e.to_string())
}

fn parse_option(text: &str) -> Result<(String, String), String> {
    text.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{text}'"))
}

/// Format file size in human-readable form
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// One `ls`-style line: kind, size, modification time, name.
#[must_use]
pub fn format_entry(info: &FileInfo) -> String {
    let kind = if info.is_dir() { 'd' } else { '-' };
    format!(
        "{kind} {:>10} {} {}",
        format_file_size(info.size),
        info.modified.format("%Y-%m-%d %H:%M:%S"),
        info.name
    )
}
