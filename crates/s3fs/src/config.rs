use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

/// Smallest multipart part size the store accepts (5 MiB).
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Default name of the sentinel object that keeps an empty directory alive.
pub const DEFAULT_DIRECTORY_MARKER: &str = ".keep";

/// Options for one filesystem instance.
///
/// Built once and handed to [`crate::Fs::new`]; there is no global state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key prefix prepended to every path; stored without surrounding '/'
    #[serde(deserialize_with = "deserialize_prefix")]
    prefix: String,

    /// Bound on each metadata, listing, copy and delete request
    #[serde(deserialize_with = "deserialize_timeout")]
    timeout: Option<Duration>,

    /// Multipart part size for uploads; also sizes the transfer spool
    #[serde(deserialize_with = "deserialize_part_size")]
    part_size: usize,

    /// Directory for the spool files backing transfers; system temp if unset
    scratch_dir: Option<PathBuf>,

    #[serde(deserialize_with = "deserialize_marker")]
    directory_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            timeout: None,
            part_size: MIN_PART_SIZE,
            scratch_dir: None,
            directory_marker: DEFAULT_DIRECTORY_MARKER.to_string(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.prefix = clean_prefix(prefix.as_ref());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sizes below [`MIN_PART_SIZE`] are ignored and the current value kept.
    #[must_use]
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        if part_size >= MIN_PART_SIZE {
            self.part_size = part_size;
        } else {
            diagnostics::warn!("Ignoring part size {part_size} below the 5 MiB minimum", part_size: part_size);
        }
        self
    }

    #[must_use]
    pub fn with_scratch_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// An empty marker name is ignored.
    #[must_use]
    pub fn with_directory_marker<S: AsRef<str>>(mut self, marker: S) -> Self {
        if !marker.as_ref().is_empty() {
            self.directory_marker = marker.as_ref().to_string();
        }
        self
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn part_size(&self) -> usize {
        self.part_size
    }

    #[must_use]
    pub fn scratch_dir(&self) -> Option<&std::path::Path> {
        self.scratch_dir.as_deref()
    }

    #[must_use]
    pub fn directory_marker(&self) -> &str {
        &self.directory_marker
    }

    /// Bytes a transfer may hold locally: two parts, so the caller can fill
    /// one while the other is in flight.
    #[must_use]
    pub fn spool_capacity(&self) -> usize {
        self.part_size * 2
    }
}

fn clean_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_string()
}

fn deserialize_prefix<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let prefix = String::deserialize(d)?;
    Ok(clean_prefix(&prefix))
}

fn deserialize_timeout<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    let text: Option<String> = Option::deserialize(d)?;
    text.map(|t| parse_duration::parse(&t).map_err(serde::de::Error::custom))
        .transpose()
}

fn deserialize_part_size<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    let size = usize::deserialize(d)?;
    Ok(size.max(MIN_PART_SIZE))
}

fn deserialize_marker<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let marker = String::deserialize(d)?;
    if marker.is_empty() {
        Ok(DEFAULT_DIRECTORY_MARKER.to_string())
    } else {
        Ok(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prefix(), "");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.part_size(), MIN_PART_SIZE);
        assert_eq!(config.directory_marker(), ".keep");
        assert!(config.scratch_dir().is_none());
    }

    #[test]
    fn test_small_part_size_is_ignored() {
        let config = Config::new().with_part_size(1024);
        assert_eq!(config.part_size(), MIN_PART_SIZE);

        let config = Config::new().with_part_size(8 * 1024 * 1024);
        assert_eq!(config.part_size(), 8 * 1024 * 1024);
        assert_eq!(config.spool_capacity(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_empty_marker_is_ignored() {
        let config = Config::new().with_directory_marker("");
        assert_eq!(config.directory_marker(), ".keep");

        let config = Config::new().with_directory_marker(".dir");
        assert_eq!(config.directory_marker(), ".dir");
    }

    #[test]
    fn test_prefix_is_trimmed() {
        let config = Config::new().with_prefix("/data/tenant/");
        assert_eq!(config.prefix(), "data/tenant");
    }

    #[test]
    fn test_deserialize() {
        let config: Config = serde_json::from_str(
            r#"{"prefix": "/p/", "timeout": "30s", "part_size": 10, "directory_marker": ""}"#,
        )
        .unwrap();
        assert_eq!(config.prefix(), "p");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.part_size(), MIN_PART_SIZE);
        assert_eq!(config.directory_marker(), ".keep");

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
