use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use object_store::ObjectStore;

use crate::bridge::{ReadBridge, Spool, WriteBridge};
use crate::client::ObjectClient;
use crate::config::Config;
use crate::dir::Directory;
use crate::error::{Error, Result};
use crate::file::File;
use crate::metadata::FileInfo;
use crate::object_store_client::ObjectStoreClient;
use crate::path::{basename, normalize, with_prefix};

/// A hierarchical filesystem over a flat object store.
///
/// Directories exist implicitly whenever some key lies below them, or
/// explicitly through a zero-byte marker object. Every call goes to the
/// store; nothing is cached, so `Fs` is cheap to clone and share across
/// tasks.
#[derive(Debug, Clone)]
pub struct Fs {
    pub(crate) client: Arc<dyn ObjectClient>,
    pub(crate) config: Arc<Config>,
}

/// Result of [`Fs::open`].
#[derive(Debug)]
pub enum Node {
    File(File),
    Directory(Directory),
}

impl Node {
    #[must_use]
    pub fn info(&self) -> &FileInfo {
        match self {
            Node::File(f) => f.info(),
            Node::Directory(d) => d.info(),
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn into_file(self) -> Result<File> {
        match self {
            Node::File(f) => Ok(f),
            Node::Directory(d) => Err(Error::is_a_directory(d.path())),
        }
    }

    pub fn into_directory(self) -> Result<Directory> {
        match self {
            Node::Directory(d) => Ok(d),
            Node::File(f) => Err(Error::not_a_directory(f.path())),
        }
    }
}

impl Fs {
    #[must_use]
    pub fn new(client: Arc<dyn ObjectClient>, config: Config) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// A filesystem over any `object_store` backend.
    #[must_use]
    pub fn from_object_store(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self::new(Arc::new(ObjectStoreClient::new(store)), config)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Object key for a normalized path.
    pub(crate) fn key(&self, normalized: &str) -> String {
        with_prefix(self.config.prefix(), &[normalized])
    }

    /// Runs one store request under the configured timeout.
    pub(crate) async fn bounded<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = object_store::Result<T>>,
    {
        match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| Error::Timeout(limit))?
                .map_err(Error::from),
            None => Ok(request.await?),
        }
    }

    fn spool(&self) -> Spool {
        Spool::from_config(&self.config)
    }

    pub async fn stat(&self, path: &str) -> Result<FileInfo> {
        let normalized = normalize(path);
        self.resolve(&normalized)
            .await?
            .ok_or_else(|| Error::not_found(&normalized))
    }

    /// Opens a file for reading or a directory for listing.
    pub async fn open(&self, path: &str) -> Result<Node> {
        let normalized = normalize(path);
        let info = self
            .resolve(&normalized)
            .await?
            .ok_or_else(|| Error::not_found(&normalized))?;

        if info.is_dir() {
            return Ok(Node::Directory(Directory::new(self.clone(), normalized, info)));
        }

        diagnostics::debug!("Opening {normalized} for reading", normalized: normalized);
        let bridge = ReadBridge::open(
            self.client.clone(),
            normalized.clone(),
            self.key(&normalized),
            info.size,
            self.spool(),
        )?;
        Ok(Node::File(File::reading(normalized, info, bridge)))
    }

    /// Opens a file for writing, replacing any existing file on close.
    pub async fn create(&self, path: &str) -> Result<File> {
        let normalized = normalize(path);
        if self.resolve(&normalized).await?.is_some_and(|info| info.is_dir()) {
            return Err(Error::already_exists(&normalized));
        }

        diagnostics::debug!("Creating {normalized}", normalized: normalized);
        let bridge = WriteBridge::open(
            self.client.clone(),
            normalized.clone(),
            self.key(&normalized),
            self.spool(),
            self.config.part_size(),
        )?;
        let info = FileInfo::file(basename(&normalized), 0, None);
        Ok(File::writing(normalized, info, bridge))
    }

    /// Creates a directory by writing its marker object. An existing
    /// directory is returned as is.
    pub async fn make_directory(&self, path: &str) -> Result<Directory> {
        let normalized = normalize(path);
        match self.resolve(&normalized).await? {
            Some(info) if info.is_dir() => {
                return Ok(Directory::new(self.clone(), normalized, info));
            }
            Some(_) => return Err(Error::already_exists(&normalized)),
            None => {}
        }

        let marker = self.marker_key(&normalized);
        self.bounded(self.client.put(&marker, Bytes::new())).await?;
        diagnostics::info!("Created directory {normalized}", normalized: normalized);

        let info = FileInfo::directory(basename(&normalized));
        Ok(Directory::new(self.clone(), normalized, info))
    }

    /// Deletes a file. Removing a missing path succeeds.
    pub async fn remove(&self, path: &str) -> Result<()> {
        let normalized = normalize(path);
        match self.resolve(&normalized).await? {
            None => {
                diagnostics::debug!("Nothing to remove at {normalized}", normalized: normalized);
                Ok(())
            }
            Some(info) if info.is_dir() => Err(Error::is_a_directory(&normalized)),
            Some(_) => {
                let key = self.key(&normalized);
                self.bounded(self.client.delete(&key)).await?;
                diagnostics::info!("Removed {normalized}", normalized: normalized);
                Ok(())
            }
        }
    }

    /// Deletes an empty directory's marker.
    pub async fn remove_directory(&self, path: &str) -> Result<()> {
        let normalized = normalize(path);
        if normalized.is_empty() {
            return Err(Error::invalid(&normalized, "cannot remove the root"));
        }

        let entries = self.list(&normalized).await?;
        match entries.len() {
            0 => return Err(Error::not_found(&normalized)),
            1 => {}
            _ => return Err(Error::directory_not_empty(&normalized)),
        }

        let marker = self.marker_key(&normalized);
        self.bounded(self.client.delete(&marker)).await?;
        diagnostics::info!("Removed directory {normalized}", normalized: normalized);
        Ok(())
    }

    /// Moves a file by copying it and deleting the source. The two steps
    /// are not atomic; if the delete fails the object exists under both
    /// names and [`Error::PartialRename`] says so.
    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let from = normalize(old);
        let to = normalize(new);

        let info = self
            .resolve(&from)
            .await?
            .ok_or_else(|| Error::not_found(&from))?;
        if info.is_dir() {
            return Err(Error::is_a_directory(&from));
        }
        if self.resolve(&to).await?.is_some_and(|target| target.is_dir()) {
            return Err(Error::is_a_directory(&to));
        }

        let from_key = self.key(&from);
        let to_key = self.key(&to);
        if from_key == to_key {
            return Ok(());
        }

        self.bounded(self.client.copy(&from_key, &to_key)).await?;
        if let Err(e) = self.bounded(self.client.delete(&from_key)).await {
            let reason = e.to_string();
            diagnostics::warn!("Renamed {from} to {to} but kept the source: {reason}", from: from, to: to, reason: reason);
            return Err(Error::partial_rename(&from, &to, e));
        }

        diagnostics::info!("Renamed {from} to {to}", from: from, to: to);
        Ok(())
    }

    /// Reads a whole file into memory.
    pub async fn read_to_vec(&self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.open(path).await?.into_file()?;
        let data = file.read_to_end().await?;
        file.close().await?;
        Ok(data)
    }

    /// Writes `data` as the full content of a file and returns its info.
    pub async fn write_from_slice(&self, path: &str, data: &[u8]) -> Result<FileInfo> {
        let mut file = self.create(path).await?;
        _ = file.write(data).await?;
        file.close().await?;
        Ok(file.info().clone())
    }

    fn marker_key(&self, normalized: &str) -> String {
        with_prefix(
            self.config.prefix(),
            &[normalized, self.config.directory_marker()],
        )
    }
}
