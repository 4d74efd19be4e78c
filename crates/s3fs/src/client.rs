//! The store capabilities the filesystem is built on.
//!
//! Keys are raw strings and listing prefixes match byte-wise, the way S3
//! `ListObjectsV2` does: the prefix `docs` matches `docs`, `docs.txt` and
//! everything under `docs/`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use object_store::Result;

/// A byte stream moving an object body to or from the store.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// One object reported by `head` or `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Parameters for one page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Raw key prefix; matched byte-wise
    pub prefix: String,

    /// Group keys into common prefixes up to the next delimiter
    pub delimiter: Option<String>,

    /// Continuation token from the previous page
    pub page_token: Option<String>,

    /// Cap on entries plus common prefixes in this page
    pub max_keys: Option<usize>,
}

impl ListRequest {
    #[must_use]
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_delimiter<S: Into<String>>(mut self, delimiter: S) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn with_page_token(mut self, token: Option<String>) -> Self {
        self.page_token = token;
        self
    }

    #[must_use]
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

/// One page of listing results, in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Grouped prefixes, each ending with the delimiter
    pub common_prefixes: Vec<String>,
    pub entries: Vec<ObjectEntry>,

    /// Present when more results follow
    pub next_page_token: Option<String>,
}

/// Requests against a flat key-addressed object store.
///
/// Implementations own retries, authentication and transport. Timeouts and
/// cancellation come from the caller dropping the returned future.
#[async_trait]
pub trait ObjectClient: Send + Sync + std::fmt::Debug {
    /// Size and modification time of `key`, or `None` if it does not exist.
    async fn head(&self, key: &str) -> Result<Option<ObjectEntry>>;

    async fn list(&self, request: ListRequest) -> Result<ListPage>;

    /// Body of `key`, starting at byte `from` when given.
    async fn get(&self, key: &str, from: Option<u64>) -> Result<ByteStream>;

    /// Single-request upload of a small body.
    async fn put(&self, key: &str, body: Bytes) -> Result<()>;

    /// Multipart upload of `body` in parts of `part_size` bytes. The object
    /// only becomes visible if the whole body is consumed without error.
    async fn put_multipart(&self, key: &str, body: ByteStream, part_size: usize) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn copy(&self, from: &str, to: &str) -> Result<()>;
}
