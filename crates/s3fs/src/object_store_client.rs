//! [`ObjectClient`] over any `object_store::ObjectStore`.
//!
//! `object_store` lists by whole path segments, while the filesystem needs
//! S3-style byte-wise prefixes. A listing is taken from the enclosing
//! "directory" once, filtered by the raw prefix and paginated here, using the
//! last returned key as the page token. Pages capped at a single key are
//! answered without listing the enclosing directory at all.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::{GetOptions, GetRange, ObjectMeta, ObjectStore, PutPayload, Result, WriteMultipart};

use crate::client::{ByteStream, ListPage, ListRequest, ObjectClient, ObjectEntry};
use crate::path::DELIMITER;

/// Parts uploaded concurrently by one multipart transfer.
const UPLOAD_CONCURRENCY: usize = 1;

/// Adapter from the `object_store` crate to [`ObjectClient`].
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
}

/// One listing result before pagination.
enum Listed {
    Prefix(String),
    Object(ObjectEntry),
}

impl Listed {
    fn key(&self) -> &str {
        match self {
            Listed::Prefix(p) => p,
            Listed::Object(o) => &o.key,
        }
    }
}

/// Splits a raw prefix at its last separator: "a/b/c" is ("a/b", "c") and
/// "a/b/" is ("a/b", "").
fn split_prefix(prefix: &str) -> (&str, &str) {
    match prefix.rfind(DELIMITER) {
        Some(pos) => (&prefix[..pos], &prefix[pos + 1..]),
        None => ("", prefix),
    }
}

/// The keys after `token`, at most `max_keys` of them, as one page.
fn paginate(listed: Vec<Listed>, token: Option<&str>, max_keys: Option<usize>) -> ListPage {
    let mut remaining = listed
        .into_iter()
        .skip_while(|item| token.is_some_and(|token| item.key() <= token))
        .peekable();

    let mut page = ListPage::default();
    let mut last_key = None;
    for item in remaining.by_ref().take(max_keys.map_or(usize::MAX, |n| n.max(1))) {
        last_key = Some(item.key().to_string());
        match item {
            Listed::Prefix(p) => page.common_prefixes.push(p),
            Listed::Object(o) => page.entries.push(o),
        }
    }
    if remaining.peek().is_some() {
        page.next_page_token = last_key;
    }
    page
}

impl ObjectStoreClient {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn location(key: &str) -> Result<ObjectPath> {
        Ok(ObjectPath::parse(key)?)
    }

    fn segment(key: &str) -> Result<Option<ObjectPath>> {
        if key.is_empty() {
            Ok(None)
        } else {
            Self::location(key).map(Some)
        }
    }

    fn entry(meta: ObjectMeta) -> ObjectEntry {
        ObjectEntry {
            key: meta.location.to_string(),
            size: meta.size,
            modified: Some(meta.last_modified),
        }
    }

    /// Whether any key lies below `segment`. Only the first listed key is
    /// read.
    async fn has_children(&self, segment: Option<&ObjectPath>) -> Result<bool> {
        let mut listed = self.store.list(segment);
        while let Some(meta) = listed.try_next().await? {
            if segment.is_none_or(|s| meta.location != *s) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A page capped at one key, when it can be answered without listing
    /// the enclosing directory.
    ///
    /// For a prefix ending inside a segment, `head` finds the key itself and
    /// the first listed key below it finds the segment `prefix/`. Other keys
    /// that merely share the raw prefix (`docs.txt` for `docs`) are not
    /// reported. A prefix ending at a separator is only settled here when
    /// nothing is below it.
    async fn single_key_page(&self, request: &ListRequest) -> Result<Option<ListPage>> {
        let (parent, partial) = split_prefix(&request.prefix);

        if partial.is_empty() {
            if request.page_token.is_none()
                && !self.has_children(Self::segment(parent)?.as_ref()).await?
            {
                return Ok(Some(ListPage::default()));
            }
            return Ok(None);
        }

        let mut found = Vec::with_capacity(2);
        if let Some(entry) = self.head(&request.prefix).await? {
            found.push(Listed::Object(entry));
        }
        let segment = Self::location(&request.prefix)?;
        if self.has_children(Some(&segment)).await? {
            found.push(Listed::Prefix(format!("{}{DELIMITER}", request.prefix)));
        }
        Ok(Some(paginate(found, request.page_token.as_deref(), Some(1))))
    }

    /// Everything matching `request.prefix`, sorted by key.
    async fn list_all(&self, request: &ListRequest) -> Result<Vec<Listed>> {
        // The segment-aligned part of the prefix: "a/b/c" lists "a/b".
        let (parent, _) = split_prefix(&request.prefix);
        let parent = Self::segment(parent)?;

        let mut listed = match request.delimiter.as_deref() {
            None => self
                .store
                .list(parent.as_ref())
                .map_ok(|meta| Listed::Object(Self::entry(meta)))
                .try_collect::<Vec<_>>()
                .await?,
            Some(DELIMITER) => {
                let result = self.store.list_with_delimiter(parent.as_ref()).await?;
                result
                    .common_prefixes
                    .into_iter()
                    .map(|p| Listed::Prefix(format!("{p}{DELIMITER}")))
                    .chain(
                        result
                            .objects
                            .into_iter()
                            .map(|meta| Listed::Object(Self::entry(meta))),
                    )
                    .collect()
            }
            Some(_) => return Err(object_store::Error::NotImplemented),
        };

        listed.retain(|item| item.key().starts_with(&request.prefix));
        listed.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(listed)
    }
}

#[async_trait]
impl ObjectClient for ObjectStoreClient {
    async fn head(&self, key: &str) -> Result<Option<ObjectEntry>> {
        match self.store.head(&Self::location(key)?).await {
            Ok(meta) => Ok(Some(Self::entry(meta))),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Uncapped requests get every matching key in one page.
    async fn list(&self, request: ListRequest) -> Result<ListPage> {
        if request.max_keys == Some(1) && request.delimiter.as_deref() == Some(DELIMITER) {
            if let Some(page) = self.single_key_page(&request).await? {
                return Ok(page);
            }
        }
        let listed = self.list_all(&request).await?;
        Ok(paginate(listed, request.page_token.as_deref(), request.max_keys))
    }

    async fn get(&self, key: &str, from: Option<u64>) -> Result<ByteStream> {
        let options = GetOptions {
            range: from.map(GetRange::Offset),
            ..Default::default()
        };
        let result = self.store.get_opts(&Self::location(key)?, options).await?;
        Ok(result.into_stream())
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<()> {
        _ = self
            .store
            .put(&Self::location(key)?, PutPayload::from(body))
            .await?;
        Ok(())
    }

    async fn put_multipart(&self, key: &str, mut body: ByteStream, part_size: usize) -> Result<()> {
        let upload = self.store.put_multipart(&Self::location(key)?).await?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, part_size);

        let mut outcome = Ok(());
        while let Some(chunk) = body.next().await {
            let step = match chunk {
                Ok(bytes) => writer.wait_for_capacity(UPLOAD_CONCURRENCY).await.map(|()| {
                    writer.write(&bytes);
                }),
                Err(e) => Err(e),
            };
            if let Err(e) = step {
                outcome = Err(e);
                break;
            }
        }

        match outcome {
            Ok(()) => {
                _ = writer.finish().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort) = writer.abort().await {
                    let reason = abort.to_string();
                    diagnostics::warn!("Failed to abort multipart upload of {key}: {reason}", key: key, reason: reason);
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(&Self::location(key)?).await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.store
            .copy(&Self::location(from)?, &Self::location(to)?)
            .await
    }
}
