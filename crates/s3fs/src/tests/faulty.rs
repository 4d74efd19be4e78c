//! An `ObjectClient` wrapper that injects failures and delays.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::Result;
use tokio::sync::Notify;

use crate::client::{ByteStream, ListPage, ListRequest, ObjectClient, ObjectEntry};
use crate::object_store_client::ObjectStoreClient;

#[derive(Debug, Default)]
pub(crate) struct Faults {
    /// Deletes fail
    pub fail_delete: AtomicBool,
    /// Bodies fail after their first chunk
    pub fail_get: AtomicBool,
    /// Multipart uploads fail without reading the body
    pub fail_upload: AtomicBool,
    /// Multipart uploads wait for `release` before reading the body
    pub hold_upload: AtomicBool,
    pub release: Notify,
    /// Delay added to every listing
    pub list_delay_ms: AtomicU64,
    /// Page cap applied to listings that set none
    pub page_size: AtomicUsize,

    pub lists: AtomicUsize,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

fn injected(what: &str) -> object_store::Error {
    object_store::Error::Generic {
        store: "faulty",
        source: format!("injected {what} failure").into(),
    }
}

#[derive(Debug)]
pub(crate) struct FaultyClient {
    inner: ObjectStoreClient,
    faults: Arc<Faults>,
}

impl FaultyClient {
    pub(crate) fn new(inner: ObjectStoreClient, faults: Arc<Faults>) -> Self {
        Self { inner, faults }
    }
}

#[async_trait]
impl ObjectClient for FaultyClient {
    async fn head(&self, key: &str) -> Result<Option<ObjectEntry>> {
        self.inner.head(key).await
    }

    async fn list(&self, mut request: ListRequest) -> Result<ListPage> {
        _ = self.faults.lists.fetch_add(1, Ordering::SeqCst);
        let page_size = self.faults.page_size.load(Ordering::SeqCst);
        if page_size > 0 && request.max_keys.is_none() {
            request.max_keys = Some(page_size);
        }
        let delay = self.faults.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.list(request).await
    }

    async fn get(&self, key: &str, from: Option<u64>) -> Result<ByteStream> {
        _ = self.faults.gets.fetch_add(1, Ordering::SeqCst);
        let body = self.inner.get(key, from).await?;
        if self.faults.fail_get.load(Ordering::SeqCst) {
            let failure = futures::stream::once(async { Err(injected("get")) });
            return Ok(body.take(1).chain(failure).boxed());
        }
        Ok(body)
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<()> {
        _ = self.faults.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, body).await
    }

    async fn put_multipart(&self, key: &str, body: ByteStream, part_size: usize) -> Result<()> {
        if self.faults.fail_upload.load(Ordering::SeqCst) {
            return Err(injected("upload"));
        }
        if self.faults.hold_upload.load(Ordering::SeqCst) {
            self.faults.release.notified().await;
        }
        self.inner.put_multipart(key, body, part_size).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.faults.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(key).await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.inner.copy(from, to).await
    }
}
