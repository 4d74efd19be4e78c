mod faulty;
mod transfer_tests;

use std::sync::Arc;

use bytes::Bytes;
use object_store::memory::InMemory;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::{Config, Fs, ObjectClient, ObjectStoreClient};
pub(crate) use counting::{CountingStore, Counts};
pub(crate) use faulty::{FaultyClient, Faults};

pub(crate) fn new_fs() -> Fs {
    new_fs_with(Config::default())
}

pub(crate) fn new_fs_with(config: Config) -> Fs {
    Fs::from_object_store(Arc::new(InMemory::new()), config)
}

/// A filesystem whose store requests can be made to fail or stall.
pub(crate) fn faulty_fs(config: Config) -> (Fs, Arc<Faults>) {
    let inner = ObjectStoreClient::new(Arc::new(InMemory::new()));
    let faults = Arc::new(Faults::default());
    let client = FaultyClient::new(inner, faults.clone());
    (Fs::new(Arc::new(client), config), faults)
}

/// A filesystem whose underlying store counts requests and keys read.
pub(crate) fn counting_fs() -> (Fs, Arc<Counts>) {
    let counts = Arc::new(Counts::default());
    let store = CountingStore::new(Arc::new(InMemory::new()), counts.clone());
    (Fs::from_object_store(Arc::new(store), Config::default()), counts)
}

/// Writes an object directly, bypassing the filesystem layer.
pub(crate) async fn put_key(fs: &Fs, key: &str, data: &[u8]) {
    fs.client
        .put(key, Bytes::copy_from_slice(data))
        .await
        .unwrap();
}

pub(crate) async fn key_exists(fs: &Fs, key: &str) -> bool {
    fs.client.head(key).await.unwrap().is_some()
}

/// Deterministic pseudo-random payload.
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(len as u64);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

pub(crate) fn names(entries: &[crate::FileInfo]) -> Vec<&str> {
    entries.iter().map(|e| e.name()).collect()
}
