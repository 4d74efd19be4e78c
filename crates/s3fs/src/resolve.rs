//! Deciding whether a path names a file, a directory, or nothing.
//!
//! The store has no directories, so one capped listing with the path's key
//! as a raw prefix and "/" as delimiter answers the question: a common
//! prefix `key/` means directory, an object `key` means file. Because the
//! prefix is raw, a sibling such as `docs.txt` or the object `docs` itself
//! can fill the single slot ahead of `docs/`; a truncated page is followed by
//! one more capped listing of `key/` itself, and a directory found there
//! wins over a file of the same name.

use crate::Fs;
use crate::client::ListRequest;
use crate::error::Result;
use crate::metadata::FileInfo;
use crate::path::{DELIMITER, basename, directory_prefix};

/// The root is never looked up; its name in results.
const ROOT_NAME: &str = "/";

impl Fs {
    /// Classifies a normalized path. `None` means nothing exists there.
    pub(crate) async fn resolve(&self, normalized: &str) -> Result<Option<FileInfo>> {
        if normalized.is_empty() {
            return Ok(Some(FileInfo::directory(ROOT_NAME)));
        }

        let key = self.key(normalized);
        let dir_prefix = directory_prefix(&key);
        let name = basename(normalized);

        diagnostics::debug!("Resolving {key}", key: key);
        let page = self
            .bounded(self.client.list(single_key_listing(&key)))
            .await?;

        if page.common_prefixes.iter().any(|p| *p == dir_prefix) {
            return Ok(Some(FileInfo::directory(name)));
        }
        let file = page
            .entries
            .iter()
            .find(|e| e.key == key)
            .map(|entry| FileInfo::file(name, entry.size, entry.modified));
        if page.next_page_token.is_none() {
            return Ok(file);
        }

        // `key/` may sit beyond the single slot, and it outranks `key`.
        let below = self
            .bounded(self.client.list(single_key_listing(&dir_prefix)))
            .await?;
        if below.common_prefixes.is_empty() && below.entries.is_empty() {
            Ok(file)
        } else {
            Ok(Some(FileInfo::directory(name)))
        }
    }
}

fn single_key_listing(prefix: &str) -> ListRequest {
    ListRequest::new(prefix)
        .with_delimiter(DELIMITER)
        .with_max_keys(1)
}
