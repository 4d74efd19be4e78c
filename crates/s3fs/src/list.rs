use std::collections::BTreeMap;

use crate::Fs;
use crate::client::ListRequest;
use crate::error::{Error, Result};
use crate::metadata::FileInfo;
use crate::path::{DELIMITER, directory_prefix, normalize};

/// Name of the entry describing the listed directory itself.
pub const SELF_ENTRY: &str = ".";

impl Fs {
    /// Lists the immediate children of a directory.
    ///
    /// The result starts with a "." entry for the directory itself, followed
    /// by the children sorted by name. A name that is both an object and a
    /// common prefix is reported once, as a directory. The directory marker
    /// is never listed. A missing directory yields an empty list.
    pub async fn list(&self, path: &str) -> Result<Vec<FileInfo>> {
        let normalized = normalize(path);
        match self.resolve(&normalized).await? {
            None => return Ok(Vec::new()),
            Some(info) if !info.is_dir() => return Err(Error::not_a_directory(&normalized)),
            Some(_) => {}
        }

        let prefix = directory_prefix(&self.key(&normalized));
        let marker = self.config.directory_marker();
        let mut children: BTreeMap<String, FileInfo> = BTreeMap::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let request = ListRequest::new(prefix.as_str())
                .with_delimiter(DELIMITER)
                .with_page_token(token.take());
            let page = self.bounded(self.client.list(request)).await?;
            pages += 1;

            for common in &page.common_prefixes {
                if let Some(name) = child_name(&prefix, common)
                    .and_then(|rel| rel.strip_suffix(DELIMITER))
                    .filter(|name| is_child(name))
                {
                    _ = children.insert(name.to_string(), FileInfo::directory(name));
                }
            }

            for entry in &page.entries {
                let Some(rel) = child_name(&prefix, &entry.key) else {
                    continue;
                };
                // A "name/" placeholder object stands for a directory.
                if let Some(name) = rel.strip_suffix(DELIMITER) {
                    if is_child(name) {
                        _ = children.insert(name.to_string(), FileInfo::directory(name));
                    }
                    continue;
                }
                if rel == marker || !is_child(rel) {
                    continue;
                }
                _ = children
                    .entry(rel.to_string())
                    .or_insert_with(|| FileInfo::file(rel, entry.size, entry.modified));
            }

            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let count = children.len();
        diagnostics::debug!("Listed {count} entries of {prefix} in {pages} pages", count: count, prefix: prefix, pages: pages);

        let mut entries = Vec::with_capacity(count + 1);
        entries.push(FileInfo::directory(SELF_ENTRY));
        entries.extend(children.into_values());
        Ok(entries)
    }
}

fn child_name<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}

/// A single, non-empty path segment other than "." and "..".
fn is_child(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(DELIMITER)
}
