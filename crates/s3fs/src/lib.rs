//! A hierarchical filesystem over a flat object store.
//!
//! Paths map onto object keys under an optional prefix. Directories are
//! derived from key prefixes (plus an empty marker object for empty ones),
//! and file contents stream through bounded, disk-backed pipes so memory
//! use does not depend on object size.

mod bridge;
pub mod client;
mod config;
mod dir;
mod entry_type;
mod error;
mod file;
mod fs;
mod list;
mod metadata;
mod object_store_client;
pub mod path;
pub mod pipe;
mod resolve;

pub use client::{ByteStream, ListPage, ListRequest, ObjectClient, ObjectEntry};
pub use config::{Config, DEFAULT_DIRECTORY_MARKER, MIN_PART_SIZE};
pub use dir::Directory;
pub use entry_type::EntryType;
pub use error::{Error, Result};
pub use file::File;
pub use fs::{Fs, Node};
pub use list::SELF_ENTRY;
pub use metadata::FileInfo;
pub use object_store_client::ObjectStoreClient;
pub use path::normalize;

#[cfg(test)]
mod tests;
