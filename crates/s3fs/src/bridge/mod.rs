//! Adapters between caller-driven file I/O and streaming object transfers.
//!
//! Each open file runs its transfer as a background task connected to the
//! caller through a bounded [`crate::pipe`]. The task owns the store stream;
//! the caller only ever touches the pipe.

mod read;
mod write;

pub(crate) use read::ReadBridge;
pub(crate) use write::WriteBridge;

use std::io;
use std::path::PathBuf;

use crate::Config;
use crate::pipe::{PipeReader, PipeWriter, pipe_in};

/// Where and how much a transfer may spool locally.
#[derive(Debug, Clone)]
pub(crate) struct Spool {
    dir: Option<PathBuf>,
    capacity: usize,
}

impl Spool {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            dir: config.scratch_dir().map(PathBuf::from),
            capacity: config.spool_capacity(),
        }
    }

    fn pipe(&self) -> io::Result<(PipeWriter, PipeReader)> {
        pipe_in(self.dir.as_deref(), self.capacity)
    }
}
