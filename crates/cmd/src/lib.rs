pub mod commands;
pub mod common;

pub use commands::*;
pub use common::{StoreArgs, build_object_store};
