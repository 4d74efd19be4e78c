pub mod cat;
pub mod copy;
pub mod list;
pub mod mkdir;
pub mod remove;

pub use cat::{cat_command, copy_out, get_command};
pub use copy::put_command;
pub use list::{list_command, stat_command};
pub use mkdir::{mkdir_command, rmdir_command};
pub use remove::{mv_command, rm_command};
