//! Simple diagnostics library for s3fs
//!
//! Provides lightweight, configurable logging across all crates in the workspace.
//!
//! Usage:
//! - Set S3FS_LOG=off (default) - no logs
//! - Set S3FS_LOG=info - basic operation logs
//! - Set S3FS_LOG=debug - detailed logs, including every store request

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the minimum log level.
pub const LOG_ENV: &str = "S3FS_LOG";

static INIT: Once = Once::new();

/// Map an `S3FS_LOG` value to a minimum level; `None` disables logging.
fn parse_level(value: &str) -> Option<Option<emit::Level>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Some(None),
        "debug" => Some(Some(emit::Level::Debug)),
        "info" => Some(Some(emit::Level::Info)),
        "warn" => Some(Some(emit::Level::Warn)),
        "error" => Some(Some(emit::Level::Error)),
        _ => None,
    }
}

/// Initialize diagnostics based on the S3FS_LOG environment variable
///
/// This should be called once at application startup. It's safe to call
/// multiple times - subsequent calls will be ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let level = match parse_level(&log_level) {
            Some(None) => return,
            Some(Some(level)) => level,
            None => {
                // Bootstrap warning - the runtime isn't up yet
                eprintln!("Warning: Unknown {LOG_ENV} value '{log_level}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Log basic operations (opens, commits, directory changes)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (store requests, page counts, offsets)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log warning conditions (ignored options, partial failures)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log critical error conditions
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("off"), Some(None));
        assert_eq!(parse_level(""), Some(None));
        assert_eq!(parse_level("DEBUG"), Some(Some(emit::Level::Debug)));
        assert_eq!(parse_level(" warn "), Some(Some(emit::Level::Warn)));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_macros_compile() {
        info!("Test message");
        debug!("Debug message with {value}", value: 42);
        warn!("Warning message");
        error!("Error message");
    }

    #[test]
    fn test_macros_take_local_properties() {
        let path = String::from("dir/file.txt");
        let key = "tenant/dir/file.txt";
        let size: u64 = 5;
        info!("Committed {path} ({size} bytes)", path: path, size: size);
        debug!("Resolving {key}", key: key);
        warn!("Renamed {key} but kept {path}", key: key, path: path);
    }
}
