//! Path normalization and key derivation.
//!
//! Caller paths and store keys are plain '/'-separated strings; they are
//! never interpreted with host path rules.

/// Separator between path segments, and the listing delimiter.
pub const DELIMITER: &str = "/";

/// Lexically cleans a caller path.
///
/// Empty and "." segments are dropped, ".." removes the preceding segment
/// (and is dropped at the root), and the result carries no leading or
/// trailing separator. The root normalizes to the empty string.
#[must_use]
pub fn normalize<S: AsRef<str>>(path: S) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.as_ref().split(DELIMITER) {
        match segment {
            "" | "." => {}
            ".." => {
                _ = segments.pop();
            }
            name => segments.push(name),
        }
    }

    segments.join(DELIMITER)
}

/// Joins the configured prefix with path segments and re-normalizes.
///
/// An empty result names the root, which has no object key of its own.
#[must_use]
pub fn with_prefix(prefix: &str, segments: &[&str]) -> String {
    let mut joined = String::from(prefix);
    for segment in segments {
        joined.push_str(DELIMITER);
        joined.push_str(segment);
    }
    normalize(joined)
}

/// The listing prefix for everything below `key`.
#[must_use]
pub fn directory_prefix(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!("{key}{DELIMITER}")
    }
}

/// Final segment of a key or common prefix, ignoring one trailing separator.
#[must_use]
pub fn basename(key: &str) -> &str {
    let trimmed = key.strip_suffix(DELIMITER).unwrap_or(key);
    match trimmed.rfind(DELIMITER) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}
