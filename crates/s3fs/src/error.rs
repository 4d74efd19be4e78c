use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur in filesystem operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Invalid argument for {path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("File not open for {op}: {path}")]
    NotOpen { path: String, op: &'static str },

    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    /// The copy landed but the source could not be deleted, so the object
    /// now exists under both keys.
    #[error("Rename copied {from} to {to} but failed to delete the source: {source}")]
    PartialRename {
        from: String,
        to: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transfer for {path} ended without a result: {reason}")]
    Transfer { path: String, reason: String },
}

impl Error {
    pub fn not_found<S: AsRef<str>>(path: S) -> Self {
        Error::NotFound(display_path(path.as_ref()))
    }

    pub fn already_exists<S: AsRef<str>>(path: S) -> Self {
        Error::AlreadyExists(display_path(path.as_ref()))
    }

    pub fn is_a_directory<S: AsRef<str>>(path: S) -> Self {
        Error::IsADirectory(display_path(path.as_ref()))
    }

    pub fn not_a_directory<S: AsRef<str>>(path: S) -> Self {
        Error::NotADirectory(display_path(path.as_ref()))
    }

    pub fn directory_not_empty<S: AsRef<str>>(path: S) -> Self {
        Error::DirectoryNotEmpty(display_path(path.as_ref()))
    }

    pub fn invalid<S: AsRef<str>, R: Into<String>>(path: S, reason: R) -> Self {
        Error::Invalid {
            path: display_path(path.as_ref()),
            reason: reason.into(),
        }
    }

    pub fn not_open<S: AsRef<str>>(path: S, op: &'static str) -> Self {
        Error::NotOpen {
            path: display_path(path.as_ref()),
            op,
        }
    }

    pub fn transfer<S: AsRef<str>, R: Into<String>>(path: S, reason: R) -> Self {
        Error::Transfer {
            path: display_path(path.as_ref()),
            reason: reason.into(),
        }
    }

    pub fn partial_rename<F: AsRef<str>, T: AsRef<str>>(from: F, to: T, source: Error) -> Self {
        Error::PartialRename {
            from: display_path(from.as_ref()),
            to: display_path(to.as_ref()),
            source: Box::new(source),
        }
    }

    /// True for the "no such path" outcome, whichever layer reported it.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Store(object_store::Error::NotFound { .. })
        )
    }
}

/// The root is the empty normalized path; show it as "/" in messages.
fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_displayed_as_slash() {
        assert_eq!(Error::is_a_directory("").to_string(), "Is a directory: /");
        assert_eq!(
            Error::not_found("a/b.txt").to_string(),
            "Path not found: a/b.txt"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("x").is_not_found());
        let store = object_store::Error::NotFound {
            path: "x".to_string(),
            source: "missing".into(),
        };
        assert!(Error::from(store).is_not_found());
        assert!(!Error::is_a_directory("x").is_not_found());
    }
}
