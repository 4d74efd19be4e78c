/// Kind of a filesystem entry.
///
/// The store only holds objects; `Directory` is derived from key prefixes
/// every time an entry is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Regular file entry, backed by one object
    File,
    /// Directory entry, inferred from a common prefix or the marker object
    Directory,
}

impl EntryType {
    /// Convert EntryType to string for display
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "directory",
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryType::Directory)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(EntryType::File),
            "directory" => Ok(EntryType::Directory),
            other => Err(format!("Unknown entry type: {}", other)),
        }
    }
}
