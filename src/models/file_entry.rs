use serde::{Deserialize, Serialize};

/// One published file, as seen by `lstat` at collection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub disk_size: u64,
    pub exists: bool,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, size: u64, disk_size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            disk_size,
            exists: true,
        }
    }

    /// A file that was resolved but had vanished by the time it was stat'd.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            disk_size: 0,
            exists: false,
        }
    }
}

/// A directory synthesized from the published file paths. `children` holds
/// the names of the direct children, in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub size: u64,
    pub disk_size: u64,
    pub exists: bool,
    pub is_directory: bool,
    pub children: Vec<String>,
}

impl DirEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            disk_size: 0,
            exists: true,
            is_directory: true,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Dir(DirEntry),
    File(FileEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Self::Dir(dir) => &dir.name,
            Self::File(file) => &file.name,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Dir(dir) => dir.size,
            Self::File(file) => file.size,
        }
    }

    pub fn disk_size(&self) -> u64 {
        match self {
            Self::Dir(dir) => dir.disk_size,
            Self::File(file) => file.disk_size,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Dir(_))
    }

    /// Name as shown to users: directories carry a trailing `/`.
    pub fn display_name(&self) -> String {
        match self {
            Self::Dir(dir) => format!("{}/", dir.name),
            Self::File(file) => file.name.clone(),
        }
    }
}
