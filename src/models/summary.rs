use serde::{Deserialize, Serialize};

use crate::models::file_entry::Entry;
use crate::models::package::Package;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub packages: Vec<Package>,
    pub entries: Vec<Entry>,
    /// Logical size of the whole directory, dependencies included.
    pub extracted_size: u64,
    /// Disk size of the whole directory, dependencies included.
    pub extracted_disk_size: u64,
    pub publish_size: u64,
    pub publish_disk_size: u64,
}

impl Summary {
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory()).count()
    }

    pub fn dir_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory()).count()
    }
}
