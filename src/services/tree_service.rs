//! Rebuilds the directory tree implied by a flat list of published files.
//!
//! Every ancestor directory of every file gets a synthesized [`DirEntry`],
//! the package root included (named `.`). A directory's sizes are the sums
//! over everything below it.
//!
//! Nodes live in path-keyed maps and parents refer to children by name.
//! Parentage is exact dirname equality, so `lib` never claims `lib2/x.js`,
//! and every node has exactly one parent.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::file_entry::{DirEntry, Entry, FileEntry};
use crate::rel_path::{self, ROOT};

#[derive(Debug, Clone)]
pub struct DirTree {
    dirs: BTreeMap<String, DirEntry>,
    files: BTreeMap<String, FileEntry>,
}

impl DirTree {
    pub fn root(&self) -> &DirEntry {
        &self.dirs[ROOT]
    }

    pub fn dir(&self, name: &str) -> Option<&DirEntry> {
        self.dirs.get(name)
    }

    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.files.get(name)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &DirEntry> {
        self.dirs.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    /// All entries, root first, then by name.
    pub fn into_entries(self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .dirs
            .into_values()
            .map(Entry::Dir)
            .chain(self.files.into_values().map(Entry::File))
            .collect();
        entries.sort_by(|a, b| {
            (a.name() != ROOT)
                .cmp(&(b.name() != ROOT))
                .then_with(|| a.name().cmp(b.name()))
        });
        entries
    }
}

/// Builds the tree in two passes: collect every ancestor directory, then
/// wire each node to its dirname. Sizes are filled deepest directory first,
/// so each directory is summed once and only after all of its children.
pub fn build_tree(files: Vec<FileEntry>) -> DirTree {
    let mut file_map: BTreeMap<String, FileEntry> = BTreeMap::new();
    for mut file in files {
        file.name = rel_path::normalize(&file.name);
        if file.name == ROOT {
            continue;
        }
        file_map.entry(file.name.clone()).or_insert(file);
    }

    let mut dirs: BTreeMap<String, DirEntry> = BTreeMap::new();
    dirs.insert(ROOT.to_string(), DirEntry::new(ROOT));
    for name in file_map.keys() {
        for ancestor in rel_path::ancestors(name) {
            dirs.entry(ancestor.to_string())
                .or_insert_with(|| DirEntry::new(ancestor));
        }
    }

    // A resolver may list a directory as a path of its own; the synthesized
    // entry replaces it.
    file_map.retain(|name, _| !dirs.contains_key(name));

    let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for name in file_map.keys().chain(dirs.keys()) {
        if let Some(parent) = rel_path::dirname(name) {
            children
                .entry(parent.to_string())
                .or_default()
                .insert(name.clone());
        }
    }

    let mut order: Vec<String> = dirs.keys().cloned().collect();
    order.sort_by_key(|name| std::cmp::Reverse(rel_path::depth(name)));

    for name in order {
        let kids = children.remove(&name).unwrap_or_default();
        let mut size = 0u64;
        let mut disk_size = 0u64;
        for child in &kids {
            if let Some(dir) = dirs.get(child) {
                size += dir.size;
                disk_size += dir.disk_size;
            } else if let Some(file) = file_map.get(child) {
                size += file.size;
                disk_size += file.disk_size;
            }
        }
        if let Some(dir) = dirs.get_mut(&name) {
            dir.size = size;
            dir.disk_size = disk_size;
            dir.children = kids.into_iter().collect();
        }
    }

    DirTree {
        dirs,
        files: file_map,
    }
}

/// The published file entries plus a synthesized entry for every directory.
pub fn aggregate(files: Vec<FileEntry>) -> Vec<Entry> {
    build_tree(files).into_entries()
}
