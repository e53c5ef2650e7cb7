pub mod file_entry;
pub mod package;
pub mod summary;
