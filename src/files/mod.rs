//! Filesystem helpers for the data directory
//!
//! Path resolution and validation live in `path`; non-recursive listing
//! lives in `listing`.

pub mod listing;
pub mod path;

pub use listing::list_files_in_directory;
pub use path::{expand_absolute_path, folder_exists, resolve_data_root, PathError};
