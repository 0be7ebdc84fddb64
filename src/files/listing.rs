//! Non-recursive directory listing

use std::io;
use std::path::Path;

use tokio::fs;

use crate::error::RequestError;

/// List the names of the files directly inside `dir`.
///
/// Subdirectories are skipped, everything else (dotfiles included) is
/// returned. Names are sorted so repeated listings are stable.
pub async fn list_files_in_directory(dir: &Path) -> Result<Vec<String>, RequestError> {
    let read_error = |source: io::Error| RequestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(dir).await.map_err(read_error)?;
    if !metadata.is_dir() {
        return Err(read_error(io::Error::new(
            io::ErrorKind::NotFound,
            "path is not a directory",
        )));
    }

    let mut entries = fs::read_dir(dir).await.map_err(read_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let file_type = entry.file_type().await.map_err(read_error)?;
        if !file_type.is_dir() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    files.sort();
    Ok(files)
}
