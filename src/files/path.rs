//! Data directory path resolution
//!
//! Resolution (`~` expansion + absolute conversion) and validation
//! (the directory must exist) are separate steps.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StartupError;

#[derive(thiserror::Error, Debug)]
pub enum PathError {
    #[error("Unable to determine the home directory of the current user")]
    NoHomeDir,

    #[error("Unable to convert '{path}' to an absolute path: {source}")]
    Absolute { path: String, source: io::Error },
}

/// Expand a leading `~` to the current user's home directory and make the
/// result absolute. Existence is not checked.
pub fn expand_absolute_path(path: &str) -> Result<PathBuf, PathError> {
    expand_with_home(path, dirs::home_dir)
}

fn expand_with_home(
    path: &str,
    home_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    let expanded = match path.strip_prefix('~') {
        Some(rest) => {
            let home = home_dir().ok_or(PathError::NoHomeDir)?;
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        None => PathBuf::from(path),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|source| PathError::Absolute {
            path: path.to_string(),
            source,
        })?;
        cwd.join(expanded)
    };

    Ok(clean(&absolute))
}

/// Lexically normalize an absolute path: drop `.` and fold `..`.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root is a no-op
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `path` exists and is a directory.
pub fn folder_exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_dir())
}

/// Resolve the raw CLI argument into the data root and validate it.
pub fn resolve_data_root(raw: &str) -> Result<PathBuf, StartupError> {
    let path = expand_absolute_path(raw)?;
    if !folder_exists(&path) {
        return Err(StartupError::InvalidDataRoot { path });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/tester"))
    }

    #[test]
    fn test_absolute_path_unchanged() {
        let path = expand_with_home("/var/data", fake_home).unwrap();
        assert_eq!(path, PathBuf::from("/var/data"));
    }

    #[test]
    fn test_relative_path_joined_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let path = expand_with_home("some/data", fake_home).unwrap();
        assert_eq!(path, cwd.join("some/data"));
        assert!(path.is_absolute());
    }

    #[test]
    fn test_tilde_expansion() {
        assert_eq!(
            expand_with_home("~", fake_home).unwrap(),
            PathBuf::from("/home/tester")
        );
        assert_eq!(
            expand_with_home("~/tempData", fake_home).unwrap(),
            PathBuf::from("/home/tester/tempData")
        );
        assert_eq!(
            expand_with_home("~/a/b/c", fake_home).unwrap(),
            PathBuf::from("/home/tester/a/b/c")
        );
    }

    #[test]
    fn test_tilde_without_home_fails() {
        let err = expand_with_home("~/data", || None).unwrap_err();
        assert!(matches!(err, PathError::NoHomeDir));
    }

    #[test]
    fn test_dot_segments_are_cleaned() {
        let path = expand_with_home("/var/./data/../records", fake_home).unwrap();
        assert_eq!(path, PathBuf::from("/var/records"));
    }

    #[test]
    fn test_expansion_does_not_check_existence() {
        let path = expand_with_home("~/definitely/not/here", fake_home).unwrap();
        assert_eq!(path, PathBuf::from("/home/tester/definitely/not/here"));
    }

    #[test]
    fn test_folder_exists() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let file = dir.path().join("file with spaces.json");
        std::fs::write(&file, "").unwrap();

        assert!(folder_exists(dir.path()));
        assert!(folder_exists(&nested));
        assert!(!folder_exists(&file));
        assert!(!folder_exists(&dir.path().join("missing")));
    }

    #[test]
    fn test_resolve_data_root() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_data_root(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved, dir.path());

        let file = dir.path().join("data.json");
        std::fs::write(&file, "{}").unwrap();
        let err = resolve_data_root(file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, StartupError::InvalidDataRoot { .. }));

        let err = resolve_data_root(dir.path().join("absent").to_str().unwrap()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("The path does not exist or is not a directory"));
    }
}
