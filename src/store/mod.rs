//! Record store over a directory of JSON files
//!
//! Each `<name>.json` file in the data root is a collection document.
//! Nothing is cached: every call reads the file again.

mod record;

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde_json::Value;
use tokio::fs;

use crate::error::RequestError;

pub use record::{record_id_string, RecordLookup};

const JSON_EXTENSION: &str = ".json";

/// Append `.json` unless the name already ends with it.
pub fn normalize_file_name(name: &str) -> Cow<'_, str> {
    if name.ends_with(JSON_EXTENSION) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}{JSON_EXTENSION}"))
    }
}

/// Read-only accessor for the JSON files under the data root
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the file backing `name`.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(normalize_file_name(name).as_ref())
    }

    /// Read the raw bytes of the file backing `name`.
    pub async fn load_raw(&self, name: &str) -> Result<Vec<u8>, RequestError> {
        let file_name = normalize_file_name(name);
        let path = self.file_path(name);

        fs::read(&path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                RequestError::FileNotFound {
                    name: file_name.to_string(),
                }
            } else {
                RequestError::FileRead {
                    name: file_name.to_string(),
                    source,
                }
            }
        })
    }

    /// Return the file's bytes untouched once they are known to be valid JSON.
    pub async fn get_all_records(&self, name: &str) -> Result<Vec<u8>, RequestError> {
        let content = self.load_raw(name).await?;
        serde_json::from_slice::<IgnoredAny>(&content).map_err(|source| {
            RequestError::InvalidJson {
                name: normalize_file_name(name).to_string(),
                source,
            }
        })?;
        Ok(content)
    }

    /// Look up one record by id in the file's first non-empty collection.
    pub async fn get_record_by_id(
        &self,
        name: &str,
        id: &str,
    ) -> Result<RecordLookup, RequestError> {
        let content = self.load_raw(name).await?;
        let document: Value =
            serde_json::from_slice(&content).map_err(|source| RequestError::InvalidJson {
                name: normalize_file_name(name).to_string(),
                source,
            })?;

        record::lookup(document, id).map_err(|reason| RequestError::InvalidShape {
            name: normalize_file_name(name).to_string(),
            reason,
        })
    }
}
