//! Persistence of context snapshots
//!
//! [`Context::dump`](crate::Context::dump) hands a [`ContextSnapshot`](crate::ContextSnapshot)
//! to a [`StorageBackend`]. Only JSON is provided; another format plugs in by
//! implementing the two text conversions.

use crate::error::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::Path;

/// Text format used to persist snapshots
pub trait StorageBackend: Clone + Send + Sync {
    /// File extension for this format, without the dot
    fn extension(&self) -> &str;

    /// Serialize data to string
    fn serialize<T: Serialize>(&self, data: &T) -> Result<String>;

    /// Deserialize data from string
    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T>;

    /// Read and parse a file
    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.deserialize(&content)
    }

    /// Serialize `data` and replace the file at `path`
    ///
    /// The content goes to `<name>.tmp` first and is renamed over the target,
    /// so readers never observe a partial file.
    fn write<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let content = self.serialize(data)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file_name = path.file_name().ok_or_else(|| {
            Error::Config(format!("'{}' does not name a file", path.display()))
        })?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        fs::write(&temp_path, content).map_err(|source| Error::FileWrite {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, path).map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// =============================================================================
// JSON
// =============================================================================

/// JSON backend, pretty-printed unless built with [`JsonStorage::compact`]
#[derive(Debug, Clone)]
pub struct JsonStorage {
    pretty: bool,
}

impl Default for JsonStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStorage {
    /// Create a JSON backend with pretty printing enabled
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a compact JSON backend (single line output)
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl StorageBackend for JsonStorage {
    fn extension(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(text)
    }

    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        Ok(serde_json::from_str(content)?)
    }
}
