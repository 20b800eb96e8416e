//! Contains various `std::fs` wrapper functions that also contain the target path in their errors.

use crate::errors::FsPathError;
use serde::de::DeserializeOwned;
use std::{
    fs,
    path::{Path, PathBuf},
};

type Result<T> = std::result::Result<T, FsPathError>;

/// Wrapper for [`fs::read_to_string`].
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|err| FsPathError::read(err, path))
}

/// Reads the JSON file and deserialize it into the provided type.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let s = read_to_string(path)?;
    serde_json::from_str(&s).map_err(|source| FsPathError::read_json(source, path))
}

/// Returns the paths of all `.json` files directly inside `dir`, sorted by name.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| FsPathError::read_dir(err, dir))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| FsPathError::read_dir(err, dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
