//! Local files and directories.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::{strip_scheme, Content, FILE_SCHEME};
use crate::error::GrabError;

/// Handler for `file://` keys: a directory becomes a [`FileTree`], anything
/// else is read whole.
pub fn read_local(key: &str) -> Result<Content, GrabError> {
    let path = Path::new(strip_scheme(key, FILE_SCHEME));
    if path.is_dir() {
        return Ok(Content::Files(FileTree::new(path)));
    }

    fs::read(path)
        .map(Content::Bytes)
        .map_err(|source| GrabError::ReadPath {
            path: path.to_path_buf(),
            source,
        })
}

/// A directory exposed as a mapping from relative path to bytes.
///
/// Nothing is read until asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTree {
    root: PathBuf,
}

impl FileTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative paths of all files below the root, `/`-separated and sorted.
    pub fn keys(&self) -> Result<Vec<String>, GrabError> {
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).follow_links(true) {
            let entry = entry.map_err(|source| GrabError::ReadPath {
                path: self.root.clone(),
                source: source.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
        keys.sort();
        Ok(keys)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Read the file stored under `key`.
    pub fn get(&self, key: &str) -> Result<Vec<u8>, GrabError> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|source| GrabError::ReadPath { path, source })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, GrabError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(GrabError::InvalidKey {
                key: key.to_string(),
                message: format!("not a relative path inside {}", self.root.display()),
            });
        }
        Ok(self.root.join(relative))
    }
}
