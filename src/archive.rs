//! Member-addressable archives and scoped temporary archive files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GrabError;

/// An archive whose members can be opened by name.
pub trait MemberArchive: Sized {
    fn open(path: &Path) -> Result<Self, GrabError>;

    /// Copy one member to `dest`, returning the number of bytes written.
    fn extract_member(&mut self, name: &str, dest: &Path) -> Result<u64, GrabError>;
}

/// Zip archive on disk.
pub struct ZipMembers {
    path: PathBuf,
    archive: zip::ZipArchive<File>,
}

impl MemberArchive for ZipMembers {
    fn open(path: &Path) -> Result<Self, GrabError> {
        let file = File::open(path).map_err(|source| GrabError::ReadPath {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = zip::ZipArchive::new(file).map_err(|source| GrabError::Archive {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    fn extract_member(&mut self, name: &str, dest: &Path) -> Result<u64, GrabError> {
        let mut member = self
            .archive
            .by_name(name)
            .map_err(|source| GrabError::Archive {
                path: self.path.clone(),
                message: format!("member '{name}': {source}"),
            })?;

        let mut writer = BufWriter::new(File::create(dest)?);
        let copied = io::copy(&mut member, &mut writer).and_then(|bytes| {
            writer.flush()?;
            Ok(bytes)
        });
        drop(writer);
        copied.map_err(|source| {
            // A half-written member must not look like a cached artifact.
            let _ = fs::remove_file(dest);
            GrabError::Archive {
                path: self.path.clone(),
                message: format!("member '{name}': {source}"),
            }
        })
    }
}

/// A temporary archive path, removed when dropped.
///
/// Removal is best-effort: failures are logged and swallowed.
#[derive(Debug)]
pub struct TempArchive {
    path: PathBuf,
}

impl TempArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary archive"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "could not remove temporary archive")
            }
        }
    }
}
