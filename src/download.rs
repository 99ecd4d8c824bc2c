//! Single-file download capability and classification of its failures.
//!
//! The acquirer only ever talks to the [`Downloader`] trait. Failures come back
//! as a [`DownloadError`] carrying the HTTP status (when one was received) and
//! the server's message, and [`classify_failure`] turns that into the
//! [`FailureKind`] the acquirer branches on.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// User agent sent with every request. Some providers refuse library defaults.
pub const DEFAULT_USER_AGENT: &str = "Wget/1.16 (linux-gnu)";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MESSAGE_EXCERPT_CHARS: usize = 512;

/// A failed download, as reported by a [`Downloader`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Download of {url} failed: {message}")]
pub struct DownloadError {
    pub url: String,
    /// HTTP status of the response, when the server answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl DownloadError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        classify_failure(self)
    }
}

/// How the acquirer should react to a failed download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Access was denied; the bundled archive may still be reachable.
    Forbidden,
    /// The provider forbids re-sharing this artifact. Permanent.
    NonRedistributable,
    Other,
}

/// Classify a download failure.
///
/// Redistribution policy wins over a bare 403, because providers report the
/// policy block with a 403 status too.
pub fn classify_failure(err: &DownloadError) -> FailureKind {
    if is_non_redistributable(&err.message) {
        FailureKind::NonRedistributable
    } else if err.status == Some(403) || is_forbidden(&err.message) {
        FailureKind::Forbidden
    } else {
        FailureKind::Other
    }
}

fn is_non_redistributable(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("non-redistributable") || lowered.contains("not allowed to re-share")
}

fn is_forbidden(message: &str) -> bool {
    message.contains("403") || message.contains("Forbidden")
}

/// Fetches one URL into one local file.
pub trait Downloader {
    /// Download `url` to `filepath`.
    ///
    /// When `filepath` already exists and `overwrite` is false the existing file
    /// is returned untouched. `Ok(None)` means the download produced nothing.
    fn download(
        &self,
        url: &str,
        filepath: &Path,
        overwrite: bool,
    ) -> Result<Option<PathBuf>, DownloadError>;
}

impl<D: Downloader + ?Sized> Downloader for &D {
    fn download(
        &self,
        url: &str,
        filepath: &Path,
        overwrite: bool,
    ) -> Result<Option<PathBuf>, DownloadError> {
        (**self).download(url, filepath, overwrite)
    }
}

/// Blocking HTTP(S) downloader.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }

    fn fetch_to(&self, url: &str, filepath: &Path) -> Result<(), DownloadError> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", DEFAULT_USER_AGENT)
            .call()
            .map_err(|source| DownloadError::new(url, source.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            let mut message = format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            );
            let excerpt: String = body.trim().chars().take(MESSAGE_EXCERPT_CHARS).collect();
            if !excerpt.is_empty() {
                message.push_str(": ");
                message.push_str(&excerpt);
            }
            return Err(DownloadError::with_status(url, status.as_u16(), message));
        }

        match write_via_partial(&mut response.body_mut().as_reader(), filepath) {
            Ok(bytes) => {
                debug!(url, path = %filepath.display(), bytes, "download complete");
                Ok(())
            }
            Err(source) => Err(DownloadError::new(
                url,
                format!("could not write {}: {}", filepath.display(), source),
            )),
        }
    }
}

impl Downloader for HttpDownloader {
    fn download(
        &self,
        url: &str,
        filepath: &Path,
        overwrite: bool,
    ) -> Result<Option<PathBuf>, DownloadError> {
        if filepath.exists() && !overwrite {
            return Ok(Some(filepath.to_path_buf()));
        }
        if let Some(parent) = filepath.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                DownloadError::new(
                    url,
                    format!("could not create {}: {}", parent.display(), source),
                )
            })?;
        }

        self.fetch_to(url, filepath)?;
        Ok(filepath.exists().then(|| filepath.to_path_buf()))
    }
}

/// Write `reader` to a `.part` sibling of `filepath`, then rename it into place.
///
/// On failure the partial file is removed, so `filepath` is either complete or
/// untouched.
pub(crate) fn write_via_partial(reader: &mut impl io::Read, filepath: &Path) -> io::Result<u64> {
    let partial = partial_path(filepath);
    let written = write_body(reader, &partial)
        .and_then(|bytes| fs::rename(&partial, filepath).map(|_| bytes));
    if written.is_err() {
        let _ = fs::remove_file(&partial);
    }
    written
}

pub(crate) fn partial_path(filepath: &Path) -> PathBuf {
    let mut name = filepath.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn write_body(reader: &mut impl io::Read, path: &Path) -> io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let bytes = io::copy(reader, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}
