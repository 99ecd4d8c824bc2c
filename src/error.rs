use std::path::PathBuf;
use thiserror::Error;

/// The main error type for datagrab operations.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `scheme://` key whose scheme has no registered handler.
    #[error("Unrecognized scheme: {scheme}")]
    UnrecognizedScheme { scheme: String },

    #[error("Invalid key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    #[error("Invalid object reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    #[error("No object registered under '{reference}'")]
    ObjectNotFound { reference: String },

    #[error("Dataset hub error for '{reference}': {message}")]
    DatasetArchive { reference: String, message: String },

    #[error("HTTP fetch of {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Archive error in {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("Invalid chart slug '{slug}': {message}")]
    InvalidSlug { slug: String, message: String },

    #[error("Unknown artifact kind: '{0}' (should be 'json', 'csv', 'zip', or 'html')")]
    UnknownArtifactKind(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
