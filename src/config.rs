//! On-disk layout of the application data directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GrabError;

/// Environment variable overriding the application data directory.
pub const APP_DATA_DIR_ENV: &str = "DATAGRAB_APP_DATA_DIR";

const APP_NAME: &str = "datagrab";

/// Resolved locations for everything datagrab writes to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub app_data_dir: PathBuf,
}

impl Settings {
    /// Resolve settings from an explicit directory, then the environment,
    /// then the platform data directory.
    pub fn resolve(app_data_dir: Option<PathBuf>) -> Self {
        let app_data_dir = app_data_dir
            .or_else(|| std::env::var_os(APP_DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(default_app_data_dir);
        Self { app_data_dir }
    }

    pub fn with_app_data_dir(app_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_data_dir: app_data_dir.into(),
        }
    }

    /// Root of all downloaded artifacts.
    pub fn downloads_dir(&self) -> Result<PathBuf, GrabError> {
        ensure_dir(self.app_data_dir.join("downloads"))
    }

    /// Cache directory for Our World in Data artifacts.
    pub fn owid_dir(&self) -> Result<PathBuf, GrabError> {
        ensure_dir(self.downloads_dir()?.join("owid"))
    }

    /// Cache directory for plain web fetches.
    pub fn http_cache_dir(&self) -> Result<PathBuf, GrabError> {
        ensure_dir(self.app_data_dir.join("http"))
    }
}

fn default_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|mut path| {
            path.push(APP_NAME);
            path
        })
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, GrabError> {
    create_dir(&path)?;
    Ok(path)
}

fn create_dir(path: &Path) -> Result<(), GrabError> {
    fs::create_dir_all(path).map_err(|source| {
        GrabError::Config(format!(
            "could not create directory {}: {}",
            path.display(),
            source
        ))
    })
}
