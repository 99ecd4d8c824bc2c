//! Our World in Data grapher charts.
//!
//! Each chart slug has a metadata document and a CSV table, both also bundled
//! in a per-slug zip archive. [`OwidSource`] derives every URL and cache path
//! from the slug; [`Acquirer`] does the downloading.

pub mod acquire;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::config::Settings;
use crate::error::GrabError;

pub use acquire::Acquirer;

/// Base URL of grapher charts.
pub const DEFAULT_BASE_URL: &str = "https://ourworldindata.org/grapher";

const NON_REDISTRIBUTABLE_SUFFIX: &str = ".non-redistributable";

/// The artifacts published for one chart slug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// `<slug>.metadata.json`
    Metadata,
    /// `<slug>.csv`
    Data,
    /// `<slug>.zip`, bundling the two above.
    Archive,
    /// The chart page itself.
    Page,
}

impl ArtifactKind {
    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Metadata => ".metadata.json",
            ArtifactKind::Data => ".csv",
            ArtifactKind::Archive => ".zip",
            ArtifactKind::Page => ".html",
        }
    }

    fn url_suffix(self) -> &'static str {
        match self {
            ArtifactKind::Page => "",
            other => other.suffix(),
        }
    }

    /// Short label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Metadata => "JSON",
            ArtifactKind::Data => "CSV",
            ArtifactKind::Archive => "ZIP",
            ArtifactKind::Page => "HTML",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Metadata => "json",
            ArtifactKind::Data => "csv",
            ArtifactKind::Archive => "zip",
            ArtifactKind::Page => "html",
        };
        f.write_str(name)
    }
}

impl FromStr for ArtifactKind {
    type Err = GrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "metadata" => Ok(ArtifactKind::Metadata),
            "csv" | "data" => Ok(ArtifactKind::Data),
            "zip" | "archive" => Ok(ArtifactKind::Archive),
            "html" | "page" => Ok(ArtifactKind::Page),
            _ => Err(GrabError::UnknownArtifactKind(s.to_string())),
        }
    }
}

/// Where one artifact lives remotely and in the local cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub url: String,
    pub path: PathBuf,
}

/// URL and cache layout for grapher charts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwidSource {
    base_url: String,
    root_dir: PathBuf,
}

impl OwidSource {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            root_dir: root_dir.into(),
        }
    }

    /// Source caching under the configured downloads directory.
    pub fn from_settings(settings: &Settings) -> Result<Self, GrabError> {
        Ok(Self::new(settings.owid_dir()?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// File name of an artifact, which is also its member name in the archive.
    pub fn file_name(&self, slug: &str, kind: ArtifactKind) -> String {
        format!("{slug}{}", kind.suffix())
    }

    /// URL and cache path of one artifact. `slug` should have passed
    /// [`validate_slug`].
    pub fn location(&self, slug: &str, kind: ArtifactKind) -> ArtifactLocation {
        ArtifactLocation {
            url: format!("{}/{slug}{}", self.base_url, kind.url_suffix()),
            path: self.root_dir.join(self.file_name(slug, kind)),
        }
    }

    /// Marker recording that the provider refused to share an artifact.
    pub fn policy_marker(&self, slug: &str, kind: ArtifactKind) -> PathBuf {
        self.root_dir
            .join(format!("{}{NON_REDISTRIBUTABLE_SUFFIX}", self.file_name(slug, kind)))
    }
}

/// Check that `slug` names a single file stem inside the cache directory.
pub fn validate_slug(slug: &str) -> Result<(), GrabError> {
    let message = if slug.is_empty() {
        "slug is empty"
    } else if slug.contains(|c: char| c == '/' || c == '\\') {
        "slug must not contain path separators"
    } else if slug.contains("..") {
        "slug must not contain '..'"
    } else {
        return Ok(());
    };
    Err(GrabError::InvalidSlug {
        slug: slug.to_string(),
        message: message.to_string(),
    })
}

/// Local files produced by one acquisition. `None` means unavailable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Acquisition {
    pub metadata: Option<PathBuf>,
    pub data: Option<PathBuf>,
}

impl Acquisition {
    pub fn is_complete(&self) -> bool {
        self.metadata.is_some() && self.data.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct ChartMetadata {
    #[serde(default)]
    chart: Option<ChartSection>,
}

#[derive(Debug, Deserialize)]
struct ChartSection {
    #[serde(default)]
    title: Option<String>,
}

/// Chart title from a metadata file, falling back to `slug` when the document
/// parses but carries no title. `None` if the file is not valid metadata JSON.
pub fn read_chart_title(path: &Path, slug: &str) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let metadata: ChartMetadata = serde_json::from_str(&text).ok()?;
    Some(
        metadata
            .chart
            .and_then(|chart| chart.title)
            .unwrap_or_else(|| slug.to_string()),
    )
}
