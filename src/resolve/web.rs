//! Web fetches with an on-disk cache.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use super::{CachingFetcher, Content};
use crate::download::{write_via_partial, DEFAULT_USER_AGENT};
use crate::error::GrabError;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// File holding a URL's body inside the directory mirroring its path.
///
/// `@` never survives [`sanitize`], so no path segment can take this name.
const BODY_FILE: &str = "@body";

fn default_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
        .build();
    config.into()
}

fn fetch_with(agent: &ureq::Agent, url: &str, user_agent: &str) -> Result<Vec<u8>, GrabError> {
    let mut response = agent
        .get(url)
        .header("User-Agent", user_agent)
        .call()
        .map_err(|source| GrabError::Http {
            url: url.to_string(),
            message: source.to_string(),
        })?;

    let mut bytes = Vec::new();
    response
        .body_mut()
        .as_reader()
        .read_to_end(&mut bytes)
        .map_err(|source| GrabError::Http {
            url: url.to_string(),
            message: source.to_string(),
        })?;
    Ok(bytes)
}

/// Caches each URL's body at `<root>/<scheme>/<host>[_<port>]/<path>/@body`.
///
/// The query string, when present, is appended to the body file name. A
/// cached URL is served from disk with no network access.
pub struct HttpCache {
    root: PathBuf,
    agent: ureq::Agent,
}

impl HttpCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            agent: default_agent(),
        }
    }

    /// Local file that caches `url`.
    pub fn cache_path(&self, url: &str) -> Result<PathBuf, GrabError> {
        let parsed = url::Url::parse(url).map_err(|source| GrabError::InvalidKey {
            key: url.to_string(),
            message: format!("invalid URL: {source}"),
        })?;

        let mut path = self.root.join(sanitize(parsed.scheme()));
        let host = sanitize(parsed.host_str().unwrap_or("localhost"));
        match parsed.port() {
            Some(port) => path.push(format!("{host}_{port}")),
            None => path.push(host),
        }

        if let Some(segments) = parsed.path_segments() {
            for segment in segments.filter(|segment| is_safe_segment(segment)) {
                path.push(sanitize(segment));
            }
        }

        match parsed.query() {
            Some(query) => path.push(format!("{BODY_FILE}_{}", sanitize(query))),
            None => path.push(BODY_FILE),
        }
        Ok(path)
    }
}

impl CachingFetcher for HttpCache {
    fn fetch(&self, url: &str) -> Result<Content, GrabError> {
        let path = self.cache_path(url)?;
        if path.is_file() {
            debug!(url, path = %path.display(), "serving from cache");
            return fs::read(&path)
                .map(Content::Bytes)
                .map_err(|source| GrabError::ReadPath { path, source });
        }

        let bytes = fetch_with(&self.agent, url, DEFAULT_USER_AGENT)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_via_partial(&mut bytes.as_slice(), &path)?;
        info!(url, path = %path.display(), bytes = bytes.len(), "cached web resource");
        Ok(Content::Bytes(bytes))
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '=' | '%' | '~') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
