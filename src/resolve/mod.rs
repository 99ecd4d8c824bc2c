//! Scheme dispatch: map a key to the handler that knows how to fetch it.
//!
//! Keys look like `scheme://rest`. A key starting with a path separator is a
//! local path and is rewritten to `file://<key>` first. Keys without any
//! `scheme://` prefix are handed to an [`ObjectLookup`].

pub mod local;
pub mod lookup;
pub mod web;

#[cfg(feature = "hf-remote")]
pub mod hf;

use std::borrow::Cow;
use std::rc::Rc;

use tracing::debug;

use crate::config::Settings;
use crate::error::GrabError;

pub use local::FileTree;
pub use lookup::{NamedObjects, ObjectLookup};

/// Scheme of the local filesystem handler.
pub const FILE_SCHEME: &str = "file";
/// Scheme of the Hugging Face dataset handler.
pub const HF_SCHEME: &str = "hf";

const SCHEME_SEP: &str = "://";

/// What a key resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    /// The full contents of a single file.
    Bytes(Vec<u8>),
    /// A directory, read lazily.
    Files(FileTree),
}

impl Content {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Bytes(bytes) => Some(bytes),
            Content::Files(_) => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Content::Bytes(bytes) => Some(bytes),
            Content::Files(_) => None,
        }
    }

    pub fn as_files(&self) -> Option<&FileTree> {
        match self {
            Content::Files(tree) => Some(tree),
            Content::Bytes(_) => None,
        }
    }
}

/// A scheme handler. Receives the full (normalized) key, prefix included.
pub type Handler = Box<dyn Fn(&str) -> Result<Content, GrabError>>;

/// Accessor for datasets hosted behind a dataset hub API.
pub trait DatasetArchive {
    /// Fetch a dataset (or a file inside one) by reference, scheme stripped.
    fn fetch(&self, reference: &str) -> Result<Content, GrabError>;
}

/// Download-with-cache for web URLs.
pub trait CachingFetcher {
    /// Fetch `url` (scheme included), serving from cache when possible.
    fn fetch(&self, url: &str) -> Result<Content, GrabError>;
}

/// Registry of scheme handlers plus the fallback object lookup.
pub struct Resolver {
    handlers: Vec<(String, Handler)>,
    lookup: Box<dyn ObjectLookup>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(NamedObjects::default())
    }
}

impl Resolver {
    /// An empty registry using `lookup` for scheme-less keys.
    pub fn new(lookup: impl ObjectLookup + 'static) -> Self {
        Self {
            handlers: Vec::new(),
            lookup: Box::new(lookup),
        }
    }

    /// The standard registry: `file`, `hf` (with the `hf-remote` feature),
    /// `http` and `https`.
    pub fn with_defaults(settings: &Settings) -> Result<Self, GrabError> {
        let mut resolver = Self::default();
        resolver.register_local_files();

        #[cfg(feature = "hf-remote")]
        resolver.register_dataset_archive(HF_SCHEME, hf::HfDatasets::from_env()?);

        resolver.register_web(web::HttpCache::new(settings.http_cache_dir()?));
        Ok(resolver)
    }

    /// Register `handler` for `scheme`, replacing any previous handler.
    ///
    /// A replaced scheme keeps its original position in [`Resolver::schemes`].
    pub fn register<F>(&mut self, scheme: impl Into<String>, handler: F)
    where
        F: Fn(&str) -> Result<Content, GrabError> + 'static,
    {
        let scheme = scheme.into();
        let handler: Handler = Box::new(handler);
        match self.handlers.iter_mut().find(|(name, _)| *name == scheme) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((scheme, handler)),
        }
    }

    pub fn register_local_files(&mut self) {
        self.register(FILE_SCHEME, local::read_local);
    }

    pub fn register_dataset_archive<A>(&mut self, scheme: &str, accessor: A)
    where
        A: DatasetArchive + 'static,
    {
        let prefix = scheme.to_string();
        self.register(scheme, move |key| {
            accessor.fetch(strip_scheme(key, &prefix))
        });
    }

    /// Register `fetcher` for both `http` and `https`.
    pub fn register_web<C>(&mut self, fetcher: C)
    where
        C: CachingFetcher + 'static,
    {
        let fetcher = Rc::new(fetcher);
        for scheme in ["http", "https"] {
            let fetcher = Rc::clone(&fetcher);
            self.register(scheme, move |url| fetcher.fetch(url));
        }
    }

    /// Registered scheme names, in registration order.
    pub fn schemes(&self) -> Vec<String> {
        self.handlers.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Resolve `key` to content.
    ///
    /// Handler errors pass through untouched. The only error produced here is
    /// [`GrabError::UnrecognizedScheme`] (plus [`GrabError::InvalidKey`] for an
    /// empty key).
    pub fn resolve(&self, key: &str) -> Result<Content, GrabError> {
        if key.is_empty() {
            return Err(GrabError::InvalidKey {
                key: String::new(),
                message: "key is empty".to_string(),
            });
        }

        let key = normalize_key(key);
        if let Some((scheme, _)) = parse_scheme(&key) {
            let handler = self
                .handlers
                .iter()
                .find(|(name, _)| name == scheme)
                .map(|(_, handler)| handler)
                .ok_or_else(|| GrabError::UnrecognizedScheme {
                    scheme: scheme.to_string(),
                })?;
            debug!(scheme, key = %key, "dispatching key");
            return handler(&*key);
        }

        debug!(reference = %key, "no scheme, using object lookup");
        self.lookup.lookup(&key)
    }
}

/// Rewrite keys starting with a path separator as `file://` keys.
pub fn normalize_key(key: &str) -> Cow<'_, str> {
    if key.starts_with('/') || key.starts_with('\\') {
        Cow::Owned(format!("{FILE_SCHEME}{SCHEME_SEP}{key}"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Split `scheme://rest` into its parts.
///
/// The scheme must be one or more word characters (alphanumerics or `_`) and
/// the rest must be non-empty and on one line; anything else is not a scheme
/// key.
pub fn parse_scheme(key: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = key.split_once(SCHEME_SEP)?;
    let is_word = !scheme.is_empty() && scheme.chars().all(|c| c.is_alphanumeric() || c == '_');
    if is_word && !rest.is_empty() && !rest.contains('\n') {
        Some((scheme, rest))
    } else {
        None
    }
}

/// Remove a leading `scheme://` from `key`, if present.
pub fn strip_scheme<'a>(key: &'a str, scheme: &str) -> &'a str {
    key.strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(SCHEME_SEP))
        .unwrap_or(key)
}
