//! Hugging Face Hub datasets behind the `hf://` scheme.
//!
//! `hf://<namespace>/<dataset>` downloads the dataset snapshot and returns it as
//! a [`FileTree`]; `hf://<namespace>/<dataset>/<path>` returns one file's bytes.

use std::fs;
use std::path::{Path, PathBuf};

use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::info;

use super::{Content, DatasetArchive, FileTree};
use crate::error::GrabError;

/// A parsed `hf://` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HfDatasetRef {
    pub repo_id: String,
    pub revision: Option<String>,
    /// File inside the repository, when one was addressed.
    pub file: Option<String>,
}

/// Dataset accessor backed by the Hub's blocking API and local cache.
pub struct HfDatasets {
    api: Api,
}

impl HfDatasets {
    /// Build an accessor, authenticating with `HF_TOKEN` when it is set.
    pub fn from_env() -> Result<Self, GrabError> {
        Self::with_token(std::env::var("HF_TOKEN").ok())
    }

    pub fn with_token(token: Option<String>) -> Result<Self, GrabError> {
        let mut builder = ApiBuilder::new().with_progress(false);
        if token.is_some() {
            builder = builder.with_token(token);
        }
        let api = builder
            .build()
            .map_err(|source| GrabError::DatasetArchive {
                reference: String::new(),
                message: source.to_string(),
            })?;
        Ok(Self { api })
    }

    fn repo(&self, dataset: &HfDatasetRef) -> ApiRepo {
        match dataset.revision.as_ref() {
            Some(revision) => self.api.repo(Repo::with_revision(
                dataset.repo_id.clone(),
                RepoType::Dataset,
                revision.clone(),
            )),
            None => self.api.dataset(dataset.repo_id.clone()),
        }
    }

    fn fetch_snapshot(&self, dataset: &HfDatasetRef, repo: &ApiRepo) -> Result<Content, GrabError> {
        let hub_error = |message: String| GrabError::DatasetArchive {
            reference: dataset.repo_id.clone(),
            message,
        };

        let repo_info = repo.info().map_err(|source| hub_error(source.to_string()))?;
        let mut root = None;
        for sibling in &repo_info.siblings {
            let local = repo.get(&sibling.rfilename).map_err(|source| {
                hub_error(format!("failed downloading '{}': {}", sibling.rfilename, source))
            })?;
            if root.is_none() {
                root = snapshot_root(&local, &sibling.rfilename);
            }
        }

        let root = root.ok_or_else(|| hub_error("dataset has no files".to_string()))?;
        info!(
            repo_id = %dataset.repo_id,
            files = repo_info.siblings.len(),
            root = %root.display(),
            "dataset snapshot ready"
        );
        Ok(Content::Files(FileTree::new(root)))
    }
}

impl DatasetArchive for HfDatasets {
    fn fetch(&self, reference: &str) -> Result<Content, GrabError> {
        let dataset = parse_dataset_ref(reference)?;
        let repo = self.repo(&dataset);

        let Some(file) = dataset.file.as_deref() else {
            return self.fetch_snapshot(&dataset, &repo);
        };

        let local = repo.get(file).map_err(|source| GrabError::DatasetArchive {
            reference: reference.to_string(),
            message: format!("failed downloading '{}': {}", file, source),
        })?;
        fs::read(&local)
            .map(Content::Bytes)
            .map_err(|source| GrabError::ReadPath {
                path: local,
                source,
            })
    }
}

/// Parse `<namespace>/<dataset>[@<revision>][/<file>]`.
pub fn parse_dataset_ref(reference: &str) -> Result<HfDatasetRef, GrabError> {
    let invalid = |message: &str| GrabError::DatasetArchive {
        reference: reference.to_string(),
        message: message.to_string(),
    };

    let mut parts = reference.trim().splitn(3, '/');
    let namespace = parts.next().unwrap_or_default();
    let dataset = parts.next().unwrap_or_default();
    let file = parts.next().filter(|file| !file.is_empty());

    let (dataset, revision) = match dataset.split_once('@') {
        Some((name, revision)) if !revision.is_empty() => (name, Some(revision.to_string())),
        Some(_) => return Err(invalid("revision after '@' is empty")),
        None => (dataset, None),
    };

    if namespace.is_empty() || dataset.is_empty() {
        return Err(invalid("expected 'hf://<namespace>/<dataset>[/<file>]'"));
    }

    Ok(HfDatasetRef {
        repo_id: format!("{namespace}/{dataset}"),
        revision,
        file: file.map(str::to_string),
    })
}

/// Directory that `rfilename` was downloaded relative to.
fn snapshot_root(local: &Path, rfilename: &str) -> Option<PathBuf> {
    let depth = rfilename.split('/').filter(|part| !part.is_empty()).count();
    let mut root = local.to_path_buf();
    for _ in 0..depth {
        if !root.pop() {
            return None;
        }
    }
    Some(root)
}
