//! Metadata + CSV acquisition with a zip fallback.
//!
//! Per artifact: a cached file (or a recorded redistribution refusal) is used
//! as is unless `refresh` is set. Otherwise the artifact is downloaded
//! directly. A 403 on the direct path triggers the zip fallback, which is tried
//! at most once per slug per call and fills in both artifacts when it works.
//! Remote failures never surface as errors; they leave the artifact `None`.
//! So does a slug that would escape the cache directory.

use std::collections::BTreeSet;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{
    read_chart_title, validate_slug, Acquisition, ArtifactKind, ArtifactLocation, OwidSource,
};
use crate::archive::{MemberArchive, TempArchive, ZipMembers};
use crate::download::{Downloader, FailureKind};

/// Result of a direct download attempt.
#[derive(Debug)]
enum Direct {
    Acquired(PathBuf),
    Forbidden,
    Unavailable,
}

/// Downloads chart artifacts through `D`, opening fallback archives as `A`.
pub struct Acquirer<D, A = ZipMembers> {
    source: OwidSource,
    downloader: D,
    archive: PhantomData<A>,
}

impl<D: Downloader> Acquirer<D> {
    pub fn new(source: OwidSource, downloader: D) -> Self {
        Self::with_archive_format(source, downloader)
    }
}

impl<D: Downloader, A: MemberArchive> Acquirer<D, A> {
    pub fn with_archive_format(source: OwidSource, downloader: D) -> Self {
        Self {
            source,
            downloader,
            archive: PhantomData,
        }
    }

    /// Acquire the metadata and CSV files for `slug`.
    pub fn acquire(&self, slug: &str, refresh: bool) -> Acquisition {
        let mut attempted = BTreeSet::new();
        self.acquire_slug(slug, refresh, &mut attempted)
    }

    /// Acquire several slugs, sharing one fallback budget across the call.
    pub fn acquire_all<'a, I>(&self, slugs: I, refresh: bool) -> Vec<(String, Acquisition)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut attempted = BTreeSet::new();
        slugs
            .into_iter()
            .map(|slug| {
                let acquisition = self.acquire_slug(slug, refresh, &mut attempted);
                (slug.to_string(), acquisition)
            })
            .collect()
    }

    fn acquire_slug(
        &self,
        slug: &str,
        refresh: bool,
        attempted: &mut BTreeSet<String>,
    ) -> Acquisition {
        if let Err(err) = validate_slug(slug) {
            warn!(slug, error = %err, "refusing chart slug");
            return Acquisition::default();
        }
        if let Err(err) = fs::create_dir_all(self.source.root_dir()) {
            debug!(path = %self.source.root_dir().display(), error = %err, "could not create cache dir");
        }
        let mut extracted: Option<Acquisition> = None;

        let data = match self.cached(slug, ArtifactKind::Data, refresh) {
            Some(cached) => cached,
            None => match self.direct(slug, ArtifactKind::Data, refresh) {
                Direct::Acquired(path) => Some(path),
                Direct::Unavailable => None,
                Direct::Forbidden => {
                    extracted = self.fallback_once(slug, ArtifactKind::Data, attempted);
                    extracted.as_ref().and_then(|found| found.data.clone())
                }
            },
        };

        let from_archive = extracted.and_then(|found| found.metadata);
        let (metadata, fresh) = match from_archive {
            Some(path) => (Some(path), true),
            None => match self.cached(slug, ArtifactKind::Metadata, refresh) {
                Some(cached) => (cached, false),
                None => match self.direct(slug, ArtifactKind::Metadata, refresh) {
                    Direct::Acquired(path) => (Some(path), true),
                    Direct::Unavailable => (None, false),
                    Direct::Forbidden => {
                        let found = self.fallback_once(slug, ArtifactKind::Metadata, attempted);
                        (found.and_then(|found| found.metadata), true)
                    }
                },
            },
        };

        if fresh {
            if let Some(title) = metadata
                .as_deref()
                .and_then(|path| read_chart_title(path, slug))
            {
                info!(slug, title = %title, "chart title");
            }
        }

        Acquisition { metadata, data }
    }

    /// `Some(..)` when no network access is needed for this artifact.
    fn cached(&self, slug: &str, kind: ArtifactKind, refresh: bool) -> Option<Option<PathBuf>> {
        if refresh {
            return None;
        }
        let path = self.source.location(slug, kind).path;
        if path.exists() {
            debug!(slug, path = %path.display(), "using cached {}", kind.label());
            return Some(Some(path));
        }
        if self.source.policy_marker(slug, kind).exists() {
            info!(
                slug,
                "{} was previously refused as non-redistributable; skipping",
                kind.label()
            );
            return Some(None);
        }
        None
    }

    fn direct(&self, slug: &str, kind: ArtifactKind, refresh: bool) -> Direct {
        let ArtifactLocation { url, path } = self.source.location(slug, kind);
        info!(slug, url = %url, "acquiring {}", kind.label());

        match self.downloader.download(&url, &path, refresh) {
            Ok(Some(local)) if local.exists() => {
                log_materialized(slug, kind, &local, false);
                self.clear_policy_marker(slug, kind);
                Direct::Acquired(local)
            }
            Ok(_) => {
                info!(slug, url = %url, "{} download produced no file", kind.label());
                Direct::Unavailable
            }
            Err(err) => match err.kind() {
                FailureKind::NonRedistributable => {
                    info!(
                        slug,
                        "{} is non-redistributable; not available for download",
                        kind.label()
                    );
                    self.record_policy_marker(slug, kind);
                    Direct::Unavailable
                }
                FailureKind::Forbidden => {
                    debug!(slug, error = %err, "{} download forbidden", kind.label());
                    Direct::Forbidden
                }
                FailureKind::Other => {
                    info!(slug, error = %err, "{} download failed", kind.label());
                    Direct::Unavailable
                }
            },
        }
    }

    /// Run the zip fallback unless this call already tried it for `slug`.
    fn fallback_once(
        &self,
        slug: &str,
        trigger: ArtifactKind,
        attempted: &mut BTreeSet<String>,
    ) -> Option<Acquisition> {
        if !attempted.insert(slug.to_string()) {
            info!(
                slug,
                "{} download forbidden; ZIP fallback already attempted",
                trigger.label()
            );
            return None;
        }
        info!(
            slug,
            "{} download forbidden, attempting ZIP fallback",
            trigger.label()
        );
        Some(self.archive_fallback(slug))
    }

    fn archive_fallback(&self, slug: &str) -> Acquisition {
        let ArtifactLocation { url, path } = self.source.location(slug, ArtifactKind::Archive);
        let temp = TempArchive::new(path);

        let archive_path = match self.downloader.download(&url, temp.path(), true) {
            Ok(Some(local)) if local.exists() => local,
            Ok(_) => {
                info!(slug, url = %url, "ZIP fallback produced no file");
                return Acquisition::default();
            }
            Err(err) if err.kind() == FailureKind::NonRedistributable => {
                info!(slug, "ZIP is non-redistributable; skipping ZIP fallback");
                return Acquisition::default();
            }
            Err(err) => {
                info!(slug, error = %err, "ZIP fallback failed");
                return Acquisition::default();
            }
        };
        let _relocated = (archive_path != temp.path()).then(|| TempArchive::new(&archive_path));

        let mut archive = match A::open(&archive_path) {
            Ok(archive) => archive,
            Err(err) => {
                info!(slug, error = %err, "ZIP could not be read");
                return Acquisition::default();
            }
        };

        Acquisition {
            data: self.extract(&mut archive, slug, ArtifactKind::Data),
            metadata: self.extract(&mut archive, slug, ArtifactKind::Metadata),
        }
    }

    fn extract(&self, archive: &mut A, slug: &str, kind: ArtifactKind) -> Option<PathBuf> {
        let member = self.source.file_name(slug, kind);
        let dest = self.source.location(slug, kind).path;

        match archive.extract_member(&member, &dest) {
            Ok(_) if dest.exists() => {
                log_materialized(slug, kind, &dest, true);
                self.clear_policy_marker(slug, kind);
                Some(dest)
            }
            Ok(_) => None,
            Err(err) => {
                info!(
                    slug,
                    member = %member,
                    error = %err,
                    "could not extract {} from ZIP",
                    kind.label()
                );
                None
            }
        }
    }

    fn record_policy_marker(&self, slug: &str, kind: ArtifactKind) {
        let marker = self.source.policy_marker(slug, kind);
        if let Err(err) = fs::write(&marker, b"") {
            debug!(path = %marker.display(), error = %err, "could not record policy marker");
        }
    }

    fn clear_policy_marker(&self, slug: &str, kind: ArtifactKind) {
        let _ = fs::remove_file(self.source.policy_marker(slug, kind));
    }
}

fn log_materialized(slug: &str, kind: ArtifactKind, path: &Path, from_archive: bool) {
    let bytes = fs::metadata(path).map(|meta| meta.len()).unwrap_or_default();
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    if from_archive {
        info!(slug, file = %file, bytes, "{} extracted from ZIP", kind.label());
    } else {
        info!(slug, file = %file, bytes, "{} downloaded", kind.label());
    }
}
