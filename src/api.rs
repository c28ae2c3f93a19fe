use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::info;

use crate::aggregate::{aggregate, AggregatePackage};
use crate::config::{ensure_unique, ConfigError};
use crate::downloader::{build_client, Downloader, ProgressFn};
use crate::edition::Edition;
use crate::error::{EditionError, Error};
use crate::extract::extract_tar_gz;
use crate::matcher::match_asset;
use crate::packager::{pack, PackError, PlatformPackage};
use crate::progress::default_progress_fn;
use crate::publish::{Coordinates, LocalRepository, PublishedArtifact};
use crate::release::{Asset, ReleaseDescriptor, ReleaseResolver, GITHUB_API_BASE};
use crate::selector::select_library;

// ──────────────────────────────────────────────────────────────────────────────
// Api
// ──────────────────────────────────────────────────────────────────────────────

/// Top-level entry-point with a chainable builder API.
///
/// # Example
/// ```rust,no_run
/// use webview_natives::{Api, Edition};
///
/// #[tokio::main]
/// async fn main() {
///     let editions = [Edition::new("linux-x86-64", "webview-linux-x64").unwrap()];
///     let build = Api::new()
///         .set_work_dir("build/natives")
///         .repo("webview/webview")
///         .release("0.12.0")
///         .build(&editions)
///         .await
///         .unwrap();
///     println!("{}", build.aggregate.path.display());
/// }
/// ```
pub struct Api {
    work_dir: PathBuf,
    api_base: String,
    proxy: Option<String>,
    token: Option<String>,
    progress: Option<ProgressFn>,
    concurrent: bool,
}

impl Api {
    /// Create a new `Api` with sensible defaults.
    ///
    /// Proxy is read from `HTTP_PROXY` / `HTTPS_PROXY` and the API token from
    /// `GITHUB_TOKEN`.
    pub fn new() -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|s| !s.is_empty());

        Self {
            work_dir: PathBuf::from("build/natives"),
            api_base: GITHUB_API_BASE.to_owned(),
            proxy: env("HTTP_PROXY").or_else(|| env("HTTPS_PROXY")),
            token: env("GITHUB_TOKEN"),
            progress: Some(default_progress_fn()),
            concurrent: false,
        }
    }

    /// Set the directory holding downloads, staging trees and packages (builder).
    pub fn set_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Point release lookups at another API host (builder).
    pub fn set_api_base(mut self, base: &str) -> Self {
        self.api_base = base.to_owned();
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    /// Set the token sent to the release API (builder).
    pub fn set_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    /// Override the progress callback (builder).
    pub fn set_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Disable progress output (builder).
    pub fn no_progress(mut self) -> Self {
        self.progress = None;
        self
    }

    /// Run edition pipelines concurrently instead of one after another (builder).
    pub fn set_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Select the upstream repository and return a [`RepoApi`].
    pub fn repo(self, repo: &str) -> RepoApi {
        RepoApi {
            api: self,
            repo: repo.to_owned(),
        }
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// RepoApi
// ──────────────────────────────────────────────────────────────────────────────

/// Intermediate builder after a repository has been specified.
pub struct RepoApi {
    api: Api,
    repo: String,
}

impl RepoApi {
    /// Target a tagged release (e.g. `"0.12.0"`).
    pub fn release(self, tag: &str) -> ReleaseApi {
        ReleaseApi {
            api: self.api,
            release: ReleaseDescriptor::new(&self.repo, tag),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// ReleaseApi
// ──────────────────────────────────────────────────────────────────────────────

/// Builder with the release fixed; runs the pipeline.
pub struct ReleaseApi {
    api: Api,
    release: ReleaseDescriptor,
}

/// Per-edition paths under the work directory.
#[derive(Debug, Clone)]
pub struct EditionLayout {
    pub download: PathBuf,
    pub staging: PathBuf,
    pub package: PathBuf,
}

impl EditionLayout {
    pub fn new(work_dir: &Path, edition: &Edition) -> Self {
        let name = edition.name();
        let root = work_dir.join(name);
        Self {
            download: root.join("download").join(format!("webview-{name}-lib.tar.gz")),
            staging: root.join("natives"),
            package: root.join("pack").join(format!("native-{name}.zip")),
        }
    }
}

/// Output of a successful run, ready to publish.
#[derive(Debug, Clone)]
pub struct NativesBuild {
    pub release: ReleaseDescriptor,
    /// One per edition, in configured order.
    pub packages: Vec<PlatformPackage>,
    pub aggregate: AggregatePackage,
}

impl ReleaseApi {
    pub fn descriptor(&self) -> &ReleaseDescriptor {
        &self.release
    }

    /// Resolve the release's assets.
    pub async fn resolve(&self) -> Result<Vec<Asset>, Error> {
        let client = build_client(self.api.proxy.as_deref())?;
        self.resolve_with(&client).await
    }

    async fn resolve_with(&self, client: &reqwest::Client) -> Result<Vec<Asset>, Error> {
        ReleaseResolver::new(client, &self.api.api_base)
            .with_token(self.api.token.as_deref())
            .resolve(&self.release)
            .await
            .map_err(|source| Error::Resolve {
                repo: self.release.repo().to_owned(),
                tag: self.release.tag().to_owned(),
                source,
            })
    }

    /// Run every edition through match → fetch → extract → select → pack, then
    /// merge the results into the all-natives package.
    ///
    /// The first failing edition aborts the run. No aggregate is produced, and
    /// one left behind by an earlier run is removed up front.
    pub async fn build(&self, editions: &[Edition]) -> Result<NativesBuild, Error> {
        if editions.is_empty() {
            return Err(ConfigError::NoEditions.into());
        }
        ensure_unique(editions)?;

        let work_dir = self.api.work_dir.as_path();
        let aggregate_path = work_dir.join("all-natives.zip");
        if aggregate_path.exists() {
            std::fs::remove_file(&aggregate_path)
                .map_err(|e| Error::Aggregate(PackError::Io(e)))?;
        }

        let client = build_client(self.api.proxy.as_deref())?;
        let assets: Arc<[Asset]> = self.resolve_with(&client).await?.into();
        let downloader = Downloader::new(client, self.api.progress.clone());

        let packages = if self.api.concurrent {
            join_all(
                editions
                    .iter()
                    .map(|e| run_edition(&downloader, e, assets.clone(), work_dir)),
            )
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut packages = Vec::with_capacity(editions.len());
            for edition in editions {
                packages.push(run_edition(&downloader, edition, assets.clone(), work_dir).await?);
            }
            packages
        };

        let aggregate = aggregate(&packages, &aggregate_path).map_err(Error::Aggregate)?;

        Ok(NativesBuild {
            release: self.release.clone(),
            packages,
            aggregate,
        })
    }
}

async fn run_edition(
    downloader: &Downloader,
    edition: &Edition,
    assets: Arc<[Asset]>,
    work_dir: &Path,
) -> Result<PlatformPackage, Error> {
    let wrap = |source: EditionError| Error::Edition {
        edition: edition.name().to_owned(),
        source,
    };
    let layout = EditionLayout::new(work_dir, edition);

    let asset = match_asset(edition, &assets).map_err(|e| wrap(e.into()))?;
    info!(edition = edition.name(), asset = %asset.name, "matched release asset");

    downloader
        .fetch(&asset.url, &layout.download)
        .await
        .map_err(|e| wrap(e.into()))?;

    let owned = edition.clone();
    tokio::task::spawn_blocking(move || stage_and_pack(&owned, &layout))
        .await
        .map_err(|e| Error::Task {
            edition: edition.name().to_owned(),
            message: e.to_string(),
        })?
        .map_err(wrap)
}

/// Blocking half of an edition run: fresh staging tree, selection, packing.
fn stage_and_pack(edition: &Edition, layout: &EditionLayout) -> Result<PlatformPackage, EditionError> {
    if layout.staging.exists() {
        std::fs::remove_dir_all(&layout.staging).map_err(crate::extract::ExtractError::from)?;
    }
    extract_tar_gz(&layout.download, &layout.staging)?;
    let selected = select_library(&layout.staging, edition)?;
    Ok(pack(&selected, edition, &layout.package)?)
}

impl NativesBuild {
    /// Publish each edition's package under its own artifact id, then the
    /// all-natives package.
    pub fn publish(
        &self,
        repository: &LocalRepository,
        coordinates: &Coordinates,
    ) -> Result<Vec<PublishedArtifact>, Error> {
        let mut published = Vec::with_capacity(self.packages.len() + 1);
        for package in &self.packages {
            let artifact_id = coordinates.edition_artifact_id(&package.edition);
            published.push(repository.publish(coordinates, &artifact_id, &package.path)?);
        }
        published.push(repository.publish(
            coordinates,
            &coordinates.all_natives_artifact_id(),
            &self.aggregate.path,
        )?);
        Ok(published)
    }
}
