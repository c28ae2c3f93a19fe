use std::collections::HashSet;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Public GitHub REST endpoint.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("release API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed release descriptor: {0}")]
    Malformed(String),

    #[error("release {0} must not be empty")]
    Empty(&'static str),
}

/// One upstream release, identified by repository and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    repo: String,
    tag: String,
}

impl ReleaseDescriptor {
    pub fn new(repo: &str, tag: &str) -> Self {
        Self {
            repo: repo.to_owned(),
            tag: tag.to_owned(),
        }
    }

    /// Repository in `owner/repo` format.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Tag up to the first `+`, the part that ends up in artifact versions.
    pub fn native_version(&self) -> &str {
        self.tag.split('+').next().unwrap_or(&self.tag)
    }

    /// Both the repository and the tag must be non-empty.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.repo.trim().is_empty() {
            return Err(ResolveError::Empty("repository"));
        }
        if self.tag.trim().is_empty() {
            return Err(ResolveError::Empty("tag"));
        }
        Ok(())
    }

    /// Release-by-tag endpoint under `api_base`.
    pub fn api_url(&self, api_base: &str) -> String {
        format!(
            "{}/repos/{}/releases/tags/{}",
            api_base.trim_end_matches('/'),
            self.repo,
            self.tag
        )
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub url: String,
}

#[derive(Deserialize)]
struct ReleaseAssetsResponse {
    assets: Vec<AssetEntry>,
}

#[derive(Deserialize)]
struct AssetEntry {
    #[serde(default)]
    name: Option<String>,
    browser_download_url: String,
}

/// Queries the release API for the assets of a single tagged release.
pub struct ReleaseResolver<'a> {
    client: &'a Client,
    api_base: &'a str,
    token: Option<&'a str>,
}

impl<'a> ReleaseResolver<'a> {
    pub fn new(client: &'a Client, api_base: &'a str) -> Self {
        Self {
            client,
            api_base,
            token: None,
        }
    }

    /// Authenticate requests with a bearer token (builder).
    pub fn with_token(mut self, token: Option<&'a str>) -> Self {
        self.token = token;
        self
    }

    /// Fetch the release descriptor and return its assets, in API order,
    /// deduplicated by download URL. Any failure is final; nothing is retried.
    pub async fn resolve(&self, release: &ReleaseDescriptor) -> Result<Vec<Asset>, ResolveError> {
        release.validate()?;
        let url = release.api_url(self.api_base);
        info!(repo = release.repo(), tag = release.tag(), "resolving release assets");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ResolveError::Status { status, body });
        }

        let body = resp.text().await?;
        let assets = parse_assets(&body)?;
        debug!(count = assets.len(), "release assets resolved");
        Ok(assets)
    }
}

/// Project a release JSON document onto its assets.
pub fn parse_assets(body: &str) -> Result<Vec<Asset>, ResolveError> {
    let release: ReleaseAssetsResponse =
        serde_json::from_str(body).map_err(|e| ResolveError::Malformed(e.to_string()))?;

    let mut seen = HashSet::new();
    Ok(release
        .assets
        .into_iter()
        .filter(|a| seen.insert(a.browser_download_url.clone()))
        .map(|a| {
            let name = a.name.unwrap_or_else(|| {
                a.browser_download_url
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_owned()
            });
            Asset {
                name,
                url: a.browser_download_url,
            }
        })
        .collect())
}
