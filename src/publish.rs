//! Publishing packages into a local Maven-layout repository.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::edition::Edition;
use crate::index::DESCRIPTOR_FILE_NAME;
use crate::release::ReleaseDescriptor;

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<version>(.+?)</version>\s*$").expect("valid regex"));

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error publishing {artifact_id}: {source}")]
    Io {
        artifact_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Group, project and version shared by every artifact of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group_id: String,
    pub project: String,
    pub version: String,
}

impl Coordinates {
    /// Coordinates whose version is `<base_version>+wv<native version>`.
    pub fn for_release(group_id: &str, project: &str, base_version: &str, release: &ReleaseDescriptor) -> Self {
        Self {
            group_id: group_id.to_owned(),
            project: project.to_owned(),
            version: format!("{base_version}+wv{}", release.native_version()),
        }
    }

    /// Artifact id of one edition's standalone package.
    pub fn edition_artifact_id(&self, edition: &Edition) -> String {
        format!("{}-native-{}", self.project, edition.name())
    }

    /// Artifact id of the package holding every edition.
    pub fn all_natives_artifact_id(&self) -> String {
        format!("{}-all-natives", self.project)
    }
}

/// A jar written into the repository.
#[derive(Debug, Clone)]
pub struct PublishedArtifact {
    pub artifact_id: String,
    pub version: String,
    pub jar: PathBuf,
}

/// Maven directory layout rooted at a local path (e.g. `.repo`).
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<group as path>/<artifact_id>`
    pub fn artifact_dir(&self, group_id: &str, artifact_id: &str) -> PathBuf {
        group_id
            .split('.')
            .fold(self.root.clone(), |dir, part| dir.join(part))
            .join(artifact_id)
    }

    /// Copy `archive` in as `<artifact_id>-<version>.jar`, write its POM and
    /// refresh the artifact's `maven-metadata.xml`.
    pub fn publish(
        &self,
        coordinates: &Coordinates,
        artifact_id: &str,
        archive: &Path,
    ) -> Result<PublishedArtifact, PublishError> {
        let io_err = |source: std::io::Error| PublishError::Io {
            artifact_id: artifact_id.to_owned(),
            source,
        };
        let version = &coordinates.version;
        let artifact_dir = self.artifact_dir(&coordinates.group_id, artifact_id);
        let version_dir = artifact_dir.join(version);
        fs::create_dir_all(&version_dir).map_err(io_err)?;

        let jar = version_dir.join(format!("{artifact_id}-{version}.jar"));
        fs::copy(archive, &jar).map_err(io_err)?;
        fs::write(
            version_dir.join(format!("{artifact_id}-{version}.pom")),
            render_pom(&coordinates.group_id, artifact_id, version),
        )
        .map_err(io_err)?;

        let metadata_path = artifact_dir.join(DESCRIPTOR_FILE_NAME);
        let mut versions = match fs::read_to_string(&metadata_path) {
            Ok(existing) => existing_versions(&existing),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(io_err(e)),
        };
        if !versions.contains(version) {
            versions.push(version.clone());
        }
        let last_updated = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
        fs::write(
            &metadata_path,
            render_metadata(&coordinates.group_id, artifact_id, version, &versions, &last_updated),
        )
        .map_err(io_err)?;

        info!(%artifact_id, %version, jar = %jar.display(), "published");
        Ok(PublishedArtifact {
            artifact_id: artifact_id.to_owned(),
            version: version.clone(),
            jar,
        })
    }
}

fn existing_versions(metadata: &str) -> Vec<String> {
    metadata
        .lines()
        .filter_map(|line| VERSION_LINE.captures(line).map(|c| c[1].to_owned()))
        .collect()
}

fn render_pom(group_id: &str, artifact_id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{group_id}</groupId>
  <artifactId>{artifact_id}</artifactId>
  <version>{version}</version>
</project>
"#
    )
}

fn render_metadata(
    group_id: &str,
    artifact_id: &str,
    version: &str,
    versions: &[String],
    last_updated: &str,
) -> String {
    let versions: String = versions
        .iter()
        .map(|v| format!("      <version>{v}</version>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>{group_id}</groupId>
  <artifactId>{artifact_id}</artifactId>
  <versioning>
    <latest>{version}</latest>
    <release>{version}</release>
    <versions>
{versions}    </versions>
    <lastUpdated>{last_updated}</lastUpdated>
  </versioning>
</metadata>
"#
    )
}
