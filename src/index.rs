//! Markdown index of a published Maven repository.
//!
//! Every `maven-metadata.xml` below the root becomes one table row. Fields are
//! pulled line by line; a later matching line overwrites an earlier one, and a
//! field that never matches leaves its cell blank.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File name of the per-artifact descriptor.
pub const DESCRIPTOR_FILE_NAME: &str = "maven-metadata.xml";

static GROUP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<groupId>(.+?)</groupId>\s*$").expect("valid regex"));
static ARTIFACT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<artifactId>(.+?)</artifactId>\s*$").expect("valid regex"));
static RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<release>(.+?)</release>\s*$").expect("valid regex"));

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fields extracted from one descriptor file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest_version: Option<String>,
}

impl RepositoryDescriptor {
    /// Scan `content` line by line. The last matching line wins per field.
    pub fn parse(content: &str) -> Self {
        let mut descriptor = Self::default();
        for line in content.lines() {
            if let Some(c) = GROUP_ID.captures(line) {
                descriptor.group_id = Some(c[1].to_owned());
            }
            if let Some(c) = ARTIFACT_ID.captures(line) {
                descriptor.artifact_id = Some(c[1].to_owned());
            }
            if let Some(c) = RELEASE.captures(line) {
                descriptor.latest_version = Some(c[1].to_owned());
            }
        }
        descriptor
    }
}

/// Text placed above the table.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub title: String,
    pub description: String,
    pub repository_url: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            title: "Webview Java".to_owned(),
            description: "Public maven repository for Webview Java".to_owned(),
            repository_url: "https://github.com/NotJustAnna/webview_java/raw/maven".to_owned(),
        }
    }
}

/// Collect descriptors under `root` in walk order (sorted by file name at every level).
///
/// Unreadable entries are logged and skipped; an unreadable descriptor still
/// yields a blank row.
pub fn collect_descriptors(root: &Path) -> Result<Vec<RepositoryDescriptor>, IndexError> {
    if !root.is_dir() {
        return Err(IndexError::NotADirectory(root.to_path_buf()));
    }

    let mut descriptors = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable repository entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != DESCRIPTOR_FILE_NAME {
            continue;
        }

        let descriptor = match std::fs::read(entry.path()) {
            Ok(bytes) => RepositoryDescriptor::parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "unreadable descriptor");
                RepositoryDescriptor::default()
            }
        };
        debug!(path = %entry.path().display(), ?descriptor, "read descriptor");
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

fn cell(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("`{v}`"),
        None => String::new(),
    }
}

/// Render the preamble and table.
pub fn render(descriptors: &[RepositoryDescriptor], options: &IndexOptions) -> String {
    let mut doc = format!(
        "# {}\n\n{}\n\n**Repository URL**: `{}`\n\n",
        options.title, options.description, options.repository_url
    );
    doc.push_str("| Group ID | Artifact ID | Latest Version |\n| --- | --- | --- |\n");

    let rows: Vec<String> = descriptors
        .iter()
        .map(|d| {
            format!(
                "| {} | {} | {} |",
                cell(d.group_id.as_deref()),
                cell(d.artifact_id.as_deref()),
                cell(d.latest_version.as_deref())
            )
        })
        .collect();
    doc.push_str(&rows.join("\n"));
    doc
}

/// Scan `root` and write the index document to `output`, replacing it.
pub fn generate_index(root: &Path, output: &Path, options: &IndexOptions) -> Result<usize, IndexError> {
    let descriptors = collect_descriptors(root)?;
    let doc = render(&descriptors, options);

    std::fs::write(output, doc).map_err(|source| IndexError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    info!(rows = descriptors.len(), output = %output.display(), "wrote repository index");
    Ok(descriptors.len())
}
