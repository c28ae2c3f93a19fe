use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;

use crate::edition::Edition;

pub const KEY_REPO: &str = "natives.github-repo";
pub const KEY_RELEASE: &str = "natives.github-release";
pub const KEY_EDITIONS: &str = "natives.editions";
pub const KEY_BASE_VERSION: &str = "webview_java.version";

const DEFAULT_BASE_VERSION: &str = "0.0.0";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required property `{0}`")]
    MissingProperty(String),

    #[error("invalid edition name `{0}`")]
    InvalidEdition(String),

    #[error("edition `{0}` has no native identifier (natives.editions.{0}.identifier)")]
    MissingIdentifier(String),

    #[error("no editions configured")]
    NoEditions,

    #[error("edition `{0}` is configured more than once")]
    DuplicateEdition(String),
}

/// Typed view of the natives properties file.
#[derive(Debug, Clone)]
pub struct NativesConfig {
    /// Upstream repository in `owner/repo` format.
    pub repo: String,
    /// Upstream release tag.
    pub release: String,
    /// Editions in configured order.
    pub editions: Vec<Edition>,
    /// Version prefix of the published artifacts.
    pub base_version: String,
}

impl NativesConfig {
    /// Read and parse a properties file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_properties(&raw)
    }

    /// Parse properties text.
    pub fn from_properties(text: &str) -> Result<Self, ConfigError> {
        let props = parse_properties(text);
        let required = |key: &str| {
            props
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::MissingProperty(key.to_owned()))
        };

        let repo = required(KEY_REPO)?;
        let release = required(KEY_RELEASE)?;

        let editions = props
            .get(KEY_EDITIONS)
            .map(String::as_str)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                let identifier = props
                    .get(&format!("{KEY_EDITIONS}.{name}.identifier"))
                    .ok_or_else(|| ConfigError::MissingIdentifier(name.to_owned()))?;
                Edition::new(name, identifier)
            })
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(&editions)?;

        let base_version = props
            .get(KEY_BASE_VERSION)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_VERSION.to_owned());

        Ok(Self {
            repo,
            release,
            editions,
            base_version,
        })
    }
}

/// Editions own their work directories, so a name may appear only once.
pub(crate) fn ensure_unique(editions: &[Edition]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    match editions.iter().find(|e| !seen.insert(e.name())) {
        Some(dup) => Err(ConfigError::DuplicateEdition(dup.name().to_owned())),
        None => Ok(()),
    }
}

/// Minimal Java-properties reader: `key=value` or `key: value`, `#`/`!` comments.
fn parse_properties(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let (key, value) = line.split_at(split);
            Some((key.trim().to_owned(), value[1..].trim().to_owned()))
        })
        .collect()
}
