//! Crate-level error taxonomy.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::downloader::FetchError;
use crate::extract::ExtractError;
use crate::index::IndexError;
use crate::matcher::MatchError;
use crate::packager::PackError;
use crate::publish::PublishError;
use crate::release::ResolveError;
use crate::selector::SelectError;

/// Pipeline stage a single edition failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Match,
    Fetch,
    Extract,
    Select,
    Pack,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Match => "match",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Select => "select",
            Self::Pack => "pack",
        })
    }
}

/// Failure inside one edition's pipeline.
#[derive(Error, Debug)]
pub enum EditionError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Pack(#[from] PackError),
}

impl EditionError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Match(_) => Stage::Match,
            Self::Fetch(_) => Stage::Fetch,
            Self::Extract(_) => Stage::Extract,
            Self::Select(_) => Stage::Select,
            Self::Pack(_) => Stage::Pack,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to resolve release {repo}@{tag}: {source}")]
    Resolve {
        repo: String,
        tag: String,
        #[source]
        source: ResolveError,
    },

    #[error("edition `{edition}` failed during {}: {source}", .source.stage())]
    Edition {
        edition: String,
        #[source]
        source: EditionError,
    },

    #[error("edition `{edition}` task failed: {message}")]
    Task { edition: String, message: String },

    #[error("failed to assemble all-natives package: {0}")]
    Aggregate(#[source] PackError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("index generation failed: {0}")]
    Index(#[from] IndexError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl Error {
    /// Stage of a per-edition failure, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Edition { source, .. } => Some(source.stage()),
            _ => None,
        }
    }
}
