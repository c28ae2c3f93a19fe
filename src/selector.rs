use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::edition::{Edition, PlatformFamily, LIBRARY_BASE_NAME};

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("no native library for {edition} matching {pattern}")]
    Missing { edition: String, pattern: String },

    #[error("ambiguous native library for {edition} matching {pattern}: {}", display_paths(.candidates))]
    Ambiguous {
        edition: String,
        pattern: String,
        candidates: Vec<PathBuf>,
    },

    #[error("failed to walk staged tree: {0}")]
    Walk(#[from] walkdir::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The one file in a staged tree that is the edition's native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedLibraryFile {
    /// Location inside the staged tree.
    pub path: PathBuf,
    /// Name the file takes inside packages.
    pub canonical_name: &'static str,
}

/// Human-readable form of the family's rule, used in error messages.
pub fn selection_pattern(family: PlatformFamily) -> String {
    match family {
        PlatformFamily::Windows => format!("bin/{LIBRARY_BASE_NAME}.dll"),
        _ => format!(
            "lib{LIBRARY_BASE_NAME}.*.{}* (non-empty)",
            family.extension()
        ),
    }
}

fn qualifies(family: PlatformFamily, path: &Path, len: u64) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    match family {
        PlatformFamily::Windows => {
            let in_bin = path
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|p| p == "bin");
            in_bin && name == format!("{LIBRARY_BASE_NAME}.dll")
        }
        PlatformFamily::Linux | PlatformFamily::MacLike => {
            name.starts_with(&format!("lib{LIBRARY_BASE_NAME}."))
                && name.contains(&format!(".{}", family.extension()))
                && len > 0
        }
    }
}

/// Pick the edition's library out of `staged_root`.
///
/// Only regular files are considered; symlinks never qualify. Exactly one
/// candidate must match the family rule.
pub fn select_library(
    staged_root: &Path,
    edition: &Edition,
) -> Result<SelectedLibraryFile, SelectError> {
    let family = edition.family();
    let mut candidates = Vec::new();

    for entry in WalkDir::new(staged_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let len = entry.metadata()?.len();
        if qualifies(family, entry.path(), len) {
            candidates.push(entry.into_path());
        }
    }

    let pattern = selection_pattern(family);
    match candidates.len() {
        0 => Err(SelectError::Missing {
            edition: edition.name().to_owned(),
            pattern,
        }),
        1 => {
            let path = candidates.remove(0);
            debug!(edition = edition.name(), path = %path.display(), "selected native library");
            Ok(SelectedLibraryFile {
                path,
                canonical_name: family.canonical_file_name(),
            })
        }
        _ => Err(SelectError::Ambiguous {
            edition: edition.name().to_owned(),
            pattern,
            candidates,
        }),
    }
}
