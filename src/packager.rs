use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::edition::{Edition, NATIVES_PATH_PREFIX};
use crate::selector::SelectedLibraryFile;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("entry {entry} appears in more than one package")]
    Collision { entry: String },
}

/// Zip holding a single edition's native library.
#[derive(Debug, Clone)]
pub struct PlatformPackage {
    pub edition: Edition,
    pub path: PathBuf,
}

pub(crate) fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755)
}

/// Write `out_path` as a zip containing exactly `selected`, stored at
/// `net/notjustanna/webview/natives/<edition>/<canonical name>`.
pub fn pack(
    selected: &SelectedLibraryFile,
    edition: &Edition,
    out_path: &Path,
) -> Result<PlatformPackage, PackError> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let entry = format!(
        "{NATIVES_PATH_PREFIX}/{}/{}",
        edition.name(),
        selected.canonical_name
    );
    let mut zip = ZipWriter::new(File::create(out_path)?);
    zip.start_file(entry.as_str(), file_options())?;
    io::copy(&mut File::open(&selected.path)?, &mut zip)?;
    zip.finish()?;

    info!(edition = edition.name(), %entry, package = %out_path.display(), "packed native library");
    Ok(PlatformPackage {
        edition: edition.clone(),
        path: out_path.to_path_buf(),
    })
}

/// File entry names of a zip, in archive order. Directory entries are skipped.
pub fn package_entries(path: &Path) -> Result<Vec<String>, PackError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if !file.is_dir() {
            names.push(file.name().to_owned());
        }
    }
    Ok(names)
}
