use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::{ZipArchive, ZipWriter};

use crate::downloader::part_path;
use crate::packager::{file_options, PackError, PlatformPackage};

/// Zip whose entries are the union of every platform package's entries.
#[derive(Debug, Clone)]
pub struct AggregatePackage {
    pub path: PathBuf,
    pub entries: Vec<String>,
}

/// Merge `packages` into a single zip at `out_path`.
///
/// Entries keep their names. Edition namespacing keeps them disjoint; a
/// duplicate name is reported as a collision instead of being overwritten.
pub fn aggregate(packages: &[PlatformPackage], out_path: &Path) -> Result<AggregatePackage, PackError> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Written beside the target and renamed once complete.
    let part = part_path(out_path);
    let entries = match write_union(packages, &part) {
        Ok(entries) => entries,
        Err(e) => {
            let _ = fs::remove_file(&part);
            return Err(e);
        }
    };
    fs::rename(&part, out_path)?;

    info!(
        packages = packages.len(),
        entries = entries.len(),
        path = %out_path.display(),
        "assembled all-natives package"
    );
    Ok(AggregatePackage {
        path: out_path.to_path_buf(),
        entries,
    })
}

fn write_union(packages: &[PlatformPackage], path: &Path) -> Result<Vec<String>, PackError> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for package in packages {
        let mut archive = ZipArchive::new(File::open(&package.path)?)?;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_owned();
            if !seen.insert(name.clone()) {
                return Err(PackError::Collision { entry: name });
            }
            zip.start_file(name.as_str(), file_options())?;
            io::copy(&mut file, &mut zip)?;
            entries.push(name);
        }
    }
    zip.finish()?;
    Ok(entries)
}
