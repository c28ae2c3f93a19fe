//! Gzip tarball extraction into a staging directory.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::EntryType;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported entry type {kind:?} at {}", .path.display())]
    UnsupportedEntry { path: PathBuf, kind: EntryType },

    #[error("invalid path in archive: {}", .0.display())]
    UnsafePath(PathBuf),

    #[error("hard link {} points at missing {}", .path.display(), .target.display())]
    DanglingLink { path: PathBuf, target: PathBuf },
}

/// Unpack a `.tar.gz` file into `dest_dir`, creating it when absent.
///
/// Returns the paths (relative to `dest_dir`) of every file written.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let file = File::open(archive_path)?;
    let gz = GzDecoder::new(BufReader::new(file));
    extract_tar(gz, dest_dir)
}

/// Unpack a tar stream into `dest_dir`.
///
/// Symlinks are written as empty placeholder files and hard links as copies of
/// their target, so the staged tree holds only directories and regular files.
pub fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut written = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative = sanitize(&entry.path()?)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let outpath = dest_dir.join(&relative);

        let kind = entry.header().entry_type();
        match kind {
            EntryType::Directory => {
                fs::create_dir_all(&outpath)?;
                continue;
            }
            EntryType::XGlobalHeader
            | EntryType::XHeader
            | EntryType::GNULongName
            | EntryType::GNULongLink => continue,
            _ => {}
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }

        match kind {
            EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
                entry.unpack(&outpath)?;
            }
            EntryType::Symlink => {
                File::create(&outpath)?;
            }
            EntryType::Link => {
                let link = entry
                    .link_name()?
                    .ok_or_else(|| ExtractError::UnsafePath(relative.clone()))?;
                let target = dest_dir.join(sanitize(&link)?);
                if !target.is_file() {
                    return Err(ExtractError::DanglingLink {
                        path: relative,
                        target: link.into_owned(),
                    });
                }
                fs::copy(&target, &outpath)?;
            }
            other => {
                return Err(ExtractError::UnsupportedEntry {
                    path: relative,
                    kind: other,
                })
            }
        }

        debug!(path = %relative.display(), "extracted");
        written.push(relative);
    }

    Ok(written)
}

/// Reject absolute paths and `..` so nothing lands outside the destination.
fn sanitize(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(ExtractError::UnsafePath(path.to_path_buf())),
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    enum Item<'a> {
        File(&'a str, &'a [u8]),
        Symlink(&'a str, &'a str),
        HardLink(&'a str, &'a str),
        Fifo(&'a str),
        /// Written without path validation so `..` survives into the header.
        RawPath(&'a [u8], &'a [u8]),
    }

    /// Build a gzip tarball in memory.
    fn tar_gz(items: &[Item<'_>]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for item in items {
            let mut header = tar::Header::new_gnu();
            match item {
                Item::File(path, data) => {
                    header.set_entry_type(EntryType::Regular);
                    header.set_size(data.len() as u64);
                    header.set_mode(0o644);
                    builder.append_data(&mut header, path, *data).unwrap();
                }
                Item::Symlink(path, target) => {
                    header.set_entry_type(EntryType::Symlink);
                    header.set_size(0);
                    header.set_mode(0o777);
                    builder.append_link(&mut header, path, target).unwrap();
                }
                Item::HardLink(path, target) => {
                    header.set_entry_type(EntryType::Link);
                    header.set_size(0);
                    header.set_mode(0o644);
                    builder.append_link(&mut header, path, target).unwrap();
                }
                Item::Fifo(path) => {
                    header.set_entry_type(EntryType::Fifo);
                    header.set_size(0);
                    header.set_mode(0o644);
                    builder.append_data(&mut header, path, io::empty()).unwrap();
                }
                Item::RawPath(name, data) => {
                    header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
                    header.set_entry_type(EntryType::Regular);
                    header.set_size(data.len() as u64);
                    header.set_mode(0o644);
                    header.set_cksum();
                    builder.append(&header, *data).unwrap();
                }
            }
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    fn sample() -> Vec<u8> {
        tar_gz(&[
            Item::File("webview/lib/libwebview.so.0.12.0", b"\x7fELF real library"),
            Item::Symlink("webview/lib/libwebview.so", "libwebview.so.0.12.0"),
            Item::File("webview/include/webview.h", b"#pragma once\n"),
        ])
    }

    #[test]
    fn preserves_relative_paths_and_creates_dest() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        fs::write(&archive, sample()).unwrap();
        let out = dir.path().join("nested/out");

        let written = extract_tar_gz(&archive, &out).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(
            fs::read(out.join("webview/lib/libwebview.so.0.12.0")).unwrap(),
            b"\x7fELF real library"
        );
        let placeholder = out.join("webview/lib/libwebview.so");
        assert!(fs::symlink_metadata(&placeholder).unwrap().is_file());
        assert_eq!(fs::metadata(&placeholder).unwrap().len(), 0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        fs::write(&archive, sample()).unwrap();

        extract_tar_gz(&archive, &dir.path().join("one")).unwrap();
        extract_tar_gz(&archive, &dir.path().join("two")).unwrap();

        assert_eq!(snapshot(&dir.path().join("one")), snapshot(&dir.path().join("two")));
    }

    #[test]
    fn corrupt_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bad.tar.gz");
        fs::write(&archive, b"definitely not gzip").unwrap();

        assert!(extract_tar_gz(&archive, &dir.path().join("out")).is_err());
    }

    fn extract_items(items: &[Item<'_>]) -> (tempfile::TempDir, Result<Vec<PathBuf>, ExtractError>) {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        fs::write(&archive, tar_gz(items)).unwrap();
        let result = extract_tar_gz(&archive, &dir.path().join("out"));
        (dir, result)
    }

    #[test]
    fn hard_link_becomes_a_copy() {
        let (dir, result) = extract_items(&[
            Item::File("lib/libwebview.so.1", b"\x7fELF"),
            Item::HardLink("lib/libwebview.so", "lib/libwebview.so.1"),
        ]);

        assert_eq!(result.unwrap().len(), 2);
        let copy = dir.path().join("out/lib/libwebview.so");
        assert!(fs::symlink_metadata(&copy).unwrap().is_file());
        assert_eq!(fs::read(copy).unwrap(), b"\x7fELF");
    }

    #[test]
    fn dangling_hard_link_fails() {
        let (_dir, result) = extract_items(&[Item::HardLink("lib/libwebview.so", "lib/missing.so")]);

        match result {
            Err(ExtractError::DanglingLink { path, target }) => {
                assert_eq!(path, Path::new("lib/libwebview.so"));
                assert_eq!(target, Path::new("lib/missing.so"));
            }
            other => panic!("expected a dangling link, got {other:?}"),
        }
    }

    #[test]
    fn fifo_entry_is_unsupported() {
        let (_dir, result) = extract_items(&[
            Item::File("lib/libwebview.so", b"\x7fELF"),
            Item::Fifo("lib/pipe"),
        ]);

        assert!(matches!(
            result,
            Err(ExtractError::UnsupportedEntry { kind: EntryType::Fifo, .. })
        ));
    }

    #[test]
    fn parent_dir_entry_is_rejected() {
        let (dir, result) = extract_items(&[Item::RawPath(b"../escape.txt", b"nope")]);

        assert!(matches!(result, Err(ExtractError::UnsafePath(_))));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn sanitize_rejects_escapes() {
        assert!(sanitize(Path::new("../etc/passwd")).is_err());
        assert!(sanitize(Path::new("/abs/path")).is_err());
        assert_eq!(sanitize(Path::new("./a/b")).unwrap(), PathBuf::from("a/b"));
    }
}
