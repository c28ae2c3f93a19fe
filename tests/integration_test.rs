/// End-to-end pipeline runs against a mock release server.
#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::Read;
    use std::path::Path;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use mockito::{Server, ServerGuard};
    use webview_natives::index::{collect_descriptors, DESCRIPTOR_FILE_NAME};
    use webview_natives::packager::package_entries;
    use webview_natives::{Api, Coordinates, Edition, Error, LocalRepository, Stage};

    fn tar_gz(files: &[(&str, &str)], symlinks: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, path, data.as_bytes()).unwrap();
        }
        for (path, target) in symlinks {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_size(0);
            header.set_mode(0o777);
            builder.append_link(&mut header, path, target).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn editions() -> Vec<Edition> {
        vec![
            Edition::new("linux-x86-64", "webview-linux-x64").unwrap(),
            Edition::new("windows-x86-64", "webview-windows-x64").unwrap(),
            Edition::new("darwin", "webview-macos-universal").unwrap(),
        ]
    }

    /// Tarball laid out the way upstream ships the given identifier.
    fn edition_tarball(id: &str) -> Vec<u8> {
        if id.contains("windows") {
            tar_gz(
                &[
                    ("webview/bin/webview.dll", "MZ windows dll"),
                    ("webview/lib/webview.lib", "import lib"),
                ],
                &[],
            )
        } else if id.contains("linux") {
            tar_gz(
                &[("webview/lib/libwebview.so.0.12.0", "\x7fELF linux so")],
                &[
                    ("webview/lib/libwebview.so", "libwebview.so.0"),
                    ("webview/lib/libwebview.so.0", "libwebview.so.0.12.0"),
                ],
            )
        } else {
            tar_gz(
                &[("webview/lib/libwebview.0.12.0.dylib", "mach-o dylib")],
                &[("webview/lib/libwebview.dylib", "libwebview.0.12.0.dylib")],
            )
        }
    }

    /// Serve a release whose assets cover `identifiers`.
    async fn release_server(identifiers: &[&str]) -> (ServerGuard, Vec<mockito::Mock>) {
        let assets = identifiers
            .iter()
            .map(|id| (*id, edition_tarball(id)))
            .collect::<Vec<_>>();
        release_server_with(assets).await
    }

    /// Serve a release with one asset per `(identifier, tarball)` pair.
    async fn release_server_with(assets: Vec<(&str, Vec<u8>)>) -> (ServerGuard, Vec<mockito::Mock>) {
        let mut server = Server::new_async().await;
        let base = server.url();
        let mut mocks = Vec::new();

        let listing: Vec<String> = assets
            .iter()
            .map(|(id, _)| {
                format!(
                    r#"{{"name": "{id}-lib.tar.gz", "browser_download_url": "{base}/download/0.12.0/{id}-lib.tar.gz"}}"#
                )
            })
            .collect();
        mocks.push(
            server
                .mock("GET", "/repos/webview/webview/releases/tags/0.12.0+ci.7")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(format!(r#"{{"tag_name": "0.12.0+ci.7", "assets": [{}]}}"#, listing.join(",")))
                .create_async()
                .await,
        );

        for (id, body) in assets {
            mocks.push(
                server
                    .mock("GET", format!("/download/0.12.0/{id}-lib.tar.gz").as_str())
                    .with_status(200)
                    .with_body(body)
                    .create_async()
                    .await,
            );
        }

        (server, mocks)
    }

    fn read_entry(zip_path: &Path, name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
        let mut out = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    async fn build_and_publish(concurrent: bool) {
        let (server, _mocks) = release_server(&[
            "webview-linux-x64",
            "webview-windows-x64",
            "webview-macos-universal",
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let editions = editions();

        let build = Api::new()
            .no_progress()
            .set_api_base(&server.url())
            .set_work_dir(dir.path().join("work"))
            .set_concurrent(concurrent)
            .repo("webview/webview")
            .release("0.12.0+ci.7")
            .build(&editions)
            .await
            .unwrap();

        assert_eq!(build.packages.len(), 3);
        for (package, edition) in build.packages.iter().zip(&editions) {
            assert_eq!(package.edition.name(), edition.name());
            assert_eq!(
                package_entries(&package.path).unwrap(),
                [edition.package_entry_path()]
            );
        }

        let mut entries = package_entries(&build.aggregate.path).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            [
                "net/notjustanna/webview/natives/darwin/libwebview.dylib",
                "net/notjustanna/webview/natives/linux-x86-64/libwebview.so",
                "net/notjustanna/webview/natives/windows-x86-64/webview.dll",
            ]
        );
        assert_eq!(
            read_entry(
                &build.aggregate.path,
                "net/notjustanna/webview/natives/linux-x86-64/libwebview.so"
            ),
            b"\x7fELF linux so"
        );

        let coordinates =
            Coordinates::for_release("net.notjustanna.webview", "webview_java", "3.1.0", &build.release);
        let repository = LocalRepository::new(dir.path().join(".repo"));
        let published = build.publish(&repository, &coordinates).unwrap();

        let ids: Vec<&str> = published.iter().map(|p| p.artifact_id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "webview_java-native-linux-x86-64",
                "webview_java-native-windows-x86-64",
                "webview_java-native-darwin",
                "webview_java-all-natives",
            ]
        );
        assert!(published.iter().all(|p| p.version == "3.1.0+wv0.12.0" && p.jar.is_file()));

        let descriptors = collect_descriptors(repository.root()).unwrap();
        let artifacts: Vec<&str> = descriptors
            .iter()
            .map(|d| d.artifact_id.as_deref().unwrap())
            .collect();
        assert_eq!(
            artifacts,
            [
                "webview_java-all-natives",
                "webview_java-native-darwin",
                "webview_java-native-linux-x86-64",
                "webview_java-native-windows-x86-64",
            ]
        );
        assert!(repository
            .artifact_dir("net.notjustanna.webview", "webview_java-all-natives")
            .join(DESCRIPTOR_FILE_NAME)
            .is_file());
    }

    #[tokio::test]
    async fn sequential_build_publishes_every_edition() {
        build_and_publish(false).await;
    }

    #[tokio::test]
    async fn concurrent_build_matches_sequential() {
        build_and_publish(true).await;
    }

    #[tokio::test]
    async fn missing_edition_asset_aborts_before_aggregate() {
        let (server, _mocks) = release_server(&["webview-linux-x64", "webview-windows-x64"]).await;
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");

        let err = Api::new()
            .no_progress()
            .set_api_base(&server.url())
            .set_work_dir(&work)
            .repo("webview/webview")
            .release("0.12.0+ci.7")
            .build(&editions())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Match));
        assert!(matches!(err, Error::Edition { ref edition, .. } if edition == "darwin"));
        assert!(!work.join("all-natives.zip").exists());
    }

    #[tokio::test]
    async fn concurrent_failure_reports_first_edition_in_order() {
        // windows has no dll and fails at selection, after darwin has already
        // failed to match. windows comes first in the configured order.
        let (server, _mocks) = release_server_with(vec![
            ("webview-linux-x64", edition_tarball("webview-linux-x64")),
            (
                "webview-windows-x64",
                tar_gz(&[("webview/lib/webview.lib", "import lib")], &[]),
            ),
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("all-natives.zip"), "stale").unwrap();

        let err = Api::new()
            .no_progress()
            .set_api_base(&server.url())
            .set_work_dir(&work)
            .set_concurrent(true)
            .repo("webview/webview")
            .release("0.12.0+ci.7")
            .build(&editions())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Edition { ref edition, .. } if edition == "windows-x86-64"));
        assert_eq!(err.stage(), Some(Stage::Select));
        assert!(!work.join("all-natives.zip").exists());
    }

    #[tokio::test]
    async fn unknown_release_is_a_resolution_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/webview/webview/releases/tags/nope")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let err = Api::new()
            .no_progress()
            .set_api_base(&server.url())
            .set_work_dir(dir.path())
            .repo("webview/webview")
            .release("nope")
            .build(&editions())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Resolve { .. }));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
