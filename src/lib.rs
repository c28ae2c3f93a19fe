//! # webview-natives
//!
//! Repackages the prebuilt `webview` shared libraries attached to a GitHub
//! release into Maven artifacts: one jar per platform edition plus an
//! all-natives jar, with every library stored at
//! `net/notjustanna/webview/natives/<edition>/<library>`. Also renders a
//! markdown index of a published repository.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webview_natives::{Api, Coordinates, LocalRepository, NativesConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = NativesConfig::load("gradle.properties".as_ref()).unwrap();
//!     let build = Api::new()
//!         .repo(&config.repo)
//!         .release(&config.release)
//!         .build(&config.editions)
//!         .await
//!         .unwrap();
//!
//!     let coordinates = Coordinates::for_release(
//!         "net.notjustanna.webview",
//!         "webview_java",
//!         &config.base_version,
//!         &build.release,
//!     );
//!     build.publish(&LocalRepository::new(".repo"), &coordinates).unwrap();
//! }
//! ```

pub mod aggregate;
pub mod api;
pub mod config;
pub mod downloader;
pub mod edition;
pub mod error;
pub mod extract;
pub mod index;
pub mod matcher;
pub mod packager;
pub mod progress;
pub mod publish;
pub mod release;
pub mod selector;

pub use api::{Api, NativesBuild};
pub use config::NativesConfig;
pub use downloader::Downloader;
pub use edition::{Edition, PlatformFamily};
pub use error::{Error, Stage};
pub use index::{generate_index, IndexOptions};
pub use progress::default_progress_fn;
pub use publish::{Coordinates, LocalRepository};
pub use release::{Asset, ReleaseDescriptor};
