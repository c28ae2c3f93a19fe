use std::fmt;

use crate::config::ConfigError;

/// Base name shared by every platform's native library.
pub const LIBRARY_BASE_NAME: &str = "webview";

/// Directory inside every package under which natives are namespaced.
pub const NATIVES_PATH_PREFIX: &str = "net/notjustanna/webview/natives";

// ──────────────────────────────────────────────────────────────────────────────
// PlatformFamily
// ──────────────────────────────────────────────────────────────────────────────

/// Operating-system family of an edition, derived once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Windows,
    Linux,
    /// Anything that is neither Windows nor Linux (macOS and friends).
    MacLike,
}

impl PlatformFamily {
    /// Classify an edition name by prefix: `windows*`, `linux*`, or everything else.
    pub fn from_edition_name(name: &str) -> Self {
        if name.starts_with("windows") {
            Self::Windows
        } else if name.starts_with("linux") {
            Self::Linux
        } else {
            Self::MacLike
        }
    }

    /// File name the selected library is renamed to inside packages.
    pub fn canonical_file_name(self) -> &'static str {
        match self {
            Self::Windows => "webview.dll",
            Self::Linux => "libwebview.so",
            Self::MacLike => "libwebview.dylib",
        }
    }

    /// Shared-library extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Windows => "dll",
            Self::Linux => "so",
            Self::MacLike => "dylib",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacLike => "macos",
        })
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Edition
// ──────────────────────────────────────────────────────────────────────────────

/// A statically configured native target such as `linux-x86-64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    name: String,
    identifier: String,
    family: PlatformFamily,
}

impl Edition {
    /// Create an edition from its logical name and the upstream native identifier
    /// used to build the expected asset file name.
    ///
    /// The name ends up as a path component in staging directories and package
    /// entries, so separators and `..` are rejected.
    pub fn new(name: &str, identifier: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        let identifier = identifier.trim();

        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(ConfigError::InvalidEdition(name.to_owned()));
        }
        if identifier.is_empty() {
            return Err(ConfigError::MissingIdentifier(name.to_owned()));
        }

        Ok(Self {
            family: PlatformFamily::from_edition_name(name),
            name: name.to_owned(),
            identifier: identifier.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn family(&self) -> PlatformFamily {
        self.family
    }

    /// Asset file name this edition expects in the release, e.g.
    /// `webview-linux-x64-lib.tar.gz`.
    pub fn expected_asset_name(&self) -> String {
        format!("{}-lib.tar.gz", self.identifier)
    }

    /// Entry path of the library inside this edition's package.
    pub fn package_entry_path(&self) -> String {
        format!(
            "{NATIVES_PATH_PREFIX}/{}/{}",
            self.name,
            self.family.canonical_file_name()
        )
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
