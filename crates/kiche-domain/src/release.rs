//! Release descriptors parsed from python-build-standalone asset URLs.
//!
//! Asset names follow
//! `<prefix>-<version>+<build>-<arch>-<distrib>-<platform>-<variant>.<extension>`,
//! e.g. `cpython-3.10.13%2B20240107-x86_64-unknown-linux-gnu-install_only.tar.gz`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::issue::ProvisionIssue;
use crate::platform::OsFamily;
use crate::version::InterpreterVersion;

pub const CHECKSUM_SUFFIX: &str = ".sha256";
/// Aggregate checksum manifest published alongside the archives.
pub const CHECKSUM_MANIFEST: &str = "SHA256SUMS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    url: String,
    checksum_url: String,
    basename: String,
    version: InterpreterVersion,
    arch: String,
    distrib: String,
    platform: String,
    variant: String,
    extension: String,
}

impl ReleaseDescriptor {
    pub fn parse(url: &str) -> Result<Self, ProvisionIssue> {
        let malformed = |reason: &str| ProvisionIssue::MalformedAsset {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url).map_err(|err| malformed(&err.to_string()))?;
        let basename = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| malformed("url has no file name"))?
            .to_string();

        let mut head = basename.splitn(3, '-');
        let (Some(_prefix), Some(python), Some(context)) = (head.next(), head.next(), head.next())
        else {
            return Err(malformed("expected '<prefix>-<version>-<target>'"));
        };
        // `+` arrives percent-encoded as `%2B` in download URLs
        let version_token = python.split(['%', '+']).next().unwrap_or_default();
        let version = version_token
            .parse::<InterpreterVersion>()
            .map_err(|err| malformed(&err.to_string()))?;

        let mut fields = context.splitn(4, '-');
        let (Some(arch), Some(distrib), Some(platform), Some(tail)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed(
                "expected '<arch>-<distrib>-<platform>-<variant>.<extension>'",
            ));
        };
        let Some((variant, extension)) = tail.split_once('.') else {
            return Err(malformed("missing archive extension"));
        };

        Ok(Self {
            url: url.to_string(),
            checksum_url: format!("{url}{CHECKSUM_SUFFIX}"),
            version,
            arch: arch.to_string(),
            distrib: distrib.to_string(),
            platform: platform.to_string(),
            variant: variant.to_string(),
            extension: format!(".{extension}"),
            // moved last; the fields above borrow from it
            basename,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn checksum_url(&self) -> &str {
        &self.checksum_url
    }

    #[must_use]
    pub fn basename(&self) -> &str {
        &self.basename
    }

    #[must_use]
    pub fn version(&self) -> &InterpreterVersion {
        &self.version
    }

    #[must_use]
    pub fn python_version(&self) -> &str {
        self.version.as_str()
    }

    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    #[must_use]
    pub fn distrib(&self) -> &str {
        &self.distrib
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Layout family of the extracted archive.
    #[must_use]
    pub fn os_family(&self) -> OsFamily {
        if self.platform == "windows" {
            OsFamily::Windows
        } else {
            OsFamily::Posix
        }
    }

    /// Where the interpreter lives once the archive is extracted into `root`.
    #[must_use]
    pub fn interpreter_path(&self, root: &Path) -> PathBuf {
        interpreter_location(root, self.os_family())
    }
}

impl fmt::Display for ReleaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReleaseDescriptor({})", self.url)
    }
}

#[must_use]
pub fn interpreter_location(root: &Path, family: OsFamily) -> PathBuf {
    match family {
        OsFamily::Windows => root.join("python").join("python.exe"),
        OsFamily::Posix => root.join("python").join("bin").join("python3"),
    }
}

/// Subset of the GitHub "latest release" payload that the catalog needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDocument {
    #[serde(default)]
    pub tag_name: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub browser_download_url: String,
}

impl ReleaseDocument {
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// One descriptor per downloadable asset, skipping the checksum manifest.
    pub fn descriptors(&self) -> Result<Vec<ReleaseDescriptor>, ProvisionIssue> {
        self.assets
            .iter()
            .filter(|asset| !asset.browser_download_url.ends_with(CHECKSUM_MANIFEST))
            .map(|asset| ReleaseDescriptor::parse(&asset.browser_download_url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARWIN: &str = "https://github.com/indygreg/python-build-standalone/releases/download/20240107/cpython-3.10.13%2B20240107-aarch64-apple-darwin-install_only.tar.gz";

    #[test]
    fn parses_documented_asset_shape() {
        let release = ReleaseDescriptor::parse(DARWIN).expect("well-formed asset");
        assert_eq!(release.python_version(), "3.10.13");
        assert_eq!(release.arch(), "aarch64");
        assert_eq!(release.distrib(), "apple");
        assert_eq!(release.platform(), "darwin");
        assert_eq!(release.variant(), "install_only");
        assert_eq!(release.extension(), ".tar.gz");
        assert_eq!(
            release.basename(),
            "cpython-3.10.13%2B20240107-aarch64-apple-darwin-install_only.tar.gz"
        );
        assert_eq!(release.checksum_url(), format!("{DARWIN}.sha256"));
        assert_eq!(release.os_family(), OsFamily::Posix);
    }

    #[test]
    fn variant_keeps_inner_dashes_and_extension_keeps_dots() {
        let release = ReleaseDescriptor::parse(
            "https://example.invalid/20240107/cpython-3.10.13%2B20240107-x86_64-unknown-linux-musl-install_only.tar.gz.sha256",
        )
        .expect("well-formed asset");
        assert_eq!(release.platform(), "linux");
        assert_eq!(release.variant(), "musl-install_only");
        assert_eq!(release.extension(), ".tar.gz.sha256");

        let windows = ReleaseDescriptor::parse(
            "https://example.invalid/20240107/cpython-3.12.1%2B20240107-x86_64-pc-windows-msvc-shared-install_only.tar.gz",
        )
        .expect("well-formed asset");
        assert_eq!(windows.platform(), "windows");
        assert_eq!(windows.variant(), "msvc-shared-install_only");
        assert_eq!(windows.os_family(), OsFamily::Windows);
    }

    #[test]
    fn literal_plus_build_tag_is_stripped() {
        let release = ReleaseDescriptor::parse(
            "https://example.invalid/cpython-3.11.7+20240107-x86_64-apple-darwin-install_only.tar.gz",
        )
        .expect("well-formed asset");
        assert_eq!(release.python_version(), "3.11.7");
    }

    #[test]
    fn malformed_assets_are_errors() {
        for url in [
            "not a url",
            "https://example.invalid/",
            "https://example.invalid/cpython.tar.gz",
            "https://example.invalid/cpython-3.10.13%2B20240107-x86_64-linux.tar.gz",
            "https://example.invalid/cpython-3.x%2B20240107-x86_64-unknown-linux-gnu-install_only.tar.gz",
            "https://example.invalid/cpython-3.10.13%2B20240107-x86_64-unknown-linux-gnu",
        ] {
            let err = ReleaseDescriptor::parse(url).expect_err("malformed asset");
            assert!(
                matches!(err, ProvisionIssue::MalformedAsset { .. }),
                "expected malformed asset for {url}, got {err:?}"
            );
        }
    }

    #[test]
    fn interpreter_layout_depends_on_platform() {
        let root = Path::new("/work");
        assert_eq!(
            interpreter_location(root, OsFamily::Posix),
            Path::new("/work/python/bin/python3")
        );
        assert_eq!(
            interpreter_location(root, OsFamily::Windows),
            Path::new("/work/python/python.exe")
        );
    }

    #[test]
    fn document_skips_checksum_manifest() -> anyhow::Result<()> {
        let payload = format!(
            r#"{{"tag_name": "20240107", "assets": [
                {{"browser_download_url": "{DARWIN}"}},
                {{"browser_download_url": "{DARWIN}.sha256"}},
                {{"browser_download_url": "https://example.invalid/20240107/SHA256SUMS"}}
            ]}}"#
        );
        let document = ReleaseDocument::from_slice(payload.as_bytes())?;
        let descriptors = document.descriptors()?;
        assert_eq!(descriptors.len(), 2);
        assert_eq!(document.tag_name.as_deref(), Some("20240107"));
        Ok(())
    }

    #[test]
    fn document_surfaces_malformed_entries() -> anyhow::Result<()> {
        let payload = r#"{"assets": [{"browser_download_url": "https://example.invalid/oops.tar.gz"}]}"#;
        let document = ReleaseDocument::from_slice(payload.as_bytes())?;
        assert!(document.descriptors().is_err());
        Ok(())
    }
}
