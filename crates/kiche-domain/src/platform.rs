use std::fmt;

use crate::issue::ProvisionIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Libc {
    Glibc,
    Musl,
}

impl Libc {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Glibc => "glibc",
            Self::Musl => "musl",
        }
    }
}

impl fmt::Display for Libc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory layout conventions that differ between Windows and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Posix,
    Windows,
}

impl OsFamily {
    #[must_use]
    pub fn path_separator(self) -> char {
        match self {
            Self::Posix => ':',
            Self::Windows => ';',
        }
    }
}

/// Host description used to pick a release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformKey {
    pub os: String,
    pub arch: String,
    pub libc: Option<Libc>,
}

impl PlatformKey {
    pub fn new(os: impl Into<String>, arch: impl Into<String>, libc: Option<Libc>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            libc,
        }
    }

    #[must_use]
    pub fn family(&self) -> OsFamily {
        if normalize_os(&self.os) == Some(HostOs::Windows) {
            OsFamily::Windows
        } else {
            OsFamily::Posix
        }
    }

    fn unsupported(&self, libc: Option<Libc>) -> ProvisionIssue {
        ProvisionIssue::UnsupportedPlatform {
            os: self.os.clone(),
            arch: self.arch.clone(),
            libc: libc.map(|libc| libc.as_str().to_string()),
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)?;
        if let Some(libc) = self.libc {
            write!(f, " ({libc})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostOs {
    Linux,
    Macos,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostArch {
    X86_64,
    Aarch64,
}

// Accepts both Rust's `std::env::consts` spellings and `uname`-style ones.
fn normalize_os(os: &str) -> Option<HostOs> {
    match os.to_ascii_lowercase().as_str() {
        "linux" => Some(HostOs::Linux),
        "macos" | "darwin" => Some(HostOs::Macos),
        "windows" => Some(HostOs::Windows),
        _ => None,
    }
}

fn normalize_arch(arch: &str) -> Option<HostArch> {
    match arch.to_ascii_lowercase().as_str() {
        "x86_64" | "amd64" => Some(HostArch::X86_64),
        "aarch64" | "arm64" => Some(HostArch::Aarch64),
        _ => None,
    }
}

/// Archive-name suffix published for the given host.
///
/// Linux hosts whose C library could not be determined are treated as musl.
/// Combinations without a published build yield `UnsupportedPlatform`.
pub fn release_suffix(key: &PlatformKey) -> Result<&'static str, ProvisionIssue> {
    let (Some(os), Some(arch)) = (normalize_os(&key.os), normalize_arch(&key.arch)) else {
        return Err(key.unsupported(key.libc));
    };
    match (os, arch) {
        (HostOs::Macos, HostArch::Aarch64) => Ok("aarch64-apple-darwin-install_only.tar.gz"),
        (HostOs::Macos, HostArch::X86_64) => Ok("x86_64-apple-darwin-install_only.tar.gz"),
        (HostOs::Windows, HostArch::X86_64) => {
            Ok("x86_64-pc-windows-msvc-shared-install_only.tar.gz")
        }
        (HostOs::Windows, HostArch::Aarch64) => Err(key.unsupported(None)),
        (HostOs::Linux, arch) => {
            let libc = key.libc.unwrap_or(Libc::Musl);
            match (arch, libc) {
                (HostArch::X86_64, Libc::Glibc) => {
                    Ok("x86_64-unknown-linux-gnu-install_only.tar.gz")
                }
                (HostArch::X86_64, Libc::Musl) => {
                    Ok("x86_64-unknown-linux-musl-install_only.tar.gz")
                }
                (HostArch::Aarch64, Libc::Glibc) => {
                    Ok("aarch64-unknown-linux-gnu-install_only.tar.gz")
                }
                // no musl build is published for aarch64
                (HostArch::Aarch64, Libc::Musl) => Err(key.unsupported(Some(libc))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix(os: &str, arch: &str, libc: Option<Libc>) -> Result<&'static str, ProvisionIssue> {
        release_suffix(&PlatformKey::new(os, arch, libc))
    }

    #[test]
    fn maps_every_supported_host() {
        let cases = [
            ("macos", "aarch64", None, "aarch64-apple-darwin-install_only.tar.gz"),
            ("Darwin", "arm64", None, "aarch64-apple-darwin-install_only.tar.gz"),
            ("macos", "x86_64", None, "x86_64-apple-darwin-install_only.tar.gz"),
            (
                "windows",
                "x86_64",
                None,
                "x86_64-pc-windows-msvc-shared-install_only.tar.gz",
            ),
            (
                "Windows",
                "AMD64",
                None,
                "x86_64-pc-windows-msvc-shared-install_only.tar.gz",
            ),
            (
                "linux",
                "x86_64",
                Some(Libc::Glibc),
                "x86_64-unknown-linux-gnu-install_only.tar.gz",
            ),
            (
                "linux",
                "x86_64",
                Some(Libc::Musl),
                "x86_64-unknown-linux-musl-install_only.tar.gz",
            ),
            (
                "Linux",
                "aarch64",
                Some(Libc::Glibc),
                "aarch64-unknown-linux-gnu-install_only.tar.gz",
            ),
        ];
        for (os, arch, libc, expected) in cases {
            assert_eq!(
                suffix(os, arch, libc),
                Ok(expected),
                "unexpected suffix for {os}-{arch} {libc:?}"
            );
        }
    }

    #[test]
    fn unknown_libc_defaults_to_musl() {
        assert_eq!(
            suffix("linux", "x86_64", None),
            Ok("x86_64-unknown-linux-musl-install_only.tar.gz")
        );
        assert!(matches!(
            suffix("linux", "aarch64", None),
            Err(ProvisionIssue::UnsupportedPlatform { libc: Some(ref libc), .. }) if libc == "musl"
        ));
    }

    #[test]
    fn unmapped_hosts_are_unsupported() {
        for (os, arch) in [
            ("linux", "riscv64"),
            ("linux", "x86"),
            ("freebsd", "x86_64"),
            ("windows", "aarch64"),
            ("macos", "powerpc"),
        ] {
            let err = suffix(os, arch, Some(Libc::Glibc)).expect_err("unsupported host");
            assert!(
                matches!(err, ProvisionIssue::UnsupportedPlatform { .. }),
                "expected unsupported platform for {os}-{arch}, got {err:?}"
            );
        }
    }

    #[test]
    fn family_follows_os() {
        assert_eq!(PlatformKey::new("windows", "x86_64", None).family(), OsFamily::Windows);
        assert_eq!(PlatformKey::new("linux", "x86_64", None).family(), OsFamily::Posix);
        assert_eq!(PlatformKey::new("macos", "aarch64", None).family(), OsFamily::Posix);
    }
}
