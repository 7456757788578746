use std::env;
use std::fs;
use std::path::Path;

use kiche_domain::{Libc, PlatformKey};

const LOADER_DIRS: [&str; 4] = ["/lib", "/lib64", "/usr/lib", "/usr/lib64"];

/// Describe the running host.
#[must_use]
pub fn detect_platform() -> PlatformKey {
    let libc = if env::consts::OS == "linux" {
        detect_libc()
    } else {
        None
    };
    PlatformKey::new(env::consts::OS, env::consts::ARCH, libc)
}

fn detect_libc() -> Option<Libc> {
    let roots = LOADER_DIRS.iter().map(Path::new).collect::<Vec<_>>();
    probe_loaders(&roots).or_else(compiled_libc)
}

// The dynamic loader names the C library: `ld-linux-*` ships with glibc and
// `ld-musl-*` with musl. Hosts carrying both are glibc systems with musl tools.
fn probe_loaders(roots: &[&Path]) -> Option<Libc> {
    let mut musl = false;
    for root in roots {
        let Ok(entries) = fs::read_dir(root) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("ld-linux") {
                return Some(Libc::Glibc);
            }
            if name.starts_with("ld-musl") {
                musl = true;
            }
        }
    }
    musl.then_some(Libc::Musl)
}

fn compiled_libc() -> Option<Libc> {
    if cfg!(target_env = "gnu") {
        Some(Libc::Glibc)
    } else if cfg!(target_env = "musl") {
        Some(Libc::Musl)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn glibc_loader_wins() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let lib = temp.path().join("lib");
        fs::create_dir_all(&lib)?;
        fs::write(lib.join("ld-musl-x86_64.so.1"), b"")?;
        fs::write(lib.join("ld-linux-x86-64.so.2"), b"")?;
        assert_eq!(probe_loaders(&[lib.as_path()]), Some(Libc::Glibc));
        Ok(())
    }

    #[test]
    fn musl_only_host() -> anyhow::Result<()> {
        let temp = tempdir()?;
        fs::write(temp.path().join("ld-musl-aarch64.so.1"), b"")?;
        assert_eq!(probe_loaders(&[temp.path()]), Some(Libc::Musl));
        Ok(())
    }

    #[test]
    fn unknown_when_no_loader_present() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let missing = temp.path().join("missing");
        assert_eq!(probe_loaders(&[temp.path(), missing.as_path()]), None);
        Ok(())
    }

    #[test]
    fn detect_platform_uses_rust_target_names() {
        let key = detect_platform();
        assert_eq!(key.os, env::consts::OS);
        assert_eq!(key.arch, env::consts::ARCH);
        if env::consts::OS != "linux" {
            assert!(key.libc.is_none());
        }
    }
}
