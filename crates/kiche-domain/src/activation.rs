use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::platform::OsFamily;

pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const PATH: &str = "PATH";

#[must_use]
pub fn executables_dir(env_root: &Path, family: OsFamily) -> PathBuf {
    match family {
        OsFamily::Posix => env_root.join("bin"),
        OsFamily::Windows => env_root.join("Scripts"),
    }
}

/// Interpreter inside an isolated environment.
#[must_use]
pub fn environment_interpreter(env_root: &Path, family: OsFamily) -> PathBuf {
    match family {
        OsFamily::Posix => executables_dir(env_root, family).join("python"),
        OsFamily::Windows => executables_dir(env_root, family).join("python.exe"),
    }
}

/// Environment variables for a process running inside `env_root`.
///
/// `VIRTUAL_ENV` names the environment and its executables directory is put
/// in front of the search path. Windows keeps whatever casing the base map
/// uses for `Path`.
#[must_use]
pub fn activate(
    base: &BTreeMap<String, String>,
    env_root: &Path,
    family: OsFamily,
) -> BTreeMap<String, String> {
    let mut environ = base.clone();
    environ.insert(VIRTUAL_ENV.to_string(), env_root.display().to_string());

    let path_key = match family {
        OsFamily::Windows => base
            .keys()
            .find(|key| key.eq_ignore_ascii_case(PATH))
            .cloned()
            .unwrap_or_else(|| PATH.to_string()),
        OsFamily::Posix => PATH.to_string(),
    };
    let bin = executables_dir(env_root, family).display().to_string();
    let search_path = match environ.get(&path_key).filter(|value| !value.is_empty()) {
        Some(existing) => format!("{bin}{}{existing}", family.path_separator()),
        None => bin,
    };
    environ.insert(path_key, search_path);
    environ
}
