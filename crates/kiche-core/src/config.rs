use std::collections::HashMap;
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use crate::catalog::DEFAULT_CATALOG_URL;

const PROXY_KEYS: &[&str] = &[
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
    "NO_PROXY",
    "no_proxy",
];

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// `1/true/yes/on` (any case) enable a flag; anything else disables it.
    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        self.var(key).is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    pub(crate) fn flag_is_disabled(&self, key: &str) -> bool {
        self.var(key).is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "no" | "off"
            )
        })
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) catalog: CatalogConfig,
    pub(crate) network: NetworkConfig,
    pub(crate) tools: ToolConfig,
    pub(crate) progress: ProgressConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let snapshot = EnvSnapshot::capture();
        Self::from_snapshot(&snapshot, io::stderr().is_terminal())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot, interactive: bool) -> Self {
        Self {
            catalog: CatalogConfig {
                url: snapshot
                    .var("KICHE_CATALOG_URL")
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .unwrap_or(DEFAULT_CATALOG_URL)
                    .to_string(),
                offline: snapshot.flag_is_enabled("KICHE_OFFLINE"),
            },
            network: NetworkConfig {
                keep_proxies: keep_proxies(snapshot),
            },
            tools: ToolConfig {
                uv: snapshot
                    .var("KICHE_UV")
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from),
            },
            progress: ProgressConfig {
                enabled: match snapshot.var("KICHE_PROGRESS") {
                    Some(value) => value != "0",
                    None => interactive,
                },
            },
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn tools(&self) -> &ToolConfig {
        &self.tools
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressConfig {
        &self.progress
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub url: String,
    pub offline: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub keep_proxies: bool,
}

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub uv: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub enabled: bool,
}

/// Decide whether the HTTP client should honor standard proxy variables.
///
/// - `KICHE_KEEP_PROXIES=1/true/yes/on` forces proxies on.
/// - `KICHE_KEEP_PROXIES=0/false/no/off/""` forces proxies off.
/// - If unset, proxies are enabled only when at least one proxy var is set.
fn keep_proxies(snapshot: &EnvSnapshot) -> bool {
    if snapshot.var("KICHE_KEEP_PROXIES").is_some() {
        return !snapshot.flag_is_disabled("KICHE_KEEP_PROXIES");
    }
    PROXY_KEYS.iter().any(|key| {
        snapshot
            .var(key)
            .is_some_and(|value| !value.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_without_overrides() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[]), false);
        assert_eq!(config.catalog().url, DEFAULT_CATALOG_URL);
        assert!(!config.catalog().offline);
        assert!(!config.network().keep_proxies);
        assert!(config.tools().uv.is_none());
        assert!(!config.progress().enabled);
    }

    #[test]
    fn overrides_are_applied() {
        let snapshot = EnvSnapshot::testing(&[
            ("KICHE_CATALOG_URL", " http://127.0.0.1:8080/latest "),
            ("KICHE_OFFLINE", "yes"),
            ("KICHE_UV", "/opt/uv/bin/uv"),
            ("KICHE_PROGRESS", "0"),
        ]);
        let config = Config::from_snapshot(&snapshot, true);
        assert_eq!(config.catalog().url, "http://127.0.0.1:8080/latest");
        assert!(config.catalog().offline);
        assert_eq!(config.tools().uv, Some(PathBuf::from("/opt/uv/bin/uv")));
        assert!(!config.progress().enabled);
    }

    #[test]
    fn progress_follows_terminal_when_unset() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[]), true);
        assert!(config.progress().enabled);
        let forced =
            Config::from_snapshot(&EnvSnapshot::testing(&[("KICHE_PROGRESS", "1")]), false);
        assert!(forced.progress().enabled);
    }

    #[test]
    fn keep_proxies_defaults_to_enabled_when_proxy_env_is_set() {
        let snapshot = EnvSnapshot::testing(&[("HTTPS_PROXY", "http://proxy.example")]);
        assert!(keep_proxies(&snapshot));
        let blank = EnvSnapshot::testing(&[("HTTPS_PROXY", "  ")]);
        assert!(!keep_proxies(&blank));
    }

    #[test]
    fn keep_proxies_env_var_wins() {
        let forced_on = EnvSnapshot::testing(&[("KICHE_KEEP_PROXIES", "1")]);
        assert!(keep_proxies(&forced_on));
        let forced_off = EnvSnapshot::testing(&[
            ("KICHE_KEEP_PROXIES", "off"),
            ("HTTP_PROXY", "http://proxy.example"),
        ]);
        assert!(!keep_proxies(&forced_off));
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        let previous = env::var_os("KICHE_OFFLINE");
        env::set_var("KICHE_OFFLINE", "1");
        let config = Config::from_env();
        match previous {
            Some(value) => env::set_var("KICHE_OFFLINE", value),
            None => env::remove_var("KICHE_OFFLINE"),
        }
        assert!(config.catalog().offline);
    }
}
