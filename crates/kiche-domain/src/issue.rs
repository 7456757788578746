use std::path::PathBuf;

/// User-facing failures raised while provisioning an environment.
///
/// Issues travel inside `anyhow::Error`; callers classify them with
/// `err.downcast_ref::<ProvisionIssue>()`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProvisionIssue {
    #[error("unsupported platform {os}-{arch}{}", .libc.as_deref().map(|libc| format!(" ({libc})")).unwrap_or_default())]
    UnsupportedPlatform {
        os: String,
        arch: String,
        libc: Option<String>,
    },
    #[error("no python release found for version '{requested}' among '{}' releases: {considered:?}", .considered.len())]
    NotFound {
        requested: String,
        considered: Vec<String>,
    },
    #[error("malformed release asset '{url}': {reason}")]
    MalformedAsset { url: String, reason: String },
    #[error("failed to validate checksum for downloaded release '{release}' ({url})")]
    Integrity { release: String, url: String },
    #[error("python interpreter not found at '{}' after extracting '{archive}'", .expected.display())]
    Corruption { archive: String, expected: PathBuf },
    #[error("dependency resolution failed for '{}' (exit code {code}):\n{output}", .input.display())]
    Resolution {
        input: PathBuf,
        code: i32,
        output: String,
    },
    #[error("creating isolated environment at '{}' failed (exit code {code}):\n{output}", .root.display())]
    EnvironmentCreation {
        root: PathBuf,
        code: i32,
        output: String,
    },
    #[error("installing '{}' into the isolated environment failed (exit code {code}):\n{output}", .lock.display())]
    Installation {
        lock: PathBuf,
        code: i32,
        output: String,
    },
    #[error("required tool '{tool}' is not available: {reason}")]
    ToolMissing { tool: String, reason: String },
    #[error("request to '{url}' failed: {reason}")]
    Network { url: String, reason: String },
}

impl ProvisionIssue {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "KICHE100",
            Self::NotFound { .. } => "KICHE101",
            Self::MalformedAsset { .. } => "KICHE102",
            Self::Network { .. } => "KICHE200",
            Self::Integrity { .. } => "KICHE201",
            Self::Corruption { .. } => "KICHE202",
            Self::Resolution { .. } => "KICHE300",
            Self::EnvironmentCreation { .. } => "KICHE301",
            Self::Installation { .. } => "KICHE302",
            Self::ToolMissing { .. } => "KICHE303",
        }
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::NotFound { .. } => "release_not_found",
            Self::MalformedAsset { .. } => "malformed_release_asset",
            Self::Network { .. } => "network_failure",
            Self::Integrity { .. } => "checksum_mismatch",
            Self::Corruption { .. } => "interpreter_missing",
            Self::Resolution { .. } => "dependency_resolution_failed",
            Self::EnvironmentCreation { .. } => "environment_creation_failed",
            Self::Installation { .. } => "installation_failed",
            Self::ToolMissing { .. } => "tool_missing",
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedPlatform { .. } => {
                Some("Standalone builds exist for linux, macos and windows on x86_64/aarch64.")
            }
            Self::NotFound { .. } => {
                Some("Request a version listed above, or a shorter prefix such as '3.11'.")
            }
            Self::Integrity { .. } | Self::Corruption { .. } => {
                Some("The download was discarded; re-run to fetch it again.")
            }
            Self::Resolution { .. } => {
                Some("Check the requirements for conflicting or misspelled pins.")
            }
            Self::ToolMissing { .. } => Some("Install uv or point KICHE_UV at its executable."),
            Self::Network { .. } => {
                Some("Check connectivity, or set KICHE_KEEP_PROXIES=1 behind a proxy.")
            }
            Self::MalformedAsset { .. } => Some(
                "The release catalog lists an asset kiche cannot read; set KICHE_OFFLINE=1 to use the bundled catalog.",
            ),
            Self::EnvironmentCreation { .. } | Self::Installation { .. } => None,
        }
    }
}
