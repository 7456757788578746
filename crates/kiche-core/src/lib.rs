#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod environment;
pub mod host;
pub mod install;
pub mod launcher;
pub(crate) mod net;
pub mod process;
pub mod progress;
pub mod resolver;
pub(crate) mod timings;
pub mod uv;

pub use kiche_domain::{OsFamily, PlatformKey, ProvisionIssue, ReleaseDescriptor};

pub use crate::catalog::{release_catalog, BundledCatalog, HttpCatalog, ReleaseCatalog};
pub use crate::config::Config;
pub use crate::download::Downloader;
pub use crate::environment::{build_environment, EnvironmentTool, IsolatedEnvironment, ToolOutput};
pub use crate::host::detect_platform;
pub use crate::install::install_archive;
pub use crate::launcher::{KicheLauncher, Provisioner};
pub use crate::net::build_http_client;
pub use crate::process::ExecutionRequest;
pub use crate::progress::{DownloadProgressBar, NoProgress, TransferProgress};
pub use crate::resolver::resolve_release;
pub use crate::uv::UvTool;
