use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use kiche_domain::{activate, PlatformKey, ReleaseDescriptor};
use serde::Deserialize;
use tracing::info;

use crate::catalog::{release_catalog, ReleaseCatalog};
use crate::config::Config;
use crate::download::Downloader;
use crate::environment::{self, EnvironmentTool, IsolatedEnvironment};
use crate::host::detect_platform;
use crate::install::install_archive;
use crate::net::build_http_client;
use crate::process::{self, ExecutionRequest};
use crate::progress::{DownloadProgressBar, TransferProgress};
use crate::resolver::resolve_release;
use crate::timings::TimingGuard;
use crate::uv::UvTool;

/// The services one provisioning run talks to.
pub struct Provisioner {
    platform: PlatformKey,
    catalog: Box<dyn ReleaseCatalog>,
    downloader: Downloader,
    tool: Box<dyn EnvironmentTool>,
    progress: Box<dyn TransferProgress>,
}

impl Provisioner {
    #[must_use]
    pub fn new(
        platform: PlatformKey,
        catalog: Box<dyn ReleaseCatalog>,
        downloader: Downloader,
        tool: Box<dyn EnvironmentTool>,
        progress: Box<dyn TransferProgress>,
    ) -> Self {
        Self {
            platform,
            catalog,
            downloader,
            tool,
            progress,
        }
    }

    /// Wire up the host platform, release API, `uv` and progress bar from
    /// `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(config.network())?;
        let catalog = release_catalog(config.catalog(), client.clone());
        let tool = UvTool::locate(config.tools())?;
        Ok(Self::new(
            detect_platform(),
            catalog,
            Downloader::new(client),
            Box::new(tool),
            Box::new(DownloadProgressBar::new(config.progress().enabled)),
        ))
    }

    #[must_use]
    pub fn platform(&self) -> &PlatformKey {
        &self.platform
    }

    pub fn resolve(&self, version: Option<&str>) -> Result<ReleaseDescriptor> {
        resolve_release(self.catalog.as_ref(), version, &self.platform)
    }

    /// Download and unpack `release` into `work_dir`, returning its interpreter.
    pub fn acquire(&mut self, release: &ReleaseDescriptor, work_dir: &Path) -> Result<PathBuf> {
        let _timing = TimingGuard::info("downloaded python in ");
        let archive = self
            .downloader
            .download(release, work_dir, self.progress.as_mut())?;
        install_archive(&archive, work_dir, release.os_family())
    }

    pub fn build_environment(
        &self,
        interpreter: &Path,
        requirements: &[String],
        work_dir: &Path,
    ) -> Result<IsolatedEnvironment> {
        environment::build_environment(
            self.tool.as_ref(),
            interpreter,
            requirements,
            work_dir,
            self.platform.family(),
        )
    }
}

/// Runs a command inside a freshly provisioned python environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KicheLauncher {
    pub requirements: Vec<String>,
    /// Full or partial version; blank picks the newest release.
    pub python_version: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub environ: BTreeMap<String, String>,
    /// Working directory for the command; unset runs in the caller's.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl KicheLauncher {
    pub const NAME: &'static str = "kiche";

    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self
            .requirements
            .iter()
            .position(|requirement| requirement.trim().is_empty())
        {
            bail!("requirement #{} is blank", index + 1);
        }
        Ok(())
    }

    #[must_use]
    pub fn requested_version(&self) -> Option<&str> {
        Some(self.python_version.trim()).filter(|version| !version.is_empty())
    }

    /// Provision inside `work_dir` and run the command with `extra_args`
    /// appended. Returns the command's exit code.
    ///
    /// `work_dir` must exist and belong to this run; it is left in place.
    pub fn execute(
        &self,
        provisioner: &mut Provisioner,
        work_dir: &Path,
        extra_args: &[String],
    ) -> Result<i32> {
        self.validate()?;
        let release = provisioner.resolve(self.requested_version())?;
        info!(
            "using python {} from {}",
            release.python_version(),
            release.basename()
        );
        let interpreter = provisioner.acquire(&release, work_dir)?;
        let environment =
            provisioner.build_environment(&interpreter, &self.requirements, work_dir)?;

        let request = ExecutionRequest {
            program: environment.interpreter.clone(),
            base_command: self.command.clone(),
            extra_args: extra_args.to_vec(),
            cwd: self.cwd.clone(),
            environ: activate(&self.environ, &environment.root, provisioner.platform().family()),
        };
        match &request.cwd {
            Some(cwd) => info!("running {:?} in {}", request.args(), cwd.display()),
            None => info!("running {:?}", request.args()),
        }
        process::run(&request)
    }
}
