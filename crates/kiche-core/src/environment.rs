//! Isolated environment construction: compile a lock from the requirement
//! list, create an environment bound to the interpreter, install the lock.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiche_domain::{environment_interpreter, OsFamily, ProvisionIssue};
use tracing::{debug, info};

use crate::timings::TimingGuard;

pub const REQUIREMENTS_IN: &str = "requirements.in";
pub const REQUIREMENTS_LOCK: &str = "requirements.txt";
pub const ENVIRONMENT_DIR: &str = ".venv";

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Both streams, as surfaced in resolution and installation failures.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
        }
    }
}

/// The three external steps needed to build an environment.
///
/// Implementations only run the tool; classifying a non-zero exit is left to
/// [`build_environment`].
pub trait EnvironmentTool {
    /// Pin `input` into `output`, solving for `python`.
    fn compile_lock(
        &self,
        input: &Path,
        output: &Path,
        python: &Path,
        cwd: &Path,
    ) -> Result<ToolOutput>;

    /// Create an isolated environment at `env_root` bound to `python`.
    fn create_environment(&self, python: &Path, env_root: &Path, cwd: &Path) -> Result<ToolOutput>;

    /// Install every entry of `lock` into the environment at `env_root`.
    fn install(
        &self,
        lock: &Path,
        env_python: &Path,
        env_root: &Path,
        cwd: &Path,
    ) -> Result<ToolOutput>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedEnvironment {
    pub root: PathBuf,
    pub interpreter: PathBuf,
    pub lock_file: PathBuf,
}

pub fn build_environment(
    tool: &dyn EnvironmentTool,
    interpreter: &Path,
    requirements: &[String],
    work_dir: &Path,
    family: OsFamily,
) -> Result<IsolatedEnvironment> {
    let input = work_dir.join(REQUIREMENTS_IN);
    let lock_file = work_dir.join(REQUIREMENTS_LOCK);
    let root = work_dir.join(ENVIRONMENT_DIR);

    fs::write(&input, requirements.join("\n"))
        .with_context(|| format!("writing {}", input.display()))?;
    debug!(path = %input.display(), count = requirements.len(), "wrote requirements");

    {
        info!("resolving requirements for {}", interpreter.display());
        let _timing = TimingGuard::info("resolved requirements in ");
        let output = tool.compile_lock(&input, &lock_file, interpreter, work_dir)?;
        if !output.success() {
            return Err(ProvisionIssue::Resolution {
                input,
                code: output.code,
                output: output.combined(),
            }
            .into());
        }
    }

    let env_python = environment_interpreter(&root, family);
    {
        info!("creating isolated environment at {}", root.display());
        let _timing = TimingGuard::info("created environment in ");
        let output = tool.create_environment(interpreter, &root, work_dir)?;
        if !output.success() {
            return Err(ProvisionIssue::EnvironmentCreation {
                root,
                code: output.code,
                output: output.combined(),
            }
            .into());
        }
        if !env_python.exists() {
            return Err(ProvisionIssue::EnvironmentCreation {
                output: format!("interpreter missing at {}", env_python.display()),
                root,
                code: output.code,
            }
            .into());
        }
    }

    {
        info!("installing locked requirements into {}", root.display());
        let _timing = TimingGuard::info("installed requirements in ");
        let output = tool.install(&lock_file, &env_python, &root, work_dir)?;
        if !output.success() {
            return Err(ProvisionIssue::Installation {
                lock: lock_file,
                code: output.code,
                output: output.combined(),
            }
            .into());
        }
    }

    Ok(IsolatedEnvironment {
        root,
        interpreter: env_python,
        lock_file,
    })
}
