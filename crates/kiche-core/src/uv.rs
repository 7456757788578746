use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use kiche_domain::{ProvisionIssue, VIRTUAL_ENV};
use tracing::debug;

use crate::config::ToolConfig;
use crate::environment::{EnvironmentTool, ToolOutput};
use crate::process::run_captured;

const UV: &str = "uv";

/// [`EnvironmentTool`] backed by the `uv` executable.
#[derive(Debug, Clone)]
pub struct UvTool {
    program: PathBuf,
}

impl UvTool {
    /// Use `KICHE_UV` when configured, otherwise the first `uv` on `PATH`.
    pub fn locate(config: &ToolConfig) -> Result<Self> {
        let program = match &config.uv {
            Some(explicit) => which::which(explicit).map_err(|err| ProvisionIssue::ToolMissing {
                tool: explicit.display().to_string(),
                reason: err.to_string(),
            })?,
            None => which::which(UV).map_err(|err| ProvisionIssue::ToolMissing {
                tool: UV.to_string(),
                reason: err.to_string(),
            })?,
        };
        debug!(uv = %program.display(), "located environment tool");
        Ok(Self { program })
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn compile_args(input: &Path, output: &Path, python: &Path) -> Vec<OsString> {
        vec![
            "pip".into(),
            "compile".into(),
            input.into(),
            "-o".into(),
            output.into(),
            "--python".into(),
            python.into(),
        ]
    }

    fn venv_args(python: &Path, env_root: &Path) -> Vec<OsString> {
        vec![
            "venv".into(),
            "--python".into(),
            python.into(),
            env_root.into(),
        ]
    }

    fn install_args(lock: &Path, env_python: &Path) -> Vec<OsString> {
        vec![
            "pip".into(),
            "install".into(),
            "-r".into(),
            lock.into(),
            "--python".into(),
            env_python.into(),
        ]
    }
}

impl EnvironmentTool for UvTool {
    fn compile_lock(
        &self,
        input: &Path,
        output: &Path,
        python: &Path,
        cwd: &Path,
    ) -> Result<ToolOutput> {
        run_captured(
            &self.program,
            &Self::compile_args(input, output, python),
            &[],
            cwd,
        )
    }

    fn create_environment(&self, python: &Path, env_root: &Path, cwd: &Path) -> Result<ToolOutput> {
        run_captured(&self.program, &Self::venv_args(python, env_root), &[], cwd)
    }

    fn install(
        &self,
        lock: &Path,
        env_python: &Path,
        env_root: &Path,
        cwd: &Path,
    ) -> Result<ToolOutput> {
        run_captured(
            &self.program,
            &Self::install_args(lock, env_python),
            &[(VIRTUAL_ENV, env_root)],
            cwd,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn command_lines_match_uv_cli() {
        let args = UvTool::compile_args(
            Path::new("requirements.in"),
            Path::new("requirements.txt"),
            Path::new("/w/python/bin/python3"),
        );
        assert_eq!(
            args,
            [
                "pip",
                "compile",
                "requirements.in",
                "-o",
                "requirements.txt",
                "--python",
                "/w/python/bin/python3"
            ]
            .map(OsString::from)
        );
        assert_eq!(
            UvTool::venv_args(Path::new("/w/python/bin/python3"), Path::new("/w/.venv")),
            ["venv", "--python", "/w/python/bin/python3", "/w/.venv"].map(OsString::from)
        );
        assert_eq!(
            UvTool::install_args(Path::new("requirements.txt"), Path::new("/w/.venv/bin/python")),
            [
                "pip",
                "install",
                "-r",
                "requirements.txt",
                "--python",
                "/w/.venv/bin/python"
            ]
            .map(OsString::from)
        );
    }

    #[test]
    fn explicit_missing_tool_is_reported() -> Result<()> {
        let temp = tempdir()?;
        let config = ToolConfig {
            uv: Some(temp.path().join("no-uv-here")),
        };
        let err = UvTool::locate(&config).expect_err("missing uv");
        assert!(matches!(
            err.downcast_ref::<ProvisionIssue>(),
            Some(ProvisionIssue::ToolMissing { .. })
        ));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn explicit_tool_runs_with_virtual_env_for_install() -> Result<()> {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir()?;
        let script = temp.path().join("uv");
        fs::write(&script, "#!/bin/sh\nprintf '%s|%s' \"$VIRTUAL_ENV\" \"$*\"\n")?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;
        let tool = UvTool::locate(&ToolConfig {
            uv: Some(script.clone()),
        })?;
        assert_eq!(tool.program(), script.as_path());

        let env_root = temp.path().join(".venv");
        let output = tool.install(
            Path::new("requirements.txt"),
            &env_root.join("bin/python"),
            &env_root,
            temp.path(),
        )?;
        assert!(output.success());
        assert_eq!(
            output.stdout,
            format!(
                "{}|pip install -r requirements.txt --python {}",
                env_root.display(),
                env_root.join("bin/python").display()
            )
        );
        Ok(())
    }
}
