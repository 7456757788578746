use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::environment::ToolOutput;

/// Final command handed to the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Interpreter placed at argv\[0\].
    pub program: PathBuf,
    pub base_command: Vec<String>,
    pub extra_args: Vec<String>,
    /// Working directory; `None` keeps the caller's.
    pub cwd: Option<PathBuf>,
    /// The complete child environment; nothing is inherited beyond it.
    pub environ: BTreeMap<String, String>,
}

impl ExecutionRequest {
    #[must_use]
    pub fn args(&self) -> Vec<&str> {
        self.base_command
            .iter()
            .chain(self.extra_args.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Run the request with inherited stdio and return the child's exit code.
///
/// A non-zero code is a normal result. On unix a signal-terminated child
/// reports the negated signal number.
pub fn run(request: &ExecutionRequest) -> Result<i32> {
    let args = request.args();
    debug!(
        program = %request.program.display(),
        ?args,
        cwd = ?request.cwd,
        "running command"
    );
    let mut command = Command::new(&request.program);
    command
        .args(&args)
        .env_clear()
        .envs(&request.environ)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(cwd) = &request.cwd {
        command.current_dir(cwd);
    }
    let status = command
        .status()
        .with_context(|| format!("failed to start {}", request.program.display()))?;
    Ok(exit_code(status))
}

/// Run a helper tool, capturing both streams. The tool inherits the parent
/// environment with `envs` applied on top.
pub(crate) fn run_captured(
    program: &Path,
    args: &[OsString],
    envs: &[(&str, &Path)],
    cwd: &Path,
) -> Result<ToolOutput> {
    debug!(program = %program.display(), ?args, "running tool");
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start {}", program.display()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout missing for {}", program.display()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr missing for {}", program.display()))?;
    let stdout_handle = thread::spawn(move || read_to_string_lossy(stdout));
    let stderr_handle = thread::spawn(move || read_to_string_lossy(stderr));

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {}", program.display()))?;
    let stdout = stdout_handle
        .join()
        .map_err(|_| anyhow!("stdout thread panicked"))??;
    let stderr = stderr_handle
        .join()
        .map_err(|_| anyhow!("stderr thread panicked"))??;
    Ok(ToolOutput {
        code: exit_code(status),
        stdout,
        stderr,
    })
}

fn read_to_string_lossy(mut reader: impl Read) -> Result<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn shell_request(
        script: &str,
        environ: BTreeMap<String, String>,
        cwd: &Path,
    ) -> ExecutionRequest {
        ExecutionRequest {
            program: PathBuf::from("/bin/sh"),
            base_command: vec!["-c".to_string()],
            extra_args: vec![script.to_string()],
            cwd: Some(cwd.to_path_buf()),
            environ,
        }
    }

    #[test]
    fn args_append_extra_arguments() {
        let request = ExecutionRequest {
            program: PathBuf::from("python"),
            base_command: vec!["-m".into(), "pytest".into()],
            extra_args: vec!["-x".into()],
            cwd: None,
            environ: BTreeMap::new(),
        };
        assert_eq!(request.args(), vec!["-m", "pytest", "-x"]);
    }

    #[cfg(unix)]
    #[test]
    fn run_returns_child_exit_code_verbatim() -> Result<()> {
        let temp = tempdir()?;
        let environ = BTreeMap::from([("CODE".to_string(), "42".to_string())]);
        let code = run(&shell_request(r#"exit "$CODE""#, environ, temp.path()))?;
        assert_eq!(code, 42);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn run_uses_only_the_supplied_environment() -> Result<()> {
        let temp = tempdir()?;
        let environ = BTreeMap::from([("ONLY".to_string(), "1".to_string())]);
        let code = run(&shell_request(
            r#"[ "$ONLY" = 1 ] && [ -z "$HOME" ]"#,
            environ,
            temp.path(),
        ))?;
        assert_eq!(code, 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn missing_cwd_keeps_callers_directory() -> Result<()> {
        let here = std::env::current_dir()?.canonicalize()?;
        let mut request = shell_request(
            r#"[ "$(pwd -P)" = "$EXPECTED" ]"#,
            BTreeMap::from([("EXPECTED".to_string(), here.display().to_string())]),
            &here,
        );
        request.cwd = None;
        assert_eq!(run(&request)?, 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn signal_termination_reports_negative_signal() -> Result<()> {
        let temp = tempdir()?;
        let code = run(&shell_request("kill -9 $$", BTreeMap::new(), temp.path()))?;
        assert_eq!(code, -9);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn run_captured_collects_both_streams() -> Result<()> {
        let temp = tempdir()?;
        let marker = temp.path().join("marker");
        let output = run_captured(
            Path::new("/bin/sh"),
            &[
                OsString::from("-c"),
                OsString::from(r#"printf out; printf "$MARKER" >&2; exit 7"#),
            ],
            &[("MARKER", marker.as_path())],
            temp.path(),
        )?;
        assert_eq!(output.code, 7);
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, marker.display().to_string());
        Ok(())
    }

    #[test]
    fn missing_program_is_an_error() -> Result<()> {
        let temp = tempdir()?;
        let err = run(&ExecutionRequest {
            program: temp.path().join("does-not-exist"),
            base_command: Vec::new(),
            extra_args: Vec::new(),
            cwd: Some(temp.path().to_path_buf()),
            environ: BTreeMap::new(),
        })
        .expect_err("nothing to spawn");
        assert!(err.to_string().contains("failed to start"));
        Ok(())
    }
}
