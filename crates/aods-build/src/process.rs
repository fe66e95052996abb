//! Synchronous subprocess execution for the external tools (compiler, pkg-config).

use crate::error::{BuildError, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Output};
use tracing::debug;

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone)]
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        Self {
            status: output.status,
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Run `program` with `args` and wait for it, capturing both output streams.
///
/// A nonzero exit is not an error here; callers decide what it means.
/// Only a failure to spawn the process is reported as `BuildError::Io`.
pub(crate) fn run<S: AsRef<str>>(program: &str, args: &[S], cwd: Option<&Path>) -> Result<ToolOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|a| a.as_ref()));
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(
        program,
        args = ?args.iter().map(|a| a.as_ref()).collect::<Vec<_>>(),
        "running"
    );

    let output = cmd.output().map_err(|e| BuildError::io(program, e))?;
    let output = ToolOutput::from(output);

    debug!(program, success = output.success, "finished");
    Ok(output)
}

/// Render a command line the way it would be typed into a shell.
pub(crate) fn command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(|a| a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        assert_eq!(
            command_line("pkg-config", &["-cflags", "zlib", "libpng"]),
            "pkg-config -cflags zlib libpng"
        );
        assert_eq!(command_line::<&str>("cc", &[]), "cc");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output() {
        let out = run("sh", &["-c", "echo out; echo err >&2; exit 3"], None).unwrap();
        assert!(!out.success);
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[test]
    fn test_run_missing_program() {
        let result = run("/nonexistent/aods-tool", &["--version"], None);
        assert!(matches!(result, Err(BuildError::Io { .. })));
    }
}
