//! External package resolution through `pkg-config`.
//!
//! Flag queries are batched: one provider invocation per call, covering
//! every requested package. A failure is attributed to the whole batch.

use crate::error::{BuildError, Result};
use crate::process;
use tracing::warn;

/// Default package-metadata provider.
pub const DEFAULT_PROGRAM: &str = "pkg-config";

/// A handle on a `pkg-config` compatible program.
#[derive(Debug, Clone)]
pub struct PkgConfig {
    program: String,
}

impl Default for PkgConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PkgConfig {
    /// Use `pkg-config` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a specific provider program (e.g. `pkgconf` or a cross wrapper).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the provider knows `name`.
    ///
    /// A provider that cannot be run counts as "not installed" for this
    /// query only.
    pub fn is_installed(&self, name: &str) -> bool {
        match process::run(&self.program, &["--exists", name], None) {
            Ok(output) => output.success,
            Err(e) => {
                warn!(package = name, error = %e, "package provider failed");
                false
            }
        }
    }

    /// Fail with `DependencyNotFound` unless `name` is installed.
    pub fn assert_installed(&self, name: &str) -> Result<()> {
        if self.is_installed(name) {
            Ok(())
        } else {
            Err(BuildError::DependencyNotFound(name.to_string()))
        }
    }

    /// Compiler flags for all `names`, from a single provider call.
    pub fn cflags<S: AsRef<str>>(&self, names: &[S]) -> Result<String> {
        self.query("-cflags", names)
    }

    /// Linker flags for all `names`, from a single provider call.
    pub fn libs<S: AsRef<str>>(&self, names: &[S]) -> Result<String> {
        self.query("-libs", names)
    }

    /// Value of a package variable such as `prefix` or `includedir`.
    pub fn variable(&self, name: &str, var: &str) -> Result<String> {
        let args = [format!("--variable={var}"), name.to_string()];
        let output = process::run(&self.program, &args, None)?;
        if !output.success {
            return Err(BuildError::Resolution {
                command: process::command_line(&self.program, &args),
                message: format!("no variable {var} for package {name}"),
            });
        }

        Ok(output.stdout.trim().to_string())
    }

    fn query<S: AsRef<str>>(&self, mode: &str, names: &[S]) -> Result<String> {
        let mut args = vec![mode.to_string()];
        args.extend(names.iter().map(|n| n.as_ref().to_string()));

        let output = process::run(&self.program, &args, None)?;
        if !output.success {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr.to_string()
            };
            return Err(BuildError::Resolution {
                command: process::command_line(&self.program, &args),
                message,
            });
        }

        Ok(output.stdout.trim().to_string())
    }
}
