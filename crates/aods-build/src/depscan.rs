//! Header dependency discovery through the compiler's `-MM` mode.

use crate::error::{BuildError, Result};
use crate::process;
use std::path::Path;

/// Runs `<compiler> -I<dir>... -MT <object> -MM <source>` for one source file.
#[derive(Debug, Clone, Copy)]
pub struct HeaderScanner<'a> {
    compiler: &'a str,
    includes: &'a [String],
}

impl<'a> HeaderScanner<'a> {
    pub fn new(compiler: &'a str, includes: &'a [String]) -> Self {
        Self { compiler, includes }
    }

    /// Arguments passed to the compiler for a scan of `source`.
    pub fn args(&self, object: &str, source: &str) -> Vec<String> {
        let mut args: Vec<String> = self.includes.iter().map(|i| format!("-I{i}")).collect();
        args.extend([
            "-MT".to_string(),
            object.to_string(),
            "-MM".to_string(),
            source.to_string(),
        ]);
        args
    }

    /// The make rule fragment `object: source headers...` as printed by the
    /// compiler, always newline-terminated.
    ///
    /// `cwd` is the directory relative source and include paths resolve against.
    pub fn scan(&self, object: &str, source: &str, cwd: Option<&Path>) -> Result<String> {
        let output = process::run(self.compiler, &self.args(object, source), cwd)?;
        if !output.success {
            return Err(BuildError::CompileDependency {
                source_file: source.to_string(),
                stderr: output.stderr,
            });
        }

        let mut fragment = output.stdout;
        if !fragment.ends_with('\n') {
            fragment.push('\n');
        }
        Ok(fragment)
    }
}
