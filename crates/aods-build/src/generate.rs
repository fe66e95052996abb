//! Makefile and compilation database generation.

use crate::compile_commands::{CompileCommand, CompileCommands};
use crate::depscan::HeaderScanner;
use crate::error::{BuildError, Result};
use crate::plan::{make_dir, BuildPlan, ObjectArtifact};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the compilation database inside the build directory.
pub const COMPILE_COMMANDS: &str = "compile_commands.json";

/// One compile rule: the compiler-generated prerequisite fragment plus the
/// compile step for a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRule {
    pub fragment: String,
    pub artifact: ObjectArtifact,
}

/// Writes a plan's Makefile and compile_commands.json.
#[derive(Debug, Clone)]
pub struct Generator {
    working_dir: PathBuf,
    makefile: Option<PathBuf>,
}

impl Generator {
    /// `working_dir` is recorded as `directory` in the compilation database.
    /// Header scans run in it and relative output paths resolve against it.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            makefile: None,
        }
    }

    /// Use the process's current directory as the working directory.
    pub fn from_current_dir() -> Result<Self> {
        let dir = std::env::current_dir().map_err(BuildError::RootPath)?;
        Ok(Self::new(dir))
    }

    /// Write the Makefile somewhere other than `<working_dir>/Makefile`.
    pub fn makefile(mut self, path: impl Into<PathBuf>) -> Self {
        self.makefile = Some(path.into());
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn makefile_path(&self) -> PathBuf {
        match &self.makefile {
            Some(path) => self.working_dir.join(path),
            None => self.working_dir.join("Makefile"),
        }
    }

    pub fn compile_commands_path(&self, plan: &BuildPlan) -> PathBuf {
        self.build_dir(plan).join(COMPILE_COMMANDS)
    }

    /// The plan's build directory, resolved against the working directory.
    pub fn build_dir(&self, plan: &BuildPlan) -> PathBuf {
        self.working_dir.join(plan.build_dir())
    }

    /// Scan headers for every source, then write the Makefile followed by
    /// the compilation database.
    ///
    /// The build directory is created under the working directory before
    /// anything is written. The two writes are not atomic as a pair: a
    /// failure writing the database leaves the new Makefile in place.
    pub fn generate(&self, plan: &BuildPlan) -> Result<()> {
        let rules = self.compile_rules(plan)?;
        make_dir(&self.build_dir(plan))?;

        let makefile = self.makefile_path();
        std::fs::write(&makefile, render_makefile(plan, &rules))
            .map_err(|e| BuildError::io(&makefile, e))?;
        info!(path = %makefile.display(), rules = rules.len() + 1, "wrote Makefile");

        let database = self.compile_commands_path(plan);
        let json = self.compile_database(&rules).to_json()?;
        std::fs::write(&database, json).map_err(|e| BuildError::io(&database, e))?;
        info!(path = %database.display(), entries = rules.len(), "wrote compilation database");

        Ok(())
    }

    /// Derive the compile rule of every source, running one header scan each.
    pub fn compile_rules(&self, plan: &BuildPlan) -> Result<Vec<CompileRule>> {
        let scanner = HeaderScanner::new(plan.compiler(), plan.includes());

        plan.objects()
            .into_iter()
            .map(|artifact| {
                let fragment =
                    scanner.scan(&artifact.object, &artifact.source, Some(&self.working_dir))?;
                Ok::<_, BuildError>(CompileRule { fragment, artifact })
            })
            .collect()
    }

    pub fn compile_database(&self, rules: &[CompileRule]) -> CompileCommands {
        CompileCommands::new(
            rules
                .iter()
                .map(|rule| {
                    CompileCommand::new(
                        &self.working_dir,
                        &rule.artifact.command,
                        &rule.artifact.source,
                    )
                })
                .collect(),
        )
    }
}

/// Makefile text: the link rule first, then one block per compile rule.
///
/// Recipe lines must start with a tab for `make` to accept them.
pub fn render_makefile(plan: &BuildPlan, rules: &[CompileRule]) -> String {
    let mut out = format!("{}\n\t{}\n", plan.link_target(), plan.link_command());
    for rule in rules {
        out.push_str(&rule.fragment);
        out.push('\t');
        out.push_str(&rule.artifact.command);
        out.push('\n');
    }
    out
}
