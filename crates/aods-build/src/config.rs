//! Project manifest (aods.toml format).

use crate::error::{BuildError, Result};
use crate::flags::{default_flags, BuildType};
use crate::pkgconfig::PkgConfig;
use crate::plan::{PlanBuilder, DEFAULT_BUILD_DIR};
use crate::toolchain;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "aods.toml";

/// Root manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Project metadata.
    pub project: ProjectConfig,

    /// Compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// The executable target.
    pub target: TargetConfig,
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, also the executable name.
    pub name: String,

    /// Project version (optional).
    #[serde(default)]
    pub version: Option<String>,

    /// Project root directory (default: manifest directory).
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Compiler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler command; discovered from `PATH` when absent.
    #[serde(default)]
    pub command: Option<String>,

    /// Flag preset to start from.
    #[serde(default)]
    pub profile: Option<BuildType>,

    /// Compiler flags added after the preset.
    #[serde(default)]
    pub flags: Vec<String>,

    /// Preprocessor definitions, passed as `-D<define>`.
    #[serde(default)]
    pub defines: Vec<String>,
}

/// Target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Directory for objects, the executable and compile_commands.json.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Source files.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Include directories.
    #[serde(default)]
    pub includes: Vec<String>,

    /// pkg-config packages.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Target-specific compiler flags, added last.
    #[serde(default)]
    pub flags: Vec<String>,
}

fn default_build_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BUILD_DIR)
}

impl Manifest {
    /// Load a manifest from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a manifest.
    pub fn from_toml(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(BuildError::Validation("project name is empty".to_string()));
        }
        if self.project.name.contains('/') {
            return Err(BuildError::Validation(format!(
                "project name `{}` must not contain `/`",
                self.project.name
            )));
        }
        if self.target.sources.is_empty() {
            return Err(BuildError::Validation("target has no sources".to_string()));
        }
        Ok(())
    }

    /// Flags contributed by the `[compiler]` table, in order: preset, flags,
    /// defines.
    pub fn compiler_flags(&self) -> Vec<String> {
        let preset: Vec<String> = self
            .compiler
            .profile
            .map(|p| default_flags(p).iter().map(|f| f.to_string()).collect())
            .unwrap_or_else(Vec::new);

        preset
            .into_iter()
            .chain(self.compiler.flags.iter().cloned())
            .chain(self.compiler.defines.iter().map(|d| format!("-D{d}")))
            .collect()
    }

    /// Turn the manifest into a plan builder, resolving dependencies with `pkg_config`.
    ///
    /// The build directory is created relative to the current directory
    /// unless it is absolute.
    pub fn to_builder(&self, pkg_config: PkgConfig) -> Result<PlanBuilder> {
        let compiler = match &self.compiler.command {
            Some(command) => command.clone(),
            None => toolchain::find_compiler()?,
        };

        let mut builder = PlanBuilder::new(&self.project.name, compiler, &self.target.build_dir)?
            .pkg_config(pkg_config);
        builder
            .add_flags(self.compiler_flags())
            .add_sources(self.target.sources.iter().cloned())
            .add_includes(self.target.includes.iter().cloned());
        builder.add_dependencies(self.target.dependencies.iter().cloned())?;
        builder.add_flags(self.target.flags.iter().cloned());
        Ok(builder)
    }
}
