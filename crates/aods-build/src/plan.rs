//! Build plan for a single executable target.
//!
//! A [`PlanBuilder`] accumulates sources, include directories, package
//! dependencies and flags. [`PlanBuilder::build`] freezes that state into a
//! [`BuildPlan`], from which object names and compile/link commands are
//! derived.

use crate::error::{BuildError, Result};
use crate::pkgconfig::PkgConfig;
use crate::toolchain;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default output directory used by [`PlanBuilder::with_default_toolchain`].
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Accumulates the description of one build target.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    name: String,
    compiler: String,
    build_dir: PathBuf,
    sources: Vec<String>,
    includes: Vec<String>,
    dependencies: Vec<String>,
    flags: Vec<String>,
    libs: Vec<String>,
    pkg_config: PkgConfig,
}

impl PlanBuilder {
    /// Start a plan for executable `name`, compiled with `compiler`, whose
    /// objects go to `build_dir`.
    ///
    /// `build_dir` is created immediately. An existing directory is fine;
    /// any other creation failure is returned.
    pub fn new(
        name: impl Into<String>,
        compiler: impl Into<String>,
        build_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let build_dir = build_dir.as_ref();
        make_dir(build_dir)?;

        Ok(Self {
            name: name.into(),
            compiler: compiler.into(),
            build_dir: build_dir.to_path_buf(),
            sources: Vec::new(),
            includes: Vec::new(),
            dependencies: Vec::new(),
            flags: Vec::new(),
            libs: Vec::new(),
            pkg_config: PkgConfig::new(),
        })
    }

    /// Start a plan using the first compiler found on `PATH` and `build/`.
    pub fn with_default_toolchain(name: impl Into<String>) -> Result<Self> {
        let compiler = toolchain::find_compiler()?;
        Self::new(name, compiler, DEFAULT_BUILD_DIR)
    }

    /// Resolve dependencies with a different `pkg-config` program.
    pub fn pkg_config(mut self, pkg_config: PkgConfig) -> Self {
        self.pkg_config = pkg_config;
        self
    }

    pub fn add_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.sources.push(source.into());
        self
    }

    pub fn add_sources<I, S>(&mut self, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn add_include(&mut self, include: impl Into<String>) -> &mut Self {
        self.includes.push(include.into());
        self
    }

    pub fn add_includes<I, S>(&mut self, includes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(includes.into_iter().map(Into::into));
        self
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.flags.push(flag.into());
        self
    }

    pub fn add_flags<I, S>(&mut self, flags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Add a single package dependency. See [`PlanBuilder::add_dependencies`].
    pub fn add_dependency(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.add_dependencies([name.into()])
    }

    /// Add a batch of package dependencies.
    ///
    /// Every package must be installed, then the batch's compile and link
    /// flags are queried in one provider call each. The builder is only
    /// modified once all of that succeeded.
    pub fn add_dependencies<I, S>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Ok(self);
        }

        for name in &names {
            self.pkg_config.assert_installed(name)?;
        }
        let cflags = self.pkg_config.cflags(&names[..])?;
        let libs = self.pkg_config.libs(&names[..])?;
        debug!(packages = ?names, %cflags, %libs, "resolved dependencies");

        self.dependencies.extend(names);
        if !cflags.is_empty() {
            self.flags.push(cflags);
        }
        if !libs.is_empty() {
            self.libs.push(libs);
        }
        Ok(self)
    }

    /// Accumulated compiler flags, space-joined.
    pub fn flags(&self) -> String {
        self.flags.join(" ")
    }

    /// Accumulated linker flags, space-joined.
    pub fn libs(&self) -> String {
        self.libs.join(" ")
    }

    /// Freeze the accumulated state.
    pub fn build(&self) -> BuildPlan {
        BuildPlan {
            name: self.name.clone(),
            compiler: self.compiler.clone(),
            build_dir: self.build_dir.clone(),
            sources: self.sources.clone(),
            includes: self.includes.clone(),
            dependencies: self.dependencies.clone(),
            flags: self.flags(),
            libs: self.libs(),
        }
    }
}

/// Create `dir` (and missing parents), tolerating only "already exists".
pub(crate) fn make_dir(dir: &Path) -> Result<()> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(source) => Err(BuildError::FileSystem {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Immutable description of one executable target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    name: String,
    compiler: String,
    build_dir: PathBuf,
    sources: Vec<String>,
    includes: Vec<String>,
    dependencies: Vec<String>,
    flags: String,
    libs: String,
}

/// A compile step derived from a plan for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectArtifact {
    /// Object file path, e.g. `build/main.o`.
    pub object: String,
    /// Full compiler invocation producing `object`.
    pub command: String,
    /// The source path exactly as it was added.
    pub source: String,
}

impl BuildPlan {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn libs(&self) -> &str {
        &self.libs
    }

    /// Path of the linked executable.
    pub fn output(&self) -> String {
        self.in_build_dir(&self.name)
    }

    /// Object file for `source`: `<build_dir>/<base>.o`, where `<base>` is
    /// the file name up to its first dot.
    ///
    /// Two sources with the same base name map to the same object.
    pub fn object_name(&self, source: &str) -> String {
        let file_name = Path::new(source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = file_name.split('.').next().unwrap_or_default();
        self.in_build_dir(&format!("{base}.o"))
    }

    /// `-I<dir>` arguments in the order the directories were added.
    pub fn include_args(&self) -> Vec<String> {
        self.includes.iter().map(|i| format!("-I{i}")).collect()
    }

    /// `<compiler> -c <flags> <-I...> -o <object> <source>`
    pub fn compile_command(&self, source: &str) -> String {
        let object = self.object_name(source);
        let includes = self.include_args().join(" ");
        join_nonempty(&[
            &self.compiler,
            "-c",
            &self.flags,
            &includes,
            "-o",
            &object,
            source,
        ])
    }

    /// Compile steps for every source, in insertion order.
    pub fn objects(&self) -> Vec<ObjectArtifact> {
        self.sources
            .iter()
            .map(|source| ObjectArtifact {
                object: self.object_name(source),
                command: self.compile_command(source),
                source: source.clone(),
            })
            .collect()
    }

    /// Make rule header for the executable: `<output>: <objects...>`.
    pub fn link_target(&self) -> String {
        let objects = self.object_list();
        format!("{}: {}", self.output(), objects).trim_end().to_string()
    }

    /// `<compiler> <flags> <libs> -o <output> <objects...>`
    pub fn link_command(&self) -> String {
        let output = self.output();
        let objects = self.object_list();
        join_nonempty(&[
            &self.compiler,
            &self.flags,
            &self.libs,
            "-o",
            &output,
            &objects,
        ])
    }

    fn object_list(&self) -> String {
        self.sources
            .iter()
            .map(|s| self.object_name(s))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn in_build_dir(&self, file: &str) -> String {
        self.build_dir.join(file).to_string_lossy().into_owned()
    }
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
