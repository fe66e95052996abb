//! Makefile and compilation database generation for native C projects.
//!
//! This crate provides:
//! - A [`PlanBuilder`] accumulating sources, include directories,
//!   pkg-config dependencies and compiler flags into a [`BuildPlan`]
//! - A [`Generator`] writing a dependency-aware Makefile and a
//!   `compile_commands.json` from a plan
//! - The `aods.toml` manifest format
//! - Compiler discovery and debug/release flag presets
//!
//! # Example
//!
//! ```no_run
//! use aods_build::{Generator, PlanBuilder};
//!
//! # fn main() -> aods_build::Result<()> {
//! let mut builder = PlanBuilder::new("app", "cc", "build")?;
//! builder.add_source("main.c").add_include("include");
//! builder.add_dependency("zlib")?;
//!
//! Generator::from_current_dir()?.generate(&builder.build())?;
//! # Ok(())
//! # }
//! ```
//!
//! ```toml
//! # aods.toml
//! [project]
//! name = "app"
//!
//! [compiler]
//! profile = "debug"
//!
//! [target]
//! sources = ["src/main.c", "src/util.c"]
//! includes = ["include"]
//! dependencies = ["zlib"]
//! ```

mod compile_commands;
mod config;
mod depscan;
mod error;
mod flags;
mod generate;
mod pkgconfig;
mod plan;
mod process;
mod toolchain;

pub use compile_commands::{CompileCommand, CompileCommands};
pub use config::{CompilerConfig, Manifest, ProjectConfig, TargetConfig, MANIFEST_FILE};
pub use depscan::HeaderScanner;
pub use error::{BuildError, Result};
pub use flags::{default_flags, BuildType};
pub use generate::{render_makefile, CompileRule, Generator, COMPILE_COMMANDS};
pub use pkgconfig::PkgConfig;
pub use plan::{BuildPlan, ObjectArtifact, PlanBuilder, DEFAULT_BUILD_DIR};
pub use toolchain::{find_compiler, FALLBACK_COMPILERS};
