//! Error types for aods-build.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for aods-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while configuring or generating a build.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    /// A package is unknown to the package-metadata provider.
    #[error("`{0}` not installed!")]
    #[diagnostic(
        code(aods::dependency_not_found),
        help("install the development package or check PKG_CONFIG_PATH")
    )]
    DependencyNotFound(String),

    /// The package-metadata provider failed for a batch of packages.
    #[error("`{command}` failed: {message}")]
    #[diagnostic(code(aods::resolution))]
    Resolution { command: String, message: String },

    /// The compiler's dependency scan failed for a source file.
    #[error("failed making a makefile entry for `{source_file}`:\n{stderr}")]
    #[diagnostic(code(aods::compile_dependency))]
    CompileDependency { source_file: String, stderr: String },

    /// None of the fallback compilers could be found.
    #[error("no C compiler found")]
    #[diagnostic(code(aods::no_toolchain), help("install one of: cc, gcc, clang"))]
    NoToolchain,

    /// The working directory for the compilation database is unknown.
    #[error("couldn't determine the project root: {0}")]
    #[diagnostic(code(aods::root_path))]
    RootPath(#[source] std::io::Error),

    /// Creating the output directory failed for a reason other than it existing.
    #[error("failed to create directory {}: {source}", .path.display())]
    #[diagnostic(code(aods::filesystem))]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a file, or spawning a tool, failed.
    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(code(aods::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML manifest.
    #[error("Failed to parse TOML manifest: {0}")]
    #[diagnostic(code(aods::manifest))]
    ParseToml(#[from] toml::de::Error),

    /// Failed to read or write JSON (compile_commands.json).
    #[error("JSON error: {0}")]
    #[diagnostic(code(aods::json))]
    Json(#[from] serde_json::Error),

    /// Manifest validation error.
    #[error("Manifest validation error: {0}")]
    #[diagnostic(code(aods::validation))]
    Validation(String),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
