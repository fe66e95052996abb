//! compile_commands.json reading and writing.
//!
//! The compilation database records the exact compile invocation for each
//! source file so that clangd and similar tools can index the project.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single entry in compile_commands.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The full compilation command (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// The source file path, as given to the compiler.
    pub file: String,

    /// The compilation arguments (array form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
}

impl CompileCommand {
    pub fn new(directory: impl Into<PathBuf>, command: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            command: Some(command.into()),
            file: file.into(),
            arguments: None,
        }
    }

    /// Get the compilation arguments as a vector.
    pub fn get_args(&self) -> Vec<String> {
        if let Some(args) = &self.arguments {
            args.clone()
        } else if let Some(cmd) = &self.command {
            // Commands are emitted unquoted, so a whitespace split is exact
            cmd.split_whitespace().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        }
    }
}

/// Collection of compile commands (a whole compile_commands.json).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    pub fn new(commands: Vec<CompileCommand>) -> Self {
        Self { commands }
    }

    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::BuildError::io(path, e))?;
        Self::from_str(&content)
    }

    /// Parse compile commands from a JSON string.
    pub fn from_str(json: &str) -> crate::Result<Self> {
        let commands: Vec<CompileCommand> = serde_json::from_str(json)?;
        Ok(Self { commands })
    }

    /// Render as a JSON array indented with four spaces.
    pub fn to_json(&self) -> crate::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.commands.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Find the compile command for a specific source file.
    pub fn find_command(&self, source: &str) -> Option<&CompileCommand> {
        self.commands
            .iter()
            .find(|cmd| cmd.file == source || Path::new(&cmd.file).ends_with(source))
    }
}
