//! Predefined compiler flag presets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Build type selecting a flag preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    /// Symbols, sanitizers and extra warnings.
    #[default]
    Debug,
    /// Optimization, LTO and hardening.
    Release,
}

const RELEASE_FLAGS: &[&str] = &[
    "-O2",
    "-march=native",
    "-flto",
    "-Wall",
    "-Wextra",
    "-Wpedantic",
    "-fstack-protector-strong",
    "-D_FORTIFY_SOURCE=2",
    "-Wformat",
    "-Wformat-security",
];

const DEBUG_FLAGS: &[&str] = &[
    "-g",
    "-O0",
    "-Wall",
    "-Wextra",
    "-Wpedantic",
    "-Wnull-dereference",
    "-fsanitize=address,undefined",
    "-fno-omit-frame-pointer",
];

/// The ordered compiler flags for a build type.
pub fn default_flags(build_type: BuildType) -> &'static [&'static str] {
    match build_type {
        BuildType::Release => RELEASE_FLAGS,
        BuildType::Debug => DEBUG_FLAGS,
    }
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            other => Err(format!("unknown build type `{other}` (expected debug or release)")),
        }
    }
}
