//! Default C compiler discovery.

use crate::error::{BuildError, Result};
use crate::process;
use tracing::debug;

/// Compilers probed by [`find_compiler`], in priority order.
pub const FALLBACK_COMPILERS: &[&str] = &["cc", "gcc", "clang"];

/// Find a C compiler on the system.
///
/// Tries `cc` first, then falls back to `gcc` and `clang`. The returned
/// value is the command name, not its resolved path, so generated
/// Makefiles stay portable across machines.
pub fn find_compiler() -> Result<String> {
    find_first(FALLBACK_COMPILERS)
}

fn find_first(candidates: &[&str]) -> Result<String> {
    for candidate in candidates {
        if is_on_path(candidate) {
            debug!(compiler = candidate, "found compiler");
            return Ok(candidate.to_string());
        }
    }

    Err(BuildError::NoToolchain)
}

fn is_on_path(program: &str) -> bool {
    // A missing `which` counts as "not found" for this candidate.
    match process::run("which", &[program], None) {
        Ok(output) => output.success && !output.stdout.trim().is_empty(),
        Err(_) => false,
    }
}
