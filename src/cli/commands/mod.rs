//! One module per subcommand, each exposing `execute(args, json_mode)`.

pub mod analyze;
pub mod diff;
pub mod multi;
pub mod restore;
pub mod rewrite;

use anyhow::{Context, Result};
use std::path::Path;

use crate::diff::split_lines;

/// Read a local file as newline-terminated lines.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(split_lines(&content)
        .into_iter()
        .map(str::to_string)
        .collect())
}
