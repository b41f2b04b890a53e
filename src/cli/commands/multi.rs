//! Implementation of the `genius multi` command.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use super::read_lines;
use crate::diff::{create_structured_diff, optimize_diff_context, FileChange, StructuredDiff};

#[derive(Args, Debug)]
pub struct MultiArgs {
    /// Alternating ORIGINAL UPDATED paths, one pair per file
    #[arg(required = true, num_args = 2..)]
    pub files: Vec<PathBuf>,

    /// Shrink each diff's context to fit roughly this many tokens
    #[arg(long)]
    pub max_tokens: Option<usize>,
}

/// Pair up the positional paths; the original path names the change.
pub fn load_changes(files: &[PathBuf]) -> Result<Vec<FileChange>> {
    if files.len() % 2 != 0 {
        bail!(
            "expected ORIGINAL UPDATED pairs, got an odd number of paths ({})",
            files.len()
        );
    }
    files
        .chunks(2)
        .map(|pair| {
            Ok(FileChange::new(
                pair[0].to_string_lossy(),
                read_lines(&pair[0])?,
                read_lines(&pair[1])?,
            ))
        })
        .collect()
}

pub fn build(changes: &[FileChange], max_tokens: Option<usize>) -> Result<StructuredDiff> {
    let mut structured = create_structured_diff(changes)?;
    if let Some(budget) = max_tokens {
        for file in &mut structured.files {
            file.diff = optimize_diff_context(&file.diff, budget);
        }
    }
    Ok(structured)
}

pub async fn execute(args: MultiArgs, json_mode: bool) -> Result<()> {
    let changes = load_changes(&args.files)?;
    let structured = build(&changes, args.max_tokens)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&structured)?);
    } else {
        for file in &structured.files {
            print!("{}", file.diff);
        }
    }
    Ok(())
}
