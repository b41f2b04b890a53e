//! Implementation of the `genius diff` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::read_lines;
use crate::diff::{DiffError, StreamingDiffRenderer, DEFAULT_CONTEXT_LINES};
use crate::terminal::FramePrinter;
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// File holding the original content
    pub original: PathBuf,

    /// File holding the rewritten content
    pub updated: PathBuf,

    /// Do not wait for Enter between frames
    #[arg(long)]
    pub no_pause: bool,

    /// Name for the diff headers; an existing file of that name in the
    /// current directory replaces the original
    #[arg(long)]
    pub name: Option<String>,

    /// Unchanged lines around each hunk
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    pub context: usize,
}

/// Frames a streaming consumer would have shown while `updated` arrived one
/// line at a time. Steps that do not line up with the original are skipped.
pub fn replay_frames(
    renderer: &StreamingDiffRenderer<'_>,
    original: &[String],
    updated: &[String],
    name: Option<&str>,
) -> Result<Vec<String>, DiffError> {
    let mut frames = Vec::new();
    for end in 1..=updated.len() {
        let frame = renderer.render(original, &updated[..end], false, name)?;
        if !frame.is_empty() {
            frames.push(frame);
        }
    }
    Ok(frames)
}

pub async fn execute(args: DiffArgs, json_mode: bool) -> Result<()> {
    let original = read_lines(&args.original)?;
    let updated = read_lines(&args.updated)?;

    let workspace =
        Workspace::new(std::env::current_dir().context("Failed to get current directory")?);
    let mut renderer = StreamingDiffRenderer::new().with_context_lines(args.context);
    if args.name.is_some() {
        renderer = renderer.with_resolver(&workspace);
    }
    let name = args.name.as_deref();

    let final_diff = renderer.render(&original, &updated, true, name)?;
    if json_mode {
        let frames = replay_frames(&renderer, &original, &updated, name)?;
        let value = serde_json::json!({
            "frames": frames,
            "diff": final_diff,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut printer = FramePrinter::stdout();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    for frame in replay_frames(&renderer, &original, &updated, name)? {
        printer.show(&frame)?;
        if !args.no_pause {
            // EOF on stdin stops pausing but keeps replaying.
            if stdin.next_line().await?.is_none() {
                debug!("stdin closed, continuing without pauses");
            }
        }
    }
    printer.show(&final_diff)?;
    debug!(frames = printer.frames(), "diff replay finished");
    Ok(())
}
