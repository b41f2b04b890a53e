//! Implementation of the `genius rewrite` command.

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::diff::{StreamingDiffRenderer, DEFAULT_CONTEXT_LINES};
use crate::rewrite::{run_rewrite, RewriteRequest};
use crate::terminal::FramePrinter;
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// File to rewrite, relative to the working directory
    pub file: String,

    /// What the rewrite should do
    pub instruction: String,

    /// Write the result back (after backing up the original)
    #[arg(long)]
    pub apply: bool,

    /// Unchanged lines around each hunk
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    pub context: usize,
}

pub async fn execute(args: RewriteArgs, json_mode: bool) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let workspace = Workspace::new(config.working_dir.clone());
    let original = workspace.read_lines(&args.file)?;
    let client = ApiClient::new(&config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let request = RewriteRequest {
        path: &args.file,
        original: &original,
        instruction: &args.instruction,
    };
    let renderer = StreamingDiffRenderer::new().with_context_lines(args.context);

    let mut printer = (!json_mode).then(FramePrinter::stdout);
    let outcome = run_rewrite(&client, &request, renderer, &cancel, |frame| {
        if let Some(printer) = printer.as_mut() {
            printer.show(frame)?;
        }
        Ok(())
    })
    .await?;

    if outcome.stop_reason.as_deref() == Some("max_tokens") {
        warn!(file = %args.file, "generation hit the token limit; the rewrite may be truncated");
    }

    let mut backup_id = None;
    if args.apply && outcome.changed(&original) {
        let id = workspace
            .backup_files(&[args.file.as_str()])
            .context("Failed to back up before applying the rewrite")?;
        workspace.write_file(&args.file, &outcome.content)?;
        info!(file = %args.file, backup_id = %id, "applied rewrite");
        backup_id = Some(id);
    }

    if json_mode {
        let value = serde_json::json!({
            "path": args.file,
            "diff": outcome.diff,
            "changed": outcome.changed(&original),
            "applied": backup_id.is_some(),
            "backup_id": backup_id,
            "stop_reason": outcome.stop_reason,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if let Some(printer) = printer.as_mut() {
        printer.show(&outcome.diff)?;
    }
    match backup_id {
        Some(id) => println!("Applied. Undo with: genius restore {id}"),
        None if args.apply => println!("No changes to apply."),
        None => {}
    }
    Ok(())
}
