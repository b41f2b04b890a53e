//! Implementation of the `genius restore` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup id printed by `genius rewrite --apply`
    pub backup_id: String,
}

pub async fn execute(args: RestoreArgs, json_mode: bool) -> Result<()> {
    let workspace =
        Workspace::new(std::env::current_dir().context("Failed to get current directory")?);
    let restored = workspace.restore_backup(&args.backup_id)?;

    if json_mode {
        let value = serde_json::json!({
            "backup_id": args.backup_id,
            "restored": restored,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Restored {} file(s) from {}", restored.len(), args.backup_id);
        for path in &restored {
            println!("  - {path}");
        }
    }
    Ok(())
}
