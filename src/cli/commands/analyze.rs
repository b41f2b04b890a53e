//! Implementation of the `genius analyze` command.

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::analysis::{OspClient, RankedFile, SubprocessBackend};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Ranking strategy understood by the analysis runtime
    #[arg(long, default_value = "default")]
    pub strategy: String,

    /// Show at most this many files
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn format_ranking(ranked: &[RankedFile]) -> String {
    let width = ranked.iter().map(|file| file.path.len()).max().unwrap_or(0);
    ranked
        .iter()
        .enumerate()
        .map(|(index, file)| {
            format!(
                "{:>3}. {:<width$}  {:.3}\n",
                index + 1,
                file.path,
                file.score,
                width = width
            )
        })
        .collect()
}

pub async fn execute(args: AnalyzeArgs, json_mode: bool) -> Result<()> {
    let config = Config::load()?;
    let backend = SubprocessBackend::new(config.osp_runtime.clone(), config.osp_workspace.clone());
    match backend.version().await {
        Ok(version) => debug!(runtime = %config.osp_runtime, %version, "analysis runtime"),
        Err(error) => debug!(%error, "could not read analysis runtime version"),
    }

    let client = OspClient::new(backend);
    let mut ranked = client
        .rank_files(&args.strategy)
        .await
        .with_context(|| format!("Ranking files with strategy '{}' failed", args.strategy))?;
    ranked.truncate(args.limit);

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else if ranked.is_empty() {
        println!("No files ranked.");
    } else {
        print!("{}", format_ranking(&ranked));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ranking_aligns_scores() {
        let ranked = vec![
            RankedFile {
                path: "src/lib.rs".to_string(),
                score: 0.9,
            },
            RankedFile {
                path: "a.rs".to_string(),
                score: 0.25,
            },
        ];
        assert_eq!(
            format_ranking(&ranked),
            "  1. src/lib.rs  0.900\n  2. a.rs        0.250\n"
        );
    }
}
