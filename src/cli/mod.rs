//! Command-line surface of the `genius` binary.

pub mod commands;

use clap::{Parser, Subcommand};

use commands::{
    analyze::AnalyzeArgs, diff::DiffArgs, multi::MultiArgs, restore::RestoreArgs,
    rewrite::RewriteArgs,
};

#[derive(Parser, Debug)]
#[command(name = "genius", version, about = "Streaming diffs for whole-file rewrites")]
pub struct Cli {
    /// Emit machine-readable JSON where a command supports it
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a rewrite line by line as streaming diff frames
    Diff(DiffArgs),
    /// Render final diffs for several original/updated file pairs
    Multi(MultiArgs),
    /// Ask the model to rewrite a file and stream the diff as it arrives
    Rewrite(RewriteArgs),
    /// Rank repository files with the analysis runtime
    Analyze(AnalyzeArgs),
    /// Put the files of a backup back in place
    Restore(RestoreArgs),
}

/// Print a failed command's error chain and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let value = serde_json::json!({
            "error": err.to_string(),
            "caused_by": chain,
        });
        println!("{value}");
    } else {
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diff_with_global_flags() {
        let cli = Cli::try_parse_from([
            "genius", "diff", "a.txt", "b.txt", "--no-pause", "--name", "a.txt", "-v",
        ])
        .expect("parses");
        assert!(cli.verbose);
        match cli.command {
            Commands::Diff(args) => {
                assert!(args.no_pause);
                assert_eq!(args.name.as_deref(), Some("a.txt"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_multi_pairs_and_budget() {
        let cli = Cli::try_parse_from([
            "genius",
            "--json",
            "multi",
            "a.old",
            "a.new",
            "b.old",
            "b.new",
            "--max-tokens",
            "400",
        ])
        .expect("parses");
        assert!(cli.json);
        match cli.command {
            Commands::Multi(args) => {
                assert_eq!(args.files.len(), 4);
                assert_eq!(args.max_tokens, Some(400));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_missing_subcommand() {
        assert!(Cli::try_parse_from(["genius"]).is_err());
    }
}
