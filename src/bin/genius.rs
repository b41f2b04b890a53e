use clap::Parser;

use genius::cli::{commands, handle_error, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    genius::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args, cli.json).await,
        Commands::Multi(args) => commands::multi::execute(args, cli.json).await,
        Commands::Rewrite(args) => commands::rewrite::execute(args, cli.json).await,
        Commands::Analyze(args) => commands::analyze::execute(args, cli.json).await,
        Commands::Restore(args) => commands::restore::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        let _ = genius::terminal::restore();
        handle_error(err, cli.json);
    }
}
