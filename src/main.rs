use clap::Parser;
use tracing_subscriber::EnvFilter;

use bankfeed::cli::Cli;
use bankfeed::dispatcher;

fn main() {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = dispatcher::dispatch_command(cli.command, cli.db, cli.json) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
