//! seed-install - installation orchestrator for the SEED agent framework

use std::io::IsTerminal as _;

use clap::Parser;
use seed_installer::cli::Cli;
use seed_installer::domain::classify::ClassifiedError;
use seed_installer::output::json;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;

    if let Err(e) = cli.run().await {
        // Classified failures were already rendered by the command.
        if let Some(classified) = e.downcast_ref::<ClassifiedError>() {
            std::process::exit(classified.exit_code());
        }
        if json_mode {
            match json::format_error(&format!("{e:#}"), "UNCLASSIFIED") {
                Ok(out) => println!("{out}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SEED_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}
