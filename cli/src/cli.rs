//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Install, roll back and diagnose the SEED agent framework
#[derive(Parser)]
#[command(
    name = "seed-install",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Show raw tool output for failures and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install the framework under the base path
    Install(commands::install::InstallArgs),

    /// Remove everything a previous install recorded
    Rollback(commands::rollback::RollbackArgs),

    /// Inspect the current installation and write a report
    Diagnose,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose,
            command,
        } = self;
        let yes = match &command {
            Command::Install(args) => args.yes,
            Command::Rollback(args) => args.yes,
            Command::Diagnose => false,
        };
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
                verbose,
            },
            behaviour: BehaviourFlags { yes },
        })?;

        match command {
            Command::Install(args) => commands::install::run(&app, &args).await,
            Command::Rollback(args) => commands::rollback::run(&app, &args).await,
            Command::Diagnose => commands::diagnose::run(&app).await,
        }
    }
}
