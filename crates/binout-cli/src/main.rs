mod commands;
mod error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use commands::{InfoCommand, ListCommand, ReadCommand, TimestepsCommand, ValidateCommand};

#[derive(Parser)]
#[command(name = "binout")]
#[command(version, about = "binout archive inspection tool", long_about = None)]
#[command(author = "binout-rs Contributors")]
struct Cli {
    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of an archive's shards and root entries
    Info(InfoCommand),

    /// List the children of a path within an archive
    #[command(name = "ls")]
    List(ListCommand),

    /// Read a variable's payload
    Read(ReadCommand),

    /// Report the timestep count under a folder
    Timesteps(TimestepsCommand),

    /// Validate that every shard opens and parses cleanly
    Validate(ValidateCommand),
}

fn setup_logging(verbosity: u8, quiet: bool) {
    if quiet {
        return;
    }

    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Info(cmd) => cmd.execute(),
        Commands::List(cmd) => cmd.execute(),
        Commands::Read(cmd) => cmd.execute(),
        Commands::Timesteps(cmd) => cmd.execute(),
        Commands::Validate(cmd) => cmd.execute(),
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("{}: {}", "Error".red().bold(), e);

            if cli.verbose > 0 {
                let mut source = e.source();
                while let Some(err) = source {
                    eprintln!("{}: {}", "Caused by".yellow(), err);
                    source = err.source();
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
