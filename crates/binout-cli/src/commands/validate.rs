use anyhow::Result;
use binout_parser::Archive;
use clap::Args;
use colored::*;

/// Open an archive and report per-shard failures; exits non-zero if any
/// shard failed to open or parse.
#[derive(Args)]
pub struct ValidateCommand {
    /// Shell glob matching the archive's shard files
    pub pattern: String,
}

impl ValidateCommand {
    pub fn execute(&self) -> Result<()> {
        let archive = Archive::open(&self.pattern)?;

        match archive.open_error() {
            None => {
                println!("{}", "OK".green().bold());
                Ok(())
            }
            Some(err) => {
                println!("{}", "FAILED".red().bold());
                for line in err.lines() {
                    println!("  {line}");
                }
                std::process::exit(1);
            }
        }
    }
}
