use anyhow::Result;
use binout_parser::Archive;
use clap::Args;
use colored::*;
use log::info;

/// Print a summary of an archive: shard count, open-time errors, and the
/// immediate children of the root folder.
#[derive(Args)]
pub struct InfoCommand {
    /// Shell glob matching the archive's shard files, e.g. `d3plot*`
    pub pattern: String,
}

impl InfoCommand {
    pub fn execute(&self) -> Result<()> {
        let archive = Archive::open(&self.pattern)?;
        info!("opened archive for pattern {}", self.pattern);

        println!("{} {}", "Shards:".bold(), archive.shard_count());
        for index in 0..archive.shard_count() {
            match archive.shard_info(index) {
                Some((path, len)) => println!("  [{index}] {} ({len} bytes)", path.display()),
                None => println!("  [{index}] {}", "failed".red()),
            }
        }

        match archive.open_error() {
            Some(err) => {
                println!("{}", "Shard errors:".yellow().bold());
                for line in err.lines() {
                    println!("  {line}");
                }
            }
            None => println!("{}", "All shards parsed cleanly.".green()),
        }

        let children = archive.get_children("/").unwrap_or_default();
        println!("{} {}", "Root entries:".bold(), children.len());
        for name in &children {
            println!("  /{name}");
        }

        Ok(())
    }
}
