use crate::error::CliError;
use anyhow::Result;
use binout_parser::Archive;
use clap::Args;

/// Report the number of timesteps found under a folder.
#[derive(Args)]
pub struct TimestepsCommand {
    /// Shell glob matching the archive's shard files
    pub pattern: String,

    /// Folder to scan for `d[0-9]+` children
    #[arg(default_value = "/")]
    pub path: String,
}

impl TimestepsCommand {
    pub fn execute(&self) -> Result<()> {
        let archive = Archive::open(&self.pattern)?;

        let count = archive
            .get_num_timesteps(&self.path)
            .ok_or_else(|| CliError::VariableNotFound {
                path: self.path.clone(),
            })?;

        println!("{count}");
        Ok(())
    }
}
