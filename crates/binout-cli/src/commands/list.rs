use crate::error::CliError;
use anyhow::Result;
use binout_parser::Archive;
use clap::Args;
use colored::*;

/// List the immediate children of a path within an archive.
#[derive(Args)]
pub struct ListCommand {
    /// Shell glob matching the archive's shard files
    pub pattern: String,

    /// Path within the archive to list (defaults to the root)
    #[arg(default_value = "/")]
    pub path: String,
}

impl ListCommand {
    pub fn execute(&self) -> Result<()> {
        let archive = Archive::open(&self.pattern)?;

        let children = archive
            .get_children(&self.path)
            .ok_or_else(|| CliError::VariableNotFound {
                path: self.path.clone(),
            })?;

        for name in children {
            let child_path = format!("{}/{name}", self.path.trim_end_matches('/'));
            if archive.variable_exists(&child_path) {
                let type_name = archive
                    .get_type_id(&child_path)
                    .and_then(binout_core::ElementType::from_type_id)
                    .map(|t| t.name())
                    .unwrap_or("?");
                println!("{name}  {}", type_name.dimmed());
            } else {
                println!("{}/", name.blue());
            }
        }

        Ok(())
    }
}
