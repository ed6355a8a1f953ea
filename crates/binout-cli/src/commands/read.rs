use crate::error::CliError;
use anyhow::Result;
use binout_core::ElementType;
use binout_parser::Archive;
use clap::Args;
use serde_json::json;

/// Read a variable's payload and print it as text or JSON.
#[derive(Args)]
pub struct ReadCommand {
    /// Shell glob matching the archive's shard files
    pub pattern: String,

    /// Absolute path to the variable to read
    pub path: String,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: String,
}

macro_rules! dispatch {
    ($archive:expr, $path:expr, $variant:expr, [$($elem:ident => $method:ident),+ $(,)?]) => {
        match $variant {
            $(ElementType::$elem => $archive.$method($path)?.map(|v| json!(v)),)+
        }
    };
}

impl ReadCommand {
    pub fn execute(&self) -> Result<()> {
        if self.format != "text" && self.format != "json" {
            return Err(CliError::UnsupportedFormat {
                format: self.format.clone(),
                supported: crate::error::supported_read_formats(),
            }
            .into());
        }

        let mut archive = Archive::open(&self.pattern)?;

        let type_id = archive
            .get_type_id(&self.path)
            .ok_or_else(|| CliError::VariableNotFound {
                path: self.path.clone(),
            })?;
        let element_type = ElementType::from_type_id(type_id).ok_or_else(|| CliError::VariableNotFound {
            path: self.path.clone(),
        })?;

        let values = dispatch!(archive, &self.path, element_type, [
            Int8 => read_i8,
            Int16 => read_i16,
            Int32 => read_i32,
            Int64 => read_i64,
            UInt8 => read_u8,
            UInt16 => read_u16,
            UInt32 => read_u32,
            UInt64 => read_u64,
            Float32 => read_f32,
            Float64 => read_f64,
        ]);

        let values = match values {
            Some(v) => v,
            None => {
                let err = archive
                    .read_error()
                    .unwrap_or("unknown read failure")
                    .to_string();
                return Err(anyhow::anyhow!(err));
            }
        };

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(&json!({
                "path": self.path,
                "type": element_type.name(),
                "values": values,
            }))?);
        } else {
            println!("{} ({})", self.path, element_type.name());
            let rendered = values
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_else(|| values.to_string());
            println!("{rendered}");
        }

        Ok(())
    }
}
