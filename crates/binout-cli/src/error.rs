use thiserror::Error;

/// CLI-specific error types — failures in argument handling and output
/// rendering that sit above [`binout_core::errors::BinoutError`].
#[derive(Debug, Error)]
pub enum CliError {
    #[error("unsupported output format '{format}'. Supported formats: {}", .supported.join(", "))]
    UnsupportedFormat {
        format: String,
        supported: Vec<String>,
    },

    #[error("{path} does not exist or does not address a variable")]
    VariableNotFound { path: String },

    #[error("{0}")]
    Archive(#[from] binout_core::errors::BinoutError),
}

pub fn supported_read_formats() -> Vec<String> {
    vec!["text".to_string(), "json".to_string()]
}
