use thiserror::Error;

/// Every way opening, parsing, or reading a binout archive can fail.
///
/// Open-time failures (see [`BinoutError::is_open_failure`]) are accumulated
/// per shard and never abort the whole archive; read-time failures are
/// returned directly from the typed-read API.
#[derive(Error, Debug)]
pub enum BinoutError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported endianness flag 0x{flag:02X}: only little-endian archives are supported")]
    UnsupportedEndianness { flag: u8 },

    #[error("unsupported float format flag 0x{flag:02X}: only IEEE-754 archives are supported")]
    UnsupportedFloatFormat { flag: u8 },

    #[error("field width {width} exceeds the maximum of 8 bytes")]
    FieldWidthTooLarge { width: u8 },

    #[error("truncated header: expected {expected} bytes, found {found}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("truncated record at offset {offset}: expected {expected} more bytes, found {found}")]
    TruncatedRecord {
        offset: u64,
        expected: usize,
        found: usize,
    },

    #[error("record length {length} at offset {offset} underflows the header field widths")]
    LengthUnderflow { offset: u64, length: u64 },

    #[error("DATA record at offset {offset} appeared before any CD record")]
    DataBeforeCd { offset: u64 },

    #[error("path exceeds the maximum supported length of {max} bytes")]
    PathTooLong { max: usize },

    #[error("unknown element type id {type_id}")]
    UnknownElementType { type_id: u64 },

    #[error("The data is of type {actual} instead of {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("variable not found: {path}")]
    PathNotFound { path: String },

    #[error("shard {index} is not open (it failed during archive opening)")]
    ShardNotOpen { index: usize },

    #[error("no shard matched pattern: {pattern}")]
    NoShardsMatched { pattern: String },

    #[error("glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

impl BinoutError {
    /// True for the taxonomy of errors a per-shard parse can raise; these are
    /// the ones the opener downgrades to an accumulated open-time error
    /// string instead of propagating.
    pub fn is_open_failure(&self) -> bool {
        !matches!(
            self,
            BinoutError::TypeMismatch { .. }
                | BinoutError::PathNotFound { .. }
                | BinoutError::ShardNotOpen { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BinoutError>;
