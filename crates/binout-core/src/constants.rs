//! Fixed, format-level constants: the record-header prefix layout, the
//! record command enumeration, and the typed-element set.

/// Size in bytes of the fixed prefix every shard begins with: endianness
/// flag, three field-width bytes, float-format flag, and 3 bytes of
/// reserved padding.
pub const HEADER_PREFIX_SIZE: usize = 8;

/// The only endianness flag value this reader accepts.
pub const ENDIAN_LITTLE: u8 = 0;

/// The only float-format flag value this reader accepts.
pub const FLOAT_FORMAT_IEEE: u8 = 0;

/// Field widths must not exceed this many bytes (they back a `u64`).
pub const MAX_FIELD_WIDTH: u8 = 8;

/// Maximum supported path length, in bytes, including any trailing nul a
/// C host binding would reserve.
pub const MAX_PATH_LEN: usize = 1024;

/// The record commands a shard stream can carry. Only [`RecordCommand::Cd`]
/// and [`RecordCommand::Data`] are acted on; the rest are recognized so a
/// reader can log them, but their payload is skipped unread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCommand {
    Null,
    Cd,
    Data,
    Variable,
    BeginSymbolTable,
    EndSymbolTable,
    SymbolTableOffset,
    /// A command value this reader doesn't recognize; its payload is
    /// skipped like any other non-CD/DATA command.
    Unknown(u64),
}

impl From<u64> for RecordCommand {
    fn from(value: u64) -> Self {
        match value {
            0 => RecordCommand::Null,
            1 => RecordCommand::Cd,
            2 => RecordCommand::Data,
            3 => RecordCommand::Variable,
            4 => RecordCommand::BeginSymbolTable,
            5 => RecordCommand::EndSymbolTable,
            6 => RecordCommand::SymbolTableOffset,
            other => RecordCommand::Unknown(other),
        }
    }
}

/// The fixed set of element types a DATA record's payload can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl ElementType {
    /// Size in bytes of a single element of this type.
    pub const fn element_size(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => 8,
        }
    }

    /// The on-disk type id for this element type.
    pub const fn type_id(self) -> u64 {
        match self {
            ElementType::Int8 => 0,
            ElementType::Int16 => 1,
            ElementType::Int32 => 2,
            ElementType::Int64 => 3,
            ElementType::UInt8 => 4,
            ElementType::UInt16 => 5,
            ElementType::UInt32 => 6,
            ElementType::UInt64 => 7,
            ElementType::Float32 => 8,
            ElementType::Float64 => 9,
        }
    }

    /// Decode a type id read from a DATA record.
    pub fn from_type_id(type_id: u64) -> Option<Self> {
        Some(match type_id {
            0 => ElementType::Int8,
            1 => ElementType::Int16,
            2 => ElementType::Int32,
            3 => ElementType::Int64,
            4 => ElementType::UInt8,
            5 => ElementType::UInt16,
            6 => ElementType::UInt32,
            7 => ElementType::UInt64,
            8 => ElementType::Float32,
            9 => ElementType::Float64,
            _ => return None,
        })
    }

    /// Short name used in error messages and the demonstration CLI
    /// (`"The data is of type FLOAT64 instead of INT32"`).
    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Int8 => "INT8",
            ElementType::Int16 => "INT16",
            ElementType::Int32 => "INT32",
            ElementType::Int64 => "INT64",
            ElementType::UInt8 => "UINT8",
            ElementType::UInt16 => "UINT16",
            ElementType::UInt32 => "UINT32",
            ElementType::UInt64 => "UINT64",
            ElementType::Float32 => "FLOAT32",
            ElementType::Float64 => "FLOAT64",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_size_table_matches_spec() {
        let sizes: Vec<usize> = [
            ElementType::Int8,
            ElementType::Int16,
            ElementType::Int32,
            ElementType::Int64,
            ElementType::UInt8,
            ElementType::UInt16,
            ElementType::UInt32,
            ElementType::UInt64,
            ElementType::Float32,
            ElementType::Float64,
        ]
        .into_iter()
        .map(ElementType::element_size)
        .collect();

        assert_eq!(sizes, vec![1, 2, 4, 8, 1, 2, 4, 8, 4, 8]);
    }

    #[test]
    fn type_id_round_trips() {
        for t in [
            ElementType::Int8,
            ElementType::Float64,
            ElementType::UInt32,
        ] {
            assert_eq!(ElementType::from_type_id(t.type_id()), Some(t));
        }
        assert_eq!(ElementType::from_type_id(99), None);
    }

    #[test]
    fn record_command_from_u64() {
        assert_eq!(RecordCommand::from(1), RecordCommand::Cd);
        assert_eq!(RecordCommand::from(2), RecordCommand::Data);
        assert!(matches!(RecordCommand::from(42), RecordCommand::Unknown(42)));
    }
}
