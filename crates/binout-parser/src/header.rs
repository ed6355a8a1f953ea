//! The fixed 8-byte prefix every shard begins with (§3, §4.3 step 1).

use crate::reader::ShardReader;
use binout_core::constants::{
    ENDIAN_LITTLE, FLOAT_FORMAT_IEEE, HEADER_PREFIX_SIZE, MAX_FIELD_WIDTH,
};
use binout_core::errors::{BinoutError, Result};
use log::warn;
use std::io::{Read, Seek};

/// Decoded header prefix: the field widths and format flags that govern
/// how the rest of the shard's records are parsed.
#[derive(Debug, Clone, Copy)]
pub struct HeaderPrefix {
    pub length_field_width: u8,
    pub command_field_width: u8,
    pub typeid_field_width: u8,
}

impl HeaderPrefix {
    pub fn read<R: Read + Seek>(reader: &mut ShardReader<R>) -> Result<Self> {
        let bytes = reader.read_exact_n(HEADER_PREFIX_SIZE).map_err(|e| match e {
            BinoutError::TruncatedRecord { found, expected, .. } => {
                BinoutError::TruncatedHeader { expected, found }
            }
            other => other,
        })?;

        let endian_flag = bytes[0];
        if endian_flag != ENDIAN_LITTLE {
            warn!("rejecting shard: unsupported endianness flag 0x{endian_flag:02X}");
            return Err(BinoutError::UnsupportedEndianness { flag: endian_flag });
        }

        let length_field_width = bytes[1];
        let command_field_width = bytes[2];
        let typeid_field_width = bytes[3];
        for width in [length_field_width, command_field_width, typeid_field_width] {
            if width > MAX_FIELD_WIDTH {
                warn!("rejecting shard: field width {width} exceeds {MAX_FIELD_WIDTH}");
                return Err(BinoutError::FieldWidthTooLarge { width });
            }
        }

        let float_format = bytes[4];
        if float_format != FLOAT_FORMAT_IEEE {
            warn!("rejecting shard: unsupported float format flag 0x{float_format:02X}");
            return Err(BinoutError::UnsupportedFloatFormat { flag: float_format });
        }

        // bytes[5..8] are reserved padding, intentionally unread beyond this point.

        Ok(HeaderPrefix {
            length_field_width,
            command_field_width,
            typeid_field_width,
        })
    }
}
