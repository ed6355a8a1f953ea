//! The per-shard stream parser (§4.3): walks one physical file's record
//! sequence and mutates a shared [`DirectoryTree`] in place.

use crate::header::HeaderPrefix;
use crate::reader::ShardReader;
use binout_core::constants::{ElementType, MAX_PATH_LEN};
use binout_core::errors::{BinoutError, Result};
use binout_core::tree::{normalize, DirectoryTree, Variable};
use binout_core::RecordCommand;
use log::{debug, error, trace};
use std::io::{Read, Seek};

/// Parse every record of one shard, inserting folders and variables into
/// `tree` as they're declared. `shard_index` is stamped onto every
/// variable this shard contributes so the typed reader can later find the
/// right open file handle.
///
/// On error, whatever was already inserted into `tree` before the failing
/// record is left in place — per §4.3 step 5, a shard's partial
/// contribution survives even when the shard itself is later marked
/// failed.
pub fn parse_shard<R: Read + Seek>(
    reader: R,
    shard_index: usize,
    tree: &mut DirectoryTree,
) -> Result<()> {
    let mut sr = ShardReader::new(reader)?;
    let header = HeaderPrefix::read(&mut sr)?;

    let mut current_path: Vec<String> = Vec::new();
    let mut has_cd = false;

    while !sr.is_eof()? {
        let record_offset = sr.position()?;
        let record_length = sr.read_uint(header.length_field_width)?;
        let record_command = sr.read_uint(header.command_field_width)?;

        let header_fields_len =
            header.length_field_width as u64 + header.command_field_width as u64;
        let payload_len = record_length.checked_sub(header_fields_len).ok_or(
            BinoutError::LengthUnderflow {
                offset: record_offset,
                length: record_length,
            },
        )?;

        // A corrupted `record_length` (e.g. a field read as near-`u64::MAX`)
        // must not be allowed to drive an allocation or a seek before it's
        // validated: a record can never claim more payload than the shard
        // has bytes left, so bound it against the shard's own remaining
        // length before dispatching on it (§7/§9: the corresponding C
        // assertion is converted into a per-shard error here, not skipped).
        let remaining = sr.len().saturating_sub(sr.position()?);
        if payload_len > remaining {
            return Err(BinoutError::TruncatedRecord {
                offset: record_offset,
                expected: payload_len as usize,
                found: remaining as usize,
            });
        }

        match RecordCommand::from(record_command) {
            RecordCommand::Cd => {
                if payload_len > MAX_PATH_LEN as u64 {
                    return Err(BinoutError::PathTooLong { max: MAX_PATH_LEN });
                }
                let path_bytes = sr.read_exact_n(payload_len as usize)?;
                let path_str = String::from_utf8_lossy(&path_bytes);
                current_path = normalize(&current_path, &path_str)?;
                has_cd = true;
                tree.insert_folder(&current_path);
                debug!("shard {shard_index}: CD -> /{}", current_path.join("/"));
            }
            RecordCommand::Data => {
                if !has_cd || current_path.is_empty() {
                    return Err(BinoutError::DataBeforeCd {
                        offset: record_offset,
                    });
                }

                let type_id = sr.read_uint(header.typeid_field_width)?;
                let name_len = sr.read_u8()? as u64;
                let name_bytes = sr.read_exact_n(name_len as usize)?;
                let name = String::from_utf8_lossy(&name_bytes).into_owned();

                let fixed_len = header.typeid_field_width as u64 + 1 + name_len;
                let data_len = payload_len.checked_sub(fixed_len).ok_or(
                    BinoutError::LengthUnderflow {
                        offset: record_offset,
                        length: record_length,
                    },
                )?;

                let element_type = ElementType::from_type_id(type_id)
                    .ok_or(BinoutError::UnknownElementType { type_id })?;

                let file_pos = sr.position()?;
                sr.skip(data_len)?;

                debug!(
                    "shard {shard_index}: DATA /{}/{name} type={element_type} size={data_len}",
                    current_path.join("/")
                );

                let folder = tree.insert_folder(&current_path);
                DirectoryTree::insert_variable(
                    folder,
                    Variable {
                        name,
                        element_type,
                        size: data_len,
                        file_index: shard_index,
                        file_pos,
                    },
                );
            }
            other => {
                trace!("shard {shard_index}: skipping command {other:?} ({payload_len} bytes)");
                sr.skip(payload_len)?;
            }
        }
    }

    Ok(())
}

/// Log a parse failure at error level with the shard index, immediately
/// before the archive opener marks that shard's slot unusable and
/// accumulates the open-time error string.
pub fn log_shard_failure(shard_index: usize, err: &BinoutError) {
    error!("shard {shard_index} failed to parse: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(lw: u8, cw: u8, tw: u8) -> Vec<u8> {
        vec![0, lw, cw, tw, 0, 0, 0, 0]
    }

    fn record(command: u64, payload: &[u8], lw: u8, cw: u8) -> Vec<u8> {
        let length = lw as u64 + cw as u64 + payload.len() as u64;
        let mut out = Vec::new();
        out.extend_from_slice(&length.to_le_bytes()[..lw as usize]);
        out.extend_from_slice(&command.to_le_bytes()[..cw as usize]);
        out.extend_from_slice(payload);
        out
    }

    fn cd_payload(path: &str) -> Vec<u8> {
        path.as_bytes().to_vec()
    }

    fn data_payload(type_id: u8, name: &str, data: &[u8], tw: u8) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(type_id as u64).to_le_bytes()[..tw as usize]);
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn s1_list_root_children() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        data.extend(record(1, &cd_payload("/nodout"), lw, cw));
        data.extend(record(1, &cd_payload("/"), lw, cw));

        let mut tree = DirectoryTree::new();
        parse_shard(Cursor::new(data), 0, &mut tree).unwrap();

        let children = tree.get_children("/").unwrap().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "nodout");
    }

    #[test]
    fn s2_read_float64_array() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        data.extend(record(1, &cd_payload("/nodout/metadata"), lw, cw));
        data.extend(record(
            2,
            &data_payload(9, "title", &[0u8; 80], tw),
            lw,
            cw,
        ));

        let mut tree = DirectoryTree::new();
        parse_shard(Cursor::new(data), 0, &mut tree).unwrap();

        let v = tree.get_variable("/nodout/metadata/title").unwrap().unwrap();
        assert_eq!(v.element_type, ElementType::Float64);
        assert_eq!(v.element_count(), 10);
    }

    #[test]
    fn s4_relative_cd_with_dotdot() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        data.extend(record(1, &cd_payload("/a/b"), lw, cw));
        data.extend(record(1, &cd_payload("../c"), lw, cw));
        data.extend(record(2, &data_payload(0, "x", &[0xAB], tw), lw, cw));

        let mut tree = DirectoryTree::new();
        parse_shard(Cursor::new(data), 0, &mut tree).unwrap();

        let v = tree.get_variable("/a/c/x").unwrap().unwrap();
        assert_eq!(v.element_type, ElementType::Int8);
        assert_eq!(v.size, 1);
        assert!(tree.get_variable("/a/b").unwrap().is_none());
    }

    #[test]
    fn data_before_any_cd_fails() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        data.extend(record(2, &data_payload(0, "x", &[1], tw), lw, cw));

        let mut tree = DirectoryTree::new();
        let err = parse_shard(Cursor::new(data), 0, &mut tree).unwrap_err();
        assert!(matches!(err, BinoutError::DataBeforeCd { .. }));
    }

    #[test]
    fn data_at_root_fails() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        data.extend(record(1, &cd_payload("/"), lw, cw));
        data.extend(record(2, &data_payload(0, "x", &[1], tw), lw, cw));

        let mut tree = DirectoryTree::new();
        let err = parse_shard(Cursor::new(data), 0, &mut tree).unwrap_err();
        assert!(matches!(err, BinoutError::DataBeforeCd { .. }));
    }

    #[test]
    fn empty_shard_is_header_only() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let data = header_bytes(lw, cw, tw);
        let mut tree = DirectoryTree::new();
        parse_shard(Cursor::new(data), 0, &mut tree).unwrap();
        assert!(tree.get_children("/").unwrap().unwrap().is_empty());
    }

    #[test]
    fn name_length_zero_and_max_are_accepted() {
        let (lw, cw, tw) = (4u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        data.extend(record(1, &cd_payload("/a"), lw, cw));
        data.extend(record(2, &data_payload(0, "", &[1], tw), lw, cw));
        let long_name = "x".repeat(255);
        data.extend(record(2, &data_payload(0, &long_name, &[2], tw), lw, cw));

        let mut tree = DirectoryTree::new();
        parse_shard(Cursor::new(data), 0, &mut tree).unwrap();

        let folder = match tree.resolve("/a").unwrap().unwrap() {
            binout_core::Resolved::Folder(f) => f,
            other => panic!("expected folder, got {other:?}"),
        };
        assert!(folder.variables.iter().any(|v| v.name.is_empty()));
        assert!(folder.variables.iter().any(|v| v.name == long_name));
    }

    #[test]
    fn corrupted_record_length_fails_the_shard_instead_of_allocating() {
        let (lw, cw, tw) = (8u8, 1u8, 1u8);
        let mut data = header_bytes(lw, cw, tw);
        // A record claiming an enormous length with almost no bytes actually
        // following it: payload_len computed from this would be multiple
        // exabytes if taken at face value.
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        data.push(1); // CD command
        data.extend_from_slice(b"/x");

        let mut tree = DirectoryTree::new();
        let err = parse_shard(Cursor::new(data), 0, &mut tree).unwrap_err();
        assert!(matches!(err, BinoutError::TruncatedRecord { .. }));
    }

    #[test]
    fn cd_payload_longer_than_max_path_len_fails() {
        let (lw, cw) = (8u8, 1u8);
        let long_path = format!("/{}", "a".repeat(2000));
        let mut data = header_bytes(lw, cw, 1);
        data.extend(record(1, long_path.as_bytes(), lw, cw));

        let mut tree = DirectoryTree::new();
        let err = parse_shard(Cursor::new(data), 0, &mut tree).unwrap_err();
        assert!(matches!(err, BinoutError::PathTooLong { .. }));
    }

    #[test]
    fn every_supported_field_width_round_trips() {
        for width in [1u8, 2, 4, 8] {
            let mut data = header_bytes(width, width, width);
            data.extend(record(1, &cd_payload("/a"), width, width));
            data.extend(record(2, &data_payload(0, "x", &[9], width), width, width));

            let mut tree = DirectoryTree::new();
            parse_shard(Cursor::new(data), 0, &mut tree).unwrap();
            let v = tree.get_variable("/a/x").unwrap().unwrap();
            assert_eq!(v.size, 1);
        }
    }
}
