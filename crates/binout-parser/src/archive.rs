//! The archive opener, typed reader, and query helpers (§4.4–§4.6).

use crate::glob_expand;
use crate::stream::{self, parse_shard};
use binout_core::constants::ElementType;
use binout_core::errors::{BinoutError, Result};
use binout_core::tree::{DirectoryTree, Resolved, Variable};
use log::info;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

struct ShardHandle {
    file: File,
    path: PathBuf,
    len: u64,
}

/// An opened binout archive: a read-only directory tree plus a sparse
/// table of shard file handles.
///
/// §4.4 step 4: failed shards are never compacted out of this table — a
/// failed slot simply becomes `None` — so every variable's `file_index`
/// (assigned while that shard was being parsed) stays valid for the
/// archive's whole lifetime without any index remapping.
pub struct Archive {
    shards: Vec<Option<ShardHandle>>,
    tree: DirectoryTree,
    open_errors: Vec<String>,
    read_error: Option<String>,
}

impl Archive {
    /// Expand `pattern`, open and parse every matching shard, and return
    /// the resulting archive. Every open-time failure — a malformed shard,
    /// an unreadable file, or the pattern matching no files at all — is
    /// accumulated into [`Archive::open_error`] rather than failing the
    /// call: `open` only returns `Err` for a malformed glob pattern itself,
    /// matching `dynareadout`'s `binout_open`, which still returns a usable
    /// (if empty) archive when nothing matches and reports that through
    /// its own error accessor.
    pub fn open(pattern: &str) -> Result<Self> {
        let mut shards = Vec::new();
        let mut tree = DirectoryTree::new();
        let mut open_errors = Vec::new();

        match glob_expand::expand(pattern) {
            Ok(paths) => {
                info!("opening {} shard(s) matching {pattern}", paths.len());
                shards.reserve(paths.len());
                for (index, path) in paths.iter().enumerate() {
                    match Self::open_and_parse(path, index, &mut tree) {
                        Ok(handle) => shards.push(Some(handle)),
                        Err(e) => {
                            debug_assert!(
                                e.is_open_failure(),
                                "shard parsing produced a read-time error variant: {e:?}"
                            );
                            stream::log_shard_failure(index, &e);
                            open_errors.push(format!("{}: {}", path.display(), e));
                            shards.push(None);
                        }
                    }
                }
            }
            Err(e @ BinoutError::NoShardsMatched { .. }) => {
                debug_assert!(e.is_open_failure());
                info!("no shards matched pattern {pattern}");
                open_errors.push(e.to_string());
            }
            Err(e) => return Err(e),
        }

        Ok(Archive {
            shards,
            tree,
            open_errors,
            read_error: None,
        })
    }

    fn open_and_parse(path: &Path, index: usize, tree: &mut DirectoryTree) -> Result<ShardHandle> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        // parse_shard consumes its reader; hand it a duplicate descriptor
        // so the original `file` stays available for later typed reads.
        let parse_handle = file.try_clone()?;
        parse_shard(parse_handle, index, tree)?;

        Ok(ShardHandle {
            file,
            path: path.to_path_buf(),
            len,
        })
    }

    /// Number of shard slots the opener allocated — one per path the glob
    /// pattern matched, whether or not that shard is still open.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The on-disk path and byte length of shard `index`, if it is still
    /// open (a failed shard has no handle to report on).
    pub fn shard_info(&self, index: usize) -> Option<(&Path, u64)> {
        self.shards
            .get(index)
            .and_then(|s| s.as_ref())
            .map(|s| (s.path.as_path(), s.len))
    }

    /// Every accumulated per-shard open error, one per line, in open
    /// order — or `None` if every shard parsed cleanly.
    pub fn open_error(&self) -> Option<String> {
        if self.open_errors.is_empty() {
            None
        } else {
            Some(self.open_errors.join("\n"))
        }
    }

    /// The error from the most recent typed read, if it failed. Cleared
    /// at the start of every `read_*` call.
    pub fn read_error(&self) -> Option<&str> {
        self.read_error.as_deref()
    }

    pub fn variable_exists(&self, path: &str) -> bool {
        matches!(self.tree.get_variable(path), Ok(Some(_)))
    }

    pub fn get_type_id(&self, path: &str) -> Option<u64> {
        self.tree
            .get_variable(path)
            .ok()
            .flatten()
            .map(|v| v.element_type.type_id())
    }

    /// Names of `path`'s immediate children — folder and variable names
    /// are not distinguishable here; use [`Archive::variable_exists`] to
    /// tell them apart (§4.6).
    pub fn get_children(&self, path: &str) -> Option<Vec<String>> {
        self.tree
            .get_children(path)
            .ok()
            .flatten()
            .map(|children| children.into_iter().map(|c| c.name().to_string()).collect())
    }

    /// Count of the contiguous `d[0-9]+` run among `path`'s child folders.
    /// `None` is the all-ones sentinel of the original API: `path` doesn't
    /// exist, or addresses a variable rather than a folder.
    pub fn get_num_timesteps(&self, path: &str) -> Option<usize> {
        match self.tree.resolve(path).ok()? {
            Some(Resolved::Folder(folder)) => Some(count_timesteps_run(folder)),
            _ => None,
        }
    }

    fn shard_mut(&mut self, index: usize) -> Result<&mut File> {
        self.shards
            .get_mut(index)
            .and_then(|s| s.as_mut())
            .map(|s| &mut s.file)
            .ok_or(BinoutError::ShardNotOpen { index })
    }

    fn read_raw(&mut self, path: &str, expected: ElementType) -> Result<Option<(Variable, Vec<u8>)>> {
        self.read_error = None;

        let variable = match self.tree.get_variable(path)? {
            Some(v) => v.clone(),
            None => {
                self.read_error = Some(
                    BinoutError::PathNotFound {
                        path: path.to_string(),
                    }
                    .to_string(),
                );
                return Ok(None);
            }
        };

        if variable.element_type != expected {
            self.read_error = Some(
                BinoutError::TypeMismatch {
                    expected: expected.name(),
                    actual: variable.element_type.name(),
                }
                .to_string(),
            );
            return Ok(None);
        }

        let file = self.shard_mut(variable.file_index)?;
        file.seek(SeekFrom::Start(variable.file_pos))?;
        let mut buf = vec![0u8; variable.size as usize];
        file.read_exact(&mut buf)?;

        Ok(Some((variable, buf)))
    }
}

/// Count of the contiguous `d[0-9]+` run among `folder`'s child folders,
/// by array position — the first and last matching indices into
/// `folder.folders`, not the numeric value embedded in the matching
/// names. A solver that saves every 10th state produces folders like
/// `d000010, d000020, d000030`, three entries at positions 0..2; a
/// numeric-value diff would read that as 21.
fn count_timesteps_run(folder: &binout_core::Folder) -> usize {
    let mut first: Option<usize> = None;
    let mut last: Option<usize> = None;
    for (index, child) in folder.folders.iter().enumerate() {
        if is_timestep_name(&child.name) {
            if first.is_none() {
                first = Some(index);
            }
            last = Some(index);
        }
    }
    match (first, last) {
        (Some(start), Some(end)) => end - start + 1,
        _ => 0,
    }
}

/// `d[0-9]+` — a literal `d` followed by one or more ASCII digits.
fn is_timestep_name(name: &str) -> bool {
    match name.strip_prefix('d') {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

macro_rules! typed_read {
    ($name:ident, $elem:expr, $t:ty, $size:expr) => {
        impl Archive {
            #[doc = concat!("Read a variable as `", stringify!($t), "`, validating its stored element type first (§4.5).")]
            pub fn $name(&mut self, path: &str) -> Result<Option<Vec<$t>>> {
                Ok(self.read_raw(path, $elem)?.map(|(_, bytes)| {
                    bytes
                        .chunks_exact($size)
                        .map(|c| <$t>::from_le_bytes(c.try_into().unwrap()))
                        .collect()
                }))
            }
        }
    };
}

typed_read!(read_i8, ElementType::Int8, i8, 1);
typed_read!(read_i16, ElementType::Int16, i16, 2);
typed_read!(read_i32, ElementType::Int32, i32, 4);
typed_read!(read_i64, ElementType::Int64, i64, 8);
typed_read!(read_u8, ElementType::UInt8, u8, 1);
typed_read!(read_u16, ElementType::UInt16, u16, 2);
typed_read!(read_u32, ElementType::UInt32, u32, 4);
typed_read!(read_u64, ElementType::UInt64, u64, 8);
typed_read!(read_f32, ElementType::Float32, f32, 4);
typed_read!(read_f64, ElementType::Float64, f64, 8);

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn header_bytes() -> Vec<u8> {
        vec![0, 4, 1, 1, 0, 0, 0, 0]
    }

    fn record(command: u64, payload: &[u8]) -> Vec<u8> {
        let length = 4u64 + 1 + payload.len() as u64;
        let mut out = Vec::new();
        out.extend_from_slice(&length.to_le_bytes()[..4]);
        out.extend_from_slice(&command.to_le_bytes()[..1]);
        out.extend_from_slice(payload);
        out
    }

    fn cd(path: &str) -> Vec<u8> {
        record(1, path.as_bytes())
    }

    fn data(type_id: u8, name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.push(type_id);
        payload.push(name.len() as u8);
        payload.extend_from_slice(name.as_bytes());
        payload.extend_from_slice(bytes);
        record(2, &payload)
    }

    fn write_shard(dir: &std::path::Path, name: &str, records: &[u8]) {
        let mut body = header_bytes();
        body.extend_from_slice(records);
        fs::File::create(dir.join(name))
            .unwrap()
            .write_all(&body)
            .unwrap();
    }

    #[test]
    fn s2_and_s3_read_and_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        records.extend(cd("/nodout/metadata"));
        records.extend(data(9, "title", &[0u8; 80]));
        write_shard(dir.path(), "s2.bin0001", &records);

        let mut archive =
            Archive::open(dir.path().join("s2.bin*").to_str().unwrap()).unwrap();
        assert!(archive.open_error().is_none());

        let values = archive.read_f64("/nodout/metadata/title").unwrap().unwrap();
        assert_eq!(values.len(), 10);
        assert!(values.iter().all(|&v| v == 0.0));

        let mismatch = archive.read_i32("/nodout/metadata/title").unwrap();
        assert!(mismatch.is_none());
        assert_eq!(
            archive.read_error(),
            Some("The data is of type FLOAT64 instead of INT32")
        );
        assert!(archive.open_error().is_none());
    }

    #[test]
    fn s5_partial_shard_failure() {
        let dir = tempfile::tempdir().unwrap();

        let mut good_records = Vec::new();
        good_records.extend(cd("/nodout"));
        good_records.extend(data(0, "x", &[0xAB]));
        write_shard(dir.path(), "s5.bin0001", &good_records);

        // Second shard: bad endianness flag.
        let mut bad = vec![1u8, 4, 1, 1, 0, 0, 0, 0];
        bad.extend(cd("/other"));
        fs::File::create(dir.path().join("s5.bin0002"))
            .unwrap()
            .write_all(&bad)
            .unwrap();

        let mut archive =
            Archive::open(dir.path().join("s5.bin*").to_str().unwrap()).unwrap();

        let err = archive.open_error().unwrap();
        assert!(err.starts_with("s5.bin0002"), "got: {err}");

        let values = archive.read_i8("/nodout/x").unwrap().unwrap();
        assert_eq!(values, vec![-85i8]);
    }

    #[test]
    fn s6_timestep_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        for name in ["metadata", "d000001", "d000002", "d000003", "units"] {
            records.extend(cd(&format!("/{name}")));
        }
        write_shard(dir.path(), "s6.bin0001", &records);

        let archive = Archive::open(dir.path().join("s6.bin*").to_str().unwrap()).unwrap();
        assert_eq!(archive.get_num_timesteps("/"), Some(3));
    }

    #[test]
    fn timestep_count_uses_position_not_numeric_stride() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        for name in ["metadata", "d000010", "d000020", "d000030", "units"] {
            records.extend(cd(&format!("/{name}")));
        }
        write_shard(dir.path(), "stride.bin0001", &records);

        let archive = Archive::open(dir.path().join("stride.bin*").to_str().unwrap()).unwrap();
        // Three timestep folders at positions 1..3, even though a diff of
        // the embedded numeric suffixes (30 - 10) would suggest 21.
        assert_eq!(archive.get_num_timesteps("/"), Some(3));
    }

    #[test]
    fn get_num_timesteps_on_variable_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        records.extend(cd("/a"));
        records.extend(data(0, "x", &[1]));
        write_shard(dir.path(), "leaf.bin0001", &records);

        let archive = Archive::open(dir.path().join("leaf.bin*").to_str().unwrap()).unwrap();
        assert_eq!(archive.get_num_timesteps("/a/x"), None);
    }

    #[test]
    fn variable_exists_and_type_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        records.extend(cd("/a"));
        records.extend(data(2, "x", &[1, 2, 3, 4]));
        write_shard(dir.path(), "exist.bin0001", &records);

        let archive = Archive::open(dir.path().join("exist.bin*").to_str().unwrap()).unwrap();
        assert!(archive.variable_exists("/a/x"));
        assert!(!archive.variable_exists("/a/y"));
        assert_eq!(archive.get_type_id("/a/x"), Some(ElementType::Int32.type_id()));
    }

    #[test]
    fn shard_count_and_info_report_failed_slots() {
        let dir = tempfile::tempdir().unwrap();

        let mut good = Vec::new();
        good.extend(cd("/a"));
        good.extend(data(0, "x", &[1]));
        write_shard(dir.path(), "shards.bin0000", &good);

        fs::File::create(dir.path().join("shards.bin0001"))
            .unwrap()
            .write_all(&[9, 4, 1, 1, 0, 0, 0, 0])
            .unwrap();

        let archive =
            Archive::open(dir.path().join("shards.bin*").to_str().unwrap()).unwrap();

        assert_eq!(archive.shard_count(), 2);
        let (path0, len0) = archive.shard_info(0).unwrap();
        assert!(path0.ends_with("shards.bin0000"));
        assert_eq!(len0, 8 + good.len() as u64);
        assert!(archive.shard_info(1).is_none());
    }
}
