//! The in-memory virtual directory: a strict tree of [`Folder`]s and leaf
//! [`Variable`] descriptors, built once while opening an archive and
//! immutable afterward.

use crate::constants::{ElementType, MAX_PATH_LEN};
use crate::errors::{BinoutError, Result};
use crate::path::PathView;

/// A leaf "file" descriptor: everything the typed reader needs to locate
/// and validate a variable's payload without touching the disk.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub name: String,
    pub element_type: ElementType,
    /// Payload size in bytes (not element count).
    pub size: u64,
    /// Index into the archive's shard table.
    pub file_index: usize,
    /// Absolute byte offset of the payload within that shard.
    pub file_pos: u64,
}

impl Variable {
    /// Number of elements the payload holds for `element_type`.
    pub fn element_count(&self) -> u64 {
        self.size / self.element_type.element_size() as u64
    }
}

/// A directory node: named child folders and named child variables, both
/// kept in insertion order with unique names among siblings of the same
/// kind.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Folder {
    pub name: String,
    pub folders: Vec<Folder>,
    pub variables: Vec<Variable>,
}

impl Folder {
    fn new(name: String) -> Self {
        Folder {
            name,
            folders: Vec::new(),
            variables: Vec::new(),
        }
    }

    fn child_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }

    fn child_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    fn child_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// What a path resolves to: a folder (list its children) or a single
/// variable (the tree-level `get_children` tags this case distinctly per
/// §4.2 of the design).
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Folder(&'a Folder),
    Variable(&'a Variable),
}

/// A named child, as returned by [`DirectoryTree::get_children`] — tagged
/// so a caller that cares can tell folders from variables without a
/// separate existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Folder(String),
    Variable(String),
}

impl Child {
    pub fn name(&self) -> &str {
        match self {
            Child::Folder(n) | Child::Variable(n) => n,
        }
    }
}

/// The in-memory binout virtual directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTree {
    root: Folder,
}

/// Normalize `input` against `base` the way a CD record's path payload is
/// joined to the parser's current path (§4.1/§4.3): an absolute input
/// replaces `base` outright; a relative input is appended segment by
/// segment, with `..` popping one segment (never past the root) and empty
/// or `.` segments tolerated and dropped.
pub fn normalize(base: &[String], input: &str) -> Result<Vec<String>> {
    let absolute = PathView::is_absolute(input);
    let mut segments: Vec<String> = if absolute { Vec::new() } else { base.to_vec() };

    let raw_segments = PathView::segments(input);
    let iter_start = if absolute { 1 } else { 0 };
    for seg in raw_segments.into_iter().skip(iter_start) {
        match seg {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_string()),
        }
    }

    let total_len: usize = 1 + segments.iter().map(|s| s.len() + 1).sum::<usize>();
    if total_len > MAX_PATH_LEN {
        return Err(BinoutError::PathTooLong { max: MAX_PATH_LEN });
    }

    Ok(segments)
}

impl DirectoryTree {
    pub fn new() -> Self {
        DirectoryTree {
            root: Folder::new(String::new()),
        }
    }

    pub fn root(&self) -> &Folder {
        &self.root
    }

    /// Descend `segments` from the root, creating folders that don't yet
    /// exist, and return the deepest folder.
    pub fn insert_folder(&mut self, segments: &[String]) -> &mut Folder {
        let mut current = &mut self.root;
        for seg in segments {
            let idx = current.folders.iter().position(|f| f.name == *seg);
            current = match idx {
                Some(i) => &mut current.folders[i],
                None => {
                    current.folders.push(Folder::new(seg.clone()));
                    current.folders.last_mut().unwrap()
                }
            };
        }
        current
    }

    /// Append a variable under `folder` (found via [`DirectoryTree::insert_folder`]
    /// or resolved directly). A duplicate name overwrites the previous
    /// entry in place (last write wins), preserving its original slot so
    /// sibling order doesn't change.
    pub fn insert_variable(folder: &mut Folder, variable: Variable) {
        if let Some(existing) = folder.variables.iter_mut().find(|v| v.name == variable.name) {
            *existing = variable;
        } else {
            folder.variables.push(variable);
        }
    }

    fn resolve_segments(&self, segments: &[String]) -> Option<Resolved<'_>> {
        if segments.is_empty() {
            return Some(Resolved::Folder(&self.root));
        }

        let (last, parents) = segments.split_last().unwrap();
        let mut current = &self.root;
        for seg in parents {
            current = current.child_folder(seg)?;
        }

        if let Some(v) = current.child_variable(last) {
            return Some(Resolved::Variable(v));
        }
        if let Some(f) = current.child_folder(last) {
            return Some(Resolved::Folder(f));
        }
        None
    }

    /// Resolve an absolute or root-relative path to whatever it addresses.
    pub fn resolve(&self, path: &str) -> Result<Option<Resolved<'_>>> {
        let segments = normalize(&[], path)?;
        Ok(self.resolve_segments(&segments))
    }

    /// Return the variable at `path`, or `None` if it doesn't exist or
    /// addresses a folder instead.
    pub fn get_variable(&self, path: &str) -> Result<Option<&Variable>> {
        Ok(match self.resolve(path)? {
            Some(Resolved::Variable(v)) => Some(v),
            _ => None,
        })
    }

    /// Tree-level child listing (§4.2): `None` if `path` doesn't exist;
    /// otherwise the tagged children of the folder, or a single tagged
    /// variable entry (count 1) if `path` addresses a variable directly.
    pub fn get_children(&self, path: &str) -> Result<Option<Vec<Child>>> {
        Ok(match self.resolve(path)? {
            None => None,
            Some(Resolved::Variable(v)) => Some(vec![Child::Variable(v.name.clone())]),
            Some(Resolved::Folder(f)) => {
                let mut out = Vec::with_capacity(f.folders.len() + f.variables.len());
                out.extend(f.folders.iter().map(|c| Child::Folder(c.name.clone())));
                out.extend(f.variables.iter().map(|c| Child::Variable(c.name.clone())));
                Some(out)
            }
        })
    }

    /// Also exposed for insertion during parsing: find (without creating)
    /// the folder at `segments`, if any.
    pub fn find_folder_mut(&mut self, segments: &[String]) -> Option<&mut Folder> {
        let mut current = &mut self.root;
        for seg in segments {
            current = current.child_folder_mut(seg)?;
        }
        Some(current)
    }
}
