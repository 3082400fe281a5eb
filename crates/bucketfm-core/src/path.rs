//! Hierarchical paths over a flat key space.
//!
//! An [`NsPath`] is an ordered list of validated segments. Its canonical
//! string form joins the segments with [`DELIMITER`]; the root is the empty
//! path and renders as `""`. Object keys are built by appending a leaf name
//! to a path ([`object_key`]), and a folder's existence is recorded by the
//! zero-byte object at [`sentinel_key`].

use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Separator between path segments in object keys.
pub const DELIMITER: char = '/';

/// Leaf name of the zero-byte marker object that makes a folder exist.
pub const SENTINEL_NAME: &str = ".keep";

/// Maximum number of segments a folder path may have. The root is depth `0`.
pub const MAX_DEPTH: usize = 6;

/// A path in the simulated folder hierarchy.
///
/// Immutable: [`NsPath::join`] and [`NsPath::parent`] return new values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NsPath {
    segments: Vec<String>,
}

impl NsPath {
    /// Returns the root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a canonical path string such as `"a/b"`.
    ///
    /// Leading, trailing and repeated delimiters are tolerated; empty
    /// segments are skipped. Depth is not checked here.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSegment`] if any segment is reserved (see [`NsPath::join`]).
    pub fn parse(s: &str) -> CoreResult<Self> {
        s.split(DELIMITER)
            .filter(|seg| !seg.is_empty())
            .try_fold(Self::root(), |path, seg| path.join(seg))
    }

    /// Returns a new path with `name` appended as the last segment.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSegment`] if `name` is empty, contains the
    ///   delimiter or NUL, is `.` / `..`, or equals [`SENTINEL_NAME`].
    pub fn join(&self, name: &str) -> CoreResult<Self> {
        if !is_valid_segment(name) {
            return Err(CoreError::InvalidSegment(name.to_string()));
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Returns the parent path.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoParent`] if this is the root.
    pub fn parent(&self) -> CoreResult<Self> {
        match self.segments.split_last() {
            Some((_, rest)) => Ok(Self {
                segments: rest.to_vec(),
            }),
            None => Err(CoreError::NoParent),
        }
    }

    /// Number of segments. The root has depth `0`.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the canonical form used as a listing prefix.
    pub fn as_prefix(&self) -> String {
        self.to_string()
    }

    /// Returns the object key of `leaf` directly below this path.
    pub fn key_for(&self, leaf: &str) -> String {
        if self.is_root() {
            leaf.to_string()
        } else {
            format!("{self}{DELIMITER}{leaf}")
        }
    }

    /// Returns the key of this folder's sentinel marker.
    pub fn sentinel_key(&self) -> String {
        self.key_for(SENTINEL_NAME)
    }
}

impl fmt::Display for NsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{DELIMITER}")?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

/// Returns `join(path.segments ++ [leaf], "/")`.
pub fn object_key(path: &NsPath, leaf: &str) -> String {
    path.key_for(leaf)
}

/// Returns the key of the sentinel marker of the folder at `path`.
pub fn sentinel_key(path: &NsPath) -> String {
    path.sentinel_key()
}

/// Returns the last delimiter-separated segment of a key or prefix.
///
/// A trailing delimiter (as some stores report prefixes) is ignored.
pub fn leaf_name(key: &str) -> &str {
    let key = key.strip_suffix(DELIMITER).unwrap_or(key);
    match key.rfind(DELIMITER) {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// Returns `true` if `path` lies within the nesting limit.
pub fn within_depth(path: &NsPath) -> bool {
    path.depth() <= MAX_DEPTH
}

/// Fails with [`CoreError::DepthExceeded`] if `path` is nested too deep.
pub(crate) fn ensure_depth(path: &NsPath) -> CoreResult<()> {
    if within_depth(path) {
        Ok(())
    } else {
        Err(CoreError::DepthExceeded {
            path: path.clone(),
            max: MAX_DEPTH,
        })
    }
}

fn is_valid_segment(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." || name == SENTINEL_NAME {
        return false;
    }
    !name.contains(DELIMITER) && !name.contains('\0')
}
