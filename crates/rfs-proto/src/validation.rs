//! Target path grammar shared by client and server
//!
//! Two grammars are accepted:
//!
//! - file: `(/seg){0,10}/name.ext`
//! - directory: `(/seg){1,10}/`
//!
//! where `seg` is 1-20 ASCII alphanumerics, `name` 1-10 and `ext` 1-5. The
//! whole string has to match; there is no prefix matching.

const MAX_DIR_SEGMENTS: usize = 10;
const MAX_SEGMENT_LEN: usize = 20;
const MAX_NAME_LEN: usize = 10;
const MAX_EXT_LEN: usize = 5;

/// Classification of a target string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Invalid,
}

impl PathKind {
    pub fn is_file(self) -> bool {
        self == PathKind::File
    }

    pub fn is_valid(self) -> bool {
        self != PathKind::Invalid
    }
}

/// Classify `path` as a file target, a directory target, or neither.
pub fn classify(path: &str) -> PathKind {
    let Some(rest) = path.strip_prefix('/') else {
        return PathKind::Invalid;
    };

    if let Some(dirs) = rest.strip_suffix('/') {
        return if is_directory_body(dirs) {
            PathKind::Directory
        } else {
            PathKind::Invalid
        };
    }

    if is_file_body(rest) {
        PathKind::File
    } else {
        PathKind::Invalid
    }
}

/// Non-empty components of a target, in order.
///
/// Only meaningful for targets that [`classify`] accepted.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// `a/b/c` with 1..=10 segments
fn is_directory_body(body: &str) -> bool {
    let parts: Vec<&str> = body.split('/').collect();
    (1..=MAX_DIR_SEGMENTS).contains(&parts.len()) && parts.iter().all(|s| is_segment(s))
}

// `a/b/name.ext` with 0..=10 leading segments
fn is_file_body(body: &str) -> bool {
    let (dirs, file) = match body.rsplit_once('/') {
        Some((dirs, file)) => (Some(dirs), file),
        None => (None, body),
    };

    let dirs_ok = match dirs {
        None => true,
        Some(dirs) => is_directory_body(dirs),
    };

    dirs_ok && is_file_name(file)
}

fn is_file_name(file: &str) -> bool {
    match file.split_once('.') {
        Some((name, ext)) => {
            is_alnum_run(name, MAX_NAME_LEN) && is_alnum_run(ext, MAX_EXT_LEN)
        }
        None => false,
    }
}

fn is_segment(segment: &str) -> bool {
    is_alnum_run(segment, MAX_SEGMENT_LEN)
}

fn is_alnum_run(s: &str, max_len: usize) -> bool {
    !s.is_empty() && s.len() <= max_len && s.bytes().all(|b| b.is_ascii_alphanumeric())
}
