//! Offset-based text splicing primitives.
//!
//! Every higher-level code mod (generated regions, declaration blocks, import
//! insertion) bottoms out in one of these three operations. Offsets are byte
//! offsets into UTF-8 text and must sit on a `char` boundary.

use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid offset {offset} in text of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("Invalid range [{start}, {end}] in text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("Unsupported bracket character {0:?} (expected one of '(' ')' '{{' '}}')")]
    UnsupportedBracket(char),
}

fn ensure_boundary(text: &str, offset: usize) -> Result<(), EditError> {
    if text.is_char_boundary(offset) {
        Ok(())
    } else {
        Err(EditError::NotCharBoundary { offset })
    }
}

/// Insert `insertion` immediately before byte `offset`.
///
/// `offset` may equal `text.len()` (append).
pub fn insert_contents_at_offset(
    text: &str,
    insertion: &str,
    offset: usize,
) -> Result<String, EditError> {
    let len = text.len();
    if offset > len {
        return Err(EditError::OffsetOutOfRange { offset, len });
    }
    ensure_boundary(text, offset)?;

    let mut out = String::with_capacity(len + insertion.len());
    if offset == 0 {
        out.push_str(insertion);
        out.push_str(text);
    } else if offset == len {
        out.push_str(text);
        out.push_str(insertion);
    } else {
        out.push_str(&text[..offset]);
        out.push_str(insertion);
        out.push_str(&text[offset..]);
    }
    Ok(out)
}

/// Replace the **inclusive** byte range `[start, end]` with `replacement`.
///
/// The character starting at `end` is part of the replaced range, so
/// `replace_contents_with_offset("abcdef", "Z", 1, 3)` yields `"aZef"`.
pub fn replace_contents_with_offset(
    text: &str,
    replacement: &str,
    start: usize,
    end: usize,
) -> Result<String, EditError> {
    let len = text.len();
    if start > end || end >= len {
        return Err(EditError::InvalidRange { start, end, len });
    }
    ensure_boundary(text, start)?;
    ensure_boundary(text, end)?;

    // Extend past the whole character that starts at `end`.
    let end_exclusive = text[end..]
        .chars()
        .next()
        .map_or(len, |c| end + c.len_utf8());

    let mut out = String::with_capacity(len - (end_exclusive - start) + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end_exclusive..]);
    Ok(out)
}

/// Search `pattern` in `text[offset..]`, returning the absolute match start.
pub fn search_from_offset(
    text: &str,
    pattern: &Regex,
    offset: usize,
) -> Result<Option<usize>, EditError> {
    let len = text.len();
    if offset > len {
        return Err(EditError::OffsetOutOfRange { offset, len });
    }
    ensure_boundary(text, offset)?;
    Ok(pattern.find(&text[offset..]).map(|m| m.start() + offset))
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Missing parent directories are created first. Either the full write
/// succeeds or the target is left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        }
    };
    fs::create_dir_all(parent)?;

    // Same directory keeps the rename on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
