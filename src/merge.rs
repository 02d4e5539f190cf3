//! Idempotent merge and removal of generated blocks.
//!
//! [`merge_contents`] inserts a hash-tagged block next to the first line that
//! matches an [`Anchor`]. Re-running it with the same payload is a no-op;
//! running it with a different payload replaces the old block in place of a
//! second copy. [`remove_contents`] undoes a merge knowing only the tag.

use crate::generated::{
    create_generated_footer_comment, create_generated_header_comment, remove_generated_contents,
};
use regex::Regex;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Failed to match \"{anchor}\" in contents:\n{contents}")]
    AnchorNotFound { anchor: String, contents: String },

    #[error("Invalid anchor pattern: {0}")]
    InvalidAnchor(#[from] regex::Error),
}

/// Line pattern that locates where a new block is inserted.
///
/// Anchors match line *content*, so one anchor works across Gradle, XML,
/// Swift or any other line-oriented file.
#[derive(Debug, Clone)]
pub struct Anchor(Regex);

impl Anchor {
    /// Compile `pattern` as a regular expression.
    pub fn new(pattern: &str) -> Result<Self, MergeError> {
        Ok(Self(Regex::new(pattern)?))
    }

    /// Match `text` verbatim anywhere in a line.
    ///
    /// Escaping cannot produce a syntax error, but a very long literal can
    /// still exceed the compiled size limit.
    pub fn literal(text: &str) -> Result<Self, MergeError> {
        Self::new(&regex::escape(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.0.is_match(line)
    }
}

impl From<Regex> for Anchor {
    fn from(regex: Regex) -> Self {
        Self(regex)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of a single [`merge_contents`] call.
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    /// Current file contents.
    pub src: &'a str,
    /// Payload to place between the markers.
    pub new_src: &'a str,
    /// Identifier shared by the begin and end markers.
    pub tag: &'a str,
    pub anchor: &'a Anchor,
    /// Line offset from the anchor: `0` inserts above the anchor line, `1`
    /// directly below it.
    pub offset: isize,
    /// Comment leader of the target language, e.g. `//` or `#`.
    pub comment: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "MergeResult carries the new contents"]
pub struct MergeResult {
    pub contents: String,
    /// A new or updated block was written.
    pub did_merge: bool,
    /// An existing block for the tag was removed first.
    pub did_clear: bool,
}

/// Merge `new_src` into `src` as the generated block `tag`.
///
/// Fails with [`MergeError::AnchorNotFound`] when no line matches the anchor;
/// nothing is produced in that case.
pub fn merge_contents(request: &MergeRequest<'_>) -> Result<MergeResult, MergeError> {
    let header = create_generated_header_comment(request.new_src, request.tag, request.comment);

    if request.src.contains(&header) {
        tracing::debug!(tag = request.tag, "generated block already up to date");
        return Ok(MergeResult {
            contents: request.src.to_string(),
            did_merge: false,
            did_clear: false,
        });
    }

    let cleared = remove_generated_contents(request.src, request.tag);
    let did_clear = cleared.is_some();
    let base = cleared.as_deref().unwrap_or(request.src);

    let footer = create_generated_footer_comment(request.tag, request.comment);
    let block = std::iter::once(header.as_str())
        .chain(request.new_src.split('\n'))
        .chain(std::iter::once(footer.as_str()));
    let contents = add_lines(base, request.anchor, request.offset, block)?;

    tracing::debug!(
        tag = request.tag,
        anchor = %request.anchor,
        did_clear,
        "merged generated block"
    );

    Ok(MergeResult {
        contents,
        did_merge: true,
        did_clear,
    })
}

/// Remove the generated block `tag` from `src`, if a well-formed one exists.
pub fn remove_contents(src: &str, tag: &str) -> MergeResult {
    match remove_generated_contents(src, tag) {
        Some(contents) => {
            tracing::debug!(tag, "removed generated block");
            MergeResult {
                contents,
                did_merge: false,
                did_clear: true,
            }
        }
        None => MergeResult {
            contents: src.to_string(),
            did_merge: false,
            did_clear: false,
        },
    }
}

/// Splice `to_add` into `content` at the anchor line index plus `offset`.
///
/// The insertion index is clamped to the line range of the file.
fn add_lines<'a>(
    content: &'a str,
    anchor: &Anchor,
    offset: isize,
    to_add: impl Iterator<Item = &'a str>,
) -> Result<String, MergeError> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    let Some(anchor_index) = lines.iter().position(|line| anchor.is_match(line)) else {
        return Err(MergeError::AnchorNotFound {
            anchor: anchor.to_string(),
            contents: content.to_string(),
        });
    };

    let index = if offset < 0 {
        anchor_index.saturating_sub(offset.unsigned_abs())
    } else {
        anchor_index.saturating_add(offset.unsigned_abs())
    }
    .min(lines.len());
    lines.splice(index..index, to_add);

    Ok(lines.join("\n"))
}
