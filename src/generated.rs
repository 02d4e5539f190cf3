//! Generated-region markers.
//!
//! A generated block is delimited by a begin and an end marker line:
//!
//! ```text
//! // @generated begin maps-init - codemod-patcher (DO NOT MODIFY) sync-<sha1 hex>
//! MapsInitializer.initialize(this);
//! // @generated end maps-init
//! ```
//!
//! The hash in the begin marker is computed over the payload that was written,
//! so an unchanged re-application is detected by substring search alone.

use regex::Regex;
use sha1::{Digest, Sha1};
use std::sync::LazyLock;

/// Prefix of the content token embedded in begin markers.
pub const HASH_PREFIX: &str = "sync-";

/// Provenance text written between the tag and the hash.
pub const PROVENANCE: &str = "codemod-patcher (DO NOT MODIFY)";

static BEGIN_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@generated begin (\S+) -(?:.*\s(sync-[0-9a-f]+))?")
        .expect("Invalid begin marker regex")
});

/// Lines of a text split on `\n`, plus the marker lines found for one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSection<'a> {
    pub lines: Vec<&'a str>,
    /// Index of the first line containing `@generated begin <tag> -`.
    pub start_line: Option<usize>,
    /// Index of the first line ending in `@generated end <tag>`.
    pub end_line: Option<usize>,
}

impl GeneratedSection<'_> {
    /// The inclusive line span, only when both markers exist in order.
    pub fn span(&self) -> Option<(usize, usize)> {
        match (self.start_line, self.end_line) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        }
    }
}

/// A well-formed generated block discovered by [`find_generated_blocks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBlock {
    pub tag: String,
    /// The `sync-…` token of the begin marker, if it carries one.
    pub hash: Option<String>,
    /// 0-based line index of the begin marker.
    pub start_line: usize,
    /// 0-based line index of the end marker.
    pub end_line: usize,
}

fn begin_needle(tag: &str) -> String {
    format!("@generated begin {tag} -")
}

fn end_needle(tag: &str) -> String {
    format!("@generated end {tag}")
}

fn is_end_marker(line: &str, needle: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line).ends_with(needle)
}

/// Locate the begin and end marker lines for `tag`.
pub fn locate_generated_section<'a>(text: &'a str, tag: &str) -> GeneratedSection<'a> {
    let lines: Vec<&str> = text.split('\n').collect();
    let begin = begin_needle(tag);
    let end = end_needle(tag);

    let start_line = lines.iter().position(|line| line.contains(&begin));
    let end_line = lines.iter().position(|line| is_end_marker(line, &end));

    GeneratedSection {
        lines,
        start_line,
        end_line,
    }
}

/// Remove the generated block for `tag`, markers included.
///
/// Returns `None` when either marker is missing or the end marker precedes the
/// begin marker; a damaged region is left for a human to fix.
pub fn remove_generated_contents(text: &str, tag: &str) -> Option<String> {
    let section = locate_generated_section(text, tag);
    let Some((start, end)) = section.span() else {
        tracing::trace!(
            tag,
            start = ?section.start_line,
            end = ?section.end_line,
            "no removable generated section"
        );
        return None;
    };

    let mut lines = section.lines;
    lines.drain(start..=end);
    Some(lines.join("\n"))
}

/// `sync-` followed by the lowercase hex SHA-1 of `payload`.
pub fn create_hash(payload: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    format!("{HASH_PREFIX}{:x}", hasher.finalize())
}

/// The begin marker line for a block whose payload will be `payload`.
pub fn create_generated_header_comment(payload: &str, tag: &str, comment: &str) -> String {
    format!(
        "{comment} @generated begin {tag} - {PROVENANCE} {}",
        create_hash(payload)
    )
}

/// The end marker line for `tag`.
pub fn create_generated_footer_comment(tag: &str, comment: &str) -> String {
    format!("{comment} {}", end_needle(tag))
}

/// List every well-formed generated block in `text`, in file order.
///
/// Begin markers without a matching end marker later in the file are skipped.
pub fn find_generated_blocks(text: &str) -> Vec<GeneratedBlock> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(caps) = BEGIN_MARKER_REGEX.captures(line) else {
            continue;
        };
        let tag = &caps[1];
        let end = end_needle(tag);
        let Some(offset) = lines[index + 1..]
            .iter()
            .position(|candidate| is_end_marker(candidate, &end))
        else {
            continue;
        };

        blocks.push(GeneratedBlock {
            tag: tag.to_string(),
            hash: caps.get(2).map(|m| m.as_str().to_string()),
            start_line: index,
            end_line: index + 1 + offset,
        });
    }

    blocks
}
