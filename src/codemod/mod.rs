//! Text-level code mods for native project sources.
//!
//! These helpers locate declarations and function bodies with regex search
//! plus bracket matching, then splice text in with the offset editor. They do
//! not parse the host language: strings or comments containing brackets can
//! confuse them, the same way they confuse [`find_matching_bracket_position`].
//!
//! [`find_matching_bracket_position`]: crate::brackets::find_matching_bracket_position

pub mod android;
pub mod apple;

use crate::edit::EditError;
use regex::Regex;
use thiserror::Error;

pub use android::{
    add_imports, append_contents_inside_declaration_block, find_new_instance_code_block,
};
pub use apple::{
    add_objc_imports, add_swift_imports, find_objc_function_code_block,
    find_objc_interface_code_block, find_swift_function_code_block,
    insert_contents_inside_objc_function_block, insert_contents_inside_objc_interface_block,
    insert_contents_inside_swift_class_block, insert_contents_inside_swift_function_block,
};

#[derive(Error, Debug)]
pub enum CodeModError {
    #[error("Unable to find code block - declaration[{declaration}]")]
    DeclarationNotFound { declaration: String },

    #[error("Code block is not closed - declaration[{declaration}]")]
    UnbalancedBlock { declaration: String },

    #[error("Cannot find last return statement in block starting at byte {block_start}")]
    ReturnNotFound { block_start: usize },

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// A bracketed region of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Byte offset of the opening delimiter.
    pub start: usize,
    /// Byte offset of the closing delimiter.
    pub end: usize,
    pub code: String,
}

impl CodeBlock {
    /// Block over `contents[start..=end]`; `end` must be an ASCII delimiter.
    pub(crate) fn inclusive(contents: &str, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            code: contents[start..=end].to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    Java,
    Kotlin,
}

/// Where to insert inside a class or interface block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPosition {
    Head,
    Tail,
}

/// Where to insert inside a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionPosition {
    Head,
    Tail,
    /// Directly before the last ` return ` of the body.
    TailBeforeLastReturn,
}

/// Insert an import line below the first line matching `anchor_line` (or at
/// the top of the file when none matches), skipping imports already present.
///
/// Each new import is inserted at the same index, so a batch lands in reverse
/// order.
pub(crate) fn insert_import_lines(
    source: &str,
    imports: &[&str],
    anchor_line: &Regex,
    render: impl Fn(&str) -> String,
) -> String {
    let mut lines: Vec<String> = source.split('\n').map(str::to_string).collect();
    let index = lines
        .iter()
        .position(|line| anchor_line.is_match(line))
        .map_or(0, |i| i + 1);

    for import in imports {
        if source.contains(import) {
            tracing::trace!(import, "import already present");
            continue;
        }
        lines.insert(index, render(import));
    }

    lines.join("\n")
}
