//! Codemod Patcher: idempotent generated-code merging for native projects
//!
//! Inserts hash-tagged blocks into Gradle, Swift, Objective-C, Java, Kotlin
//! and XML sources so that re-running a mod is a no-op, changing it replaces
//! the old block, and removing it needs only the tag.
//!
//! # Architecture
//!
//! Everything builds on two text primitives: [`insert_contents_at_offset`]
//! and [`replace_contents_with_offset`]. Generated regions are delimited by
//! marker comments carrying a SHA-1 of their payload ([`generated`]), and
//! [`merge_contents`] decides between no-op, replacement and insertion.
//! Structured files go through an XML round trip ([`xml`]).
//!
//! # Safety
//!
//! - Anchor misses fail without producing partial output
//! - Damaged regions (missing or inverted markers) are never removed
//! - Atomic file writes (tempfile + fsync + rename)
//! - Project boundary enforcement
//!
//! # Example
//!
//! ```
//! use codemod_patcher::{merge_contents, Anchor, MergeRequest};
//!
//! let gradle = "repositories {\n    mavenCentral()\n}";
//! let anchor = Anchor::literal("mavenCentral()").unwrap();
//! let request = MergeRequest {
//!     src: gradle,
//!     new_src: "    maven { url 'https://maps.example.com' }",
//!     tag: "maps-maven",
//!     anchor: &anchor,
//!     offset: 1,
//!     comment: "//",
//! };
//!
//! let first = merge_contents(&request).unwrap();
//! assert!(first.did_merge);
//!
//! let again = merge_contents(&MergeRequest { src: &first.contents, ..request }).unwrap();
//! assert!(!again.did_merge);
//! assert_eq!(again.contents, first.contents);
//! ```

pub mod brackets;
pub mod codemod;
pub mod config;
pub mod edit;
pub mod generated;
pub mod logging;
pub mod merge;
pub mod safety;
pub mod xml;

// Re-exports
pub use brackets::find_matching_bracket_position;
pub use config::{
    apply_mods, load_from_path, load_from_str, ApplicationError, ApplyMode, ConfigError,
    ModConfig, ModResult,
};
pub use edit::{
    insert_contents_at_offset, replace_contents_with_offset, search_from_offset, EditError,
};
pub use generated::{
    create_generated_footer_comment, create_generated_header_comment, create_hash,
    find_generated_blocks, remove_generated_contents, GeneratedBlock,
};
pub use merge::{merge_contents, remove_contents, Anchor, MergeError, MergeRequest, MergeResult};
pub use safety::{ProjectGuard, SafetyError};
pub use xml::{format_xml, read_xml, write_xml, XmlDocument, XmlError, XmlSource};
