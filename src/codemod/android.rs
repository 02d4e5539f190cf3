//! Java and Kotlin code mods (`MainApplication`, `MainActivity`, Gradle DSL).

use super::{insert_import_lines, CodeBlock, CodeModError, SourceLanguage};
use crate::brackets::find_matching_bracket_position;
use crate::edit::insert_contents_at_offset;
use regex::Regex;
use std::sync::LazyLock;

static PACKAGE_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^package .*;?$").expect("Invalid package regex"));

/// Find the `new Foo(...)` (Java) or `Foo(...)` / `object : Foo(...)` (Kotlin)
/// expression for `class_declaration`.
///
/// The block spans the constructor arguments. When an anonymous class body
/// follows the arguments, the block extends to the end of that body.
pub fn find_new_instance_code_block(
    contents: &str,
    class_declaration: &str,
    language: SourceLanguage,
) -> Result<Option<CodeBlock>, CodeModError> {
    let found = match language {
        SourceLanguage::Java => contents.find(&format!(" new {class_declaration}(")),
        SourceLanguage::Kotlin => {
            let pattern = Regex::new(&format!(r" (object\s*:\s*)?{class_declaration}\("))?;
            pattern.find(contents).map(|m| m.start())
        }
    };
    let Some(space) = found else {
        return Ok(None);
    };
    let start = space + 1;

    let Some(mut end) = find_matching_bracket_position(contents, '(', start)? else {
        return Ok(None);
    };

    // `new Foo() { ... }` / `object : Foo() { ... }`
    if let Some(brace) = contents[end + 1..].find('{').map(|i| i + end + 1) {
        let between = &contents[end + 1..brace];
        if between.chars().all(char::is_whitespace) {
            match find_matching_bracket_position(contents, '{', brace)? {
                Some(body_end) => end = body_end,
                None => return Ok(None),
            }
        }
    }

    Ok(Some(CodeBlock::inclusive(contents, start, end)))
}

/// Append `insertion` at the end of the block opened by `declaration`.
///
/// `declaration` is a regex fragment such as `class MainApplication` or
/// `android\s*\{`. The insertion lands right before the closing brace.
pub fn append_contents_inside_declaration_block(
    src: &str,
    declaration: &str,
    insertion: &str,
) -> Result<String, CodeModError> {
    let pattern = Regex::new(&format!(r"\s*{declaration}.*?[\(\{{]"))?;
    let start = pattern
        .find(src)
        .ok_or_else(|| CodeModError::DeclarationNotFound {
            declaration: declaration.to_string(),
        })?
        .start();

    let end = find_matching_bracket_position(src, '{', start)?.ok_or_else(|| {
        CodeModError::UnbalancedBlock {
            declaration: declaration.to_string(),
        }
    })?;

    Ok(insert_contents_at_offset(src, insertion, end)?)
}

/// Add `import` statements below the `package` line for every entry of
/// `imports` not already mentioned in `source`.
pub fn add_imports(source: &str, imports: &[&str], language: SourceLanguage) -> String {
    let terminator = match language {
        SourceLanguage::Java => ";",
        SourceLanguage::Kotlin => "",
    };
    insert_import_lines(source, imports, &PACKAGE_LINE_REGEX, |import| {
        format!("import {import}{terminator}")
    })
}
