//! Objective-C and Swift code mods (`AppDelegate`, bridging headers).

use super::{insert_import_lines, BlockPosition, CodeBlock, CodeModError, FunctionPosition};
use crate::brackets::find_matching_bracket_position;
use crate::edit::{insert_contents_at_offset, search_from_offset};
use regex::Regex;
use std::sync::LazyLock;

static OBJC_IMPORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#import .*$").expect("Invalid objc import regex"));
static SWIFT_IMPORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import .*$").expect("Invalid swift import regex"));

const OBJC_END: &str = "\n@end";

/// Add `#import <x>` lines below the first existing `#import`.
pub fn add_objc_imports(source: &str, imports: &[&str]) -> String {
    insert_import_lines(source, imports, &OBJC_IMPORT_REGEX, |import| {
        format!("#import {import}")
    })
}

/// Add `import <x>` lines below the first existing `import`.
pub fn add_swift_imports(source: &str, imports: &[&str]) -> String {
    insert_import_lines(source, imports, &SWIFT_IMPORT_REGEX, |import| {
        format!("import {import}")
    })
}

/// Find an `@interface`/`@implementation` block, from the line starting with
/// `declaration` through its `@end`.
pub fn find_objc_interface_code_block(
    contents: &str,
    declaration: &str,
) -> Result<Option<CodeBlock>, CodeModError> {
    let pattern = Regex::new(&format!(r"(?m)^{declaration}\W"))?;
    let Some(start) = pattern.find(contents).map(|m| m.start()) else {
        return Ok(None);
    };
    let Some(newline) = contents[start..].find(OBJC_END).map(|i| i + start) else {
        return Ok(None);
    };
    Ok(Some(CodeBlock::inclusive(
        contents,
        start,
        newline + OBJC_END.len() - 1,
    )))
}

/// Find the body of the Objective-C method named by `selector`, e.g.
/// `application:didFinishLaunchingWithOptions:`.
pub fn find_objc_function_code_block(
    contents: &str,
    selector: &str,
) -> Result<Option<CodeBlock>, CodeModError> {
    let symbols: Vec<&str> = selector.split(':').collect();
    let args_count = symbols.len() - 1;

    let mut pattern = String::from(r"(?m)^[\-+]\s*\(.+?\)");
    if args_count == 0 {
        pattern.push_str(&format!(r"{}\s+", regex::escape(symbols[0])));
    } else {
        for symbol in &symbols[..args_count] {
            pattern.push_str(&format!(r"{}:\(.+\)\w+\s+", regex::escape(symbol)));
        }
    }
    pattern.push_str(r"\{");

    let Some(found) = Regex::new(&pattern)?.find(contents) else {
        return Ok(None);
    };
    // The match ends with the opening brace.
    let start = found.end() - 1;
    Ok(find_matching_bracket_position(contents, '{', start)?
        .map(|end| CodeBlock::inclusive(contents, start, end)))
}

/// Split a Swift parameter list on commas outside nested brackets.
fn split_params(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    for (i, c) in params.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&params[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&params[last..]);
    parts
}

/// The argument label of `_ application: UIApplication` is `_`.
fn argument_label(param: &str) -> &str {
    let declaration = param.split(':').next().unwrap_or_default();
    declaration.split_whitespace().next().unwrap_or_default()
}

/// Argument labels of `name(a:b:)`, or `None` when the selector has no
/// parameter list.
fn selector_labels(selector: &str) -> (&str, Option<Vec<&str>>) {
    let Some(open) = selector.find('(') else {
        return (selector, None);
    };
    let inner = selector[open + 1..].trim_end_matches(')');
    let labels = inner
        .split(':')
        .filter(|label| !label.is_empty())
        .collect();
    (&selector[..open], Some(labels))
}

/// Find the body of the Swift function named by `selector`, e.g.
/// `application(_:didFinishLaunchingWithOptions:)`.
///
/// Overloads are told apart by their argument labels. A selector without a
/// parameter list matches the first function of that name.
pub fn find_swift_function_code_block(
    contents: &str,
    selector: &str,
) -> Result<Option<CodeBlock>, CodeModError> {
    let (name, labels) = selector_labels(selector);
    let candidate = Regex::new(&format!(r"\sfunc\s+{}\(", regex::escape(name)))?;

    let mut search_offset = 0;
    while let Some(offset) = search_from_offset(contents, &candidate, search_offset)? {
        let Some(params_start) = contents[offset..].find('(').map(|i| i + offset) else {
            break;
        };
        let Some(params_end) = find_matching_bracket_position(contents, '(', params_start)? else {
            break;
        };
        search_offset = params_end + 1;

        if let Some(labels) = &labels {
            let params = &contents[params_start + 1..params_end];
            let actual: Vec<&str> = if params.trim().is_empty() {
                Vec::new()
            } else {
                split_params(params)
                    .into_iter()
                    .map(|param| argument_label(param.trim()))
                    .collect()
            };
            if &actual != labels {
                tracing::trace!(selector, ?actual, "swift overload does not match");
                continue;
            }
        }

        let Some(start) = contents[params_end..].find('{').map(|i| i + params_end) else {
            return Ok(None);
        };
        return Ok(find_matching_bracket_position(contents, '{', start)?
            .map(|end| CodeBlock::inclusive(contents, start, end)));
    }

    Ok(None)
}

fn insert_contents_inside_function_block(
    src: &str,
    block: Option<CodeBlock>,
    insertion: &str,
    position: FunctionPosition,
    indent: usize,
) -> Result<String, CodeModError> {
    let Some(block) = block else {
        tracing::debug!("function block not found, leaving source unchanged");
        return Ok(src.to_string());
    };
    let indent = " ".repeat(indent);

    let updated = match position {
        FunctionPosition::Head => {
            insert_contents_at_offset(src, &format!("\n{indent}{insertion}"), block.start + 1)?
        }
        FunctionPosition::Tail => {
            // Before the line break that precedes the closing brace.
            let offset = (block.end - 1).max(block.start + 1);
            insert_contents_at_offset(src, &format!("\n{indent}{insertion}"), offset)?
        }
        FunctionPosition::TailBeforeLastReturn => {
            let body = &src[block.start..block.end];
            let Some(index) = body.rfind(" return ") else {
                return Err(CodeModError::ReturnNotFound {
                    block_start: block.start,
                });
            };
            let offset = block.start + index + 1;
            insert_contents_at_offset(src, &format!("{insertion}\n{indent}"), offset)?
        }
    };
    Ok(updated)
}

/// Insert `insertion` into the Objective-C method named by `selector`.
///
/// The source is returned unchanged when the method does not exist.
pub fn insert_contents_inside_objc_function_block(
    src: &str,
    selector: &str,
    insertion: &str,
    position: FunctionPosition,
    indent: Option<usize>,
) -> Result<String, CodeModError> {
    let block = find_objc_function_code_block(src, selector)?;
    insert_contents_inside_function_block(src, block, insertion, position, indent.unwrap_or(2))
}

/// Insert `insertion` into the Swift function named by `selector`.
///
/// The source is returned unchanged when the function does not exist.
pub fn insert_contents_inside_swift_function_block(
    src: &str,
    selector: &str,
    insertion: &str,
    position: FunctionPosition,
    indent: Option<usize>,
) -> Result<String, CodeModError> {
    let block = find_swift_function_code_block(src, selector)?;
    insert_contents_inside_function_block(src, block, insertion, position, indent.unwrap_or(2))
}

/// Insert `insertion` right after the declaration line of an Objective-C
/// interface (`Head`) or right before its `@end` (`Tail`).
pub fn insert_contents_inside_objc_interface_block(
    src: &str,
    declaration: &str,
    insertion: &str,
    position: BlockPosition,
) -> Result<String, CodeModError> {
    let Some(block) = find_objc_interface_code_block(src, declaration)? else {
        tracing::debug!(declaration, "interface block not found, leaving source unchanged");
        return Ok(src.to_string());
    };

    let offset = match position {
        BlockPosition::Head => src[block.start..]
            .find('\n')
            .map_or(block.end, |i| i + block.start),
        BlockPosition::Tail => block.end + 1 - "@end".len(),
    };
    Ok(insert_contents_at_offset(src, insertion, offset)?)
}

/// Insert `insertion` at the start or end of a Swift class body.
pub fn insert_contents_inside_swift_class_block(
    src: &str,
    declaration: &str,
    insertion: &str,
    position: BlockPosition,
) -> Result<String, CodeModError> {
    let pattern = Regex::new(&format!(r"\s*{declaration}.*?[\(\{{]"))?;
    let Some(start) = pattern.find(src).map(|m| m.start()) else {
        return Err(CodeModError::DeclarationNotFound {
            declaration: declaration.to_string(),
        });
    };

    let offset = match position {
        BlockPosition::Head => src[start..].find('{').map(|i| i + start + 1),
        BlockPosition::Tail => find_matching_bracket_position(src, '{', start)?,
    };
    let Some(offset) = offset else {
        return Err(CodeModError::UnbalancedBlock {
            declaration: declaration.to_string(),
        });
    };
    Ok(insert_contents_at_offset(src, insertion, offset)?)
}
