//! Balanced bracket search over raw source text.
//!
//! Only the bracket kind being searched is counted; other bracket kinds,
//! strings and comments are opaque text.

use crate::edit::EditError;

/// Pairs the bracket with its counterpart and scan direction.
fn counterpart(bracket: char) -> Result<(char, bool), EditError> {
    match bracket {
        '(' => Ok((')', true)),
        '{' => Ok(('}', true)),
        ')' => Ok(('(', false)),
        '}' => Ok(('{', false)),
        other => Err(EditError::UnsupportedBracket(other)),
    }
}

/// Find the bracket balancing the `bracket` nearest to `offset`.
///
/// An opening bracket is located at or after `offset` and scanned forward for
/// its closer. A closing bracket is located at or before `offset` and scanned
/// backward for its opener. Returns `Ok(None)` when no such `bracket` exists
/// or the text is unbalanced.
///
/// ```
/// use codemod_patcher::brackets::find_matching_bracket_position;
///
/// let text = "a(b(c)d)e";
/// assert_eq!(find_matching_bracket_position(text, '(', 0).unwrap(), Some(7));
/// assert_eq!(find_matching_bracket_position(text, ')', text.len() - 1).unwrap(), Some(1));
/// assert_eq!(find_matching_bracket_position(text, ')', 6).unwrap(), Some(3));
/// ```
pub fn find_matching_bracket_position(
    text: &str,
    bracket: char,
    offset: usize,
) -> Result<Option<usize>, EditError> {
    let (matching, forward) = counterpart(bracket)?;
    let bytes = text.as_bytes();
    if offset > bytes.len() {
        return Err(EditError::OffsetOutOfRange {
            offset,
            len: bytes.len(),
        });
    }

    // Brackets are ASCII, so byte comparisons never split a character.
    let (open, close) = (bracket as u8, matching as u8);
    let located = if forward {
        bytes[offset..]
            .iter()
            .position(|&b| b == open)
            .map(|i| i + offset)
    } else {
        let upto = offset.saturating_add(1).min(bytes.len());
        bytes[..upto].iter().rposition(|&b| b == open)
    };
    let Some(found) = located else {
        return Ok(None);
    };

    let mut depth = 0usize;
    if forward {
        for (i, &b) in bytes.iter().enumerate().skip(found + 1) {
            if b == open {
                depth += 1;
            } else if b == close {
                if depth == 0 {
                    return Ok(Some(i));
                }
                depth -= 1;
            }
        }
    } else {
        for i in (0..found).rev() {
            let b = bytes[i];
            if b == open {
                depth += 1;
            } else if b == close {
                if depth == 0 {
                    return Ok(Some(i));
                }
                depth -= 1;
            }
        }
    }

    Ok(None)
}
