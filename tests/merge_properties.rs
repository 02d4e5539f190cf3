//! Property tests for the merge engine and its text primitives

use codemod_patcher::brackets::find_matching_bracket_position;
use codemod_patcher::edit::{insert_contents_at_offset, replace_contents_with_offset};
use codemod_patcher::generated::find_generated_blocks;
use codemod_patcher::merge::{merge_contents, remove_contents, Anchor, MergeError, MergeRequest};
use codemod_patcher::xml::{escape_android_string, unescape_android_string};
use proptest::prelude::*;

const ANCHOR_LINE: &str = "ANCHOR_LINE";

fn source_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9 {}();=.]{0,24}", 0..12)
}

/// Source text with the anchor line spliced in at an arbitrary position.
fn source_with_anchor() -> impl Strategy<Value = String> {
    (source_lines(), any::<prop::sample::Index>()).prop_map(|(mut lines, at)| {
        let index = at.index(lines.len() + 1);
        lines.insert(index, ANCHOR_LINE.to_string());
        lines.join("\n")
    })
}

fn payload() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9 '{}()=.]{0,30}", 1..5).prop_map(|lines| lines.join("\n"))
}

fn tag() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

fn comment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["//", "#", "--", "<!--"])
}

/// Payload lines between the markers of the only block in `text`.
fn block_payload(text: &str) -> String {
    let blocks = find_generated_blocks(text);
    assert_eq!(blocks.len(), 1);
    let lines: Vec<&str> = text.split('\n').collect();
    lines[blocks[0].start_line + 1..blocks[0].end_line].join("\n")
}

proptest! {
    #[test]
    fn merge_twice_is_noop(
        src in source_with_anchor(),
        new_src in payload(),
        tag in tag(),
        offset in -3isize..6,
        comment in comment(),
    ) {
        let anchor = Anchor::literal(ANCHOR_LINE).unwrap();
        let request = MergeRequest { src: &src, new_src: &new_src, tag: &tag, anchor: &anchor, offset, comment };

        let first = merge_contents(&request).unwrap();
        prop_assert!(first.did_merge);

        let second = merge_contents(&MergeRequest { src: &first.contents, ..request }).unwrap();
        prop_assert!(!second.did_merge);
        prop_assert!(!second.did_clear);
        prop_assert_eq!(second.contents, first.contents);
    }

    #[test]
    fn changed_payload_replaces_block(
        src in source_with_anchor(),
        old in payload(),
        new in payload(),
        tag in tag(),
        offset in -3isize..6,
    ) {
        prop_assume!(old != new);
        let anchor = Anchor::literal(ANCHOR_LINE).unwrap();
        let request = MergeRequest { src: &src, new_src: &old, tag: &tag, anchor: &anchor, offset, comment: "//" };

        let first = merge_contents(&request).unwrap();
        let second = merge_contents(&MergeRequest { src: &first.contents, new_src: &new, ..request }).unwrap();

        prop_assert!(second.did_merge);
        prop_assert!(second.did_clear);
        prop_assert_eq!(block_payload(&second.contents), new);
    }

    #[test]
    fn remove_restores_source(
        src in source_with_anchor(),
        new_src in payload(),
        tag in tag(),
        offset in -3isize..6,
        comment in comment(),
    ) {
        let anchor = Anchor::literal(ANCHOR_LINE).unwrap();
        let merged = merge_contents(&MergeRequest { src: &src, new_src: &new_src, tag: &tag, anchor: &anchor, offset, comment }).unwrap();

        let removed = remove_contents(&merged.contents, &tag);
        prop_assert!(removed.did_clear);
        prop_assert_eq!(removed.contents, src);
    }

    #[test]
    fn missing_anchor_fails(lines in source_lines(), new_src in payload()) {
        let src = lines.join("\n");
        let anchor = Anchor::literal(ANCHOR_LINE).unwrap();
        let err = merge_contents(&MergeRequest { src: &src, new_src: &new_src, tag: "t", anchor: &anchor, offset: 0, comment: "//" }).unwrap_err();
        let is_anchor_error = matches!(err, MergeError::AnchorNotFound { .. });
        prop_assert!(is_anchor_error);
        prop_assert!(err.to_string().contains(ANCHOR_LINE));
    }

    #[test]
    fn brackets_pair_like_a_stack(text in "[ab()]{0,30}") {
        let bytes = text.as_bytes();
        let mut partner = vec![None; bytes.len()];
        let mut stack = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => stack.push(i),
                b')' => {
                    if let Some(open) = stack.pop() {
                        partner[open] = Some(i);
                        partner[i] = Some(open);
                    }
                }
                _ => {}
            }
        }

        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' | b')' => {
                    let found = find_matching_bracket_position(&text, b as char, i).unwrap();
                    prop_assert_eq!(found, partner[i]);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn insert_splits_at_offset(text in "[a-z]{0,20}", insertion in "[A-Z]{0,5}", at in any::<prop::sample::Index>()) {
        let offset = at.index(text.len() + 1);
        let out = insert_contents_at_offset(&text, &insertion, offset).unwrap();
        prop_assert_eq!(out, format!("{}{}{}", &text[..offset], insertion, &text[offset..]));
    }

    #[test]
    fn replace_covers_inclusive_range(text in "[a-z]{1,20}", replacement in "[A-Z]{0,5}", a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let (start, end) = {
            let (x, y) = (a.index(text.len()), b.index(text.len()));
            (x.min(y), x.max(y))
        };
        let out = replace_contents_with_offset(&text, &replacement, start, end).unwrap();
        prop_assert_eq!(out, format!("{}{}{}", &text[..start], replacement, &text[end + 1..]));
    }

    #[test]
    fn android_escape_round_trips(value in "[a-zA-Z0-9 '\"@\\\\\n\t\r?!.,]{0,40}") {
        prop_assume!(!value.starts_with(' ') && !value.ends_with(' '));
        prop_assert_eq!(unescape_android_string(&escape_android_string(&value)), value);
    }
}

#[test]
fn android_escape_padded_value_keeps_quotes() {
    let escaped = escape_android_string(" leading");
    assert_eq!(escaped, "\" leading\"");
    assert_ne!(unescape_android_string(&escaped), " leading");
}
