//! Android string-resource escaping.
//!
//! `res/values/strings.xml` text is written with backslash escapes for quotes,
//! `@` and control characters. Values with leading or trailing whitespace are
//! additionally wrapped in double quotes so aapt keeps the whitespace.

use crate::xml::document::{XmlDocument, XmlElement};

/// Escape a raw string for use as Android string-resource text.
pub fn escape_android_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\'' | '\\' | '@' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }

    let padded = escaped.starts_with(char::is_whitespace) || escaped.ends_with(char::is_whitespace);
    if padded {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Strip one level of backslash escaping.
///
/// `\n`, `\r` and `\t` decode to the control characters they stand for; any
/// other escaped character decodes to itself. Whitespace-preserving quotes
/// added by [`escape_android_string`] are not removed.
pub fn unescape_android_string(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('t') => unescaped.push('\t'),
            Some(line_break @ ('\n' | '\r')) => {
                unescaped.push('\\');
                unescaped.push(line_break);
            }
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

fn is_translatable(element: &XmlElement) -> bool {
    element.attribute("translatable") != Some("false")
}

/// Apply `transform` to the text of every translatable `<string>` directly
/// under a `<resources>` root. Strings with markup children are skipped.
fn map_string_resources(doc: &mut XmlDocument, transform: fn(&str) -> String) {
    if doc.root.name != "resources" {
        return;
    }
    for string in doc.root.elements_named_mut("string") {
        if !is_translatable(string) || string.has_element_children() {
            continue;
        }
        let text = transform(&string.text());
        string.set_text(text);
    }
}

/// Escape string-resource text before serialization.
pub fn escape_string_resources(doc: &mut XmlDocument) {
    map_string_resources(doc, escape_android_string);
}

/// Unescape string-resource text after parsing.
pub fn unescape_string_resources(doc: &mut XmlDocument) {
    map_string_resources(doc, unescape_android_string);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes_and_control_chars() {
        assert_eq!(
            escape_android_string("it's a \"test\"\nline"),
            r#"it\'s a \"test\"\nline"#
        );
        assert_eq!(escape_android_string("a\tb\rc"), r"a\tb\rc");
        assert_eq!(escape_android_string("@string/x"), r"\@string/x");
        assert_eq!(escape_android_string(r"C:\path"), r"C:\\path");
    }

    #[test]
    fn test_escape_plain_passthrough() {
        assert_eq!(escape_android_string("Hello, World!"), "Hello, World!");
        assert_eq!(escape_android_string("日本語"), "日本語");
        assert_eq!(escape_android_string(""), "");
    }

    #[test]
    fn test_escape_wraps_padded_values() {
        assert_eq!(escape_android_string(" leading"), "\" leading\"");
        assert_eq!(escape_android_string("trailing "), "\"trailing \"");
        // Escaped control characters are no longer whitespace.
        assert_eq!(escape_android_string("\nx"), r"\nx");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(
            unescape_android_string(r#"it\'s a \"test\"\nline"#),
            "it's a \"test\"\nline"
        );
        assert_eq!(unescape_android_string(r"\@a\\b\q"), r"@a\bq");
        assert_eq!(unescape_android_string(r"trailing\"), r"trailing\");
    }

    #[test]
    fn test_round_trip() {
        for value in [
            "it's a \"test\"\nline",
            "a\\b@c\td\re",
            "@",
            "plain",
        ] {
            assert_eq!(unescape_android_string(&escape_android_string(value)), value);
        }
    }

    #[test]
    fn test_padded_round_trip_keeps_quotes() {
        let escaped = escape_android_string(" x");
        assert_eq!(unescape_android_string(&escaped), "\" x\"");
    }

    #[test]
    fn test_string_resources_respect_translatable() {
        let mut doc = XmlDocument::parse(
            r#"<resources>
  <string name="a">it's</string>
  <string name="b" translatable="false">it's</string>
  <color name="c">it's</color>
</resources>"#,
        )
        .unwrap();

        escape_string_resources(&mut doc);
        let texts: Vec<String> = doc.root.elements().map(|e| e.text()).collect();
        assert_eq!(texts, vec![r"it\'s", "it's", "it's"]);

        unescape_string_resources(&mut doc);
        let texts: Vec<String> = doc.root.elements().map(|e| e.text()).collect();
        assert_eq!(texts, vec!["it's", "it's", "it's"]);
    }

    #[test]
    fn test_non_resources_root_untouched() {
        let mut doc = XmlDocument::parse(r#"<manifest><string>it's</string></manifest>"#).unwrap();
        escape_string_resources(&mut doc);
        assert_eq!(doc.root.elements().next().unwrap().text(), "it's");
    }
}
