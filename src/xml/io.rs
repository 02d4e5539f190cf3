use crate::edit::write_atomic;
use crate::xml::android::{escape_string_resources, unescape_string_resources};
use crate::xml::document::XmlDocument;
use crate::xml::errors::XmlError;
use std::fs;
use std::path::Path;

/// What [`format_xml`] renders: text passes through, trees are serialized.
#[derive(Debug, Clone, Copy)]
pub enum XmlSource<'a> {
    Raw(&'a str),
    Tree(&'a XmlDocument),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per nesting level.
    pub indent_level: usize,
    pub newline: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        let newline = if cfg!(windows) { "\r\n" } else { "\n" };
        Self {
            indent_level: 2,
            newline: newline.to_string(),
        }
    }
}

/// Parse XML text. No Android post-processing is applied.
pub fn parse_xml(text: &str) -> Result<XmlDocument, XmlError> {
    XmlDocument::parse(text)
}

/// Render `source` as XML text.
///
/// Trees get their translatable `resources/string` entries escaped on a copy
/// before serialization; the caller's document is not modified.
pub fn format_xml(source: XmlSource<'_>, options: &FormatOptions) -> Result<String, XmlError> {
    match source {
        XmlSource::Raw(text) => Ok(text.to_string()),
        XmlSource::Tree(doc) => {
            let mut doc = doc.clone();
            escape_string_resources(&mut doc);
            doc.to_xml_string(options.indent_level, &options.newline)
        }
    }
}

/// Format `doc` with default options and write it atomically, creating parent
/// directories as needed.
pub fn write_xml(path: &Path, doc: &XmlDocument) -> Result<(), XmlError> {
    let contents = format_xml(XmlSource::Tree(doc), &FormatOptions::default())?;
    write_atomic(path, contents.as_bytes()).map_err(|source| XmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "wrote XML");
    Ok(())
}

/// Read and parse `path`, falling back to `fallback` (then to empty text)
/// when the file does not exist. String resources are unescaped.
pub fn read_xml(path: &Path, fallback: Option<&str>) -> Result<XmlDocument, XmlError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "XML file missing, using fallback");
            fallback.unwrap_or_default().to_string()
        }
        Err(source) => {
            return Err(XmlError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut doc = parse_xml(&contents)?;
    unescape_string_resources(&mut doc);
    Ok(doc)
}
