use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("invalid XML: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid XML escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("serialized XML is not valid UTF-8: {0}")]
    OutputUtf8(#[from] std::string::FromUtf8Error),

    #[error("XML document has no root element")]
    NoRootElement,

    #[error("XML document has more than one root element: <{first}> and <{second}>")]
    MultipleRoots { first: String, second: String },

    #[error("unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write XML: {0}")]
    Write(#[from] std::io::Error),
}
