//! XML read/format/write round trip for structured native files
//! (`AndroidManifest.xml`, `res/values/*.xml`).

pub mod android;
pub mod document;
pub mod errors;
pub mod io;
pub mod resources;

pub use android::{
    escape_android_string, escape_string_resources, unescape_android_string,
    unescape_string_resources,
};
pub use document::{XmlDocument, XmlElement, XmlNode};
pub use errors::XmlError;
pub use io::{format_xml, parse_xml, read_xml, write_xml, FormatOptions, XmlSource};
pub use resources::{
    ensure_resources_root, get_resource_item, read_resources_xml, remove_resource_item,
    set_resource_item, ResourceItem, ResourceKind, EMPTY_RESOURCES,
};
