//! Android value resources (`res/values/*.xml`).

use crate::xml::document::{XmlDocument, XmlElement};
use crate::xml::errors::XmlError;
use crate::xml::io::read_xml;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Contents used when a resource file does not exist yet.
pub const EMPTY_RESOURCES: &str = "<resources></resources>";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    String,
    Color,
    Dimen,
    Integer,
    Bool,
}

impl ResourceKind {
    pub fn element_name(self) -> &'static str {
        match self {
            ResourceKind::String => "string",
            ResourceKind::Color => "color",
            ResourceKind::Dimen => "dimen",
            ResourceKind::Integer => "integer",
            ResourceKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub name: String,
    pub value: String,
    /// Written as the `translatable` attribute when set.
    pub translatable: Option<bool>,
}

impl ResourceItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            translatable: None,
        }
    }

    fn to_element(&self, kind: ResourceKind) -> XmlElement {
        let mut element = XmlElement::new(kind.element_name()).with_attribute("name", &self.name);
        if let Some(translatable) = self.translatable {
            element.set_attribute("translatable", translatable.to_string());
        }
        element.with_text(&self.value)
    }
}

/// Fail unless the document is a `<resources>` file.
pub fn ensure_resources_root(doc: &XmlDocument) -> Result<(), XmlError> {
    if doc.root.name == "resources" {
        Ok(())
    } else {
        Err(XmlError::UnexpectedRoot {
            expected: "resources".to_string(),
            found: doc.root.name.clone(),
        })
    }
}

/// Read a resource file, starting from an empty `<resources>` when missing.
pub fn read_resources_xml(path: &Path) -> Result<XmlDocument, XmlError> {
    let doc = read_xml(path, Some(EMPTY_RESOURCES))?;
    ensure_resources_root(&doc)?;
    Ok(doc)
}

pub fn get_resource_item(doc: &XmlDocument, kind: ResourceKind, name: &str) -> Option<ResourceItem> {
    doc.root
        .elements_named(kind.element_name())
        .find(|element| element.attribute("name") == Some(name))
        .map(|element| ResourceItem {
            name: name.to_string(),
            value: element.text(),
            translatable: element.attribute("translatable").map(|value| value != "false"),
        })
}

/// Add `item`, or update the existing entry with the same name.
///
/// Returns `false` when the document already holds exactly this item.
pub fn set_resource_item(doc: &mut XmlDocument, kind: ResourceKind, item: &ResourceItem) -> bool {
    let existing = doc
        .root
        .elements_named_mut(kind.element_name())
        .find(|element| element.attribute("name") == Some(item.name.as_str()));

    match existing {
        Some(element) => {
            let translatable = item.translatable.map(|value| value.to_string());
            let same_flag = translatable.is_none()
                || element.attribute("translatable") == translatable.as_deref();
            if element.text() == item.value && same_flag {
                return false;
            }
            if let Some(translatable) = translatable {
                element.set_attribute("translatable", translatable);
            }
            element.set_text(&item.value);
            true
        }
        None => {
            doc.root.push_element(item.to_element(kind));
            true
        }
    }
}

/// Remove every entry of `kind` named `name`. Returns whether one existed.
pub fn remove_resource_item(doc: &mut XmlDocument, kind: ResourceKind, name: &str) -> bool {
    let element_name = kind.element_name();
    let before = doc.root.elements().count();
    doc.root
        .retain_elements(|element| !(element.name == element_name && element.attribute("name") == Some(name)));
    doc.root.elements().count() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::io::parse_xml;

    fn resources() -> XmlDocument {
        parse_xml(
            r#"<resources>
  <string name="app_name">Demo</string>
  <color name="primary">#000000</color>
</resources>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_item() {
        let doc = resources();
        let item = get_resource_item(&doc, ResourceKind::String, "app_name").unwrap();
        assert_eq!(item, ResourceItem::new("app_name", "Demo"));
        assert!(get_resource_item(&doc, ResourceKind::Color, "app_name").is_none());
    }

    #[test]
    fn test_set_new_item() {
        let mut doc = resources();
        let item = ResourceItem {
            translatable: Some(false),
            ..ResourceItem::new("api_key", "abc")
        };
        assert!(set_resource_item(&mut doc, ResourceKind::String, &item));

        let added = doc.root.elements().last().unwrap();
        assert_eq!(added.name, "string");
        assert_eq!(added.attribute("name"), Some("api_key"));
        assert_eq!(added.attribute("translatable"), Some("false"));
        assert_eq!(added.text(), "abc");
    }

    #[test]
    fn test_set_existing_item() {
        let mut doc = resources();
        let item = ResourceItem::new("app_name", "Renamed");
        assert!(set_resource_item(&mut doc, ResourceKind::String, &item));
        assert_eq!(doc.root.elements().count(), 2);
        assert_eq!(
            get_resource_item(&doc, ResourceKind::String, "app_name").unwrap().value,
            "Renamed"
        );
    }

    #[test]
    fn test_set_unchanged_item() {
        let mut doc = resources();
        let before = doc.clone();
        assert!(!set_resource_item(
            &mut doc,
            ResourceKind::Color,
            &ResourceItem::new("primary", "#000000")
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_remove_item() {
        let mut doc = resources();
        assert!(remove_resource_item(&mut doc, ResourceKind::Color, "primary"));
        assert!(!remove_resource_item(&mut doc, ResourceKind::Color, "primary"));
        assert_eq!(doc.root.elements().count(), 1);
    }

    #[test]
    fn test_read_resources_fallback() {
        let temp_dir = tempfile::tempdir().unwrap();
        let doc = read_resources_xml(&temp_dir.path().join("colors.xml")).unwrap();
        assert_eq!(doc.root.name, "resources");
        assert!(doc.root.children.is_empty());
    }

    #[test]
    fn test_ensure_resources_root() {
        let doc = parse_xml("<manifest/>").unwrap();
        assert!(matches!(
            ensure_resources_root(&doc),
            Err(XmlError::UnexpectedRoot { .. })
        ));
    }
}
