use crate::xml::errors::XmlError;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data (CDATA sections are folded in).
    Text(String),
}

/// A parsed XML file. Prolog, comments and processing instructions are not
/// retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Concatenated text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Replace all text children with a single text node placed after any
    /// child elements. An empty `text` leaves no text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children
            .retain(|child| matches!(child, XmlNode::Element(_)));
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    pub fn has_element_children(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, XmlNode::Element(_)))
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |element| element.name == name)
    }

    pub fn elements_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> {
        self.elements_mut().filter(move |element| element.name == name)
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Keep only the child elements for which `keep` returns true. Text
    /// children are untouched.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&XmlElement) -> bool) {
        self.children.retain(|child| match child {
            XmlNode::Element(element) => keep(element),
            XmlNode::Text(_) => true,
        });
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut element = XmlElement::new(std::str::from_utf8(start.name().as_ref())?);
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(previous)) = self.children.last_mut() {
            previous.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Text and elements interleaved, as in `Hello <b>World</b>`.
    fn is_mixed(&self) -> bool {
        self.has_element_children()
            && self.children.iter().any(|child| match child {
                XmlNode::Text(text) => !text.trim().is_empty(),
                XmlNode::Element(_) => false,
            })
    }

    /// Indentation between child elements is not content.
    fn drop_layout_whitespace(&mut self) {
        if self.has_element_children() && !self.is_mixed() {
            self.children
                .retain(|child| matches!(child, XmlNode::Element(_)));
        }
    }
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse XML text into a tree.
    ///
    /// Whitespace-only text between child elements is discarded; text inside
    /// leaf elements is kept verbatim.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
                Event::Empty(start) => {
                    let element = XmlElement::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                        XmlError::UnexpectedEnd(name)
                    })?;
                    element.drop_layout_whitespace();
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(std::str::from_utf8(&data)?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = stack.pop() {
            return Err(XmlError::Unclosed(unclosed.name));
        }
        root.map(Self::new).ok_or(XmlError::NoRootElement)
    }

    /// Serialize without an XML declaration.
    ///
    /// Elements without children are self-closed, elements holding only text
    /// or mixed content stay on one line, everything else is indented by
    /// `indent` spaces per level and separated by `newline`.
    pub fn to_xml_string(&self, indent: usize, newline: &str) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, &self.root, 0, indent, newline)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_element(element);
        return Ok(());
    }
    match root {
        Some(existing) => Err(XmlError::MultipleRoots {
            first: existing.name.clone(),
            second: element.name,
        }),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

fn write_layout(writer: &mut Writer<Vec<u8>>, depth: usize, indent: usize, newline: &str) {
    let out = writer.get_mut();
    out.extend_from_slice(newline.as_bytes());
    out.resize(out.len() + depth * indent, b' ');
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), XmlError> {
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    Ok(())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
    depth: usize,
    indent: usize,
    newline: &str,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if element.is_mixed() {
        for child in &element.children {
            match child {
                XmlNode::Element(child) => write_element(writer, child, depth + 1, 0, "")?,
                XmlNode::Text(text) => write_text(writer, text)?,
            }
        }
    } else if element.has_element_children() {
        for child in &element.children {
            match child {
                XmlNode::Element(child) => {
                    write_layout(writer, depth + 1, indent, newline);
                    write_element(writer, child, depth + 1, indent, newline)?;
                }
                XmlNode::Text(text) if text.trim().is_empty() => {}
                XmlNode::Text(text) => {
                    write_layout(writer, depth + 1, indent, newline);
                    write_text(writer, text)?;
                }
            }
        }
        write_layout(writer, depth, indent, newline);
    } else {
        write_text(writer, &element.text())?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
