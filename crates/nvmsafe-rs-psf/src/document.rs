// crates/nvmsafe-rs-psf/src/document.rs

//! A generic, ordered XML tree with a structural checksum on the root.
//!
//! Loading verifies the checksum stored in the root's `checksum` attribute;
//! saving recomputes and stamps it. The `_unchecked` variants skip both,
//! which is what freshly created "clean" files use.

use crate::checksum::{CHECKSUM_ATTRIBUTE, structural_checksum};
use crate::error::PsfError;
use log::{debug, error, trace};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::path::Path;

/// One element of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Text content; empty if the node has none. Kept verbatim for leaves.
    /// For nodes with children it is trimmed, since the rest is indentation.
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: sets (or replaces) an attribute.
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder: sets the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: appends a child.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn required_attribute(&self, name: &'static str) -> Result<&str, PsfError> {
        self.attribute(name).ok_or_else(|| PsfError::MissingAttribute {
            element: self.name.clone(),
            attribute: name,
        })
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn required_child(&self, name: &'static str) -> Result<&XmlNode, PsfError> {
        self.child(name).ok_or_else(|| PsfError::MissingElement {
            parent: self.name.clone(),
            element: name,
        })
    }

    /// All children with the given name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(XmlNode::subtree_len).sum::<usize>()
    }
}

/// A whole document: one root node. The XML declaration is not part of the
/// model and is always written as `<?xml version="1.0" encoding="UTF-8"?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: XmlNode,
}

impl Document {
    pub fn new(root: XmlNode) -> Self {
        Self { root }
    }

    /// The checksum stored on the root, if any.
    pub fn stored_checksum(&self) -> Result<Option<u16>, PsfError> {
        self.root
            .attribute(CHECKSUM_ATTRIBUTE)
            .map(|text| {
                text.trim()
                    .parse::<u16>()
                    .map_err(|_| PsfError::InvalidAttributeFormat {
                        attribute: CHECKSUM_ATTRIBUTE,
                        value: text.to_string(),
                    })
            })
            .transpose()
    }

    /// Recomputes the structural checksum and compares it to the stored one.
    pub fn verify(&self) -> Result<(), PsfError> {
        let stored = self
            .stored_checksum()?
            .ok_or_else(|| PsfError::MissingAttribute {
                element: self.root.name.clone(),
                attribute: CHECKSUM_ATTRIBUTE,
            })?;
        let computed = structural_checksum(&self.root);
        if stored != computed {
            error!(
                "[XML] Checksum mismatch on <{}>: stored {:#06x}, computed {:#06x}",
                self.root.name, stored, computed
            );
            return Err(PsfError::Integrity { stored, computed });
        }
        trace!("[XML] Checksum {:#06x} verified", stored);
        Ok(())
    }

    /// Recomputes the checksum and stores it on the root.
    pub fn stamp_checksum(&mut self) -> u16 {
        let checksum = structural_checksum(&self.root);
        self.root
            .set_attribute(CHECKSUM_ATTRIBUTE, checksum.to_string());
        checksum
    }

    /// Parses and verifies a document from text.
    pub fn from_str_verified(text: &str) -> Result<Self, PsfError> {
        let document = Self::from_str_unchecked(text)?;
        document.verify()?;
        Ok(document)
    }

    /// Parses a document from text without looking at the checksum.
    pub fn from_str_unchecked(text: &str) -> Result<Self, PsfError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        // Stack of open elements; the finished root ends up in `root`.
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let node = node_from_start(&start)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(PsfError::Malformed("more than one root element".into()));
                    }
                    stack.push(node);
                }
                Event::Empty(start) => {
                    let node = node_from_start(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None if root.is_none() => root = Some(node),
                        None => {
                            return Err(PsfError::Malformed("more than one root element".into()));
                        }
                    }
                }
                Event::End(end) => {
                    let name = std::str::from_utf8(end.name().as_ref())?.to_string();
                    let mut node = stack
                        .pop()
                        .ok_or_else(|| PsfError::Malformed(format!("unexpected </{name}>")))?;
                    if node.name != name {
                        return Err(PsfError::Malformed(format!(
                            "</{name}> closes <{}>",
                            node.name
                        )));
                    }
                    if !node.children.is_empty() {
                        node.text = node.text.trim().to_string();
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    append_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let text = std::str::from_utf8(&bytes)?;
                    append_text(&mut stack, text)?;
                }
                Event::Eof => break,
                // Declaration, comments, processing instructions and DOCTYPE
                // are not part of the tree.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(PsfError::Malformed(format!("<{}> is never closed", open.name)));
        }
        let root = root.ok_or_else(|| PsfError::Malformed("document has no root element".into()))?;
        debug!("[XML] Parsed document <{}> with {} nodes", root.name, root.subtree_len());
        Ok(Self { root })
    }

    /// Stamps the checksum and renders the document.
    pub fn to_string_stamped(&mut self) -> Result<String, PsfError> {
        self.stamp_checksum();
        self.to_string_unchecked()
    }

    /// Renders the document exactly as it is, checksum attribute included or not.
    pub fn to_string_unchecked(&self) -> Result<String, PsfError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_node(&mut writer, &self.root)?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| PsfError::Encoding(e.utf8_error()))
    }

    /// Loads and verifies a document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PsfError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_str_verified(&text)
    }

    /// Loads a document from disk, ignoring its checksum.
    pub fn load_unchecked(path: impl AsRef<Path>) -> Result<Self, PsfError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_str_unchecked(&text)
    }

    /// Stamps the checksum and writes the whole document to disk.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), PsfError> {
        let text = self.to_string_stamped()?;
        fs::write(path.as_ref(), text)?;
        debug!("[XML] Saved {}", path.as_ref().display());
        Ok(())
    }

    /// Writes the document without a checksum attribute.
    pub fn save_unchecked(&mut self, path: impl AsRef<Path>) -> Result<(), PsfError> {
        self.root.remove_attribute(CHECKSUM_ATTRIBUTE);
        let text = self.to_string_unchecked()?;
        fs::write(path.as_ref(), text)?;
        debug!("[XML] Saved {} without checksum", path.as_ref().display());
        Ok(())
    }
}

fn node_from_start(start: &BytesStart<'_>) -> Result<XmlNode, PsfError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut node = XmlNode::new(name);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn append_text(stack: &mut [XmlNode], text: &str) -> Result<(), PsfError> {
    match stack.last_mut() {
        Some(node) => node.text.push_str(text),
        // Line breaks around the root element.
        None if text.trim().is_empty() => {}
        None => return Err(PsfError::Malformed("text outside of the root element".into())),
    }
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), PsfError> {
    let mut start = BytesStart::new(node.name.as_str());
    for (name, value) in &node.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !node.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&node.text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}
