//! XML to generic tree.
//!
//! The whole document is read into nested [`Element`]s whose children are
//! grouped by tag name. A tag that occurs once under a parent is stored as
//! [`OneOrMany::One`], a repeated tag as [`OneOrMany::Many`]. Converters never
//! look at that distinction: every lookup goes through [`Element::all`] (or
//! helpers built on it), which normalizes both shapes to a slice.
//!
//! Grouping loses the interleaving of different tags, so each element also
//! records the sequence its children arrived in; [`Element::children`] walks
//! them in document order.
//!
//! Namespace prefixes are dropped, so `<kml:Placemark>` and `<Placemark>`
//! are the same key.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use std::slice;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("{source} (at byte {position})")]
    Syntax {
        source: quick_xml::Error,
        position: u64,
    },

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("document ended inside <{0}>")]
    UnclosedElement(String),

    #[error("document has no root element")]
    NoRootElement,
}

/// A value the tree stores once or as a sequence depending on how many
/// siblings shared the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Both shapes as a slice; a single value becomes a one-element slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }

    pub fn push(&mut self, item: T) {
        let prev = std::mem::replace(self, OneOrMany::Many(Vec::new()));
        *self = match prev {
            OneOrMany::One(first) => OneOrMany::Many(vec![first, item]),
            OneOrMany::Many(mut items) => {
                items.push(item);
                OneOrMany::Many(items)
            }
        };
    }
}

/// One XML element: attributes, concatenated text and children by tag name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub children: IndexMap<String, OneOrMany<Element>>,
    /// `(group index in children, position within the group)` per child
    order: Vec<(usize, usize)>,
}

impl Element {
    /// Every child with the given tag, in document order.
    pub fn all(&self, tag: &str) -> &[Element] {
        self.children
            .get(tag)
            .map(OneOrMany::as_slice)
            .unwrap_or(&[])
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.all(tag).first()
    }

    /// Follow a chain of tags, taking the first match at each level.
    pub fn path(&self, tags: &[&str]) -> Option<&Element> {
        tags.iter().try_fold(self, |el, tag| el.child(tag))
    }

    /// Text of the first child with the given tag.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).map(|c| c.text.as_str())
    }

    /// Every child with its tag, in document order across tags.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Element)> + '_ {
        self.order.iter().filter_map(|&(group, index)| {
            let (tag, children) = self.children.get_index(group)?;
            Some((tag.as_str(), children.as_slice().get(index)?))
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn append_child(&mut self, tag: String, child: Element) {
        let entry = self.children.entry(tag);
        let group = entry.index();
        let index = match entry {
            indexmap::map::Entry::Occupied(mut existing) => {
                let siblings = existing.get_mut();
                siblings.push(child);
                siblings.as_slice().len() - 1
            }
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(OneOrMany::One(child));
                0
            }
        };
        self.order.push((group, index));
    }

    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }
}

/// A parsed document: the tag of its root element plus the element itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root_tag: String,
    pub root: Element,
}

/// Parse a complete XML document.
pub fn parse(bytes: &[u8]) -> Result<Document, MarkupError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    // Bottom of the stack collects top-level elements
    let mut stack: Vec<(String, Element)> = vec![(String::new(), Element::default())];
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| MarkupError::Syntax {
                source,
                position: reader.buffer_position() as u64,
            })?;

        match event {
            Event::Start(start) => {
                let (tag, element) = open_element(&start, reader.buffer_position() as u64)?;
                stack.push((tag, element));
            }
            Event::Empty(start) => {
                let (tag, element) = open_element(&start, reader.buffer_position() as u64)?;
                if let Some((_, parent)) = stack.last_mut() {
                    parent.append_child(tag, element);
                }
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some((tag, element)) = stack.pop() {
                        if let Some((_, parent)) = stack.last_mut() {
                            parent.append_child(tag, element);
                        }
                    }
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| MarkupError::Syntax {
                    source,
                    position: reader.buffer_position() as u64,
                })?;
                if stack.len() > 1 {
                    if let Some((_, current)) = stack.last_mut() {
                        current.append_text(text.trim());
                    }
                }
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                if stack.len() > 1 {
                    if let Some((_, current)) = stack.last_mut() {
                        current.append_text(String::from_utf8_lossy(&raw).trim());
                    }
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            _ => {}
        }
        buf.clear();
    }

    if stack.len() > 1 {
        let open = stack.pop().map(|(tag, _)| tag).unwrap_or_default();
        return Err(MarkupError::UnclosedElement(open));
    }

    let (_, mut top) = stack.pop().ok_or(MarkupError::NoRootElement)?;
    let (root_tag, roots) = top
        .children
        .shift_remove_index(0)
        .ok_or(MarkupError::NoRootElement)?;
    let root = match roots {
        OneOrMany::One(root) => root,
        OneOrMany::Many(mut all) => all.swap_remove(0),
    };

    Ok(Document { root_tag, root })
}

fn open_element(start: &BytesStart<'_>, position: u64) -> Result<(String, Element), MarkupError> {
    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut element = Element::default();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| MarkupError::Syntax { source, position })?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok((tag, element))
}
