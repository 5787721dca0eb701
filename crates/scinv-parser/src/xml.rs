use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::InventoryError;

/// Minimal owned element tree. Names are stored without namespace prefixes so
/// lookups work across schema versions.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text content, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Attribute `name` if present and non-blank, otherwise the text of the
    /// first child element called `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        if let Some(attr) = self.attribute(name) {
            let trimmed = attr.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        self.child(name).and_then(XmlElement::text)
    }

    pub fn owned_value(&self, name: &str) -> Option<String> {
        self.value(name).map(str::to_owned)
    }
}

pub fn parse_document(content: &str) -> Result<XmlElement, InventoryError> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(source) => {
                return Err(InventoryError::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                })
            }
        };

        match event {
            Event::Start(start) => {
                let element = element_from(&start).map_err(|source| InventoryError::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                })?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from(&start).map_err(|source| InventoryError::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| InventoryError::Unbalanced {
                    message: "closing tag without matching opening tag".to_string(),
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|source| InventoryError::Xml {
                        position: reader.buffer_position() as u64,
                        source,
                    })?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(InventoryError::Unbalanced {
            message: format!("element <{}> is never closed", open.name),
        });
    }

    root.ok_or_else(|| InventoryError::Unbalanced {
        message: "document has no root element".to_string(),
    })
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), InventoryError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }

    if root.is_some() {
        return Err(InventoryError::Unbalanced {
            message: format!("second root element <{}>", element.name),
        });
    }

    *root = Some(element);
    Ok(())
}
