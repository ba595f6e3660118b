//! Small owned element tree over quick-xml events.
//!
//! Mirrors the text/tail model of ElementTree: `text` is the character data
//! before an element's first child, `tail` the data after its end tag up to
//! the next sibling.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, ReviewError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn parse(xml: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element_from(&e)?),
                Event::Empty(e) => {
                    let element = element_from(&e)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ReviewError::MalformedXml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    push_text(&mut stack, &text);
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    push_text(&mut stack, &text);
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ReviewError::MalformedXml(format!("unclosed element <{}>", open.name)));
        }
        root.ok_or_else(|| ReviewError::MalformedXml("document has no root element".to_string()))
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// This element followed by all descendants in document order.
    pub fn iter(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut pending = vec![self];
        while let Some(element) = pending.pop() {
            out.push(element);
            pending.extend(element.children.iter().rev());
        }
        out
    }

    /// All elements named `name`, this one included, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        self.iter().into_iter().filter(|e| e.name == name).collect()
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ReviewError::MalformedXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    let slot = match parent.children.last_mut() {
        Some(previous) => &mut previous.tail,
        None => &mut parent.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_tail() {
        let root = XmlElement::parse("<p>Before <b>bold</b> after &amp; more<br/>end</p>").unwrap();
        assert_eq!(root.name, "p");
        assert_eq!(root.text.as_deref(), Some("Before "));
        assert_eq!(root.children[0].text.as_deref(), Some("bold"));
        assert_eq!(root.children[0].tail.as_deref(), Some(" after & more"));
        assert_eq!(root.children[1].name, "br");
        assert_eq!(root.children[1].tail.as_deref(), Some("end"));
    }

    #[test]
    fn test_attributes_and_traversal() {
        let xml = r#"<?xml version="1.0"?>
            <!DOCTYPE pmc-articleset>
            <pmc-articleset><article article-type="research-article">
              <body><sec sec-type="methods"><title>Methods</title><sec><title>EEG</title></sec></sec></body>
            </article></pmc-articleset>"#;
        let root = XmlElement::parse(xml).unwrap();

        let article = root.child("article").unwrap();
        assert_eq!(article.attr("article-type"), Some("research-article"));
        assert_eq!(root.find_all("sec").len(), 2);
        let titles: Vec<&str> = root
            .find_all("title")
            .iter()
            .filter_map(|t| t.text.as_deref())
            .collect();
        assert_eq!(titles, vec!["Methods", "EEG"]);
    }

    #[test]
    fn test_malformed_documents_error() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("just text").is_err());
    }
}
