//! Minimal owned XML element tree built on top of the xml-rs pull parser.

use xml::reader::{EventReader, ParserConfig, XmlEvent};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlNode {
    /// Local name of the element.
    pub name: String,
    pub namespace: Option<String>,
    /// Attributes as (qualified name, value). Namespace declarations are not kept.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Concatenated character data directly under this element.
    pub text: String,
}

impl XmlNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Parse a complete document and return its root element.
pub fn parse(xml: &str) -> Result<XmlNode, String> {
    let config = ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(true)
        .cdata_to_characters(true)
        .ignore_comments(true);
    let reader = EventReader::new_with_config(xml.as_bytes(), config);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    for event in reader {
        match event.map_err(|e| e.to_string())? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let attributes = attributes
                    .into_iter()
                    .map(|attr| {
                        let key = match attr.name.prefix {
                            Some(prefix) => format!("{}:{}", prefix, attr.name.local_name),
                            None => attr.name.local_name,
                        };
                        (key, attr.value)
                    })
                    .collect();
                stack.push(XmlNode {
                    name: name.local_name,
                    namespace: name.namespace,
                    attributes,
                    children: Vec::new(),
                    text: String::new(),
                });
            }
            XmlEvent::EndElement { .. } => {
                let node = stack
                    .pop()
                    .ok_or_else(|| "unbalanced end element".to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            XmlEvent::Characters(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| "document has no root element".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree_with_attributes_and_text() {
        let root = parse(
            r#"<?xml version="1.0"?>
<person xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="7" xsi:type="x">
  <name>Ada</name>
  <!-- ignored -->
  <email><![CDATA[ada@example.org]]></email>
</person>"#,
        )
        .unwrap();

        assert_eq!(root.name, "person");
        assert_eq!(root.attr("id"), Some("7"));
        assert_eq!(root.attr("xsi:type"), Some("x"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "Ada");
        assert_eq!(root.children[1].text, "ada@example.org");
        assert!(!root.has_text());
    }

    #[test]
    fn keeps_element_namespace() {
        let root = parse(r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#).unwrap();
        assert_eq!(root.name, "schema");
        assert_eq!(
            root.namespace.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema")
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("").is_err());
        assert!(parse("just text").is_err());
    }
}
