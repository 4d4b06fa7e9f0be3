//! Minimal namespace-aware XML tree built on quick-xml

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at byte {position})")]
pub struct XmlError {
    pub message: String,
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Name as written, including any prefix
    pub qualified_name: String,
    pub local_name: String,
    pub namespace: Option<String>,
    pub value: String,
}

impl XmlAttribute {
    pub fn is_namespace_declaration(&self) -> bool {
        self.qualified_name == "xmlns" || self.qualified_name.starts_with("xmlns:")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element
    pub text: String,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.name == name
    }

    /// Direct children with the given expanded name
    pub fn children_named<'a>(&'a self, namespace: &'a str, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// Unprefixed attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Element name with its namespace in Clark notation, for diagnostics
    pub fn expanded_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// All descendants in document order
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        for child in &self.children {
            found.push(child);
            found.extend(child.descendants());
        }
        found
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = NsReader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let position = reader.buffer_position();
            let (resolved, event) = reader.read_resolved_event().map_err(|e| error(e, position))?;
            let namespace = namespace_of(resolved);

            match event {
                Event::Start(start) => {
                    let element = open_element(&reader, &start, namespace, position)?;
                    ensure_single_root(&root, &stack, position)?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = open_element(&reader, &start, namespace, position)?;
                    ensure_single_root(&root, &stack, position)?;
                    close_element(element, &mut stack, &mut root);
                }
                Event::End(_) => match stack.pop() {
                    Some(element) => close_element(element, &mut stack, &mut root),
                    None => return Err(error("unexpected closing tag", position)),
                },
                Event::Text(text) => {
                    let value = text.unescape().map_err(|e| error(e, position))?;
                    append_text(&mut stack, &value, position)?;
                }
                Event::CData(data) => {
                    let value = reader.decoder().decode(&data).map_err(|e| error(e, position))?;
                    append_text(&mut stack, &value, position)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(error(
                format!("element {} is not closed", open.name),
                reader.buffer_position(),
            ));
        }
        root.map(|root| XmlDocument { root })
            .ok_or_else(|| error("document has no root element", 0))
    }
}

fn error(message: impl ToString, position: u64) -> XmlError {
    XmlError {
        message: message.to_string(),
        position,
    }
}

/// Namespace URI of a resolved name, or the prefix that has no binding in scope
fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(String::from_utf8_lossy(&prefix).into_owned()),
    }
}

fn ensure_single_root(root: &Option<XmlElement>, stack: &[XmlElement], position: u64) -> Result<(), XmlError> {
    if root.is_some() && stack.is_empty() {
        return Err(error("extra content after the root element", position));
    }
    Ok(())
}

fn append_text(stack: &mut [XmlElement], value: &str, position: u64) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(value);
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(error("character data outside of the root element", position)),
    }
}

fn close_element(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    namespace: Result<Option<String>, String>,
    position: u64,
) -> Result<XmlElement, XmlError> {
    let qualified = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let namespace = namespace
        .map_err(|prefix| error(format!("namespace prefix {} of {} is not bound", prefix, qualified), position))?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| error(e, position))?;
        let qualified_name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let attr_namespace = namespace_of(resolved).map_err(|prefix| {
            error(
                format!("namespace prefix {} of attribute {} is not bound", prefix, qualified_name),
                position,
            )
        })?;
        attributes.push(XmlAttribute {
            local_name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            qualified_name,
            namespace: attr_namespace,
            value: attr.unescape_value().map_err(|e| error(e, position))?.into_owned(),
        });
    }

    Ok(XmlElement {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SM: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
    const XHTML: &str = "http://www.w3.org/1999/xhtml";

    #[test]
    fn test_parse_resolves_namespaces() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <url>
    <loc>https://x.com/a?x=1&amp;y=2</loc>
    <xhtml:link rel="alternate" hreflang="fr" href="https://x.com/fr/a"/>
  </url>
</urlset>"#,
        )
        .unwrap();

        assert!(doc.root.is(SM, "urlset"));
        let url = doc.root.children_named(SM, "url").next().unwrap();
        let loc = url.children_named(SM, "loc").next().unwrap();
        assert_eq!(loc.text, "https://x.com/a?x=1&y=2");

        let link = url.children_named(XHTML, "link").next().unwrap();
        assert_eq!(link.attribute("hreflang"), Some("fr"));
        assert!(link.attributes.iter().all(|a| a.namespace.is_none()));
        assert!(doc.root.attributes.iter().all(XmlAttribute::is_namespace_declaration));
    }

    #[test]
    fn test_prefixed_attribute_and_rebound_default() {
        let doc = XmlDocument::parse(
            r#"<a xmlns="urn:a" xmlns:x="urn:x"><b x:id="1" id="2"/><c xmlns=""/></a>"#,
        )
        .unwrap();
        let b = &doc.root.children[0];
        assert_eq!(b.namespace.as_deref(), Some("urn:a"));
        assert_eq!(b.attributes[0].namespace.as_deref(), Some("urn:x"));
        assert_eq!(b.attributes[0].local_name, "id");
        assert_eq!(b.attribute("id"), Some("2"));
        assert_eq!(doc.root.children[1].namespace, None);
    }

    #[test]
    fn test_unbound_prefixes_are_errors() {
        let err = XmlDocument::parse("<p:a/>").unwrap_err();
        assert!(err.message.contains("namespace prefix p of p:a is not bound"));

        let err = XmlDocument::parse(r#"<a q:id="1"/>"#).unwrap_err();
        assert!(err.message.contains("attribute q:id"));

        // bindings go out of scope with their element
        assert!(XmlDocument::parse(r#"<a><b xmlns:p="urn:p"/><p:c/></a>"#).is_err());
    }

    #[test]
    fn test_cdata_is_text() {
        let doc = XmlDocument::parse("<a><![CDATA[x < y]]></a>").unwrap();
        assert_eq!(doc.root.text, "x < y");
        assert_eq!(doc.root.namespace, None);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("<a>").is_err());
        assert!(XmlDocument::parse("<a/><b/>").is_err());
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("not xml").is_err());
        assert!(XmlDocument::parse("<p:a/>").is_err());
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = XmlDocument::parse("<a><b><c/></b><d/></a>").unwrap();
        let descendants = doc.root.descendants();
        let names: Vec<&str> = descendants.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }
}
