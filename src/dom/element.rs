//! Element tree model and serializer.
//!
//! An `Element` is only ever materialized for a matched region: attribute
//! order, per-attribute quote style, and the raw text between siblings are
//! all retained so an untouched tree re-serializes byte-identically.

use std::fmt;

use memchr::memchr;

/// Quote character recorded for an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    /// `name="value"`
    #[default]
    Double,
    /// `name='value'`
    Single,
}

impl QuoteStyle {
    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            QuoteStyle::Double => b'"',
            QuoteStyle::Single => b'\'',
        }
    }

    #[inline]
    pub fn as_char(self) -> char {
        self.as_byte() as char
    }
}

/// A named attribute with its source quote style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub quote: QuoteStyle,
}

impl Attribute {
    /// New attribute with the default double-quote style.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
            quote: QuoteStyle::Double,
        }
    }
}

/// A materialized element subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Full tag name, possibly `prefix:local`.
    pub name: String,
    /// Attributes in source order, at most one entry per name.
    pub attributes: Vec<Attribute>,
    /// Child elements in document order, across all names.
    pub children: Vec<Element>,
    /// The element's own text: all content for a childless element, the
    /// text following the last child otherwise.
    pub text: String,
    /// Raw text immediately before this element's opening tag, relative to
    /// its previous sibling or the parent's start.
    pub leading_text: String,
    /// True when the element was exactly self-closed in source; it renders
    /// as `<name/>` only while it still has no text and no children.
    pub self_closing: bool,
}

impl Element {
    /// New empty element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// Name part after the namespace prefix, if any.
    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    /// Namespace prefix (before the colon), if any.
    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.name).0
    }

    /// Value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute value.
    ///
    /// An existing name keeps its position and quote style; a new name is
    /// appended after all pre-existing attributes, double-quoted.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.into(),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Remove the named attribute. Returns whether it existed.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.name != name);
        self.attributes.len() != before
    }

    /// First child element, in document order.
    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    /// First child with the given name.
    pub fn first_child_named(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable access to the first child with the given name.
    pub fn first_child_named_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Remove every child with the given name.
    pub fn remove_children_named(&mut self, name: &str) {
        self.children.retain(|c| c.name != name);
    }

    /// Serialize the subtree to markup text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    /// Serialize the subtree, appending to `out`.
    ///
    /// Each child contributes its own leading text before its tag; the
    /// node's own text comes after the last child.
    pub fn render_into(&self, out: &mut String) {
        out.push_str(&self.leading_text);
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push('=');
            out.push(attr.quote.as_char());
            out.push_str(&attr.value);
            out.push(attr.quote.as_char());
        }
        if self.self_closing && self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.render_into(out);
        }
        out.push_str(&self.text);
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Split a name into prefix and local name at the first colon.
fn split_name(name: &str) -> (Option<&str>, &str) {
    match memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_leaf_with_attributes() {
        let mut root = Element::new("root");
        root.text = "Hello".to_string();
        root.set_attribute("foo", "bar");
        assert_eq!(root.render(), r#"<root foo="bar">Hello</root>"#);
    }

    #[test]
    fn test_set_attribute_updates_in_place() {
        let mut root = Element::new("root");
        root.text = "Hello".to_string();
        root.set_attribute("foo", "bar");
        root.set_attribute("foo", "bas");
        assert_eq!(root.render(), r#"<root foo="bas">Hello</root>"#);
    }

    #[test]
    fn test_set_attribute_appends_new_names() {
        let mut root = Element::new("root");
        root.attributes.push(Attribute {
            name: "a".to_string(),
            value: "1".to_string(),
            quote: QuoteStyle::Single,
        });
        root.set_attribute("b", "2");
        root.set_attribute("a", "9");
        assert_eq!(root.render(), "<root a='9' b=\"2\"></root>");
    }

    #[test]
    fn test_render_children_in_document_order_with_leading_text() {
        let mut root = Element::new("root");
        root.text = "\n".to_string();
        for (i, name) in ["element1", "element2", "element2"].iter().enumerate() {
            let mut child = Element::new(*name);
            child.leading_text = "\n  ".to_string();
            child.text = format!("Contenu{}", i + 1);
            root.children.push(child);
        }
        assert_eq!(
            root.render(),
            "<root>\n  <element1>Contenu1</element1>\n  <element2>Contenu2</element2>\n  <element2>Contenu3</element2>\n</root>"
        );
    }

    #[test]
    fn test_render_self_closing() {
        let mut el = Element::new("e");
        el.self_closing = true;
        el.set_attribute("nil", "true");
        assert_eq!(el.render(), r#"<e nil="true"/>"#);
    }

    #[test]
    fn test_self_closing_expands_once_content_is_added() {
        let mut el = Element::new("e");
        el.self_closing = true;
        el.text = "x".to_string();
        assert_eq!(el.render(), "<e>x</e>");
    }

    #[test]
    fn test_render_mixed_content_keeps_trailing_text() {
        let mut root = Element::new("element1");
        let mut name = Element::new("name");
        name.leading_text = "Hello ".to_string();
        name.text = "world".to_string();
        root.children.push(name);
        root.text = " !".to_string();
        assert_eq!(root.render(), "<element1>Hello <name>world</name> !</element1>");
    }

    #[test]
    fn test_attribute_lookup_and_removal() {
        let mut el = Element::new("e");
        el.set_attribute("a", "1");
        el.set_attribute("b", "2");
        assert_eq!(el.attribute("a"), Some("1"));
        assert!(el.remove_attribute("a"));
        assert!(!el.remove_attribute("a"));
        assert_eq!(el.attribute("a"), None);
        assert_eq!(el.render(), r#"<e b="2"></e>"#);
    }

    #[test]
    fn test_child_accessors() {
        let mut root = Element::new("root");
        root.children.push(Element::new("a"));
        root.children.push(Element::new("b"));
        root.children.push(Element::new("a"));
        assert_eq!(root.first_child().map(|c| c.name.as_str()), Some("a"));
        assert_eq!(root.first_child_named("b").map(|c| c.name.as_str()), Some("b"));
        root.remove_children_named("a");
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_prefix_and_local_name() {
        let el = Element::new("svg:rect");
        assert_eq!(el.prefix(), Some("svg"));
        assert_eq!(el.local_name(), "rect");

        let plain = Element::new("rect");
        assert_eq!(plain.prefix(), None);
        assert_eq!(plain.local_name(), "rect");
    }
}
