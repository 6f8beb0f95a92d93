//! Dict projection: the flat name → value view of a one-level subtree.
//!
//! The projection is the contract dict and text transforms work against.
//! Keys: `@attr` for the element's own attributes, `child` for a child's
//! text, `child@attr` for a child's attributes. Key splitting is on the
//! first `@` only. Among same-named children, only the first instance is
//! exposed and mutable; later siblings pass through untouched.

use indexmap::IndexMap;

use crate::dom::{Element, Navigator};

/// Flat ordered mapping view of a one-level element subtree.
pub type Dict = IndexMap<String, String>;

/// Project an element one level deep into a flat mapping.
///
/// The element's own attributes come first, then each first-instance child
/// in document order: its text under the bare name, its attributes under
/// `name@attr`.
pub fn project(element: &Element) -> Dict {
    let mut dict = Dict::new();
    for attr in &element.attributes {
        dict.insert(format!("@{}", attr.name), attr.value.clone());
    }

    // Direct children, enumerated first-child/next-sibling over the
    // materialized tree.
    let mut nav = Navigator::new(element);
    if nav.move_to_child() {
        loop {
            let child = nav.current();
            if !dict.contains_key(child.name.as_str()) {
                dict.insert(child.name.clone(), child.text.clone());
                for attr in &child.attributes {
                    dict.insert(format!("{}@{}", child.name, attr.name), attr.value.clone());
                }
            }
            if !nav.move_to_next() {
                break;
            }
        }
    }
    dict
}

/// Apply a returned mapping back onto the element.
///
/// Attributes present under the relevant prefix are set (position and quote
/// style retained for existing names, new names appended in mapping order);
/// attributes absent under the prefix are removed. A child name with no key
/// at all removes that whole same-named group. Keys naming children that do
/// not exist are ignored.
pub fn apply(element: &mut Element, dict: &Dict) {
    apply_attributes(element, dict, "");

    let mut dropped: Vec<String> = Vec::new();
    for child in &element.children {
        if !is_referenced(dict, &child.name) && !dropped.iter().any(|n| n == &child.name) {
            dropped.push(child.name.clone());
        }
    }
    for name in &dropped {
        element.remove_children_named(name);
    }

    let mut names: Vec<String> = Vec::new();
    for child in &element.children {
        if !names.iter().any(|n| n == &child.name) {
            names.push(child.name.clone());
        }
    }
    for name in &names {
        if let Some(child) = element.first_child_named_mut(name) {
            if let Some(text) = dict.get(name) {
                child.text.clear();
                child.text.push_str(text);
            }
            apply_attributes(child, dict, name);
        }
    }
}

/// True when the mapping holds any key for this child name, either its
/// text form or an attribute form.
fn is_referenced(dict: &Dict, name: &str) -> bool {
    dict.keys().any(|key| {
        key == name
            || (key.starts_with(name) && key.as_bytes().get(name.len()) == Some(&b'@'))
    })
}

/// Rewrite the attribute set of `element` from the keys prefixed by
/// `owner@` (owner empty for the element itself).
fn apply_attributes(element: &mut Element, dict: &Dict, owner: &str) {
    element.attributes.retain_mut(|attr| {
        let key = format!("{}@{}", owner, attr.name);
        match dict.get(&key) {
            Some(value) => {
                attr.value.clear();
                attr.value.push_str(value);
                true
            }
            None => false,
        }
    });

    for (key, value) in dict {
        let Some((prefix, name)) = key.split_once('@') else {
            continue;
        };
        if prefix == owner && element.attribute(name).is_none() {
            element.set_attribute(name, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Attribute, QuoteStyle};

    fn sample() -> Element {
        // <root><a>1</a><b x="2">3</b></root>
        let mut root = Element::new("root");
        let mut a = Element::new("a");
        a.text = "1".to_string();
        let mut b = Element::new("b");
        b.text = "3".to_string();
        b.attributes.push(Attribute::new("x", "2"));
        root.children.push(a);
        root.children.push(b);
        root
    }

    #[test]
    fn test_project_flattens_one_level() {
        let root = sample();
        let dict = project(&root);
        let pairs: Vec<(&str, &str)> = dict
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "3"), ("b@x", "2")]);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let mut root = sample();
        let rendered = root.render();
        let dict = project(&root);
        apply(&mut root, &dict);
        assert_eq!(root.render(), rendered);
    }

    #[test]
    fn test_project_exposes_parent_attributes() {
        let mut root = sample();
        root.attributes.push(Attribute::new("type", "foo"));
        let dict = project(&root);
        assert_eq!(dict.get("@type").map(String::as_str), Some("foo"));
    }

    #[test]
    fn test_project_only_first_same_named_child() {
        let mut root = sample();
        let mut b2 = Element::new("b");
        b2.text = "9".to_string();
        root.children.push(b2);
        let dict = project(&root);
        assert_eq!(dict.get("b").map(String::as_str), Some("3"));
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_apply_sets_child_text() {
        let mut root = sample();
        let mut dict = project(&root);
        dict.insert("a".to_string(), "changed".to_string());
        apply(&mut root, &dict);
        assert_eq!(root.render(), r#"<root><a>changed</a><b x="2">3</b></root>"#);
    }

    #[test]
    fn test_apply_removes_dropped_attribute_and_keeps_quote_style() {
        let mut root = Element::new("root");
        root.attributes.push(Attribute {
            name: "location".to_string(),
            value: "Nantes".to_string(),
            quote: QuoteStyle::Single,
        });
        root.attributes.push(Attribute::new("name", "Agency"));
        let mut dict = project(&root);
        dict.shift_remove("@location");
        apply(&mut root, &dict);
        assert_eq!(root.render(), r#"<root name="Agency"></root>"#);
    }

    #[test]
    fn test_apply_removes_whole_child_group_when_unreferenced() {
        let mut root = sample();
        let mut b2 = Element::new("b");
        b2.text = "9".to_string();
        root.children.push(b2);
        let mut dict = project(&root);
        dict.shift_remove("b");
        dict.shift_remove("b@x");
        apply(&mut root, &dict);
        assert_eq!(root.render(), "<root><a>1</a></root>");
    }

    #[test]
    fn test_apply_keeps_group_referenced_only_by_attribute_key() {
        let mut root = sample();
        let mut dict = project(&root);
        dict.shift_remove("b");
        apply(&mut root, &dict);
        // b@x still references the group, so <b> stays, text untouched.
        assert_eq!(root.render(), r#"<root><a>1</a><b x="2">3</b></root>"#);
    }

    #[test]
    fn test_apply_injects_parent_and_child_attributes() {
        // <root><element1 age="22">Hello</element1><element2>World</element2></root>
        let mut root = Element::new("root");
        let mut e1 = Element::new("element1");
        e1.text = "Hello".to_string();
        e1.attributes.push(Attribute::new("age", "22"));
        let mut e2 = Element::new("element2");
        e2.text = "World".to_string();
        root.children.push(e1);
        root.children.push(e2);

        let mut dict = project(&root);
        dict.insert("@type".to_string(), "bar".to_string());
        dict.insert("element1@age".to_string(), "50".to_string());
        dict.insert("element2@age".to_string(), "25".to_string());
        apply(&mut root, &dict);

        assert_eq!(
            root.render(),
            r#"<root type="bar"><element1 age="50">Hello</element1><element2 age="25">World</element2></root>"#
        );
    }

    #[test]
    fn test_apply_ignores_unknown_child_names() {
        let mut root = sample();
        let mut dict = project(&root);
        dict.insert("ghost".to_string(), "boo".to_string());
        apply(&mut root, &dict);
        assert_eq!(root.render(), r#"<root><a>1</a><b x="2">3</b></root>"#);
    }

    #[test]
    fn test_apply_touches_only_first_same_named_child() {
        let mut root = sample();
        let mut b2 = Element::new("b");
        b2.text = "9".to_string();
        root.children.push(b2);
        let mut dict = project(&root);
        dict.insert("b".to_string(), "edited".to_string());
        apply(&mut root, &dict);
        assert_eq!(
            root.render(),
            r#"<root><a>1</a><b x="2">edited</b><b>9</b></root>"#
        );
    }

    #[test]
    fn test_key_split_on_first_at_only() {
        let mut root = sample();
        let mut dict = project(&root);
        dict.insert("b@x".to_string(), "v@lue".to_string());
        apply(&mut root, &dict);
        assert_eq!(root.first_child_named("b").unwrap().attribute("x"), Some("v@lue"));
    }
}
