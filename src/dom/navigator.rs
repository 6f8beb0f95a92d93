//! Read-only traversal adapter over a materialized subtree.
//!
//! Exposes the minimal primitives an external XPath-style evaluator needs:
//! current node/attribute position, movement to root, parent, children and
//! siblings, node type and value. The subtree is flattened into an arena of
//! entries addressed by indices; parent and sibling links are optional
//! indices, never references back into the tree, and nothing here mutates.

use crate::dom::element::Element;

/// Kind of the navigator's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
}

/// A bookmark into a navigator, valid for the navigator it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    node: usize,
    attr: Option<usize>,
}

struct Entry<'a> {
    element: &'a Element,
    parent: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
    first_child: Option<usize>,
}

/// Index-based cursor over an element subtree.
pub struct Navigator<'a> {
    entries: Vec<Entry<'a>>,
    node: usize,
    attr: Option<usize>,
}

impl<'a> Navigator<'a> {
    /// Build a navigator rooted at `root`; the whole subtree is indexed.
    pub fn new(root: &'a Element) -> Self {
        let mut entries = Vec::new();
        index(root, None, &mut entries);
        Navigator {
            entries,
            node: 0,
            attr: None,
        }
    }

    /// The element at the current position.
    pub fn current(&self) -> &'a Element {
        self.entries[self.node].element
    }

    /// Kind of the current position.
    pub fn node_type(&self) -> NodeType {
        if self.attr.is_some() {
            NodeType::Attribute
        } else if self.node == 0 {
            NodeType::Root
        } else {
            NodeType::Element
        }
    }

    /// Full name of the current attribute or element.
    pub fn name(&self) -> &'a str {
        let element = self.current();
        match self.attr {
            Some(i) => &element.attributes[i].name,
            None => &element.name,
        }
    }

    /// Local name of the current attribute or element.
    pub fn local_name(&self) -> &'a str {
        match self.attr {
            Some(i) => &self.current().attributes[i].name,
            None => self.current().local_name(),
        }
    }

    /// Namespace prefix of the current element, if any.
    pub fn prefix(&self) -> Option<&'a str> {
        self.current().prefix()
    }

    /// Value of the current position: attribute value, or element text.
    pub fn value(&self) -> &'a str {
        let element = self.current();
        match self.attr {
            Some(i) => &element.attributes[i].value,
            None => &element.text,
        }
    }

    /// Bookmark the current position.
    pub fn position(&self) -> Position {
        Position {
            node: self.node,
            attr: self.attr,
        }
    }

    /// Jump to a previously bookmarked position.
    pub fn move_to(&mut self, position: Position) -> bool {
        if position.node >= self.entries.len() {
            return false;
        }
        self.node = position.node;
        self.attr = position.attr;
        true
    }

    /// Move to the subtree root.
    pub fn move_to_root(&mut self) {
        self.node = 0;
        self.attr = None;
    }

    /// Move to the parent: off an attribute first, then up the tree.
    pub fn move_to_parent(&mut self) -> bool {
        if self.attr.take().is_some() {
            return true;
        }
        match self.entries[self.node].parent {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }

    /// Move to the first child of the current element.
    pub fn move_to_child(&mut self) -> bool {
        match self.entries[self.node].first_child {
            Some(child) => {
                self.node = child;
                self.attr = None;
                true
            }
            None => false,
        }
    }

    /// Move to the first sibling of the current element.
    pub fn move_to_first(&mut self) -> bool {
        let Some(parent) = self.entries[self.node].parent else {
            return false;
        };
        match self.entries[parent].first_child {
            Some(first) => {
                self.node = first;
                self.attr = None;
                true
            }
            None => false,
        }
    }

    /// Move to the next sibling.
    pub fn move_to_next(&mut self) -> bool {
        match self.entries[self.node].next {
            Some(next) => {
                self.node = next;
                self.attr = None;
                true
            }
            None => false,
        }
    }

    /// Move to the previous sibling.
    pub fn move_to_previous(&mut self) -> bool {
        match self.entries[self.node].prev {
            Some(prev) => {
                self.node = prev;
                self.attr = None;
                true
            }
            None => false,
        }
    }

    /// Advance to the next attribute of the current element.
    pub fn move_to_next_attribute(&mut self) -> bool {
        let count = self.current().attributes.len();
        let next = match self.attr {
            Some(i) => i + 1,
            None => 0,
        };
        if next >= count {
            return false;
        }
        self.attr = Some(next);
        true
    }
}

/// Flatten a subtree depth-first, wiring parent and sibling indices.
fn index<'a>(element: &'a Element, parent: Option<usize>, entries: &mut Vec<Entry<'a>>) -> usize {
    let id = entries.len();
    entries.push(Entry {
        element,
        parent,
        prev: None,
        next: None,
        first_child: None,
    });
    let mut prev: Option<usize> = None;
    for child in &element.children {
        let child_id = index(child, Some(id), entries);
        match prev {
            Some(prev_id) => {
                entries[prev_id].next = Some(child_id);
                entries[child_id].prev = Some(prev_id);
            }
            None => entries[id].first_child = Some(child_id),
        }
        prev = Some(child_id);
    }
    id
}
