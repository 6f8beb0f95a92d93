//! Transform callback variants.
//!
//! One case per callback kind; the dict and text cases are adapters that
//! route through the projection so every kind ends up honoring the tree
//! contract: element in, element out.

use log::debug;

use crate::dom::Element;
use crate::error::BoxError;
use crate::transform::projection::{self, Dict};

/// Result type for user transform callbacks.
pub type TransformResult<T> = std::result::Result<T, BoxError>;

/// Full-tree transform: receives the materialized element and returns the
/// element to serialize in its place.
pub type TreeFn = Box<dyn FnMut(Element) -> TransformResult<Element>>;

/// Dict transform: runs against the flat projection of the element.
pub type DictFn = Box<dyn FnMut(Dict) -> TransformResult<Dict>>;

/// Text transform: the projection is marshaled as one JSON object of
/// strings; the returned text must parse back as the same shape.
pub type TextFn = Box<dyn FnMut(&str) -> TransformResult<String>>;

/// A registered transformation.
pub enum Transform {
    Tree(TreeFn),
    Dict(DictFn),
    Text(TextFn),
}

impl Transform {
    /// Kind label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Transform::Tree(_) => "tree",
            Transform::Dict(_) => "dict",
            Transform::Text(_) => "text",
        }
    }

    /// Apply to a materialized element, routing dict and text kinds through
    /// the projection adapter.
    pub fn apply(&mut self, mut element: Element) -> TransformResult<Element> {
        match self {
            Transform::Tree(f) => f(element),
            Transform::Dict(f) => {
                let dict = f(projection::project(&element))?;
                projection::apply(&mut element, &dict);
                Ok(element)
            }
            Transform::Text(f) => {
                let line = serde_json::to_string(&projection::project(&element))?;
                debug!("text transform request: {line}");
                let reply = f(&line)?;
                debug!("text transform reply: {reply}");
                let dict: Dict = serde_json::from_str(&reply)?;
                projection::apply(&mut element, &dict);
                Ok(element)
            }
        }
    }
}
