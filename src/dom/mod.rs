//! Element tree model, serializer, and navigation adapter.
//!
//! Trees exist only for matched regions: the engine materializes a subtree,
//! a transform mutates it, the serializer renders it back, and the tree is
//! dropped. The navigator offers index-based read-only traversal for
//! external query evaluators.

pub mod element;
pub mod navigator;

pub use element::{Attribute, Element, QuoteStyle};
pub use navigator::{Navigator, NodeType, Position};
