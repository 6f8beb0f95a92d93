//! xmlpipe - streaming in-place XML editing
//!
//! Copies input to output byte-for-byte except inside elements selected for
//! editing: a matched element's whole subtree is materialized, handed to a
//! transform, and re-serialized in place. Unmatched regions stream through
//! in constant memory.
//!
//! Layers:
//! - core: byte cursor (echo/capture modes) and lexical scanner
//! - dom: element tree, serializer, and read-only navigator
//! - transform: tree/dict/text callback variants and the dict projection
//! - engine: the single-pass stream editor
//! - process: line-protocol transport for shell-backed transforms
//!
//! ```
//! use xmlpipe::StreamEditor;
//!
//! let mut out = Vec::new();
//! let mut editor = StreamEditor::new("<a><b>1</b></a>".as_bytes(), &mut out);
//! editor.register_tree("b", |mut el| {
//!     el.text = "2".to_string();
//!     Ok(el)
//! });
//! editor.run().unwrap();
//! drop(editor);
//! assert_eq!(out, b"<a><b>2</b></a>");
//! ```

pub mod core;
pub mod dom;
mod engine;
pub mod error;
pub mod process;
pub mod transform;

pub use dom::{Attribute, Element, Navigator, NodeType, QuoteStyle};
pub use engine::StreamEditor;
pub use error::{BoxError, Error, Result};
pub use process::{Process, ProcessError};
pub use transform::{Dict, Transform, TransformResult};
