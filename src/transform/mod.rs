//! Transform callbacks and the dict projection adapter.

pub mod callback;
pub mod projection;

pub use callback::{DictFn, TextFn, Transform, TransformResult, TreeFn};
pub use projection::Dict;
