//! Core streaming primitives.
//!
//! The fundamental building blocks of the single-pass engine:
//! - Cursor: one-byte-lookahead reader/writer with echo and capture modes
//! - Scanner: tag, attribute, comment, CDATA and preamble recognition

pub mod cursor;
pub mod scanner;

pub use cursor::Cursor;
