//! Streaming edit engine.
//!
//! Drives the cursor and scanner over the document in echo mode; on each
//! opening tag it consults the interest registry. On a match it captures
//! the element's whole subtree, materializes it, hands it to the registered
//! transform, and emits the re-serialized result in place of the captured
//! bytes. Everywhere else the captured open tag is committed verbatim and
//! the byte stream continues untouched.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use log::debug;

use crate::core::cursor::Cursor;
use crate::core::scanner::{self, OpenTag, Tag};
use crate::dom::Element;
use crate::error::{Error, Result};
use crate::process::Process;
use crate::transform::{Dict, Transform, TransformResult};

/// Single-pass streaming editor over a reader/writer pair.
///
/// Each instance owns its cursor, registry, and in-flight tree; a run is
/// fully synchronous and invokes transforms in document order.
pub struct StreamEditor<R: Read, W: Write> {
    cursor: Cursor<R, W>,
    transforms: HashMap<String, Transform>,
    skip: HashSet<String>,
    /// Scratch for CDATA folded outside any capture, reused between tags.
    scratch: Vec<u8>,
    /// Render buffer for replacements, reused between matches.
    render: String,
}

impl<R: Read, W: Write> StreamEditor<R, W> {
    /// New editor streaming from `reader` to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        StreamEditor {
            cursor: Cursor::new(reader, writer),
            transforms: HashMap::new(),
            skip: HashSet::new(),
            scratch: Vec::new(),
            render: String::new(),
        }
    }

    /// Register a full-tree transform for elements named `name`.
    ///
    /// Only one transform per name; a later registration replaces it.
    pub fn register_tree<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: FnMut(Element) -> TransformResult<Element> + 'static,
    {
        self.transforms
            .insert(name.into(), Transform::Tree(Box::new(transform)));
    }

    /// Register a dict transform: the element is projected to a flat
    /// mapping, and the returned mapping is applied back.
    pub fn register_dict<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: FnMut(Dict) -> TransformResult<Dict> + 'static,
    {
        self.transforms
            .insert(name.into(), Transform::Dict(Box::new(transform)));
    }

    /// Register a text transform speaking one JSON object of strings per
    /// matched element.
    pub fn register_text<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: FnMut(&str) -> TransformResult<String> + 'static,
    {
        self.transforms
            .insert(name.into(), Transform::Text(Box::new(transform)));
    }

    /// Bind a long-lived shell process as the text transform for `name`.
    ///
    /// The process is spawned immediately and answers one line per matched
    /// element for the rest of the run.
    pub fn register_shell(&mut self, name: impl Into<String>, command: &str) -> Result<()> {
        let name = name.into();
        let mut process = Process::new(command);
        process.start().map_err(|source| Error::Process {
            element: name.clone(),
            source,
        })?;
        self.register_text(name, move |line| {
            process.round_trip(line).map_err(Into::into)
        });
        Ok(())
    }

    /// Add an element name to scan past and drop inside matched subtrees.
    pub fn skip_element(&mut self, name: impl Into<String>) {
        self.skip.insert(name.into());
    }

    /// Add several skip-listed element names.
    pub fn skip_elements<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.skip.insert(name.into());
        }
    }

    /// Total bytes consumed from the input so far.
    pub fn bytes_read(&self) -> u64 {
        self.cursor.bytes_read()
    }

    /// Run the streaming pass to completion.
    ///
    /// On success all pending output is flushed. On error the stream is
    /// abandoned where it was; the partial output is not a usable document.
    pub fn run(&mut self) -> Result<()> {
        scanner::skip_preamble(&mut self.cursor)?;
        match self.content_loop() {
            Ok(()) => self.cursor.finish(),
            Err(err) => {
                let _ = self.cursor.finish();
                Err(err)
            }
        }
    }

    /// Echo-mode scan over top-level content.
    fn content_loop(&mut self) -> Result<()> {
        loop {
            let Some(b) = self.cursor.next_byte()? else {
                return Ok(());
            };
            if b != b'<' {
                continue;
            }
            // CDATA and comments outside any match echo straight through.
            self.scratch.clear();
            if scanner::cdata_probe(&mut self.cursor, &mut self.scratch)? {
                continue;
            }
            if scanner::comment_probe(&mut self.cursor)? {
                continue;
            }
            self.cursor.begin_capture()?;
            match scanner::scan_tag(&mut self.cursor)? {
                Tag::Close(_) => self.cursor.commit_capture()?,
                Tag::Open(tag) => self.handle_open(tag)?,
            }
        }
    }

    /// Decide what to do with a fully opened tag, capture still active.
    fn handle_open(&mut self, tag: OpenTag) -> Result<()> {
        // A self-closed tag is already closed by itself: nothing to edit.
        if tag.self_closing || !self.transforms.contains_key(&tag.name) {
            return self.cursor.commit_capture();
        }

        let name = tag.name.clone();
        let mut element = Element::new(tag.name);
        element.attributes = tag.attributes;
        self.build_subtree(&mut element)?;

        let Some(transform) = self.transforms.get_mut(&name) else {
            return self.cursor.commit_capture();
        };
        debug!("editing <{name}> via {} transform", transform.kind());
        let edited = transform
            .apply(element)
            .map_err(|source| Error::callback(&name, source))?;

        self.render.clear();
        edited.render_into(&mut self.render);
        // The matched root's leading text is outside the captured span, and
        // its '<' was already emitted in echo mode when the tag was probed;
        // the replacement supplies everything after that '<'.
        let skip = edited.leading_text.len() + 1;
        debug_assert_eq!(self.render.as_bytes().get(skip - 1), Some(&b'<'));
        self.cursor.replace_capture(&self.render.as_bytes()[skip..])
    }

    /// Materialize the subtree of an already-opened element.
    ///
    /// Accumulated raw text becomes the next child's leading text, or the
    /// node's own text once the matching close tag arrives. Comments are
    /// dropped; CDATA content folds into the surrounding text. Skip-listed
    /// children are consumed without entering the tree.
    fn build_subtree(&mut self, node: &mut Element) -> Result<()> {
        let mut text: Vec<u8> = Vec::new();
        loop {
            let b = self.cursor.read_byte()?;
            if b != b'<' {
                text.push(b);
                continue;
            }
            if scanner::cdata_probe(&mut self.cursor, &mut text)? {
                continue;
            }
            if scanner::comment_probe(&mut self.cursor)? {
                continue;
            }
            match scanner::scan_tag(&mut self.cursor)? {
                Tag::Close(close) => {
                    if close != node.name {
                        return Err(Error::malformed(
                            self.cursor.bytes_read(),
                            format!("unexpected closing tag </{close}> inside <{}>", node.name),
                        ));
                    }
                    node.text = scanner::utf8(self.cursor.bytes_read(), text)?;
                    return Ok(());
                }
                Tag::Open(tag) => {
                    if self.skip.contains(&tag.name) && !tag.self_closing {
                        scanner::scan_past_element(&mut self.cursor, &tag.name)?;
                        continue;
                    }
                    let mut child = Element::new(tag.name);
                    child.attributes = tag.attributes;
                    child.self_closing = tag.self_closing;
                    child.leading_text =
                        scanner::utf8(self.cursor.bytes_read(), std::mem::take(&mut text))?;
                    if !tag.self_closing {
                        self.build_subtree(&mut child)?;
                    }
                    node.children.push(child);
                }
            }
        }
    }
}
