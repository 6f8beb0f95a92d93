//! Lexical scanning over the byte cursor.
//!
//! Recognizes tag boundaries, attribute syntax (quote character remembered
//! per attribute), self-closing tags, comments, CDATA sections, and the
//! document preamble. All functions consume through the cursor, so the
//! bytes they read follow whatever output mode (echo or capture) the
//! caller has put the cursor in.

use std::io::{Read, Write};

use crate::core::cursor::Cursor;
use crate::dom::{Attribute, QuoteStyle};
use crate::error::{Error, Result};

/// A fully scanned opening tag.
#[derive(Debug, Clone)]
pub struct OpenTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

/// Outcome of scanning the markup right after a consumed `<`.
#[derive(Debug, Clone)]
pub enum Tag {
    Open(OpenTag),
    Close(String),
}

/// Whitespace per the markup grammar: space, tab, CR, LF.
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub(crate) fn utf8(offset: u64, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| Error::malformed(offset, "invalid utf-8"))
}

/// Consume leading declarations and comments before the root element.
///
/// Declarations (`<?...?>`, `<!DOCTYPE ...>`) are tracked with a nested
/// `<...>` depth counter; comments end at `-->`. Returns with the cursor
/// positioned on the root element's `<`, or at end of input.
pub fn skip_preamble<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<()> {
    loop {
        let Some(first) = cursor.peek_at(0)? else {
            return Ok(());
        };
        if first != b'<' {
            cursor.read_byte()?;
            continue;
        }
        match cursor.peek_at(1)? {
            Some(b'!') | Some(b'?') => {
                cursor.read_byte()?;
                cursor.read_byte()?;
                if cursor.peek_at(0)? == Some(b'-') && cursor.peek_at(1)? == Some(b'-') {
                    cursor.read_byte()?;
                    cursor.read_byte()?;
                    skip_comment_body(cursor)?;
                } else {
                    skip_declaration_body(cursor)?;
                }
            }
            _ => return Ok(()),
        }
    }
}

/// Consume a declaration body after `<!` or `<?`, honoring nested `<...>`.
fn skip_declaration_body<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<()> {
    let mut depth = 1u32;
    loop {
        match cursor.read_byte()? {
            b'>' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            b'<' => depth += 1,
            _ => {}
        }
    }
}

/// Consume a comment body after `<!--`, up to and including `-->`.
pub fn skip_comment_body<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<()> {
    let mut dashes = 0u32;
    loop {
        match cursor.read_byte()? {
            b'-' => dashes += 1,
            b'>' if dashes >= 2 => return Ok(()),
            _ => dashes = 0,
        }
    }
}

/// Detect a comment after a consumed `<` and consume it entirely.
///
/// Reads one byte to decide; a non-`!` byte is pushed back. A `<!` that is
/// not a comment is malformed here (CDATA must be probed first, and
/// declarations are only legal in the preamble).
pub fn comment_probe<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<bool> {
    let b = cursor.read_byte()?;
    if b != b'!' {
        cursor.unread_byte();
        return Ok(false);
    }
    let c = cursor.read_byte()?;
    let d = cursor.read_byte()?;
    if c != b'-' || d != b'-' {
        return Err(Error::malformed(cursor.bytes_read(), "expected comment"));
    }
    skip_comment_body(cursor)?;
    Ok(true)
}

/// Detect a CDATA section after a consumed `<` and fold its content.
///
/// On a `![CDATA[` marker, consumes through `]]>` and appends the raw
/// content (markers excluded) to `text`. Otherwise consumes nothing.
pub fn cdata_probe<R: Read, W: Write>(
    cursor: &mut Cursor<R, W>,
    text: &mut Vec<u8>,
) -> Result<bool> {
    if cursor.peek_at(0)? != Some(b'!') || cursor.peek_at(1)? != Some(b'[') {
        return Ok(false);
    }
    cursor.read_byte()?;
    cursor.read_byte()?;
    for expected in *b"CDATA[" {
        if cursor.read_byte()? != expected {
            return Err(Error::malformed(cursor.bytes_read(), "malformed CDATA section"));
        }
    }
    let start = text.len();
    loop {
        match cursor.read_byte()? {
            b'>' if text.len() >= start + 2 && &text[text.len() - 2..] == b"]]" => {
                text.truncate(text.len() - 2);
                return Ok(true);
            }
            b => text.push(b),
        }
    }
}

/// Scan the tag following a consumed `<`: either a closing tag (`</name>`)
/// or an opening tag with attributes.
pub fn scan_tag<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<Tag> {
    let b = cursor.read_byte()?;
    if b == b'/' {
        return Ok(Tag::Close(close_tag_name(cursor)?));
    }
    cursor.unread_byte();
    scan_open_tag(cursor).map(Tag::Open)
}

/// Scan a closing tag's name after `</`, up to `>`; whitespace is ignored.
pub fn close_tag_name<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<String> {
    let mut name = Vec::new();
    loop {
        match cursor.read_byte()? {
            b'>' => return utf8(cursor.bytes_read(), name),
            b if is_whitespace(b) => {}
            b => name.push(b),
        }
    }
}

/// Scan an opening tag after `<`: name, then attributes until `>` or `/>`.
///
/// Tags come in three forms: `<abc>`, `<abc type="foo" val='bar'>`, and
/// `<abc/>`. The quote character of each attribute value is remembered.
pub fn scan_open_tag<R: Read, W: Write>(cursor: &mut Cursor<R, W>) -> Result<OpenTag> {
    let mut scratch: Vec<u8> = Vec::new();
    let mut prev = 0u8;

    // Name phase: accumulate until whitespace, '>' or '/>'.
    loop {
        let b = cursor.read_byte()?;
        if is_whitespace(b) {
            break;
        }
        if b == b'>' {
            let self_closing = prev == b'/';
            if self_closing {
                scratch.pop();
            }
            return Ok(OpenTag {
                name: utf8(cursor.bytes_read(), scratch)?,
                attributes: Vec::new(),
                self_closing,
            });
        }
        scratch.push(b);
        prev = b;
    }

    let name = utf8(cursor.bytes_read(), scratch)?;
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut scratch: Vec<u8> = Vec::new();

    // Attribute phase: name up to '=', quoted value, repeated until the tag
    // ends. Whitespace separates freely and never reaches the scratch.
    loop {
        let b = cursor.read_byte()?;
        if is_whitespace(b) {
            continue;
        }
        match b {
            b'=' => {
                let quote = match cursor.read_byte()? {
                    b'"' => QuoteStyle::Double,
                    b'\'' => QuoteStyle::Single,
                    _ => {
                        return Err(Error::malformed(
                            cursor.bytes_read(),
                            "attribute value must be quoted",
                        ))
                    }
                };
                let value = read_quoted_value(cursor, quote.as_byte())?;
                let attr_name = utf8(cursor.bytes_read(), std::mem::take(&mut scratch))?;
                // Names are unique: a duplicate updates the value in place
                // and keeps the first occurrence's position and quote.
                match attributes.iter_mut().find(|a| a.name == attr_name) {
                    Some(attr) => attr.value = value,
                    None => attributes.push(Attribute {
                        name: attr_name,
                        value,
                        quote,
                    }),
                }
            }
            b'>' => {
                return Ok(OpenTag {
                    name,
                    attributes,
                    self_closing: prev == b'/',
                });
            }
            _ => {
                scratch.push(b);
                prev = b;
            }
        }
    }
}

/// Read an attribute value up to the matching quote character.
fn read_quoted_value<R: Read, W: Write>(cursor: &mut Cursor<R, W>, quote: u8) -> Result<String> {
    let mut value = Vec::new();
    loop {
        let b = cursor.read_byte()?;
        if b == quote {
            return utf8(cursor.bytes_read(), value);
        }
        value.push(b);
    }
}

/// Scan past an element and everything inside it, down to its matching
/// close tag. Nothing is retained; nested same-named elements are counted
/// so the match is the structural one.
pub fn scan_past_element<R: Read, W: Write>(
    cursor: &mut Cursor<R, W>,
    name: &str,
) -> Result<()> {
    let mut depth = 1u32;
    let mut sink = Vec::new();
    loop {
        if cursor.read_byte()? != b'<' {
            continue;
        }
        sink.clear();
        if cdata_probe(cursor, &mut sink)? {
            continue;
        }
        if comment_probe(cursor)? {
            continue;
        }
        match scan_tag(cursor)? {
            Tag::Open(tag) if tag.name == name && !tag.self_closing => depth += 1,
            Tag::Close(tag) if tag == name => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor<'a>(input: &'a [u8], out: &'a mut Vec<u8>) -> Cursor<&'a [u8], &'a mut Vec<u8>> {
        Cursor::new(input, out)
    }

    #[test]
    fn test_scan_open_tag_plain() {
        let mut out = Vec::new();
        let mut cur = cursor(b"root>", &mut out);
        let tag = scan_open_tag(&mut cur).unwrap();
        assert_eq!(tag.name, "root");
        assert!(tag.attributes.is_empty());
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_scan_open_tag_self_closing() {
        let mut out = Vec::new();
        let mut cur = cursor(b"br/>", &mut out);
        let tag = scan_open_tag(&mut cur).unwrap();
        assert_eq!(tag.name, "br");
        assert!(tag.self_closing);
    }

    #[test]
    fn test_scan_open_tag_attributes_keep_order_and_quotes() {
        let mut out = Vec::new();
        let mut cur = cursor(br#"a x="1" y='2'>"#, &mut out);
        let tag = scan_open_tag(&mut cur).unwrap();
        assert_eq!(tag.name, "a");
        assert_eq!(tag.attributes.len(), 2);
        assert_eq!(tag.attributes[0].name, "x");
        assert_eq!(tag.attributes[0].value, "1");
        assert_eq!(tag.attributes[0].quote, QuoteStyle::Double);
        assert_eq!(tag.attributes[1].name, "y");
        assert_eq!(tag.attributes[1].quote, QuoteStyle::Single);
    }

    #[test]
    fn test_scan_open_tag_attribute_then_self_close() {
        let mut out = Vec::new();
        let mut cur = cursor(br#"e nil="true"/>"#, &mut out);
        let tag = scan_open_tag(&mut cur).unwrap();
        assert_eq!(tag.name, "e");
        assert_eq!(tag.attributes.len(), 1);
        assert!(tag.self_closing);
    }

    #[test]
    fn test_scan_open_tag_duplicate_attribute_updates_in_place() {
        let mut out = Vec::new();
        let mut cur = cursor(b"a x='1' y=\"2\" x=\"3\">", &mut out);
        let tag = scan_open_tag(&mut cur).unwrap();
        assert_eq!(tag.attributes.len(), 2);
        assert_eq!(tag.attributes[0].name, "x");
        assert_eq!(tag.attributes[0].value, "3");
        assert_eq!(tag.attributes[0].quote, QuoteStyle::Single);
        assert_eq!(tag.attributes[1].name, "y");
    }

    #[test]
    fn test_scan_open_tag_value_may_contain_angle_bracket() {
        let mut out = Vec::new();
        let mut cur = cursor(br#"a x="1>2">"#, &mut out);
        let tag = scan_open_tag(&mut cur).unwrap();
        assert_eq!(tag.attributes[0].value, "1>2");
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_scan_open_tag_unquoted_value_is_malformed() {
        let mut out = Vec::new();
        let mut cur = cursor(b"a x=1>", &mut out);
        assert!(matches!(
            scan_open_tag(&mut cur),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_scan_tag_close() {
        let mut out = Vec::new();
        let mut cur = cursor(b"/root >", &mut out);
        match scan_tag(&mut cur).unwrap() {
            Tag::Close(name) => assert_eq!(name, "root"),
            other => panic!("expected close tag, got {other:?}"),
        }
    }

    #[test]
    fn test_cdata_probe_folds_content() {
        let mut out = Vec::new();
        let mut cur = cursor(b"![CDATA[a < b]]>rest", &mut out);
        let mut text = b"x".to_vec();
        assert!(cdata_probe(&mut cur, &mut text).unwrap());
        assert_eq!(text, b"xa < b");
    }

    #[test]
    fn test_cdata_probe_rejects_non_cdata() {
        let mut out = Vec::new();
        let mut cur = cursor(b"!-- c -->", &mut out);
        let mut text = Vec::new();
        assert!(!cdata_probe(&mut cur, &mut text).unwrap());
        // Nothing consumed: the comment probe still sees the full marker.
        assert!(comment_probe(&mut cur).unwrap());
    }

    #[test]
    fn test_comment_probe_pushback() {
        let mut out = Vec::new();
        let mut cur = cursor(b"abc", &mut out);
        assert!(!comment_probe(&mut cur).unwrap());
        assert_eq!(cur.read_byte().unwrap(), b'a');
    }

    #[test]
    fn test_unterminated_comment_is_malformed() {
        let mut out = Vec::new();
        let mut cur = cursor(b"!-- never closed", &mut out);
        assert!(matches!(
            comment_probe(&mut cur),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_skip_preamble_stops_at_root() {
        let input =
            b"<?xml version=\"1.0\"?>\n<!DOCTYPE note [ <!ENTITY a \"b\"> ]>\n<!-- hi -->\n<root>";
        let mut out = Vec::new();
        let mut cur = cursor(input, &mut out);
        skip_preamble(&mut cur).unwrap();
        assert_eq!(cur.peek_at(0).unwrap(), Some(b'<'));
        assert_eq!(cur.peek_at(1).unwrap(), Some(b'r'));
    }

    #[test]
    fn test_scan_past_element_counts_nesting() {
        let mut out = Vec::new();
        let mut cur = cursor(b"inner<x><x>deep</x></x></x>after", &mut out);
        // Positioned just inside <x>: consume to the structural close.
        scan_past_element(&mut cur, "x").unwrap();
        assert_eq!(cur.read_byte().unwrap(), b'a');
    }
}
