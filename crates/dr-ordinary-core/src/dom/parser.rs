//! Lenient HTML tree builder.
//!
//! Tolerates unclosed tags, stray end tags, and unquoted attributes. Content of
//! raw-text elements (`script`, `style`, `noscript`, `textarea`, `title`) is
//! kept verbatim as a single text child. `noscript` is read the way a browser
//! with scripting enabled reads it.

use tracing::warn;

use super::{Document, NodeId};

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not parsed as markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "textarea", "title"];

/// Elements implicitly closed by an opening tag of the same name.
const SELF_NESTING_CLOSERS: &[&str] = &["p", "li", "option", "tr", "td", "th"];

/// Parses raw HTML into a [`Document`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> Document {
        let mut doc = Document::new();
        let mut stack: Vec<NodeId> = vec![doc.root()];
        let bytes = input.as_bytes();
        let mut idx = 0_usize;

        while idx < bytes.len() {
            if bytes[idx] != b'<' {
                let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
                append_text(&mut doc, &stack, &decode_entities(&input[idx..next]));
                idx = next;
                continue;
            }

            if starts_with(bytes, idx, b"<!--") {
                let end = find_subslice(bytes, idx + 4, b"-->");
                let body_end = end.unwrap_or(bytes.len());
                let comment = doc.create_comment(&input[idx + 4..body_end.max(idx + 4)]);
                append_node(&mut doc, &stack, comment);
                idx = end.map(|e| e + 3).unwrap_or(bytes.len());
                continue;
            }

            if starts_with(bytes, idx, b"<!") || starts_with(bytes, idx, b"<?") {
                idx = skip_to_gt(bytes, idx + 2);
                continue;
            }

            let Some((tag, next_idx)) = parse_tag(input, idx) else {
                // A lone '<' that does not open a tag is text.
                append_text(&mut doc, &stack, "<");
                idx += 1;
                continue;
            };

            if tag.is_end {
                close_element(&doc, &mut stack, &tag.name);
                idx = next_idx;
                continue;
            }

            if SELF_NESTING_CLOSERS.contains(&tag.name.as_str()) {
                if let Some(top) = stack.last().copied() {
                    if doc.tag_name(top) == Some(tag.name.as_str()) {
                        stack.pop();
                    }
                }
            }

            let element = doc.create_element(&tag.name);
            for (name, value) in &tag.attrs {
                doc.set_attr(element, name, value);
            }
            append_node(&mut doc, &stack, element);

            if VOID_ELEMENTS.contains(&tag.name.as_str()) || tag.self_closing {
                idx = next_idx;
                continue;
            }

            if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                let (raw, after_raw) = read_raw_text_until_end_tag(input, next_idx, &tag.name);
                if !raw.is_empty() {
                    let text = if tag.name == "textarea" || tag.name == "title" {
                        decode_entities(raw)
                    } else {
                        raw.to_owned()
                    };
                    let text_node = doc.create_text(text);
                    attach(&mut doc, element, text_node);
                }
                idx = after_raw;
                continue;
            }

            stack.push(element);
            idx = next_idx;
        }

        doc
    }
}

fn attach(doc: &mut Document, parent: NodeId, node: NodeId) {
    if let Err(error) = doc.append_child(parent, node) {
        warn!(%error, "Dropping node the parser could not attach");
    }
}

fn append_node(doc: &mut Document, stack: &[NodeId], node: NodeId) {
    let parent = stack.last().copied().unwrap_or_else(|| doc.root());
    attach(doc, parent, node);
}

fn append_text(doc: &mut Document, stack: &[NodeId], text: &str) {
    if text.is_empty() {
        return;
    }
    let parent = stack.last().copied().unwrap_or_else(|| doc.root());
    // Merge with a preceding text sibling so the tree has no adjacent text nodes.
    if let Some(last) = doc.children(parent).last().copied() {
        if let Some(existing) = doc.text(last) {
            let merged = format!("{existing}{text}");
            let replacement = doc.create_text(merged);
            if let Err(error) = doc.replace(last, replacement) {
                warn!(%error, "Could not merge adjacent text");
            }
            return;
        }
    }
    let node = doc.create_text(text);
    attach(doc, parent, node);
}

fn close_element(doc: &Document, stack: &mut Vec<NodeId>, name: &str) {
    let Some(position) = stack
        .iter()
        .rposition(|id| doc.tag_name(*id) == Some(name))
    else {
        return;
    };
    stack.truncate(position);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    attrs: Vec<(String, String)>,
    is_end: bool,
    self_closing: bool,
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start + 1;
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx += 1;
    }

    let name_start = idx;
    if !bytes.get(idx).map(u8::is_ascii_alphabetic).unwrap_or(false) {
        return None;
    }
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx += 1;
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attrs,
                        is_end,
                        self_closing: false,
                    },
                    idx + 1,
                ));
            }
            Some(b'/') if bytes.get(idx + 1).copied() == Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attrs,
                        is_end,
                        self_closing: true,
                    },
                    idx + 2,
                ));
            }
            Some(b'/') => idx += 1,
            Some(_) => {
                let attr_start = idx;
                while idx < bytes.len()
                    && !bytes[idx].is_ascii_whitespace()
                    && !matches!(bytes[idx], b'=' | b'>' | b'/')
                {
                    idx += 1;
                }
                let attr_name = input[attr_start..idx].to_ascii_lowercase();
                idx = skip_spaces(bytes, idx);

                let mut value = String::new();
                if bytes.get(idx).copied() == Some(b'=') {
                    idx = skip_spaces(bytes, idx + 1);
                    match bytes.get(idx).copied() {
                        Some(quote @ (b'"' | b'\'')) => {
                            let value_start = idx + 1;
                            let value_end = find_byte(bytes, value_start, quote)?;
                            value = decode_entities(&input[value_start..value_end]);
                            idx = value_end + 1;
                        }
                        Some(_) => {
                            let value_start = idx;
                            while idx < bytes.len()
                                && !bytes[idx].is_ascii_whitespace()
                                && bytes[idx] != b'>'
                            {
                                idx += 1;
                            }
                            value = decode_entities(&input[value_start..idx]);
                        }
                        None => return None,
                    }
                }

                if !attr_name.is_empty() && !attrs.iter().any(|(n, _)| *n == attr_name) {
                    attrs.push((attr_name, value));
                }
            }
        }
    }
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx + 1).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx + 2, tag_bytes)
            && tag_name_boundary(bytes, idx + 2 + tag_bytes.len())
        {
            let end = skip_to_gt(bytes, idx + 2);
            return (&input[start..idx], end);
        }
        idx += 1;
    }

    (&input[start..], bytes.len())
}

/// Decode the common named entities and numeric character references.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &after[..end];
            decode_entity(entity).map(|ch| (ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx + 1;
        }
        idx += 1;
    }
    bytes.len()
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx + pattern.len();
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx + pattern.len();
    if end > bytes.len() {
        return false;
    }
    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}
