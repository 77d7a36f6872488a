//! A small scanner for the JSX-style component tags used in course pages.
//!
//! MDX components such as `<Steps>` or `<Folder>` nest, so matching them with
//! a lazy regular expression pairs an opener with the wrong closer as soon as a
//! block contains another block of the same name. The scanner here walks the
//! text, tracking nesting depth per tag name, and hands back the outermost
//! blocks together with their raw attribute text and inner content.

use std::ops::Range;

/// One `<Name attrs>inner</Name>` block found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// Raw text between the tag name and the closing `>` of the opener
    pub attrs: &'a str,
    /// Everything between the opener and the matching closer
    pub inner: &'a str,
    /// Byte range of the whole block, opener and closer included
    pub range: Range<usize>,
}

struct Opener<'a> {
    start: usize,
    end: usize,
    attrs: &'a str,
    self_closing: bool,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find the next opener for `name` at or after `from`.
fn next_opener<'a>(input: &'a str, name: &str, from: usize) -> Option<Opener<'a>> {
    let needle = format!("<{name}");
    let mut search = from;
    while let Some(found) = input[search..].find(&needle) {
        let start = search + found;
        let after_name = start + needle.len();
        search = after_name;

        // `<Tab` must not match `<Tabs`
        match input[after_name..].chars().next() {
            Some(c) if !is_word_char(c) => {}
            _ => continue,
        }

        let Some(gt) = input[after_name..].find('>') else {
            return None;
        };
        let attrs = &input[after_name..after_name + gt];
        return Some(Opener {
            start,
            end: after_name + gt + 1,
            attrs,
            self_closing: attrs.trim_end().ends_with('/'),
        });
    }
    None
}

/// Locate the closer matching an opener whose body starts at `from`.
/// Returns the byte range of the closing tag.
fn matching_closer(input: &str, name: &str, from: usize) -> Option<Range<usize>> {
    let closer = format!("</{name}>");
    let mut depth = 1usize;
    let mut cursor = from;
    loop {
        let close_at = input[cursor..].find(&closer).map(|i| cursor + i)?;

        // count nested openers that appear before this closer
        let mut nested = next_opener(input, name, cursor);
        while let Some(opener) = nested.filter(|o| o.start < close_at) {
            if !opener.self_closing {
                depth += 1;
            }
            nested = next_opener(input, name, opener.end);
        }

        depth -= 1;
        if depth == 0 {
            return Some(close_at..close_at + closer.len());
        }
        cursor = close_at + closer.len();
    }
}

/// Collect the outermost `name` blocks in document order.
///
/// Self-closing openers (`<Name ... />`) are not blocks and are skipped, as
/// are openers that never get closed.
pub fn blocks<'a>(input: &'a str, name: &str) -> Vec<Block<'a>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(opener) = next_opener(input, name, cursor) {
        if opener.self_closing {
            cursor = opener.end;
            continue;
        }
        match matching_closer(input, name, opener.end) {
            Some(close) => {
                found.push(Block {
                    attrs: opener.attrs,
                    inner: &input[opener.end..close.start],
                    range: opener.start..close.end,
                });
                cursor = close.end;
            }
            None => cursor = opener.end,
        }
    }
    found
}

/// Rewrite every outermost `name` block with `replace`.
///
/// Returning `None` from `replace` keeps the block's original text.
pub fn replace_blocks<F>(input: &str, name: &str, mut replace: F) -> String
where
    F: FnMut(&Block) -> Option<String>,
{
    let found = blocks(input, name);
    if found.is_empty() {
        return input.to_string();
    }

    let mut output = String::with_capacity(input.len());
    let mut last = 0;
    for block in found.iter() {
        output.push_str(&input[last..block.range.start]);
        match replace(block) {
            Some(text) => output.push_str(&text),
            None => output.push_str(&input[block.range.clone()]),
        }
        last = block.range.end;
    }
    output.push_str(&input[last..]);
    output
}

/// Read a quoted attribute value (`key="..."` or `key='...'`).
pub fn attr<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{key}=");
    for (at, _) in attrs.match_indices(&needle) {
        if attrs[..at].chars().next_back().is_some_and(is_word_char) {
            continue;
        }
        let rest = &attrs[at + needle.len()..];
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        if let Some(end) = rest[1..].find(quote) {
            return Some(&rest[1..1 + end]);
        }
    }
    None
}
