//! Interpolation splitting.
//!
//! The splitter is a byte scanner with brace/quote/backtick state; it never
//! invokes the expression parser. Quotes in the surrounding HTML text are
//! literal characters; string delimiters are only honored *inside* a
//! confirmed `${…}` region. An unterminated `${` makes the whole text
//! plain, so the function returns `None` and the caller falls back.

use smol_str::SmolStr;
use source_map::Span;

/// The result of splitting text around `${…}` holes.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationSplit {
    /// Literal text parts; always `expr_spans.len() + 1` entries. Escape
    /// sequences are kept verbatim (`\${` stays `\${`).
    pub parts: Vec<SmolStr>,
    /// Spans of the inner expression text, excluding `${` and `}`.
    pub expr_spans: Vec<Span>,
}

/// Splits `src` into literal parts and expression spans.
///
/// Returns `None` when the text contains no interpolation, either because
/// there is no unescaped `${` at all or because a `${` never finds its
/// matching `}`.
pub fn split_interpolation_text(src: &str) -> Option<InterpolationSplit> {
    let bytes = src.as_bytes();
    let mut parts: Vec<SmolStr> = Vec::new();
    let mut expr_spans: Vec<Span> = Vec::new();
    let mut part_start = 0usize;
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' && !is_escaped(bytes, i) {
            let close = scan_balanced(src, i + 2)?;
            parts.push(SmolStr::from(&src[part_start..i]));
            expr_spans.push(Span::new((i + 2) as u32, close as u32));
            part_start = close + 1;
            i = close + 1;
        } else {
            i += 1;
        }
    }

    if expr_spans.is_empty() {
        return None;
    }
    parts.push(SmolStr::from(&src[part_start..]));
    Some(InterpolationSplit { parts, expr_spans })
}

/// True when the byte at `idx` is preceded by an odd number of backslashes.
fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    let preceding = (0..idx)
        .rev()
        .take_while(|&j| bytes[j] == b'\\')
        .count();
    preceding % 2 == 1
}

/// Scans forward from just inside a `${`, returning the index of the
/// matching `}`. Handles nested braces, string literals, and nested
/// template literals. Returns `None` when unterminated.
pub(crate) fn scan_balanced(src: &str, from: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 1usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'`' => {
                i = skip_template(src, i)?;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Skips a quoted string starting at `open`; returns the index after the
/// closing quote.
fn skip_string(bytes: &[u8], open: usize) -> Option<usize> {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Skips a template literal starting at the backtick at `open`; returns the
/// index after the closing backtick. Nested `${…}` regions recurse through
/// [`scan_balanced`].
fn skip_template(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                let close = scan_balanced(src, i + 2)?;
                i = close + 1;
            }
            _ => i += 1,
        }
    }
    None
}
