//! Character reference resolution.
//!
//! Contract:
//! - Named references resolved: a small fixed table (see `NAMED`).
//! - Numeric references resolve only when well-formed and semicolon-terminated:
//!   `&#123;` (decimal) and `&#x1F4A9;` (hex).
//! - Only valid Unicode scalar values resolve; anything else is left unchanged.
//! - Missing semicolons, unknown names, malformed numerics, or overlong digit runs are
//!   left unchanged.

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Longest reference body (between `&` and `;`) the tokenizer will buffer.
pub(crate) const MAX_REFERENCE_LEN: usize = 32;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("copy", '\u{00A9}'),
    ("reg", '\u{00AE}'),
    ("times", '\u{00D7}'),
    ("laquo", '\u{00AB}'),
    ("raquo", '\u{00BB}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("hellip", '\u{2026}'),
];

/// Resolve the body of a semicolon-terminated reference (`amp`, `#215`, `#xD7`).
pub(crate) fn resolve_reference(body: &str) -> Option<char> {
    if let Some(digits) = body
        .strip_prefix("#x")
        .or_else(|| body.strip_prefix("#X"))
    {
        if digits.is_empty()
            || digits.len() > MAX_HEX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return None;
        }
        return u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32);
    }
    if let Some(digits) = body.strip_prefix('#') {
        if digits.is_empty()
            || digits.len() > MAX_DEC_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        return digits.parse::<u32>().ok().and_then(char::from_u32);
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == body)
        .map(|(_, ch)| *ch)
}

/// Whether `ch` may continue a reference body after `&`.
pub(crate) fn is_reference_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '#'
}
