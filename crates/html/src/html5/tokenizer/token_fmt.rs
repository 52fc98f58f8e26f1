//! One-line token rendering for trace logs and tokenizer tests.
//!
//! Attributes are printed in the order the tokenizer met them. Atoms missing
//! from the table print as `#<id>` instead of failing.

use crate::html5::shared::{AtomId, AtomTable, Token};
use std::fmt::{self, Write};

/// `Display` adapter for a [`Token`] and the table its atoms live in.
pub struct TokenDisplay<'a> {
    token: &'a Token,
    atoms: &'a AtomTable,
}

impl<'a> TokenDisplay<'a> {
    pub fn new(token: &'a Token, atoms: &'a AtomTable) -> Self {
        Self { token, atoms }
    }

    fn atom(&self, f: &mut fmt::Formatter<'_>, id: AtomId) -> fmt::Result {
        match self.atoms.resolve(id) {
            Some(name) => f.write_str(name),
            None => write!(f, "#<{}>", id.0),
        }
    }
}

impl fmt::Display for TokenDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Token::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => {
                f.write_str("DOCTYPE name=")?;
                match name {
                    Some(id) => self.atom(f, *id)?,
                    None => f.write_str("null")?,
                }
                f.write_str(" public_id=")?;
                quoted_or_null(f, public_id.as_deref())?;
                f.write_str(" system_id=")?;
                quoted_or_null(f, system_id.as_deref())?;
                write!(f, " force_quirks={force_quirks}")
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                f.write_str("START name=")?;
                self.atom(f, *name)?;
                f.write_str(" attrs=[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    self.atom(f, attr.name)?;
                    if let Some(value) = &attr.value {
                        f.write_char('=')?;
                        quoted(f, value)?;
                    }
                }
                write!(f, "] self_closing={self_closing}")
            }
            Token::EndTag { name } => {
                f.write_str("END name=")?;
                self.atom(f, *name)
            }
            Token::Comment { text } => {
                f.write_str("COMMENT text=")?;
                quoted(f, text)
            }
            Token::Text { text } => {
                f.write_str("CHAR text=")?;
                quoted(f, text)
            }
            Token::Eof => f.write_str("EOF"),
        }
    }
}

fn quoted_or_null(f: &mut fmt::Formatter<'_>, value: Option<&str>) -> fmt::Result {
    match value {
        Some(value) => quoted(f, value),
        None => f.write_str("null"),
    }
}

fn quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in text.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            ch if ch < ' ' || ch == '\u{7f}' => write!(f, "\\u{{{:02X}}}", ch as u32)?,
            ch => f.write_char(ch)?,
        }
    }
    f.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::TokenDisplay;
    use crate::html5::shared::{AtomId, AtomTable, Attribute, Token};

    #[test]
    fn start_tag_keeps_attribute_order() {
        let mut atoms = AtomTable::new();
        let div = atoms.intern_ascii_folded("div");
        let id = atoms.intern_ascii_folded("id");
        let hidden = atoms.intern_ascii_folded("hidden");
        let token = Token::StartTag {
            name: div,
            attrs: vec![
                Attribute {
                    name: id,
                    value: Some("a\"b".to_string()),
                },
                Attribute {
                    name: hidden,
                    value: None,
                },
            ],
            self_closing: false,
        };
        assert_eq!(
            TokenDisplay::new(&token, &atoms).to_string(),
            r#"START name=div attrs=[id="a\"b" hidden] self_closing=false"#
        );
    }

    #[test]
    fn unknown_atoms_and_control_characters() {
        let atoms = AtomTable::new();
        let end = Token::EndTag { name: AtomId(42) };
        assert_eq!(TokenDisplay::new(&end, &atoms).to_string(), "END name=#<42>");
        let text = Token::Text {
            text: "a\n\u{1}".to_string(),
        };
        assert_eq!(
            TokenDisplay::new(&text, &atoms).to_string(),
            r#"CHAR text="a\n\u{01}""#
        );
    }
}
