//! Tag classification tables for Core v0 tree construction.

use crate::html5::shared::{AtomId, AtomTable};
use crate::html5::tokenizer::RawKind;

use super::stack::ScopeTagSet;

/// Names the tree builder compares against on hot paths, interned once per
/// document so comparisons are atom-id equality.
#[derive(Clone, Copy, Debug)]
pub(crate) struct KnownTags {
    pub(crate) html: AtomId,
    pub(crate) head: AtomId,
    pub(crate) body: AtomId,
    pub(crate) br: AtomId,
    pub(crate) p: AtomId,
    pub(crate) li: AtomId,
    pub(crate) dd: AtomId,
    pub(crate) dt: AtomId,
    pub(crate) button: AtomId,
    pub(crate) table: AtomId,
    pub(crate) tbody: AtomId,
    pub(crate) thead: AtomId,
    pub(crate) tfoot: AtomId,
    pub(crate) tr: AtomId,
    pub(crate) option: AtomId,
    pub(crate) image: AtomId,
    pub(crate) svg: AtomId,
    pub(crate) math: AtomId,
    pub(crate) scope: ScopeTagSet,
}

impl KnownTags {
    pub(crate) fn intern(atoms: &mut AtomTable) -> Self {
        Self {
            html: atoms.intern_ascii_folded("html"),
            head: atoms.intern_ascii_folded("head"),
            body: atoms.intern_ascii_folded("body"),
            br: atoms.intern_ascii_folded("br"),
            p: atoms.intern_ascii_folded("p"),
            li: atoms.intern_ascii_folded("li"),
            dd: atoms.intern_ascii_folded("dd"),
            dt: atoms.intern_ascii_folded("dt"),
            button: atoms.intern_ascii_folded("button"),
            table: atoms.intern_ascii_folded("table"),
            tbody: atoms.intern_ascii_folded("tbody"),
            thead: atoms.intern_ascii_folded("thead"),
            tfoot: atoms.intern_ascii_folded("tfoot"),
            tr: atoms.intern_ascii_folded("tr"),
            option: atoms.intern_ascii_folded("option"),
            image: atoms.intern_ascii_folded("image"),
            svg: atoms.intern_ascii_folded("svg"),
            math: atoms.intern_ascii_folded("math"),
            scope: ScopeTagSet::intern(atoms),
        }
    }

    /// Current nodes whose character and element children get foster parented.
    pub(crate) fn is_table_context(&self, name: AtomId) -> bool {
        name == self.table
            || name == self.tbody
            || name == self.thead
            || name == self.tfoot
            || name == self.tr
    }

    pub(crate) fn is_list_item(&self, name: AtomId) -> bool {
        name == self.li || name == self.dd || name == self.dt
    }
}

pub(crate) fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "basefont"
            | "bgsound"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Start tags that close an open `p` in button scope before inserting.
pub(crate) fn closes_p(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "center"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "header"
            | "hgroup"
            | "hr"
            | "listing"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "plaintext"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "ul"
            | "xmp"
    ) || is_heading(name)
}

/// End tags closed through the generic "in scope, then pop until" path.
pub(crate) fn is_block_end(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "button"
            | "center"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "header"
            | "hgroup"
            | "listing"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "pre"
            | "section"
            | "summary"
            | "ul"
    )
}

pub(crate) fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Elements that stop the "any other end tag" walk.
pub(crate) fn is_special(name: &str) -> bool {
    is_void(name)
        || is_block_end(name)
        || is_heading(name)
        || matches!(
            name,
            "applet"
                | "body"
                | "caption"
                | "colgroup"
                | "dd"
                | "dt"
                | "frame"
                | "frameset"
                | "head"
                | "html"
                | "iframe"
                | "li"
                | "marquee"
                | "noembed"
                | "noframes"
                | "noscript"
                | "object"
                | "p"
                | "plaintext"
                | "script"
                | "select"
                | "style"
                | "table"
                | "tbody"
                | "td"
                | "template"
                | "textarea"
                | "tfoot"
                | "th"
                | "thead"
                | "title"
                | "tr"
                | "xmp"
        )
}

/// Elements popped by "generate implied end tags".
pub(crate) fn has_implied_end(name: &str) -> bool {
    matches!(
        name,
        "dd" | "dt" | "li" | "optgroup" | "option" | "p" | "rb" | "rp" | "rt" | "rtc"
    )
}

/// Elements inserted inside a table context instead of being foster parented.
pub(crate) fn is_table_content(name: &str) -> bool {
    matches!(
        name,
        "caption"
            | "col"
            | "colgroup"
            | "form"
            | "script"
            | "style"
            | "table"
            | "tbody"
            | "td"
            | "template"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
    )
}

/// HTML start tags that break out of SVG/MathML content.
pub(crate) fn breaks_out_of_foreign(name: &str) -> bool {
    is_heading(name)
        || matches!(
            name,
            "b" | "big"
                | "blockquote"
                | "body"
                | "br"
                | "center"
                | "code"
                | "dd"
                | "div"
                | "dl"
                | "dt"
                | "em"
                | "embed"
                | "head"
                | "hr"
                | "i"
                | "img"
                | "li"
                | "listing"
                | "menu"
                | "meta"
                | "nobr"
                | "ol"
                | "p"
                | "pre"
                | "ruby"
                | "s"
                | "small"
                | "span"
                | "strike"
                | "strong"
                | "sub"
                | "sup"
                | "table"
                | "tt"
                | "u"
                | "ul"
                | "var"
        )
}

/// Head-only elements that are inserted and immediately popped.
pub(crate) fn is_head_void(name: &str) -> bool {
    matches!(name, "base" | "basefont" | "bgsound" | "link" | "meta")
}

/// Content model an HTML element switches the tokenizer into.
pub(crate) fn raw_content_model(name: &str, scripting_enabled: bool) -> Option<RawKind> {
    match name {
        "title" | "textarea" => Some(RawKind::RcData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::RawText),
        "noscript" if scripting_enabled => Some(RawKind::RawText),
        "script" => Some(RawKind::ScriptData),
        "plaintext" => Some(RawKind::Plaintext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{KnownTags, closes_p, is_special, is_void, raw_content_model};
    use crate::html5::shared::AtomTable;
    use crate::html5::tokenizer::RawKind;

    #[test]
    fn raw_content_models_follow_scripting_flag() {
        assert_eq!(raw_content_model("script", false), Some(RawKind::ScriptData));
        assert_eq!(raw_content_model("noscript", true), Some(RawKind::RawText));
        assert_eq!(raw_content_model("noscript", false), None);
        assert_eq!(raw_content_model("textarea", true), Some(RawKind::RcData));
        assert_eq!(raw_content_model("div", true), None);
    }

    #[test]
    fn classification_tables_agree() {
        for name in ["br", "img", "meta", "input"] {
            assert!(is_void(name) && is_special(name), "{name}");
        }
        assert!(closes_p("h3") && closes_p("table") && !closes_p("span"));
        assert!(!is_special("span") && !is_special("b"));
    }

    #[test]
    fn known_tags_are_interned_once() {
        let mut atoms = AtomTable::new();
        let tags = KnownTags::intern(&mut atoms);
        assert_eq!(tags.html, tags.scope.html);
        assert_eq!(atoms.get("tbody"), Some(tags.tbody));
        assert!(tags.is_table_context(tags.tr));
        assert!(!tags.is_table_context(tags.p));
        assert!(tags.is_list_item(tags.dd));
    }
}
