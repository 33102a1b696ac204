// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The built-in HTML declaration set, distilled from the HTML 4.01 DTD.
//!
//! The tables below carry exactly what the reader's repair logic consults:
//! content classes, containment exceptions, EMPTY and CDATA content, and
//! which end tags the DTD lets a document omit.

use std::sync::Arc;

use tendril::StrTendril;

use super::groups::*;
use super::{ContentModel, DeclaredContent, Dtd, ElementDecl, EntityDef};

/// Content model shorthand for the element table.
enum Cm {
    Empty,
    Cdata,
    Any,
    /// PCDATA only.
    Pcdata,
    /// Accepts the given classes, plus/minus named exceptions.
    C(u32, &'static [&'static str], &'static [&'static str]),
}

struct ElemDef {
    name: &'static str,
    groups: u32,
    model: Cm,
    end_optional: bool,
}

const fn elem(name: &'static str, groups: u32, model: Cm, end_optional: bool) -> ElemDef {
    ElemDef {
        name,
        groups,
        model,
        end_optional,
    }
}

#[rustfmt::skip]
static ELEMENTS: &[ElemDef] = &[
    elem("html",       0,                      Cm::Any,                                              true),
    elem("head",       0,                      Cm::C(HEAD_CONTENT, &["TITLE", "BASE", "ISINDEX"], &[]), true),
    elem("body",       0,                      Cm::C(FLOW, &[], &[]),                                true),
    elem("frameset",   0,                      Cm::C(0, &["FRAMESET", "FRAME", "NOFRAMES"], &[]),    false),

    // Head content.
    elem("title",      HEAD_CONTENT,           Cm::Pcdata,                                           false),
    elem("base",       HEAD_CONTENT,           Cm::Empty,                                            false),
    elem("meta",       HEAD_CONTENT,           Cm::Empty,                                            false),
    elem("link",       HEAD_CONTENT,           Cm::Empty,                                            false),
    elem("isindex",    HEAD_CONTENT,           Cm::Empty,                                            false),
    elem("style",      HEAD_CONTENT,           Cm::Cdata,                                            false),
    elem("script",     HEAD_CONTENT | INLINE,  Cm::Cdata,                                            false),
    elem("object",     HEAD_CONTENT | INLINE,  Cm::C(FLOW, &["PARAM"], &[]),                         false),

    // Block-level structure.
    elem("p",          BLOCK,                  Cm::C(INLINE, &[], &[]),                              true),
    elem("div",        BLOCK,                  Cm::C(FLOW, &[], &[]),                                false),
    elem("center",     BLOCK,                  Cm::C(FLOW, &[], &[]),                                false),
    elem("address",    BLOCK,                  Cm::C(INLINE, &["P"], &[]),                           false),
    elem("blockquote", BLOCK,                  Cm::C(FLOW, &[], &[]),                                false),
    elem("h1",         BLOCK,                  Cm::C(INLINE, &[], &[]),                              false),
    elem("h2",         BLOCK,                  Cm::C(INLINE, &[], &[]),                              false),
    elem("h3",         BLOCK,                  Cm::C(INLINE, &[], &[]),                              false),
    elem("h4",         BLOCK,                  Cm::C(INLINE, &[], &[]),                              false),
    elem("h5",         BLOCK,                  Cm::C(INLINE, &[], &[]),                              false),
    elem("h6",         BLOCK,                  Cm::C(INLINE, &[], &[]),                              false),
    elem("pre",        BLOCK,                  Cm::C(INLINE, &[], &["IMG", "OBJECT", "BIG", "SMALL", "SUB", "SUP"]), false),
    elem("hr",         BLOCK,                  Cm::Empty,                                            false),
    elem("noscript",   BLOCK,                  Cm::C(FLOW, &[], &[]),                                false),
    elem("noframes",   BLOCK,                  Cm::C(FLOW, &[], &[]),                                false),
    elem("fieldset",   BLOCK,                  Cm::C(FLOW, &["LEGEND"], &[]),                        false),
    elem("legend",     0,                      Cm::C(INLINE, &[], &[]),                              false),
    elem("ins",        FLOW,                   Cm::C(FLOW, &[], &[]),                                false),
    elem("del",        FLOW,                   Cm::C(FLOW, &[], &[]),                                false),

    // Lists.
    elem("ul",         BLOCK,                  Cm::C(LIST_ITEM, &[], &[]),                           false),
    elem("ol",         BLOCK,                  Cm::C(LIST_ITEM, &[], &[]),                           false),
    elem("dir",        BLOCK,                  Cm::C(LIST_ITEM, &[], &[]),                           false),
    elem("menu",       BLOCK,                  Cm::C(LIST_ITEM, &[], &[]),                           false),
    elem("li",         LIST_ITEM,              Cm::C(FLOW, &[], &[]),                                true),
    elem("dl",         BLOCK,                  Cm::C(DEF_ITEM, &[], &[]),                            false),
    elem("dt",         DEF_ITEM,               Cm::C(INLINE, &[], &[]),                              true),
    elem("dd",         DEF_ITEM,               Cm::C(FLOW, &[], &[]),                                true),

    // Tables.
    elem("table",      BLOCK,                  Cm::C(TABLE_SECTION, &["CAPTION", "COLGROUP", "COL", "TR"], &[]), false),
    elem("caption",    0,                      Cm::C(INLINE, &[], &[]),                              false),
    elem("colgroup",   0,                      Cm::C(0, &["COL"], &[]),                              true),
    elem("col",        0,                      Cm::Empty,                                            false),
    elem("thead",      TABLE_SECTION,          Cm::C(TABLE_ROW, &[], &[]),                           true),
    elem("tbody",      TABLE_SECTION,          Cm::C(TABLE_ROW, &[], &[]),                           true),
    elem("tfoot",      TABLE_SECTION,          Cm::C(TABLE_ROW, &[], &[]),                           true),
    elem("tr",         TABLE_ROW,              Cm::C(TABLE_CELL, &[], &[]),                          true),
    elem("td",         TABLE_CELL,             Cm::C(FLOW, &[], &[]),                                true),
    elem("th",         TABLE_CELL,             Cm::C(FLOW, &[], &[]),                                true),

    // Forms.
    elem("form",       BLOCK,                  Cm::C(FLOW, &[], &["FORM"]),                          false),
    elem("input",      INLINE,                 Cm::Empty,                                            false),
    elem("select",     INLINE,                 Cm::C(OPTION_ITEM, &[], &[]),                         false),
    elem("optgroup",   OPTION_ITEM,            Cm::C(OPTION_ITEM, &[], &["OPTGROUP"]),               false),
    elem("option",     OPTION_ITEM,            Cm::Pcdata,                                           true),
    elem("textarea",   INLINE,                 Cm::Pcdata,                                           false),
    elem("button",     INLINE,                 Cm::C(FLOW, &[], &["A", "FORM", "INPUT", "SELECT", "TEXTAREA", "LABEL", "BUTTON", "IFRAME"]), false),
    elem("label",      INLINE,                 Cm::C(INLINE, &[], &["LABEL"]),                       false),

    // Inline markup.
    elem("a",          INLINE,                 Cm::C(INLINE, &[], &["A"]),                           false),
    elem("span",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("bdo",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("em",         INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("strong",     INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("dfn",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("code",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("samp",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("kbd",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("var",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("cite",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("abbr",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("acronym",    INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("q",          INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("sub",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("sup",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("tt",         INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("i",          INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("b",          INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("u",          INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("s",          INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("strike",     INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("big",        INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("small",      INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("font",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("basefont",   INLINE,                 Cm::Empty,                                            false),
    elem("br",         INLINE,                 Cm::Empty,                                            false),
    elem("img",        INLINE,                 Cm::Empty,                                            false),
    elem("map",        INLINE,                 Cm::C(BLOCK, &["AREA"], &[]),                         false),
    elem("area",       0,                      Cm::Empty,                                            false),
    elem("param",      0,                      Cm::Empty,                                            false),
    elem("applet",     INLINE,                 Cm::C(FLOW, &["PARAM"], &[]),                         false),
    elem("iframe",     INLINE,                 Cm::C(FLOW, &[], &[]),                                false),
    elem("frame",      0,                      Cm::Empty,                                            false),

    // Legacy elements still seen in the wild.
    elem("nobr",       INLINE,                 Cm::C(INLINE, &[], &[]),                              false),
    elem("wbr",        INLINE,                 Cm::Empty,                                            false),
    elem("embed",      INLINE,                 Cm::Empty,                                            false),
    elem("xmp",        BLOCK,                  Cm::Cdata,                                            false),
    elem("listing",    BLOCK,                  Cm::Cdata,                                            false),
];

/// Declared attribute defaults (element, attribute, default value).
#[rustfmt::skip]
static ATTR_DEFAULTS: &[(&str, &str, &str)] = &[
    ("td",     "colspan",   "1"),
    ("td",     "rowspan",   "1"),
    ("th",     "colspan",   "1"),
    ("th",     "rowspan",   "1"),
    ("a",      "shape",     "rect"),
    ("area",   "shape",     "rect"),
    ("form",   "method",    "get"),
    ("form",   "enctype",   "application/x-www-form-urlencoded"),
    ("input",  "type",      "text"),
    ("button", "type",      "submit"),
    ("frame",  "scrolling", "auto"),
    ("param",  "valuetype", "data"),
];

/// The HTML 4.01 Latin-1 entity set.
#[rustfmt::skip]
static LAT1_ENTITIES: &[(&str, char)] = &[
    ("nbsp", '\u{a0}'), ("iexcl", '\u{a1}'), ("cent", '\u{a2}'), ("pound", '\u{a3}'),
    ("curren", '\u{a4}'), ("yen", '\u{a5}'), ("brvbar", '\u{a6}'), ("sect", '\u{a7}'),
    ("uml", '\u{a8}'), ("copy", '\u{a9}'), ("ordf", '\u{aa}'), ("laquo", '\u{ab}'),
    ("not", '\u{ac}'), ("shy", '\u{ad}'), ("reg", '\u{ae}'), ("macr", '\u{af}'),
    ("deg", '\u{b0}'), ("plusmn", '\u{b1}'), ("sup2", '\u{b2}'), ("sup3", '\u{b3}'),
    ("acute", '\u{b4}'), ("micro", '\u{b5}'), ("para", '\u{b6}'), ("middot", '\u{b7}'),
    ("cedil", '\u{b8}'), ("sup1", '\u{b9}'), ("ordm", '\u{ba}'), ("raquo", '\u{bb}'),
    ("frac14", '\u{bc}'), ("frac12", '\u{bd}'), ("frac34", '\u{be}'), ("iquest", '\u{bf}'),
    ("Agrave", '\u{c0}'), ("Aacute", '\u{c1}'), ("Acirc", '\u{c2}'), ("Atilde", '\u{c3}'),
    ("Auml", '\u{c4}'), ("Aring", '\u{c5}'), ("AElig", '\u{c6}'), ("Ccedil", '\u{c7}'),
    ("Egrave", '\u{c8}'), ("Eacute", '\u{c9}'), ("Ecirc", '\u{ca}'), ("Euml", '\u{cb}'),
    ("Igrave", '\u{cc}'), ("Iacute", '\u{cd}'), ("Icirc", '\u{ce}'), ("Iuml", '\u{cf}'),
    ("ETH", '\u{d0}'), ("Ntilde", '\u{d1}'), ("Ograve", '\u{d2}'), ("Oacute", '\u{d3}'),
    ("Ocirc", '\u{d4}'), ("Otilde", '\u{d5}'), ("Ouml", '\u{d6}'), ("times", '\u{d7}'),
    ("Oslash", '\u{d8}'), ("Ugrave", '\u{d9}'), ("Uacute", '\u{da}'), ("Ucirc", '\u{db}'),
    ("Uuml", '\u{dc}'), ("Yacute", '\u{dd}'), ("THORN", '\u{de}'), ("szlig", '\u{df}'),
    ("agrave", '\u{e0}'), ("aacute", '\u{e1}'), ("acirc", '\u{e2}'), ("atilde", '\u{e3}'),
    ("auml", '\u{e4}'), ("aring", '\u{e5}'), ("aelig", '\u{e6}'), ("ccedil", '\u{e7}'),
    ("egrave", '\u{e8}'), ("eacute", '\u{e9}'), ("ecirc", '\u{ea}'), ("euml", '\u{eb}'),
    ("igrave", '\u{ec}'), ("iacute", '\u{ed}'), ("icirc", '\u{ee}'), ("iuml", '\u{ef}'),
    ("eth", '\u{f0}'), ("ntilde", '\u{f1}'), ("ograve", '\u{f2}'), ("oacute", '\u{f3}'),
    ("ocirc", '\u{f4}'), ("otilde", '\u{f5}'), ("ouml", '\u{f6}'), ("divide", '\u{f7}'),
    ("oslash", '\u{f8}'), ("ugrave", '\u{f9}'), ("uacute", '\u{fa}'), ("ucirc", '\u{fb}'),
    ("uuml", '\u{fc}'), ("yacute", '\u{fd}'), ("thorn", '\u{fe}'), ("yuml", '\u{ff}'),
];

/// The HTML 4.01 "special" entity set (markup-significant entities other
/// than the five XML built-ins, which the scanner expands itself).
#[rustfmt::skip]
static SPECIAL_ENTITIES: &[(&str, char)] = &[
    ("OElig", '\u{152}'), ("oelig", '\u{153}'), ("Scaron", '\u{160}'),
    ("scaron", '\u{161}'), ("Yuml", '\u{178}'), ("circ", '\u{2c6}'),
    ("tilde", '\u{2dc}'), ("ensp", '\u{2002}'), ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'), ("zwnj", '\u{200c}'), ("zwj", '\u{200d}'),
    ("lrm", '\u{200e}'), ("rlm", '\u{200f}'), ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'), ("lsquo", '\u{2018}'), ("rsquo", '\u{2019}'),
    ("sbquo", '\u{201a}'), ("ldquo", '\u{201c}'), ("rdquo", '\u{201d}'),
    ("bdquo", '\u{201e}'), ("dagger", '\u{2020}'), ("Dagger", '\u{2021}'),
    ("permil", '\u{2030}'), ("lsaquo", '\u{2039}'), ("rsaquo", '\u{203a}'),
    ("euro", '\u{20ac}'),
];

/// A working subset of the HTML 4.01 symbol entity set.
#[rustfmt::skip]
static SYMBOL_ENTITIES: &[(&str, char)] = &[
    ("fnof", '\u{192}'), ("bull", '\u{2022}'), ("hellip", '\u{2026}'),
    ("prime", '\u{2032}'), ("Prime", '\u{2033}'), ("oline", '\u{203e}'),
    ("frasl", '\u{2044}'), ("trade", '\u{2122}'), ("alefsym", '\u{2135}'),
    ("larr", '\u{2190}'), ("uarr", '\u{2191}'), ("rarr", '\u{2192}'),
    ("darr", '\u{2193}'), ("harr", '\u{2194}'), ("crarr", '\u{21b5}'),
    ("forall", '\u{2200}'), ("part", '\u{2202}'), ("exist", '\u{2203}'),
    ("empty", '\u{2205}'), ("nabla", '\u{2207}'), ("isin", '\u{2208}'),
    ("notin", '\u{2209}'), ("ni", '\u{220b}'), ("prod", '\u{220f}'),
    ("sum", '\u{2211}'), ("minus", '\u{2212}'), ("lowast", '\u{2217}'),
    ("radic", '\u{221a}'), ("prop", '\u{221d}'), ("infin", '\u{221e}'),
    ("ang", '\u{2220}'), ("and", '\u{2227}'), ("or", '\u{2228}'),
    ("cap", '\u{2229}'), ("cup", '\u{222a}'), ("int", '\u{222b}'),
    ("there4", '\u{2234}'), ("sim", '\u{223c}'), ("cong", '\u{2245}'),
    ("asymp", '\u{2248}'), ("ne", '\u{2260}'), ("equiv", '\u{2261}'),
    ("le", '\u{2264}'), ("ge", '\u{2265}'), ("sub", '\u{2282}'),
    ("sup", '\u{2283}'), ("nsub", '\u{2284}'), ("sube", '\u{2286}'),
    ("supe", '\u{2287}'), ("oplus", '\u{2295}'), ("otimes", '\u{2297}'),
    ("perp", '\u{22a5}'), ("sdot", '\u{22c5}'), ("lceil", '\u{2308}'),
    ("rceil", '\u{2309}'), ("lfloor", '\u{230a}'), ("rfloor", '\u{230b}'),
    ("lang", '\u{2329}'), ("rang", '\u{232a}'), ("loz", '\u{25ca}'),
    ("spades", '\u{2660}'), ("clubs", '\u{2663}'), ("hearts", '\u{2665}'),
    ("diams", '\u{2666}'),
    ("Alpha", '\u{391}'), ("Beta", '\u{392}'), ("Gamma", '\u{393}'),
    ("Delta", '\u{394}'), ("Epsilon", '\u{395}'), ("Zeta", '\u{396}'),
    ("Eta", '\u{397}'), ("Theta", '\u{398}'), ("Iota", '\u{399}'),
    ("Kappa", '\u{39a}'), ("Lambda", '\u{39b}'), ("Mu", '\u{39c}'),
    ("Nu", '\u{39d}'), ("Xi", '\u{39e}'), ("Omicron", '\u{39f}'),
    ("Pi", '\u{3a0}'), ("Rho", '\u{3a1}'), ("Sigma", '\u{3a3}'),
    ("Tau", '\u{3a4}'), ("Upsilon", '\u{3a5}'), ("Phi", '\u{3a6}'),
    ("Chi", '\u{3a7}'), ("Psi", '\u{3a8}'), ("Omega", '\u{3a9}'),
    ("alpha", '\u{3b1}'), ("beta", '\u{3b2}'), ("gamma", '\u{3b3}'),
    ("delta", '\u{3b4}'), ("epsilon", '\u{3b5}'), ("zeta", '\u{3b6}'),
    ("eta", '\u{3b7}'), ("theta", '\u{3b8}'), ("iota", '\u{3b9}'),
    ("kappa", '\u{3ba}'), ("lambda", '\u{3bb}'), ("mu", '\u{3bc}'),
    ("nu", '\u{3bd}'), ("xi", '\u{3be}'), ("omicron", '\u{3bf}'),
    ("pi", '\u{3c0}'), ("rho", '\u{3c1}'), ("sigmaf", '\u{3c2}'),
    ("sigma", '\u{3c3}'), ("tau", '\u{3c4}'), ("upsilon", '\u{3c5}'),
    ("phi", '\u{3c6}'), ("chi", '\u{3c7}'), ("psi", '\u{3c8}'),
    ("omega", '\u{3c9}'), ("thetasym", '\u{3d1}'), ("upsih", '\u{3d2}'),
    ("piv", '\u{3d6}'),
];

fn build() -> Dtd {
    let mut dtd = Dtd::new("HTML");
    for def in ELEMENTS {
        let model = match def.model {
            Cm::Empty => ContentModel::Empty,
            Cm::Cdata => ContentModel::Cdata,
            Cm::Any => ContentModel::Any,
            Cm::Pcdata => ContentModel::Declared(DeclaredContent {
                allows: 0,
                names: vec![],
                excludes: vec![],
            }),
            Cm::C(allows, names, excludes) => ContentModel::Declared(DeclaredContent {
                allows,
                names: names.iter().map(|n| n.to_string()).collect(),
                excludes: excludes.iter().map(|n| n.to_string()).collect(),
            }),
        };
        dtd.add_element(ElementDecl::new(
            def.name,
            def.groups,
            model,
            def.end_optional,
        ));
    }
    for &(elem_name, attr_name, default) in ATTR_DEFAULTS {
        let index = dtd
            .find_element(elem_name)
            .expect("defaulted attribute on undeclared element");
        dtd.element_mut(index).add_attr(attr_name, Some(default));
    }
    for &(name, ch) in LAT1_ENTITIES
        .iter()
        .chain(SPECIAL_ENTITIES)
        .chain(SYMBOL_ENTITIES)
    {
        let mut text = StrTendril::new();
        text.push_char(ch);
        dtd.add_entity(name, EntityDef::Internal(text));
    }
    dtd
}

/// The shared built-in HTML DTD, constructed on first use.
pub fn html_dtd() -> Arc<Dtd> {
    thread_local! {
        static DTD: Arc<Dtd> = Arc::new(build());
    }
    DTD.with(Arc::clone)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paragraphs_do_not_nest() {
        let dtd = html_dtd();
        let p = dtd.find_element("p").unwrap();
        assert!(dtd.element(p).end_tag_optional());
        assert!(!dtd.can_contain(p, "p"));
        assert!(dtd.can_contain(p, "b"));
    }

    #[test]
    fn table_cells_imply_their_ends() {
        let dtd = html_dtd();
        let td = dtd.find_element("td").unwrap();
        let tr = dtd.find_element("tr").unwrap();
        assert!(dtd.element(td).end_tag_optional());
        assert!(!dtd.can_contain(td, "td"));
        assert!(!dtd.can_contain(tr, "tr"));
        assert!(dtd.can_contain(tr, "TH"));
    }

    #[test]
    fn script_is_unparsed_and_br_is_empty() {
        let dtd = html_dtd();
        let script = dtd.find_element("script").unwrap();
        let br = dtd.find_element("br").unwrap();
        assert!(dtd.element(script).is_cdata());
        assert!(dtd.element(br).is_empty());
        assert!(dtd.element(br).end_tag_optional());
    }

    #[test]
    fn entity_table_carries_latin1() {
        let dtd = html_dtd();
        match dtd.entity("nbsp") {
            Some(EntityDef::Internal(text)) => assert_eq!(&**text, "\u{a0}"),
            _ => panic!("nbsp should be an internal entity"),
        }
        assert!(dtd.entity("NBSP").is_none());
    }

    #[test]
    fn defaults_come_from_the_attribute_list() {
        let dtd = html_dtd();
        let td = dtd.find_element("td").unwrap();
        assert_eq!(dtd.attr_default(td, "COLSPAN").map(|v| &**v), Some("1"));
        assert_eq!(dtd.attr_default(td, "align"), None);
    }

    #[test]
    fn root_is_html() {
        let dtd = html_dtd();
        let html = dtd.find_element("html").unwrap();
        assert!(dtd.is_root(html));
        assert!(dtd.can_contain(html, "whatever"));
    }
}
