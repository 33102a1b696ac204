// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error-recovery scenarios and the stream invariants: whatever the
//! input, the events must pair up into a well-formed tree.

use std::sync::Arc;

use sgml5ever::driver::to_xml;
use sgml5ever::dtd::{ContentModel, Dtd, ElementDecl, EntityDef};
use sgml5ever::{Error, NodeKind, ReaderOpts, SgmlReader};

fn html(input: &str) -> String {
    to_xml(input, ReaderOpts::default()).unwrap()
}

/// Drive the reader and assert that start and end events nest properly,
/// with every end carrying its start's name and depth.
fn assert_balanced(input: &str, opts: ReaderOpts) {
    let mut reader = SgmlReader::from_str(input, opts);
    let mut open: Vec<(String, usize)> = Vec::new();
    while reader.read().unwrap() {
        match reader.node_kind() {
            NodeKind::Element => {
                if !reader.is_empty_element() {
                    open.push((reader.name(), reader.depth()));
                }
            },
            NodeKind::EndElement => {
                let (name, depth) = open.pop().expect("end without start");
                assert_eq!(reader.name(), name);
                assert_eq!(reader.depth(), depth);
            },
            _ => {},
        }
    }
    assert!(open.is_empty(), "unclosed elements: {open:?}");
}

#[test]
fn every_start_gets_an_end() {
    for input in [
        "<p>a<p>b",
        "<ul><li>a<li>b",
        "<table><tr><td>a<td>b</table>",
        "<b>x<i>y</b>z",
        "<p>a<div>b",
        "<script>x<y",
        "<p>unclosed <!-- comment",
        "<p><a href=broken>x",
    ] {
        assert_balanced(input, ReaderOpts::default());
    }
}

#[test]
fn list_items_close_each_other() {
    assert_eq!(
        html("<ul><li>a<li>b</ul>"),
        "<html><ul><li>a</li><li>b</li></ul></html>"
    );
}

#[test]
fn definition_items_close_each_other() {
    assert_eq!(
        html("<dl><dt>t<dd>d</dl>"),
        "<html><dl><dt>t</dt><dd>d</dd></dl></html>"
    );
}

#[test]
fn table_cells_and_rows_auto_close() {
    assert_eq!(
        html("<table><tr><td>a<td>b<tr><td>c</table>"),
        "<html><table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table></html>"
    );
}

#[test]
fn paragraph_closes_before_block_content() {
    assert_eq!(
        html("<body><p>x<div>y</div></body>"),
        "<html><body><p>x</p><div>y</div></body></html>"
    );
}

#[test]
fn body_is_never_auto_closed() {
    // `tr` has no legal home here, but the walk stops at BODY rather
    // than closing it.
    assert_eq!(
        html("<body><tr>x</tr></body>"),
        "<html><body><tr>x</tr></body></html>"
    );
}

#[test]
fn options_close_each_other() {
    assert_eq!(
        html("<select><option>a<option>b</select>"),
        "<html><select><option>a</option><option>b</option></select></html>"
    );
}

#[test]
fn unmatched_end_tag_is_ignored() {
    assert_eq!(html("<p>a</b></p>"), "<html><p>a</p></html>");
}

#[test]
fn incorrectly_nested_inline_elements() {
    assert_eq!(html("<b>x<i>y</b>z"), "<html><b>x<i>y</i></b>z</html>");
}

#[test]
fn second_root_is_discarded() {
    let opts = ReaderOpts {
        doc_type: None,
        ..Default::default()
    };
    assert_eq!(to_xml("<a>x</a><b>y</b>", opts).unwrap(), "<a>x</a>");
}

#[test]
fn invalid_element_name_degrades_to_text() {
    assert_eq!(html("<p>a <1x> b</p>"), "<html><p>a &lt;1x&gt; b</p></html>");
}

#[test]
fn duplicate_attributes_collapse_to_the_first() {
    let mut reader = SgmlReader::from_str("<p a=1 A=2 a=3>x</p>", ReaderOpts::default());
    assert!(reader.read().unwrap()); // html
    assert!(reader.read().unwrap()); // p
    assert_eq!(reader.attribute_count(), 1);
    assert_eq!(reader.attribute("a").as_deref(), Some("1"));
}

#[test]
fn unclosed_comment_at_eof() {
    assert_eq!(html("<p>a<!-- never"), "<html><p>a<!-- never--></p></html>");
}

#[test]
fn unclosed_cdata_at_eof() {
    assert_eq!(
        html("<script>var x"),
        "<html><script><![CDATA[var x]]></script></html>"
    );
}

#[test]
fn cdata_guard_sequences_are_stripped() {
    assert_eq!(
        html("<script>/**/<![CDATA[var x;]]></script>"),
        "<html><script><![CDATA[var x;]]></script></html>"
    );
}

#[test]
fn embedded_comment_splits_cdata() {
    assert_eq!(
        html("<script>a<!--c-->b</script>"),
        "<html><script><![CDATA[a]]><!--c--><![CDATA[b]]></script></html>"
    );
}

#[test]
fn dtd_defaults_back_valueless_attributes() {
    let mut reader = SgmlReader::from_str(
        "<table><tr><td colspan>x</table>",
        ReaderOpts::default(),
    );
    loop {
        assert!(reader.read().unwrap());
        if reader.node_kind() == NodeKind::Element && reader.name() == "td" {
            break;
        }
    }
    assert_eq!(reader.attribute("colspan").as_deref(), Some("1"));
    assert!(reader.move_to_attribute("colspan"));
    assert!(reader.is_default());
}

#[test]
fn scanned_attributes_are_not_defaults() {
    let mut reader = SgmlReader::from_str("<p foo>x</p>", ReaderOpts::default());
    assert!(reader.read().unwrap());
    assert!(reader.read().unwrap());
    assert!(reader.move_to_attribute("foo"));
    assert!(!reader.is_default());
    assert_eq!(&*reader.value(), "foo");
}

#[test]
fn repair_is_idempotent() {
    let messy = "<p class=foo>x<p>b<script>if(a<b){}</script>";
    let once = html(messy);
    let twice = html(&once);
    assert_eq!(once, twice);
    assert_eq!(
        once,
        "<html><p class=\"foo\">x</p><p>b<script><![CDATA[if(a<b){}]]></script></p></html>"
    );
}

#[test]
fn strict_xml_passes_through() {
    let opts = ReaderOpts {
        doc_type: None,
        ..Default::default()
    };
    let strict = "<root a=\"1\"><child>text</child><other/></root>";
    assert_eq!(to_xml(strict, opts).unwrap(), strict);
}

#[test]
fn ignore_dtd_disables_auto_close() {
    let opts = ReaderOpts {
        ignore_dtd: true,
        ..Default::default()
    };
    // Without declarations the second `p` nests inside the first and both
    // are closed at end of input.
    assert_eq!(
        to_xml("<p>a<p>b", opts).unwrap(),
        "<html><p>a<p>b</p></p></html>"
    );
}

#[test]
fn external_entities_splice_in() {
    let path = std::env::temp_dir().join("sgml5ever_chapter_entity.txt");
    std::fs::write(&path, "spliced text").unwrap();

    let mut dtd = Dtd::new("doc");
    dtd.add_element(ElementDecl::new("doc", 0, ContentModel::Any, false));
    dtd.add_entity(
        "chap",
        EntityDef::External {
            system: path.to_string_lossy().into_owned(),
        },
    );
    let opts = ReaderOpts {
        doc_type: Some("doc".to_string()),
        dtd: Some(Arc::new(dtd)),
        ..Default::default()
    };
    assert_eq!(
        to_xml("<doc>a &chap; b</doc>", opts).unwrap(),
        "<doc>a spliced text b</doc>"
    );
}

#[test]
fn internal_dtd_entities_expand() {
    let mut dtd = Dtd::new("doc");
    dtd.add_element(ElementDecl::new("doc", 0, ContentModel::Any, false));
    dtd.add_entity("greet", EntityDef::Internal("hello".into()));
    let opts = ReaderOpts {
        doc_type: Some("doc".to_string()),
        dtd: Some(Arc::new(dtd)),
        ..Default::default()
    };
    assert_eq!(
        to_xml("<doc>&greet; world</doc>", opts).unwrap(),
        "<doc>hello world</doc>"
    );
}

#[test]
fn doctype_mismatch_surfaces_an_error() {
    let mut dtd = Dtd::new("book");
    dtd.add_element(ElementDecl::new("book", 0, ContentModel::Any, false));
    let opts = ReaderOpts {
        doc_type: Some("book".to_string()),
        dtd: Some(Arc::new(dtd)),
        ..Default::default()
    };
    let mut reader = SgmlReader::from_str("<!DOCTYPE html><p>x</p>", opts);
    assert!(matches!(reader.read(), Err(Error::DtdMismatch { .. })));
}

#[test]
fn missing_input_surfaces_an_error() {
    let mut reader = SgmlReader::new(ReaderOpts::default());
    assert!(matches!(reader.read(), Err(Error::MissingInput)));
}
