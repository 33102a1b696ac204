// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The pull surface and the documented repair behaviors, checked by
//! serializing the event stream back to XML.

use std::cell::RefCell;
use std::rc::Rc;

use sgml5ever::driver::to_xml;
use sgml5ever::{CaseFolding, NodeKind, ParseError, ReaderOpts, SgmlReader, WhitespaceHandling};

fn html(input: &str) -> String {
    to_xml(input, ReaderOpts::default()).unwrap()
}

#[test]
fn quotes_added_and_wrapper_synthesized() {
    assert_eq!(html("<p class=foo>x</p>"), "<html><p class=\"foo\">x</p></html>");
}

#[test]
fn dtd_closes_paragraph_before_paragraph() {
    assert_eq!(html("<p>a<p>b</p>"), "<html><p>a</p><p>b</p></html>");
}

#[test]
fn malformed_quote_recovers_with_a_diagnostic() {
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = log.clone();
    let mut reader = SgmlReader::from_str("<a href=\"foo\"bar\">ok</a>", ReaderOpts::default());
    reader.set_error_handler(Box::new(move |e: &ParseError| {
        sink.borrow_mut().push(e.to_string());
    }));
    let mut out = String::new();
    {
        let mut writer = sgml5ever::serialize::XmlWriter::new(&mut out);
        while reader.read().unwrap() {
            reader.write_event(&mut writer).unwrap();
        }
    }
    assert_eq!(out, "<html><a href=\"foo\">ok</a></html>");
    assert!(
        log.borrow().iter().any(|m| m.contains("bar")),
        "expected a diagnostic about the dropped attribute, got {:?}",
        log.borrow()
    );
}

#[test]
fn script_content_becomes_cdata() {
    assert_eq!(
        html("<script>x<y></script>"),
        "<html><script><![CDATA[x<y]]></script></html>"
    );
}

#[test]
fn comment_double_dashes_are_rewritten() {
    assert_eq!(html("<!-- a -- b -->"), "<!-- a - b -->");
}

#[test]
fn valueless_attribute_defaults_to_its_name() {
    assert_eq!(html("<p foo>done</p>"), "<html><p foo=\"foo\">done</p></html>");
}

#[test]
fn existing_html_root_is_not_wrapped_again() {
    assert_eq!(html("<html><p>x</p></html>"), "<html><p>x</p></html>");
}

#[test]
fn empty_elements_report_empty_and_self_close() {
    assert_eq!(html("<br>"), "<html><br/></html>");

    let mut reader = SgmlReader::from_str("<br>", ReaderOpts::default());
    assert!(reader.read().unwrap());
    assert_eq!(reader.name(), "html");
    assert!(reader.read().unwrap());
    assert_eq!(reader.name(), "br");
    assert!(reader.is_empty_element());
    assert_eq!(reader.depth(), 2);
}

#[test]
fn explicit_self_closing_tag_is_empty() {
    assert_eq!(html("<div/>"), "<html><div/></html>");
}

#[test]
fn attribute_traversal_reports_depths() {
    let mut reader = SgmlReader::from_str("<p class=\"a\" id='b'>x</p>", ReaderOpts::default());
    assert!(reader.read().unwrap()); // html
    assert!(reader.read().unwrap()); // p
    assert_eq!(reader.node_kind(), NodeKind::Element);
    let elem_depth = reader.depth();
    assert_eq!(reader.attribute_count(), 2);

    assert!(reader.move_to_first_attribute());
    assert_eq!(reader.node_kind(), NodeKind::Attribute);
    assert_eq!(reader.name(), "class");
    assert_eq!(&*reader.value(), "a");
    assert_eq!(reader.depth(), elem_depth);
    assert_eq!(reader.quote_char(), '"');

    assert!(reader.read_attribute_value());
    assert_eq!(reader.depth(), elem_depth + 1);
    assert_eq!(&*reader.value(), "a");
    assert!(!reader.read_attribute_value());

    assert!(reader.move_to_next_attribute());
    assert_eq!(reader.name(), "id");
    assert_eq!(reader.quote_char(), '\'');

    assert!(!reader.move_to_next_attribute());
    assert_eq!(reader.name(), "id");

    assert!(reader.move_to_element());
    assert_eq!(reader.node_kind(), NodeKind::Element);
    assert_eq!(reader.name(), "p");

    assert!(reader.move_to_attribute("id"));
    assert_eq!(&*reader.value(), "b");
    // read() from an attribute resumes at the element's content.
    assert!(reader.read().unwrap());
    assert_eq!(reader.node_kind(), NodeKind::Text);
    assert_eq!(&*reader.value(), "x");
}

#[test]
fn read_string_concatenates_character_data() {
    let mut reader = SgmlReader::from_str("<p>hello &amp; more</p>", ReaderOpts::default());
    assert!(reader.read().unwrap()); // html
    assert!(reader.read().unwrap()); // p
    assert_eq!(&*reader.read_string().unwrap(), "hello & more");
}

#[test]
fn inner_and_outer_xml() {
    let opts = ReaderOpts::default();
    let mut reader = SgmlReader::from_str("<div><p>a</p></div>", opts.clone());
    assert!(reader.read().unwrap()); // html
    assert!(reader.read().unwrap()); // div
    assert_eq!(reader.read_outer_xml().unwrap(), "<div><p>a</p></div>");
    assert_eq!(reader.node_kind(), NodeKind::EndElement);
    assert_eq!(reader.name(), "html");

    let mut reader = SgmlReader::from_str("<div><p>a</p></div>", opts);
    assert!(reader.read().unwrap());
    assert!(reader.read().unwrap());
    assert_eq!(reader.read_inner_xml().unwrap(), "<p>a</p>");
}

#[test]
fn doctype_is_stripped_by_default() {
    assert_eq!(html("<!DOCTYPE html><p>x</p>"), "<html><p>x</p></html>");
}

#[test]
fn doctype_event_when_not_stripped() {
    let opts = ReaderOpts {
        strip_doctype: false,
        ..Default::default()
    };
    assert_eq!(
        to_xml("<!DOCTYPE html><p>x</p>", opts).unwrap(),
        "<!DOCTYPE html><html><p>x</p></html>"
    );
}

#[test]
fn doctype_public_gets_an_empty_system_literal() {
    let opts = ReaderOpts {
        strip_doctype: false,
        ..Default::default()
    };
    let out = to_xml(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\"><p>x</p>",
        opts,
    )
    .unwrap();
    assert!(
        out.starts_with("<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"\">"),
        "got {out}"
    );
}

#[test]
fn doctype_identifiers_are_captured() {
    let mut reader = SgmlReader::from_str(
        "<!DOCTYPE html PUBLIC \"pub-id\" \"sys-id\"><p>x</p>",
        ReaderOpts::default(),
    );
    assert!(reader.read().unwrap());
    assert_eq!(reader.doc_type(), Some("html"));
    assert_eq!(reader.public_id(), Some("pub-id"));
    assert_eq!(reader.system_literal(), Some("sys-id"));
}

#[test]
fn case_folding_applies_to_all_names() {
    let opts = ReaderOpts {
        case_folding: CaseFolding::ToUpper,
        ..Default::default()
    };
    assert_eq!(
        to_xml("<p Class=x>y</p>", opts).unwrap(),
        "<HTML><P CLASS=\"x\">y</P></HTML>"
    );

    let opts = ReaderOpts {
        case_folding: CaseFolding::ToLower,
        ..Default::default()
    };
    assert_eq!(
        to_xml("<P CLASS=x>y</P>", opts).unwrap(),
        "<html><p class=\"x\">y</p></html>"
    );
}

#[test]
fn mismatched_end_tag_case_still_matches() {
    assert_eq!(html("<P>x</p>"), "<html><P>x</P></html>");
}

#[test]
fn whitespace_suppression() {
    let opts = ReaderOpts {
        whitespace_handling: WhitespaceHandling::None,
        ..Default::default()
    };
    let mut reader = SgmlReader::from_str("<p> </p> <p>x</p>", opts);
    let mut kinds = Vec::new();
    while reader.read().unwrap() {
        kinds.push(reader.node_kind());
    }
    assert!(!kinds.contains(&NodeKind::Whitespace));
    assert!(!kinds.contains(&NodeKind::SignificantWhitespace));
}

#[test]
fn xml_declaration_is_discarded() {
    assert_eq!(
        html("<?xml version=\"1.0\"?><p>x</p>"),
        "<html><p>x</p></html>"
    );
}

#[test]
fn processing_instructions_survive() {
    assert_eq!(
        html("<?php echo('x')?><p>x</p>"),
        "<?php echo('x')?><html><p>x</p></html>"
    );
}

#[test]
fn pi_target_prefix_is_stripped() {
    assert_eq!(html("<?mso:x data?><p>y</p>"), "<?x data?><html><p>y</p></html>");
}

#[test]
fn asp_blocks_become_cdata() {
    assert_eq!(
        html("<p><% code %></p>"),
        "<html><p><![CDATA[ code ]]></p></html>"
    );
}

#[test]
fn explicit_cdata_sections_pass_through() {
    assert_eq!(
        html("<p><![CDATA[a<b]]></p>"),
        "<html><p><![CDATA[a<b]]></p></html>"
    );
}

#[test]
fn conditional_sections_are_swallowed() {
    assert_eq!(
        html("<p><![if !IE]>x<![endif]>y</p>"),
        "<html><p>xy</p></html>"
    );
}

#[test]
fn entity_references_expand() {
    assert_eq!(
        html("<p>&amp; &#65; &copy;</p>"),
        "<html><p>&amp; A \u{a9}</p></html>"
    );
}

#[test]
fn undefined_entities_stay_literal() {
    assert_eq!(html("<p>&nosuch; x</p>"), "<html><p>&amp;nosuch; x</p></html>");
}

#[test]
fn entity_without_semicolon_keeps_next_char() {
    assert_eq!(html("<p>a&ampb</p>"), "<html><p>a&amp;ampb</p></html>");
    assert_eq!(html("<p>a&amp;b</p>"), "<html><p>a&amp;b</p></html>");
}

#[test]
fn astral_character_references() {
    assert_eq!(
        html("<p>&#x1D11E;</p>"),
        "<html><p>\u{1D11E}</p></html>"
    );
}

#[test]
fn stray_less_than_is_text() {
    assert_eq!(html("<p>1 < 2</p>"), "<html><p>1 &lt; 2</p></html>");
}

#[test]
fn significant_whitespace_follows_preserve_scopes() {
    let opts = ReaderOpts {
        whitespace_handling: WhitespaceHandling::Significant,
        ..Default::default()
    };
    let input = "<div xml:space=\"preserve\"> </div><div> </div>";
    let mut reader = SgmlReader::from_str(input, opts);
    let mut significant = 0;
    let mut plain = 0;
    while reader.read().unwrap() {
        match reader.node_kind() {
            NodeKind::SignificantWhitespace => significant += 1,
            NodeKind::Whitespace => plain += 1,
            _ => {},
        }
    }
    assert_eq!(significant, 1);
    assert_eq!(plain, 0);
}

#[test]
fn xml_space_and_lang_scopes_are_inherited() {
    let mut reader = SgmlReader::from_str(
        "<div xml:lang=\"en\" xml:space=\"preserve\"><p>x</p></div>",
        ReaderOpts::default(),
    );
    loop {
        assert!(reader.read().unwrap());
        if reader.node_kind() == NodeKind::Element && reader.name() == "p" {
            break;
        }
    }
    assert_eq!(reader.xml_lang(), "en");
    assert_eq!(reader.xml_space(), sgml5ever::XmlSpace::Preserve);
}

#[test]
fn close_releases_the_input() {
    let mut reader = SgmlReader::from_str("<p>x</p>", ReaderOpts::default());
    assert!(reader.read().unwrap());
    reader.close();
    assert!(!reader.read().unwrap());
    assert_eq!(reader.node_kind(), NodeKind::None);
}
