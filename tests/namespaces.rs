// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Prefix resolution against `xmlns` declarations on the open stack, and
//! the `#unknown` placeholders that keep undeclared prefixes
//! namespace-well-formed.

use sgml5ever::{NodeKind, ReaderOpts, SgmlReader};

fn plain() -> ReaderOpts {
    ReaderOpts {
        doc_type: None,
        ..Default::default()
    }
}

fn read_to_element(reader: &mut SgmlReader, name: &str) {
    loop {
        assert!(reader.read().unwrap(), "never saw element '{name}'");
        if reader.node_kind() == NodeKind::Element && reader.name() == name {
            return;
        }
    }
}

#[test]
fn declared_prefix_resolves() {
    let mut reader = SgmlReader::from_str(
        "<root xmlns:a=\"urn:x\"><a:child>t</a:child></root>",
        plain(),
    );
    read_to_element(&mut reader, "a:child");
    assert_eq!(reader.prefix(), "a");
    assert_eq!(reader.local_name(), "child");
    assert_eq!(reader.namespace_uri(), "urn:x");
}

#[test]
fn default_namespace_covers_descendants() {
    let mut reader = SgmlReader::from_str(
        "<root xmlns=\"urn:d\"><child>t</child></root>",
        plain(),
    );
    read_to_element(&mut reader, "root");
    assert_eq!(reader.namespace_uri(), "urn:d");
    read_to_element(&mut reader, "child");
    assert_eq!(reader.namespace_uri(), "urn:d");
}

#[test]
fn inner_declaration_shadows_outer() {
    let mut reader = SgmlReader::from_str(
        "<root xmlns:a=\"urn:outer\"><mid xmlns:a=\"urn:inner\"><a:x>t</a:x></mid></root>",
        plain(),
    );
    read_to_element(&mut reader, "a:x");
    assert_eq!(reader.namespace_uri(), "urn:inner");
}

#[test]
fn unknown_prefixes_get_placeholders() {
    // Office-style markup with undeclared prefixes.
    let mut reader = SgmlReader::from_str("<root><o:p>a</o:p><v:shape>b</v:shape></root>", plain());
    read_to_element(&mut reader, "o:p");
    assert_eq!(reader.namespace_uri(), "#unknown");
    read_to_element(&mut reader, "v:shape");
    assert_eq!(reader.namespace_uri(), "#unknown1");
}

#[test]
fn placeholders_are_stable_per_prefix() {
    let mut reader = SgmlReader::from_str("<root><o:a>x</o:a><o:b>y</o:b></root>", plain());
    read_to_element(&mut reader, "o:a");
    assert_eq!(reader.namespace_uri(), "#unknown");
    read_to_element(&mut reader, "o:b");
    assert_eq!(reader.namespace_uri(), "#unknown");
}

#[test]
fn reserved_prefixes_resolve_without_declarations() {
    let mut reader = SgmlReader::from_str("<root><xml:thing>x</xml:thing></root>", plain());
    read_to_element(&mut reader, "xml:thing");
    assert_eq!(
        reader.namespace_uri(),
        "http://www.w3.org/XML/1998/namespace"
    );
}

#[test]
fn attribute_namespaces() {
    let mut reader = SgmlReader::from_str(
        "<root xmlns:a=\"urn:x\" a:attr=\"1\" plain=\"2\">t</root>",
        plain(),
    );
    read_to_element(&mut reader, "root");

    assert!(reader.move_to_attribute("xmlns:a"));
    assert_eq!(reader.namespace_uri(), "http://www.w3.org/2000/xmlns/");

    assert!(reader.move_to_attribute("a:attr"));
    assert_eq!(reader.namespace_uri(), "urn:x");

    // An unprefixed attribute is in no namespace, even with a default
    // declaration in scope.
    assert!(reader.move_to_attribute("plain"));
    assert_eq!(reader.namespace_uri(), "");
}

#[test]
fn default_xmlns_attribute_reports_the_xmlns_uri() {
    let mut reader = SgmlReader::from_str("<root xmlns=\"urn:d\">t</root>", plain());
    read_to_element(&mut reader, "root");
    assert!(reader.move_to_attribute("xmlns"));
    assert_eq!(reader.namespace_uri(), "http://www.w3.org/2000/xmlns/");
}

#[test]
fn undeclared_unprefixed_element_is_in_no_namespace() {
    let mut reader = SgmlReader::from_str("<root><child>t</child></root>", plain());
    read_to_element(&mut reader, "child");
    assert_eq!(reader.namespace_uri(), "");
}
