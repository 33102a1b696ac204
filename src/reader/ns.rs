// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Prefix resolution over the open-element stack.
//!
//! Declarations are ordinary `xmlns` / `xmlns:p` attributes on open
//! elements; the reader walks the stack top-down at query time.  A prefix
//! nobody declared still resolves, to a coined placeholder URI, so the
//! emitted stream stays namespace-well-formed.

use std::collections::HashMap;

use markup5ever::{Namespace, Prefix};

use crate::reader::frame::Frame;

pub(crate) static XML_URI: &str = "http://www.w3.org/XML/1998/namespace";
pub(crate) static XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// Placeholder URIs for prefixes the input never declares: `#unknown` for
/// the first, then `#unknown1`, `#unknown2`, ...  Lifetime is the reader.
pub(crate) struct UnknownNamespaces {
    map: HashMap<Prefix, Namespace>,
    next: u32,
}

impl UnknownNamespaces {
    pub(crate) fn new() -> UnknownNamespaces {
        UnknownNamespaces {
            map: HashMap::new(),
            next: 0,
        }
    }

    pub(crate) fn uri_for(&mut self, prefix: &Prefix) -> Namespace {
        if let Some(uri) = self.map.get(prefix) {
            return uri.clone();
        }
        let uri = if self.next == 0 {
            Namespace::from("#unknown")
        } else {
            Namespace::from(&*format!("#unknown{}", self.next))
        };
        self.next += 1;
        self.map.insert(prefix.clone(), uri.clone());
        uri
    }
}

/// The URI an element's attributes declare for `prefix` (`None` = the
/// default namespace), if any.  An empty attribute value undeclares,
/// mapping back to the empty namespace.
pub(crate) fn declared_uri(frame: &Frame, prefix: Option<&str>) -> Option<Namespace> {
    for i in 0..frame.attribute_count() {
        let attr = frame.attribute(i).expect("attribute index in range");
        let name = attr.name();
        let declares = match prefix {
            None => name.prefix.is_none() && &*name.local == "xmlns",
            Some(p) => name.prefix.as_deref() == Some("xmlns") && &*name.local == p,
        };
        if declares {
            let uri = attr.value().map(|v| Namespace::from(&**v));
            return Some(uri.unwrap_or_else(|| Namespace::from("")));
        }
    }
    None
}
