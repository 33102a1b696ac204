// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A pull-style reader that turns real-world SGML/HTML into a stream of
//! well-formed XML events.
//!
//! This crate trades strictness for recovery: unquoted attribute values,
//! duplicated attributes, mismatched tag case, omitted end tags, stray
//! characters and broken entity references are all repaired on the way
//! through, guided by a DTD that knows which end tags a document was
//! allowed to leave out.  The consumer sees only a clean cursor:
//!
//! ```
//! use sgml5ever::{NodeKind, ReaderOpts, SgmlReader};
//!
//! let mut reader = SgmlReader::from_str("<p>a<p>b</p>", ReaderOpts::default());
//! let mut names = Vec::new();
//! while reader.read().unwrap() {
//!     if reader.node_kind() == NodeKind::Element {
//!         names.push(reader.name());
//!     }
//! }
//! assert_eq!(names, ["html", "p", "p"]);
//! ```
//!
//! What isn't in scope for this library:
//!
//!   * validating SGML in the formal sense
//!   * SGML features HTML never used (short references, marked sections
//!     beyond CDATA and conditional comments)
//!   * fetching documents over HTTP, or sniffing their encodings

#![crate_name = "sgml5ever"]

pub use markup5ever::*;

/// Re-export the tendril crate.
pub use tendril;

mod macros;

mod util {
    pub mod str;
}

pub mod driver;
pub mod dtd;
pub mod entity;
pub mod error;
pub mod reader;
pub mod serialize;

pub use crate::error::{Error, ErrorHandler, ParseError};
pub use crate::reader::{
    CaseFolding, NodeKind, ReaderOpts, SgmlReader, WhitespaceHandling, XmlSpace,
};
