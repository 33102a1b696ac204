// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! High-level entry points for the common "repair this document" case.

use std::io::Read;

use crate::error::Error;
use crate::reader::{ReaderOpts, SgmlReader};
use crate::serialize::XmlWriter;

fn drain(mut reader: SgmlReader) -> Result<String, Error> {
    let mut out = String::new();
    {
        let mut writer = XmlWriter::new(&mut out);
        while reader.read()? {
            reader
                .write_event(&mut writer)
                .expect("writing to a String cannot fail");
        }
    }
    Ok(out)
}

/// Read `input` to exhaustion and return the repaired document as one
/// well-formed XML string.
///
/// ```
/// use sgml5ever::driver;
///
/// let xml = driver::to_xml("<p class=foo>x</p>", Default::default()).unwrap();
/// assert_eq!(xml, "<html><p class=\"foo\">x</p></html>");
/// ```
pub fn to_xml(input: &str, opts: ReaderOpts) -> Result<String, Error> {
    drain(SgmlReader::from_str(input, opts))
}

/// Like [`to_xml`], for a byte stream.
pub fn stream_to_xml<R: Read + 'static>(input: R, opts: ReaderOpts) -> Result<String, Error> {
    drain(SgmlReader::from_stream(input, opts))
}
