// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A small well-formed XML writer.
//!
//! Backs the reader's `read_inner_xml` / `read_outer_xml` helpers and the
//! whole-document conversion in [`crate::driver`].  Only what an event
//! stream needs: tags, attributes, text, CDATA, comments, processing
//! instructions and the document type, with the XML escaping rules.

use std::fmt::{self, Write};

enum Escape {
    Text,
    Attribute(char),
}

fn write_escaped<W: Write>(w: &mut W, text: &str, mode: Escape) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => w.write_str("&amp;")?,
            '<' => w.write_str("&lt;")?,
            '>' => w.write_str("&gt;")?,
            '"' if matches!(mode, Escape::Attribute('"')) => w.write_str("&quot;")?,
            '\'' if matches!(mode, Escape::Attribute('\'')) => w.write_str("&apos;")?,
            c => w.write_char(c)?,
        }
    }
    Ok(())
}

/// Writes one XML event at a time to any `fmt::Write` sink.
pub struct XmlWriter<W: Write> {
    out: W,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> XmlWriter<W> {
        XmlWriter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        subset: Option<&str>,
    ) -> fmt::Result {
        write!(self.out, "<!DOCTYPE {name}")?;
        if let Some(public) = public_id {
            write!(self.out, " PUBLIC \"{public}\"")?;
            // A PUBLIC id is only well-formed with a system literal after it.
            write!(self.out, " \"{}\"", system_id.unwrap_or(""))?;
        } else if let Some(system) = system_id {
            write!(self.out, " SYSTEM \"{system}\"")?;
        }
        if let Some(subset) = subset {
            write!(self.out, " [{subset}]")?;
        }
        self.out.write_str(">")
    }

    /// Write a start tag.  Attribute quote characters come from the
    /// source where known; an unquoted or defaulted attribute gets `"`.
    pub fn start_elem<'a, I>(&mut self, name: &str, attrs: I, empty: bool) -> fmt::Result
    where
        I: Iterator<Item = (String, &'a str, Option<char>)>,
    {
        write!(self.out, "<{name}")?;
        for (attr_name, value, quote) in attrs {
            let quote = match quote {
                Some(q @ ('"' | '\'')) => q,
                _ => '"',
            };
            write!(self.out, " {attr_name}={quote}")?;
            write_escaped(&mut self.out, value, Escape::Attribute(quote))?;
            self.out.write_char(quote)?;
        }
        if empty {
            self.out.write_str("/>")
        } else {
            self.out.write_str(">")
        }
    }

    pub fn end_elem(&mut self, name: &str) -> fmt::Result {
        write!(self.out, "</{name}>")
    }

    pub fn text(&mut self, text: &str) -> fmt::Result {
        write_escaped(&mut self.out, text, Escape::Text)
    }

    /// The reader strips `]]>` out of CDATA values, so the section can be
    /// written verbatim.
    pub fn cdata(&mut self, text: &str) -> fmt::Result {
        write!(self.out, "<![CDATA[{text}]]>")
    }

    pub fn comment(&mut self, text: &str) -> fmt::Result {
        write!(self.out, "<!--{text}-->")
    }

    pub fn pi(&mut self, target: &str, data: &str) -> fmt::Result {
        if data.is_empty() {
            write!(self.out, "<?{target}?>")
        } else {
            write!(self.out, "<?{target} {data}?>")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let mut w = XmlWriter::new(String::new());
        w.start_elem(
            "a",
            std::iter::once(("href".to_string(), "x&y\"z", Some('"'))),
            false,
        )
        .unwrap();
        w.text("1 < 2 & 3").unwrap();
        w.end_elem("a").unwrap();
        assert_eq!(
            w.into_inner(),
            "<a href=\"x&amp;y&quot;z\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn empty_elements_self_close() {
        let mut w = XmlWriter::new(String::new());
        w.start_elem("br", std::iter::empty(), true).unwrap();
        assert_eq!(w.into_inner(), "<br/>");
    }

    #[test]
    fn doctype_repairs_missing_system_literal() {
        let mut w = XmlWriter::new(String::new());
        w.doctype(
            "HTML",
            Some("-//W3C//DTD HTML 4.01//EN"),
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            w.into_inner(),
            "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"\">"
        );
    }

    #[test]
    fn single_quoted_attributes_keep_their_quote() {
        let mut w = XmlWriter::new(String::new());
        w.start_elem(
            "p",
            std::iter::once(("title".to_string(), "it's", Some('\''))),
            false,
        )
        .unwrap();
        assert_eq!(w.into_inner(), "<p title='it&apos;s'>");
    }
}
