// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fatal error conditions and the recoverable diagnostic record.

use std::fmt;
use std::io;

/// The conditions that abort reading.  Everything else the reader repairs
/// and reports through the diagnostic handler.
#[derive(Debug)]
pub enum Error {
    /// Neither an input stream nor an `href` was configured.
    MissingInput,
    /// The document's DOCTYPE names a different root than the loaded DTD.
    DtdMismatch { declared: String, loaded: String },
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::MissingInput => write!(f, "no input configured: set an input stream or href"),
            Error::DtdMismatch {
                ref declared,
                ref loaded,
            } => write!(
                f,
                "DOCTYPE names '{declared}' but the loaded DTD declares '{loaded}'"
            ),
            Error::Io(ref e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

/// One recoverable diagnostic: where the reader was and what it repaired.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Name of the entity being read; empty for the document entity.
    pub entity: String,
    /// Resolved URI of that entity, path only.
    pub uri: String,
    pub line: u64,
    pub column: u64,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity.is_empty() {
            write!(
                f,
                "{}({},{}): {}",
                self.uri, self.line, self.column, self.message
            )
        } else {
            write!(
                f,
                "{}({},{}): in entity '{}': {}",
                self.uri, self.line, self.column, self.entity, self.message
            )
        }
    }
}

/// Receives one [`ParseError`] per repaired problem.  Handlers must not
/// fail; diagnostics are informational and reading continues.
pub type ErrorHandler = Box<dyn FnMut(&ParseError)>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_position() {
        let e = ParseError {
            entity: String::new(),
            uri: "doc.html".into(),
            line: 3,
            column: 14,
            message: "duplicate attribute 'class'".into(),
        };
        assert_eq!(e.to_string(), "doc.html(3,14): duplicate attribute 'class'");
    }

    #[test]
    fn display_names_the_entity() {
        let e = ParseError {
            entity: "chapter".into(),
            uri: "chap1.sgml".into(),
            line: 1,
            column: 2,
            message: "undefined entity".into(),
        };
        assert_eq!(
            e.to_string(),
            "chap1.sgml(1,2): in entity 'chapter': undefined entity"
        );
    }
}
