// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Character-level input: one [`Entity`] per character source, with line
//! tracking, pushback, literal and token scanning, and numeric
//! character-reference expansion.
//!
//! External entities nest: expanding one pushes the current source and
//! makes the child current; at its end the parent resumes.  The discipline
//! is strictly LIFO.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use markup5ever::buffer_queue::BufferQueue;
use tendril::StrTendril;

use crate::util::str::is_ascii_whitespace;

/// One character source: the document, an external entity, or a literal.
pub struct Entity {
    name: String,
    uri: String,
    base: Option<PathBuf>,
    input: BufferQueue,
    line: u64,
    column: u64,
    parent: Option<Box<Entity>>,
}

fn normalize_newlines(text: &str) -> StrTendril {
    let mut out = StrTendril::with_capacity(text.len() as u32);
    let mut chars = text.chars().peekable();
    // Strip a leading BOM; it is not content.
    if chars.peek() == Some(&'\u{feff}') {
        chars.next();
    }
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push_char('\n');
        } else {
            out.push_char(c);
        }
    }
    out
}

impl Entity {
    /// Build an entity over in-memory text.
    pub fn for_str(name: &str, uri: &str, text: &str) -> Entity {
        let input = BufferQueue::default();
        input.push_back(normalize_newlines(text));
        Entity {
            name: name.to_string(),
            uri: uri.to_string(),
            base: None,
            input,
            line: 1,
            column: 1,
            parent: None,
        }
    }

    /// Build an entity by draining a byte stream; bytes decode
    /// UTF-8-lossily (encoding sniffing is out of scope here).
    pub fn from_stream(name: &str, uri: &str, stream: &mut dyn Read) -> io::Result<Entity> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(Entity::for_str(name, uri, &String::from_utf8_lossy(&bytes)))
    }

    /// Resolve `href` against `base` and open it.  Only the local
    /// filesystem is reachable: a plain path or a `file:` URL.
    pub fn open_href(name: &str, href: &str, base: Option<&Path>) -> io::Result<Entity> {
        if let Some((scheme, _)) = href.split_once(':') {
            if scheme.len() > 1 && !scheme.eq_ignore_ascii_case("file") {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported scheme '{scheme}' for entity '{name}'"),
                ));
            }
        }
        let trimmed = href
            .strip_prefix("file://")
            .or_else(|| href.strip_prefix("file:"))
            .unwrap_or(href);
        let path = match base {
            Some(base) if Path::new(trimmed).is_relative() => base.join(trimmed),
            _ => PathBuf::from(trimmed),
        };
        let text = std::fs::read_to_string(&path)?;
        let mut entity = Entity::for_str(name, &path.to_string_lossy(), &text);
        entity.base = path.parent().map(Path::to_path_buf);
        Ok(entity)
    }

    pub fn set_base(&mut self, base: Option<PathBuf>) {
        self.base = base;
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Current position, one-based.
    pub fn position(&self) -> (u64, u64) {
        (self.line, self.column)
    }

    /// Make `parent` resumable once this entity is exhausted.
    pub fn open(mut self, parent: Entity) -> Entity {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Close this entity and resume its parent, if any.
    pub fn close(mut self) -> Option<Entity> {
        self.parent.take().map(|p| *p)
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Advance one character.  Line and column track consumed input.
    pub fn read_char(&mut self) -> Option<char> {
        let c = self.input.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Look at the next character without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.input.peek()
    }

    /// Put one character back; it will be the next read.
    pub fn unread(&mut self, c: char) {
        self.input.push_front(StrTendril::from_char(c));
        self.column = self.column.saturating_sub(1);
    }

    /// Consume ASCII whitespace; the returned character is the next
    /// non-whitespace one, still unconsumed.
    pub fn skip_whitespace(&mut self) -> Option<char> {
        loop {
            let c = self.peek_char()?;
            if !is_ascii_whitespace(c) {
                return Some(c);
            }
            self.read_char();
        }
    }

    /// Append characters to `buf` until one of `terminators` (left
    /// unconsumed) or end of input.
    pub fn scan_token(&mut self, buf: &mut StrTendril, terminators: &str) {
        while let Some(c) = self.peek_char() {
            if terminators.contains(c) {
                break;
            }
            self.read_char();
            buf.push_char(c);
        }
    }

    /// Scan a quoted literal up to (and consuming) the closing `quote`,
    /// expanding numeric character references and the five XML built-in
    /// entities along the way.  Returns false if input ended first.
    pub fn scan_literal(&mut self, buf: &mut StrTendril, quote: char) -> bool {
        while let Some(c) = self.read_char() {
            if c == quote {
                return true;
            }
            if c == '&' {
                self.expand_simple_entity(buf);
            } else {
                buf.push_char(c);
            }
        }
        false
    }

    /// Consume input up to and including the multi-character `marker`,
    /// appending everything before it to `buf`.  Returns false when input
    /// ended before the marker was found.
    pub fn scan_to_end(&mut self, buf: &mut StrTendril, marker: &str) -> bool {
        debug_assert!(!marker.is_empty());
        while let Some(c) = self.read_char() {
            buf.push_char(c);
            if buf.ends_with(marker) {
                buf.pop_back(marker.len() as u32);
                return true;
            }
        }
        false
    }

    // The '&' has been consumed.  Expands `&#...;` plus amp/lt/gt/quot/apos;
    // anything else is kept literal.
    fn expand_simple_entity(&mut self, buf: &mut StrTendril) {
        match self.peek_char() {
            Some('#') => {
                self.read_char();
                self.expand_char_entity(buf);
            },
            Some(c) if c.is_ascii_alphabetic() => {
                let mut name = StrTendril::new();
                while let Some(c) = self.peek_char() {
                    if !c.is_ascii_alphanumeric() {
                        break;
                    }
                    self.read_char();
                    name.push_char(c);
                }
                let semi = self.peek_char() == Some(';');
                if semi {
                    self.read_char();
                }
                match &*name {
                    "amp" => buf.push_char('&'),
                    "lt" => buf.push_char('<'),
                    "gt" => buf.push_char('>'),
                    "quot" => buf.push_char('"'),
                    "apos" => buf.push_char('\''),
                    _ => {
                        buf.push_char('&');
                        buf.push_tendril(&name);
                        if semi {
                            buf.push_char(';');
                        }
                    },
                }
            },
            _ => buf.push_char('&'),
        }
    }

    /// Expand a numeric character reference; `&#` has been consumed.
    /// An invalid or incomplete reference is appended verbatim so no
    /// input is lost.
    pub fn expand_char_entity(&mut self, buf: &mut StrTendril) {
        let (base, marker) = match self.peek_char() {
            Some(c @ ('x' | 'X')) => {
                self.read_char();
                (16, Some(c))
            },
            _ => (10, None),
        };
        let mut digits = String::new();
        while let Some(c) = self.peek_char() {
            if c.to_digit(base).is_none() {
                break;
            }
            self.read_char();
            digits.push(c);
        }
        let semi = self.peek_char() == Some(';');
        if semi {
            self.read_char();
        }

        let scalar = if digits.is_empty() {
            None
        } else {
            u32::from_str_radix(&digits, base)
                .ok()
                .and_then(char::from_u32)
                .filter(|&c| c != '\0')
        };
        match scalar {
            Some(c) => buf.push_char(c),
            None => {
                // Keep the reference verbatim; the writer will escape it.
                buf.push_slice("&#");
                if let Some(m) = marker {
                    buf.push_char(m);
                }
                buf.push_slice(&digits);
                if semi {
                    buf.push_char(';');
                }
            },
        }
    }
}
