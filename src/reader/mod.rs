// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The pull reader.
//!
//! [`SgmlReader`] is a cursor over lenient SGML/HTML input.  Each call to
//! [`read`](SgmlReader::read) advances to the next event of a well-formed
//! XML stream, repairing the input as it goes: quoting attribute values,
//! dropping duplicates, matching end tags case-insensitively, and
//! synthesizing the end events a DTD says the document was allowed to
//! omit.

pub mod frame;
mod ns;
pub mod states;

use std::cell::RefCell;
use std::fmt;
use std::io::Read;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use markup5ever::{Namespace, QualName};
use tendril::StrTendril;

use crate::dtd::html::html_dtd;
use crate::dtd::{Dtd, EntityDef};
use crate::entity::Entity;
use crate::error::{Error, ErrorHandler, ParseError};
use crate::macros::unwrap_or_return;
use crate::serialize::XmlWriter;
use crate::util::str::{
    is_all_whitespace, is_ascii_whitespace, is_name_start, is_valid_ncname, is_valid_nmtoken,
    is_valid_xml_name,
};

pub use self::frame::{Frame, FrameAttr, HwStack, NodeKind, XmlSpace};
use self::frame::{qual_name, raw_name};
use self::ns::{declared_uri, UnknownNamespaces, XMLNS_URI, XML_URI};
pub use self::states::ReaderState;
use self::states::*;

/// Case normalization applied to element and attribute names at scan time.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug, Default)]
pub enum CaseFolding {
    /// Keep names as written; matching is ASCII-case-insensitive.
    #[default]
    None,
    ToUpper,
    ToLower,
}

/// What to do with whitespace-only text runs.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug, Default)]
pub enum WhitespaceHandling {
    /// Report all whitespace.
    #[default]
    All,
    /// Report whitespace only inside an `xml:space="preserve"` scope.
    Significant,
    /// Report no whitespace-only events at all.
    None,
}

/// Reader options, with an impl for `Default`.
///
/// Everything here takes effect before the first `read`; changing options
/// afterwards has no effect.
#[derive(Clone)]
pub struct ReaderOpts {
    /// The declared root element.  `HTML` (the default) switches on HTML
    /// mode: the built-in HTML DTD is loaded and a missing `html` root is
    /// synthesized.
    pub doc_type: Option<String>,
    /// DOCTYPE public identifier, if known up front.
    pub public_id: Option<String>,
    /// DOCTYPE system literal, if known up front.
    pub system_literal: Option<String>,
    /// DOCTYPE internal subset, if known up front.
    pub internal_subset: Option<String>,
    /// Resolution root for external entities; defaults to the input's own
    /// location.
    pub base_uri: Option<String>,
    /// Path or `file:` URL of the document; an alternative to handing the
    /// reader an in-memory input.
    pub href: Option<String>,
    pub case_folding: CaseFolding,
    pub whitespace_handling: WhitespaceHandling,
    /// Suppress the DOCTYPE event.  Default: true.
    pub strip_doctype: bool,
    /// Never load any DTD, not even the built-in HTML one.  Repair then
    /// degrades to the permissive default.
    pub ignore_dtd: bool,
    /// A preloaded DTD to use instead of lazy loading.
    pub dtd: Option<Arc<Dtd>>,
}

impl Default for ReaderOpts {
    fn default() -> ReaderOpts {
        ReaderOpts {
            doc_type: Some("HTML".to_string()),
            public_id: None,
            system_literal: None,
            internal_subset: None,
            base_uri: None,
            href: None,
            case_folding: CaseFolding::None,
            whitespace_handling: WhitespaceHandling::All,
            strip_doctype: true,
            ignore_dtd: false,
            dtd: None,
        }
    }
}

enum InputSource {
    Text(String),
    Stream(Box<dyn Read>),
}

// Terminator sets for the token scanner.
static TAG_NAME_TERM: &str = " \t\n/><";
static ATTR_NAME_TERM: &str = " \t\n=/><";
static UNQUOTED_VALUE_TERM: &str = " \t\n><";
static END_TAG_NAME_TERM: &str = "> \t\n";

// The legacy set of stray punctuation silently skipped inside start tags.
static STRAY_PUNCTUATION: &str = ",=:;";

type PendingEvent = (NodeKind, Option<String>, StrTendril);

/// A pull-style reader that turns SGML/HTML input into well-formed XML
/// events.
///
/// ```no_run
/// use sgml5ever::{ReaderOpts, SgmlReader};
///
/// let mut reader = SgmlReader::from_str("<p class=foo>x", ReaderOpts::default());
/// while reader.read().unwrap() {
///     println!("{:?} {}", reader.node_kind(), reader.name());
/// }
/// ```
pub struct SgmlReader {
    opts: ReaderOpts,
    handler: Option<ErrorHandler>,
    input: Option<InputSource>,
    entity: Option<Entity>,
    dtd: Option<Arc<Dtd>>,
    stack: HwStack<Frame>,
    state: ReaderState,
    /// Index of the frame backing the current event.  After an end event
    /// this points one past the live count; the slot stays readable.
    node: usize,
    kind: NodeKind,
    attr_pos: Option<usize>,
    saved_kind: NodeKind,
    /// The open element an explicit end tag resolved to.
    end_tag: Option<QualName>,
    pop_to_depth: usize,
    /// Start tag parked while AutoClose drains toward `pop_to_depth`.
    pending_frame: Option<Frame>,
    /// Comment/PI scanned out of CDATA content, awaiting its own `read`.
    pending_event: Option<PendingEvent>,
    html_mode: bool,
    root_seen: bool,
    root_closed: bool,
    unknown_ns: RefCell<UnknownNamespaces>,
    doc_name: Option<String>,
    public_id: Option<String>,
    system_literal: Option<String>,
    internal_subset: Option<String>,
}

impl SgmlReader {
    /// A reader that will open its input from `opts.href` on the first
    /// `read`.
    pub fn new(opts: ReaderOpts) -> SgmlReader {
        SgmlReader {
            opts,
            handler: None,
            input: None,
            entity: None,
            dtd: None,
            stack: HwStack::new(16),
            state: Initial,
            node: 0,
            kind: NodeKind::None,
            attr_pos: None,
            saved_kind: NodeKind::None,
            end_tag: None,
            pop_to_depth: 0,
            pending_frame: None,
            pending_event: None,
            html_mode: false,
            root_seen: false,
            root_closed: false,
            unknown_ns: RefCell::new(UnknownNamespaces::new()),
            doc_name: None,
            public_id: None,
            system_literal: None,
            internal_subset: None,
        }
    }

    /// A reader over in-memory input.
    pub fn from_str(input: &str, opts: ReaderOpts) -> SgmlReader {
        let mut reader = SgmlReader::new(opts);
        reader.input = Some(InputSource::Text(input.to_string()));
        reader
    }

    /// A reader over a byte stream; bytes decode UTF-8-lossily.
    pub fn from_stream<R: Read + 'static>(input: R, opts: ReaderOpts) -> SgmlReader {
        let mut reader = SgmlReader::new(opts);
        reader.input = Some(InputSource::Stream(Box::new(input)));
        reader
    }

    /// Install a diagnostic sink.  Without one, diagnostics go to
    /// `log::warn!`.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.handler = Some(handler);
    }

    /// The DTD in use, once one is loaded.
    pub fn dtd(&self) -> Option<&Arc<Dtd>> {
        self.dtd.as_ref()
    }

    /// Root name from the configuration or the parsed DOCTYPE.
    pub fn doc_type(&self) -> Option<&str> {
        self.doc_name.as_deref()
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    pub fn system_literal(&self) -> Option<&str> {
        self.system_literal.as_deref()
    }

    pub fn internal_subset(&self) -> Option<&str> {
        self.internal_subset.as_deref()
    }

    /// Release the input.  Subsequent `read` calls report exhaustion.
    pub fn close(&mut self) {
        self.entity = None;
        self.input = None;
        self.stack.truncate(1);
        self.state = Eof;
        self.kind = NodeKind::None;
        self.node = 0;
    }

    // ------------------------------------------------------------------
    // Current-event surface.

    pub fn node_kind(&self) -> NodeKind {
        self.kind
    }

    fn cur(&self) -> Option<&Frame> {
        self.stack.slot(self.node)
    }

    fn on_attr(&self) -> bool {
        matches!(self.state, Attr | AttrValue)
    }

    fn cur_attr(&self) -> Option<&FrameAttr> {
        let pos = self.attr_pos?;
        self.cur().and_then(|f| f.attribute(pos))
    }

    /// Raw name of the current event: `prefix:local` for elements and
    /// attributes, the target for PIs, empty for text.
    pub fn name(&self) -> String {
        if self.on_attr() {
            return self.cur_attr().map(|a| raw_name(a.name())).unwrap_or_default();
        }
        self.cur().map(|f| raw_name(f.name())).unwrap_or_default()
    }

    pub fn local_name(&self) -> String {
        if self.on_attr() {
            return self
                .cur_attr()
                .map(|a| a.name().local.to_string())
                .unwrap_or_default();
        }
        self.cur().map(|f| f.name().local.to_string()).unwrap_or_default()
    }

    pub fn prefix(&self) -> String {
        let name = if self.on_attr() {
            self.cur_attr().map(|a| a.name().clone())
        } else {
            self.cur().map(|f| f.name().clone())
        };
        name.and_then(|n| n.prefix.map(|p| p.to_string()))
            .unwrap_or_default()
    }

    /// Resolve the namespace URI of the current name against the `xmlns`
    /// declarations on the open-element stack.  An undeclared prefix maps
    /// to a coined `#unknown` placeholder so the stream stays
    /// namespace-well-formed.
    pub fn namespace_uri(&self) -> String {
        let (name, on_attr) = if self.on_attr() {
            match self.cur_attr() {
                Some(a) => (a.name().clone(), true),
                None => return String::new(),
            }
        } else {
            match self.cur() {
                Some(f) if matches!(self.kind, NodeKind::Element | NodeKind::EndElement) => {
                    (f.name().clone(), false)
                },
                _ => return String::new(),
            }
        };

        if on_attr && name.prefix.is_none() && &*name.local == "xmlns" {
            return XMLNS_URI.to_string();
        }
        match name.prefix {
            Some(ref p) if &**p == "xml" => return XML_URI.to_string(),
            Some(ref p) if &**p == "xmlns" => return XMLNS_URI.to_string(),
            None if on_attr => return String::new(),
            _ => {},
        }

        let prefix_str = name.prefix.as_deref();
        if let Some(uri) = self.search_declarations(prefix_str) {
            return uri.to_string();
        }
        match name.prefix {
            Some(p) => self.unknown_ns.borrow_mut().uri_for(&p).to_string(),
            // An element with no prefix and no default declaration is in
            // no namespace.
            None => String::new(),
        }
    }

    fn search_declarations(&self, prefix: Option<&str>) -> Option<Namespace> {
        let mut i = self.node.min(self.stack.count());
        loop {
            if let Some(frame) = self.stack.slot(i) {
                if frame.kind() == NodeKind::Element {
                    if let Some(uri) = declared_uri(frame, prefix) {
                        return Some(uri);
                    }
                }
            }
            if i == 0 {
                return None;
            }
            i -= 1;
        }
    }

    /// Value of the current event: text content, comment text, PI data,
    /// or the attribute value during attribute traversal.
    pub fn value(&self) -> StrTendril {
        if self.on_attr() {
            return self
                .cur_attr()
                .and_then(|a| a.value().cloned())
                .unwrap_or_default();
        }
        self.cur().map(|f| f.value().clone()).unwrap_or_default()
    }

    /// Depth of the current event; attribute values report one deeper
    /// than their owning element.
    pub fn depth(&self) -> usize {
        self.node + usize::from(self.state == AttrValue)
    }

    pub fn is_empty_element(&self) -> bool {
        !self.on_attr()
            && self.kind == NodeKind::Element
            && self.cur().is_some_and(Frame::is_empty_element)
    }

    /// Quote character of the current attribute; `"` where the input had
    /// none.
    pub fn quote_char(&self) -> char {
        self.cur_attr().and_then(FrameAttr::quote).unwrap_or('"')
    }

    /// True when the current attribute's value came from the DTD rather
    /// than the input.
    pub fn is_default(&self) -> bool {
        self.on_attr() && self.cur_attr().is_some_and(FrameAttr::is_default)
    }

    pub fn xml_space(&self) -> XmlSpace {
        self.scope_frame().map(Frame::space).unwrap_or_default()
    }

    pub fn xml_lang(&self) -> String {
        self.scope_frame().map(|f| f.lang().to_string()).unwrap_or_default()
    }

    fn scope_frame(&self) -> Option<&Frame> {
        let mut i = self.node.min(self.stack.count());
        loop {
            if let Some(frame) = self.stack.slot(i) {
                if frame.kind() == NodeKind::Element {
                    return Some(frame);
                }
            }
            if i == 0 {
                return None;
            }
            i -= 1;
        }
    }

    pub fn base_uri(&self) -> String {
        self.entity
            .as_ref()
            .map(|e| e.uri().to_string())
            .or_else(|| self.opts.base_uri.clone())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Attribute traversal.

    pub fn attribute_count(&self) -> usize {
        self.cur().map(Frame::attribute_count).unwrap_or(0)
    }

    /// Value of the named attribute of the current element, if present.
    pub fn attribute(&self, raw: &str) -> Option<StrTendril> {
        self.cur()?
            .attribute_by_raw_name(raw, true)
            .and_then(|a| a.value().cloned())
    }

    pub fn attribute_at(&self, index: usize) -> Option<StrTendril> {
        self.cur()?.attribute(index).and_then(|a| a.value().cloned())
    }

    pub fn move_to_first_attribute(&mut self) -> bool {
        self.move_to_attribute_at(0)
    }

    pub fn move_to_next_attribute(&mut self) -> bool {
        match self.attr_pos {
            None => self.move_to_attribute_at(0),
            Some(pos) => self.move_to_attribute_at(pos + 1),
        }
    }

    pub fn move_to_attribute(&mut self, raw: &str) -> bool {
        let target = qual_name(raw);
        match self.cur().and_then(|f| f.index_of_attribute(&target, true)) {
            Some(i) => self.move_to_attribute_at(i),
            None => false,
        }
    }

    pub fn move_to_attribute_at(&mut self, index: usize) -> bool {
        if index >= self.attribute_count() {
            return false;
        }
        if !self.on_attr() {
            if !matches!(self.kind, NodeKind::Element | NodeKind::Doctype) {
                return false;
            }
            let state = self.state;
            if let Some(frame) = self.stack.slot_mut(self.node) {
                frame.save_state(state);
            }
            self.saved_kind = self.kind;
        }
        self.state = Attr;
        self.kind = NodeKind::Attribute;
        self.attr_pos = Some(index);
        true
    }

    /// Step from an attribute onto its value; at most once per attribute.
    pub fn read_attribute_value(&mut self) -> bool {
        if self.state != Attr {
            return false;
        }
        self.state = AttrValue;
        self.kind = NodeKind::Text;
        true
    }

    /// Return from attribute traversal to the owning element.
    pub fn move_to_element(&mut self) -> bool {
        if !self.on_attr() {
            return false;
        }
        self.state = self
            .cur()
            .map(Frame::saved_state)
            .unwrap_or(Markup);
        self.kind = self.saved_kind;
        self.attr_pos = None;
        true
    }

    // ------------------------------------------------------------------
    // The pull loop.

    /// Advance to the next event.  `Ok(false)` only at exhaustion; `Err`
    /// only for the fatal conditions in [`Error`].
    pub fn read(&mut self) -> Result<bool, Error> {
        if self.on_attr() {
            self.move_to_element();
        }
        self.finish_previous_event();
        loop {
            debug!("read: state {:?}, depth {}", self.state, self.stack.count());
            match self.state {
                Initial => self.init()?,
                Eof => {
                    if self.stack.count() > 1 {
                        self.pop_to_depth = 1;
                        self.state = AutoClose;
                        continue;
                    }
                    self.kind = NodeKind::None;
                    self.node = 0;
                    return Ok(false);
                },
                AutoClose => {
                    if self.stack.count() > self.pop_to_depth {
                        self.emit_end_element();
                        return Ok(true);
                    }
                    if let Some(saved) = self.pending_frame.take() {
                        *self.stack.push() = saved;
                        self.node = self.stack.count() - 1;
                        self.kind = NodeKind::Element;
                        self.state = Markup;
                        self.root_seen = true;
                        return Ok(true);
                    }
                    // No parked start tag means the drain came from EOF.
                    self.state = Eof;
                },
                EndTag => {
                    if self.stack.count() <= 1 {
                        self.end_tag = None;
                        self.state = Markup;
                        continue;
                    }
                    self.emit_end_element();
                    let done = match (&self.end_tag, self.cur()) {
                        (Some(target), Some(frame)) => {
                            raw_name(frame.name()).eq_ignore_ascii_case(&raw_name(target))
                        },
                        _ => true,
                    };
                    if done {
                        self.end_tag = None;
                        self.state = Markup;
                    }
                    return Ok(true);
                },
                PseudoStartTag => {
                    // The wrapper was reported last time; now report the
                    // buffered inner event without rescanning.
                    let t = self.stack.count() - 1;
                    self.node = t;
                    let frame = self.stack.get(t).expect("buffered frame");
                    self.kind = frame.kind();
                    self.state = frame.saved_state();
                    return Ok(true);
                },
                PartialTag => {
                    self.state = Markup;
                    let c = self.read_char();
                    if self.dispatch_markup_char(c)? {
                        return Ok(true);
                    }
                },
                PartialText => {
                    self.state = Markup;
                    if self.scan_text(None)? {
                        return Ok(true);
                    }
                },
                CData => {
                    if self.scan_cdata_content()? {
                        return Ok(true);
                    }
                },
                Markup | Text => {
                    self.state = Markup;
                    if self.top_is_cdata_content() {
                        self.state = CData;
                        continue;
                    }
                    match self.read_char() {
                        None => self.state = Eof,
                        Some('<') => {
                            let c = self.read_char();
                            if self.dispatch_markup_char(c)? {
                                return Ok(true);
                            }
                        },
                        Some(c) => {
                            if self.scan_text(Some(c))? {
                                return Ok(true);
                            }
                        },
                    }
                },
                Attr | AttrValue => unreachable!("attribute states are left before the loop"),
            }
        }
    }

    fn init(&mut self) -> Result<(), Error> {
        let base_path = self.opts.base_uri.as_ref().map(PathBuf::from);
        let source = self.input.take();
        let mut entity = match source {
            Some(InputSource::Text(text)) => {
                Entity::for_str("", self.opts.href.as_deref().unwrap_or(""), &text)
            },
            Some(InputSource::Stream(mut stream)) => {
                Entity::from_stream("", self.opts.href.as_deref().unwrap_or(""), &mut *stream)?
            },
            None => match self.opts.href.clone() {
                Some(href) => Entity::open_href("", &href, base_path.as_deref())?,
                None => {
                    self.state = Eof;
                    return Err(Error::MissingInput);
                },
            },
        };
        if entity.base().is_none() {
            entity.set_base(base_path);
        }
        self.entity = Some(entity);

        self.doc_name = self.opts.doc_type.clone();
        self.public_id = self.opts.public_id.clone();
        self.system_literal = self.opts.system_literal.clone();
        self.internal_subset = self.opts.internal_subset.clone();
        self.html_mode = self
            .doc_name
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("html"));

        if let Some(dtd) = self.opts.dtd.clone() {
            if let Some(doc) = self.doc_name.as_deref() {
                if !dtd.name().eq_ignore_ascii_case(doc) {
                    self.state = Eof;
                    return Err(Error::DtdMismatch {
                        declared: doc.to_string(),
                        loaded: dtd.name().to_string(),
                    });
                }
            }
            self.dtd = Some(dtd);
        } else if self.html_mode && !self.opts.ignore_dtd {
            self.dtd = Some(html_dtd());
        }

        self.stack.push().reset(qual_name(""), NodeKind::Document);
        self.node = 0;
        self.state = Markup;
        Ok(())
    }

    /// Retire the frame behind the event reported last time: non-element
    /// events and already-reported empty elements leave the stack here.
    fn finish_previous_event(&mut self) {
        let top = match self.stack.count().checked_sub(1) {
            Some(t) if t == self.node => t,
            _ => return,
        };
        let pop = match self.kind {
            NodeKind::Element => self
                .stack
                .get(top)
                .is_some_and(Frame::is_empty_element),
            NodeKind::Text
            | NodeKind::Cdata
            | NodeKind::Comment
            | NodeKind::Pi
            | NodeKind::Doctype
            | NodeKind::Whitespace
            | NodeKind::SignificantWhitespace => true,
            _ => false,
        };
        if pop {
            self.pop_live();
        }
    }

    fn pop_live(&mut self) {
        self.stack.pop();
        if self.stack.count() == 1 && self.root_seen {
            self.root_closed = true;
        }
    }

    fn emit_end_element(&mut self) {
        let t = self.stack.count() - 1;
        self.pop_live();
        self.node = t;
        self.kind = NodeKind::EndElement;
    }

    // ------------------------------------------------------------------
    // Character access across nested entities.

    fn entity_mut(&mut self) -> &mut Entity {
        self.entity.as_mut().expect("input entity is open")
    }

    fn pop_entity(&mut self) {
        if let Some(entity) = self.entity.take() {
            self.entity = entity.close();
        }
    }

    fn read_char(&mut self) -> Option<char> {
        loop {
            let entity = self.entity.as_mut()?;
            if let Some(c) = entity.read_char() {
                return Some(c);
            }
            if entity.has_parent() {
                self.pop_entity();
            } else {
                return None;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        loop {
            let entity = self.entity.as_mut()?;
            if let Some(c) = entity.peek_char() {
                return Some(c);
            }
            if entity.has_parent() {
                self.pop_entity();
            } else {
                return None;
            }
        }
    }

    fn skip_whitespace(&mut self) -> Option<char> {
        loop {
            let c = self.peek_char()?;
            if !is_ascii_whitespace(c) {
                return Some(c);
            }
            self.read_char();
        }
    }

    fn skip_to_gt(&mut self) {
        let mut junk = StrTendril::new();
        self.entity_mut().scan_to_end(&mut junk, ">");
    }

    fn log(&mut self, message: String) {
        let (line, column) = self
            .entity
            .as_ref()
            .map(Entity::position)
            .unwrap_or((0, 0));
        let error = ParseError {
            entity: self.entity.as_ref().map(|e| e.name().to_string()).unwrap_or_default(),
            uri: self.entity.as_ref().map(|e| e.uri().to_string()).unwrap_or_default(),
            line,
            column,
            message,
        };
        match self.handler.as_mut() {
            Some(handler) => handler(&error),
            None => warn!("{error}"),
        }
    }

    fn fold(&self, raw: &str) -> String {
        match self.opts.case_folding {
            CaseFolding::None => raw.to_string(),
            CaseFolding::ToUpper => raw.to_ascii_uppercase(),
            CaseFolding::ToLower => raw.to_ascii_lowercase(),
        }
    }

    // ------------------------------------------------------------------
    // Markup dispatch.

    fn dispatch_markup_char(&mut self, c: Option<char>) -> Result<bool, Error> {
        match c {
            None => Ok(self.emit_text(StrTendril::from_slice("<"), false, Eof)),
            Some('%') => {
                // ASP-style block, captured as unparsed character data.
                let mut buf = StrTendril::new();
                let closed = self.entity_mut().scan_to_end(&mut buf, "%>");
                Ok(self.emit_cdata(buf, if closed { Markup } else { Eof }))
            },
            Some('!') => self.parse_bang(),
            Some('?') => Ok(self.parse_pi()),
            Some('/') => Ok(self.parse_end_tag()),
            Some(c) if is_name_start(c) => self.parse_start_tag(c),
            Some(c) => {
                // Not a tag after all; the `<` is literal text and the
                // character goes back to be rescanned as content.
                self.entity_mut().unread(c);
                Ok(self.emit_text(StrTendril::from_slice("<"), false, PartialText))
            },
        }
    }

    fn parse_bang(&mut self) -> Result<bool, Error> {
        match self.peek_char() {
            Some('-') => {
                self.read_char();
                if self.peek_char() == Some('-') {
                    self.read_char();
                    Ok(self.parse_comment())
                } else {
                    self.log("malformed comment open".to_string());
                    self.skip_to_gt();
                    Ok(false)
                }
            },
            Some('[') => {
                self.read_char();
                self.parse_conditional()
            },
            Some(c) if is_name_start(c) => {
                let mut word = StrTendril::new();
                self.entity_mut().scan_token(&mut word, " >[\t\n");
                if word.eq_ignore_ascii_case("DOCTYPE") {
                    self.parse_doctype()
                } else {
                    self.log(format!("unrecognized declaration '<!{word}' skipped"));
                    self.skip_to_gt();
                    Ok(false)
                }
            },
            _ => {
                self.skip_to_gt();
                Ok(false)
            },
        }
    }

    fn parse_comment(&mut self) -> bool {
        let mut buf = StrTendril::new();
        let closed = self.entity_mut().scan_to_end(&mut buf, "-->");
        if !closed {
            self.log("unterminated comment".to_string());
        }
        let text = clean_comment(&buf);
        self.emit_misc(
            NodeKind::Comment,
            None,
            text,
            if closed { Markup } else { Eof },
        )
    }

    fn parse_conditional(&mut self) -> Result<bool, Error> {
        let mut word = StrTendril::new();
        self.entity_mut().scan_token(&mut word, "[> \t\n");
        if &*word == "CDATA" && self.peek_char() == Some('[') {
            self.read_char();
            let mut buf = StrTendril::new();
            let closed = self.entity_mut().scan_to_end(&mut buf, "]]>");
            if !closed {
                self.log("unterminated CDATA section".to_string());
            }
            return Ok(self.emit_cdata(buf, if closed { Markup } else { Eof }));
        }
        // Conditional markup like `<![if ...]>` carries nothing for the
        // output stream.
        self.skip_to_gt();
        Ok(false)
    }

    fn parse_pi(&mut self) -> bool {
        let Some((target, value)) = self.scan_pi() else {
            return false;
        };
        self.emit_misc(NodeKind::Pi, Some(&target), value, Markup)
    }

    fn scan_pi(&mut self) -> Option<(String, StrTendril)> {
        let mut target = StrTendril::new();
        self.entity_mut().scan_token(&mut target, " \t\n?>");
        self.skip_whitespace();
        let mut value = StrTendril::new();
        // Scan to `>` rather than `?>`; some generators close PIs with
        // `/>` or a bare `>`.
        self.entity_mut().scan_token(&mut value, ">");
        self.read_char();
        if value.ends_with('?') || value.ends_with('/') {
            value.pop_back(1);
        }
        let trimmed_len = value.trim_end().len();
        let excess = value.len() - trimmed_len;
        if excess > 0 {
            value.pop_back(excess as u32);
        }
        let target_str = match (*target).split_once(':') {
            Some((_, local)) => local.to_string(),
            None => target.to_string(),
        };
        if target_str.is_empty() {
            self.log("processing instruction with no target skipped".to_string());
            return None;
        }
        if target_str.eq_ignore_ascii_case("xml") {
            // The stream's own XML declaration; the emitter regenerates it.
            return None;
        }
        Some((target_str, value))
    }

    fn parse_doctype(&mut self) -> Result<bool, Error> {
        self.skip_whitespace();
        let mut name = StrTendril::new();
        self.entity_mut().scan_token(&mut name, " >[\t\n");
        let doc_name = name.to_string();

        let mut public_id: Option<String> = None;
        let mut system_literal: Option<String> = None;
        if let Some(c) = self.skip_whitespace() {
            if c.is_ascii_alphabetic() {
                let mut keyword = StrTendril::new();
                self.entity_mut().scan_token(&mut keyword, " \"'>[\t\n");
                if keyword.eq_ignore_ascii_case("PUBLIC") {
                    if let Some(q @ ('"' | '\'')) = self.skip_whitespace() {
                        self.read_char();
                        let mut lit = StrTendril::new();
                        self.entity_mut().scan_literal(&mut lit, q);
                        public_id = Some(lit.to_string());
                    }
                    if let Some(q @ ('"' | '\'')) = self.skip_whitespace() {
                        self.read_char();
                        let mut lit = StrTendril::new();
                        self.entity_mut().scan_literal(&mut lit, q);
                        system_literal = Some(lit.to_string());
                    }
                } else if keyword.eq_ignore_ascii_case("SYSTEM") {
                    if let Some(q @ ('"' | '\'')) = self.skip_whitespace() {
                        self.read_char();
                        let mut lit = StrTendril::new();
                        self.entity_mut().scan_literal(&mut lit, q);
                        system_literal = Some(lit.to_string());
                    }
                } else {
                    self.log(format!("unexpected DOCTYPE keyword '{keyword}'"));
                }
            }
        }
        let mut subset: Option<StrTendril> = None;
        if self.skip_whitespace() == Some('[') {
            self.read_char();
            let mut inner = StrTendril::new();
            self.entity_mut().scan_to_end(&mut inner, "]");
            subset = Some(inner);
        }
        match self.skip_whitespace() {
            Some('>') => {
                self.read_char();
            },
            Some(_) => self.skip_to_gt(),
            None => {},
        }

        self.doc_name = Some(doc_name.clone());
        if public_id.is_some() {
            self.public_id = public_id.clone();
        }
        if system_literal.is_some() {
            self.system_literal = system_literal.clone();
        }
        if let Some(ref s) = subset {
            self.internal_subset = Some(s.to_string());
        }

        if !self.opts.ignore_dtd {
            if let Some(dtd) = self.dtd.as_ref() {
                if !dtd.name().eq_ignore_ascii_case(&doc_name) {
                    self.state = Eof;
                    return Err(Error::DtdMismatch {
                        declared: doc_name,
                        loaded: dtd.name().to_string(),
                    });
                }
            } else if doc_name.eq_ignore_ascii_case("html") {
                self.dtd = Some(html_dtd());
                self.html_mode = true;
            } else {
                debug!("no built-in DTD for document type '{doc_name}'");
            }
        }

        if self.opts.strip_doctype {
            return Ok(false);
        }
        let value = subset.unwrap_or_default();
        self.emit_misc(NodeKind::Doctype, Some(&doc_name), value, Markup);
        // PUBLIC needs a SYSTEM after it for the output to stay
        // well-formed.
        let system_attr = self
            .system_literal
            .clone()
            .or_else(|| self.public_id.as_ref().map(|_| String::new()));
        let top = self.stack.count() - 1;
        if let Some(public) = self.public_id.clone() {
            if let Some(frame) = self.stack.get_mut(top) {
                frame.add_attribute(
                    qual_name("PUBLIC"),
                    Some(StrTendril::from_slice(&public)),
                    Some('"'),
                    None,
                    false,
                );
            }
        }
        if let Some(system) = system_attr {
            if let Some(frame) = self.stack.get_mut(top) {
                frame.add_attribute(
                    qual_name("SYSTEM"),
                    Some(StrTendril::from_slice(&system)),
                    Some('"'),
                    None,
                    false,
                );
            }
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Start and end tags.

    fn parse_start_tag(&mut self, first: char) -> Result<bool, Error> {
        let mut raw = StrTendril::from_char(first);
        self.entity_mut().scan_token(&mut raw, TAG_NAME_TERM);
        let folded = self.fold(&raw);
        if !is_valid_xml_name(&folded) {
            self.log(format!("invalid element name '{raw}'; kept as text"));
            let mut rest = StrTendril::new();
            let closed = self.entity_mut().scan_to_end(&mut rest, ">");
            let mut text = StrTendril::from_slice("<");
            text.push_tendril(&raw);
            text.push_tendril(&rest);
            if closed {
                text.push_char('>');
            }
            return Ok(self.emit_text(text, false, Text));
        }

        let (space, lang) = self.parent_scope();
        let decl = self.dtd.as_ref().and_then(|d| d.find_element(&folded));
        let empty_decl =
            decl.is_some_and(|i| self.dtd.as_ref().is_some_and(|d| d.element(i).is_empty()));
        let slot = self.stack.push();
        slot.reset(qual_name(&folded), NodeKind::Element);
        slot.set_space(space);
        slot.set_lang(lang);
        slot.set_decl(decl);
        slot.set_empty(empty_decl);

        self.parse_attributes();
        self.finish_start_tag()
    }

    fn parent_scope(&self) -> (XmlSpace, StrTendril) {
        self.stack
            .top()
            .map(|f| (f.space(), f.lang().clone()))
            .unwrap_or((XmlSpace::Default, StrTendril::new()))
    }

    fn parse_attributes(&mut self) {
        let top = self.stack.count() - 1;
        loop {
            let Some(c) = self.skip_whitespace() else {
                self.log("end of input inside start tag".to_string());
                break;
            };
            match c {
                '>' => {
                    self.read_char();
                    break;
                },
                '<' => {
                    self.log("'<' inside a start tag; tag closed early".to_string());
                    break;
                },
                '/' => {
                    self.read_char();
                    if self.peek_char() == Some('>') {
                        self.read_char();
                        if let Some(frame) = self.stack.get_mut(top) {
                            frame.set_empty(true);
                        }
                        break;
                    }
                    self.log("stray '/' in start tag".to_string());
                },
                _ => {
                    let mut tok = StrTendril::new();
                    self.entity_mut().scan_token(&mut tok, ATTR_NAME_TERM);
                    if tok.is_empty() {
                        // The terminator itself is next; a lone separator
                        // is legacy noise.
                        if let Some(c) = self.read_char() {
                            if !STRAY_PUNCTUATION.contains(c) {
                                self.log(format!("stray '{c}' in start tag"));
                            }
                        }
                        continue;
                    }
                    if matches!(&*tok, "," | ":" | ";") {
                        continue;
                    }
                    self.parse_one_attribute(top, &tok);
                },
            }
        }
    }

    fn parse_one_attribute(&mut self, top: usize, tok: &StrTendril) {
        let mut literal: Option<StrTendril> = None;
        let mut quote: Option<char> = None;
        match self.skip_whitespace() {
            Some('=') => {
                self.read_char();
                match self.skip_whitespace() {
                    Some(q @ ('"' | '\'')) => {
                        self.read_char();
                        let mut value = StrTendril::new();
                        self.scan_attr_literal(&mut value, q);
                        literal = Some(value);
                        quote = Some(q);
                    },
                    Some(_) => {
                        let mut value = StrTendril::new();
                        self.entity_mut().scan_token(&mut value, UNQUOTED_VALUE_TERM);
                        literal = Some(value);
                    },
                    None => {},
                }
            },
            Some(q @ ('"' | '\'')) => {
                self.read_char();
                let mut value = StrTendril::new();
                self.scan_attr_literal(&mut value, q);
                literal = Some(value);
                quote = Some(q);
            },
            _ => {},
        }

        let folded = self.fold(tok);
        let valid = match folded.split_once(':') {
            Some((prefix, local)) => {
                !prefix.is_empty() && is_valid_nmtoken(&folded) && is_valid_ncname(local)
            },
            None => is_valid_nmtoken(&folded),
        };
        if !valid {
            self.log(format!("invalid attribute name '{tok}' dropped"));
            return;
        }

        let default = {
            let decl = self.stack.get(top).and_then(Frame::decl);
            decl.and_then(|d| {
                self.dtd
                    .as_ref()
                    .and_then(|dtd| dtd.attr_default(d, &folded).cloned())
            })
        };
        // A value-less attribute takes its DTD default when one exists,
        // else its own name (the HTML boolean-attribute convention).
        let literal = match literal {
            Some(v) => Some(v),
            None if default.is_some() => None,
            None => Some(StrTendril::from_slice(&folded)),
        };

        if folded.eq_ignore_ascii_case("xml:space") {
            if let Some(v) = literal.as_ref() {
                let space = if v.eq_ignore_ascii_case("preserve") {
                    XmlSpace::Preserve
                } else {
                    XmlSpace::Default
                };
                if let Some(frame) = self.stack.get_mut(top) {
                    frame.set_space(space);
                }
            }
        } else if folded.eq_ignore_ascii_case("xml:lang") {
            if let Some(v) = literal.clone() {
                if let Some(frame) = self.stack.get_mut(top) {
                    frame.set_lang(v);
                }
            }
        }

        let added = match self.stack.get_mut(top) {
            Some(frame) => frame.add_attribute(qual_name(&folded), literal, quote, default, true),
            None => true,
        };
        if !added {
            self.log(format!("duplicate attribute '{folded}' dropped"));
        }
    }

    fn scan_attr_literal(&mut self, buf: &mut StrTendril, quote: char) {
        loop {
            let Some(c) = self.read_char() else {
                self.log("unterminated attribute value".to_string());
                return;
            };
            if c == quote {
                return;
            }
            if c == '&' {
                self.expand_entity_ref(buf, true);
            } else {
                buf.push_char(c);
            }
        }
    }

    fn finish_start_tag(&mut self) -> Result<bool, Error> {
        // A second root would make the stream ill-formed; stop instead.
        if self.stack.count() == 2 && self.root_closed {
            self.stack.pop();
            self.log("document element already closed; content discarded".to_string());
            self.state = Eof;
            return Ok(false);
        }

        if let Some(pop_to) = self.validate_content() {
            let top = self.stack.count() - 1;
            let saved = self
                .stack
                .slot_mut(top)
                .map(mem::take)
                .expect("new element frame");
            self.stack.pop();
            self.pending_frame = Some(saved);
            self.pop_to_depth = pop_to;
            self.state = AutoClose;
            return Ok(false);
        }

        let top = self.stack.count() - 1;
        if self.html_mode && !self.root_seen {
            let is_html_root = self
                .stack
                .get(top)
                .is_some_and(|f| f.name().local.as_ref().eq_ignore_ascii_case("html"));
            if !is_html_root {
                self.inject_wrapper();
                return Ok(true);
            }
        }
        self.root_seen = true;
        self.node = top;
        self.kind = NodeKind::Element;
        self.state = Markup;
        Ok(true)
    }

    /// Walk the ancestors of the just-pushed element and decide whether
    /// DTD-optional end tags must be synthesized to give it a legal home.
    fn validate_content(&self) -> Option<usize> {
        let dtd = self.dtd.as_ref()?;
        let top = self.stack.count() - 1;
        if top < 2 {
            return None;
        }
        let new_name = self.stack.get(top).map(|f| f.name().local.to_string())?;
        let mut insert_at = top - 1;
        for i in (1..top).rev() {
            let frame = self.stack.get(i).expect("live ancestor");
            let stop = match frame.decl() {
                // Undeclared ancestors accept anything.
                None => true,
                Some(d) => {
                    dtd.is_root(d)
                        || frame.name().local.as_ref().eq_ignore_ascii_case("body")
                        || dtd.can_contain(d, &new_name)
                        || !dtd.element(d).end_tag_optional()
                },
            };
            if stop {
                insert_at = i;
                break;
            }
            insert_at = i.saturating_sub(1);
        }
        (insert_at + 1 < top).then_some(insert_at + 1)
    }

    fn inject_wrapper(&mut self) {
        let t = self.stack.count() - 1;
        let wrapper_name = self.fold("html");
        let decl = self.dtd.as_ref().and_then(|d| d.find_element(&wrapper_name));
        let slot = self.stack.push();
        slot.reset(qual_name(&wrapper_name), NodeKind::Element);
        slot.set_simulated(true);
        slot.set_decl(decl);
        self.stack.swap(t, t + 1);
        self.node = t;
        self.kind = NodeKind::Element;
        self.state = PseudoStartTag;
        self.root_seen = true;
    }

    fn parse_end_tag(&mut self) -> bool {
        let mut raw = StrTendril::new();
        self.entity_mut().scan_token(&mut raw, END_TAG_NAME_TERM);
        match self.skip_whitespace() {
            Some('>') => {
                self.read_char();
            },
            Some(_) => self.skip_to_gt(),
            None => {},
        }
        let folded = self.fold(&raw);
        let mut found = None;
        for i in (1..self.stack.count()).rev() {
            let frame = self.stack.get(i).expect("live frame");
            if raw_name(frame.name()).eq_ignore_ascii_case(&folded) {
                found = Some(i);
                break;
            }
        }
        match found {
            Some(i) => {
                self.end_tag = self.stack.get(i).map(|f| f.name().clone());
                self.state = EndTag;
            },
            None => self.log(format!("no matching start tag for '</{folded}>'")),
        }
        false
    }

    // ------------------------------------------------------------------
    // Text and CDATA content.

    fn scan_text(&mut self, first: Option<char>) -> Result<bool, Error> {
        let mut buf = StrTendril::new();
        let mut ws_only = true;
        let mut pending = first;
        loop {
            let c = match pending.take() {
                Some(c) => c,
                None => match self.read_char() {
                    Some(c) => c,
                    None => break,
                },
            };
            match c {
                '&' => {
                    let start = buf.len();
                    self.expand_entity_ref(&mut buf, false);
                    if ws_only && !is_all_whitespace(&(*buf)[start..]) {
                        ws_only = false;
                    }
                },
                '<' => match self.peek_char() {
                    Some(c2) if is_name_start(c2) || matches!(c2, '/' | '!' | '?') => {
                        // Markup follows; leave the dispatch character in
                        // the input and report the accumulated text first.
                        return Ok(self.emit_text(buf, ws_only, PartialTag));
                    },
                    _ => {
                        buf.push_char('<');
                        ws_only = false;
                    },
                },
                c => {
                    buf.push_char(c);
                    if ws_only && !is_ascii_whitespace(c) {
                        ws_only = false;
                    }
                },
            }
        }
        Ok(self.emit_text(buf, ws_only, Eof))
    }

    fn top_is_cdata_content(&self) -> bool {
        let Some(frame) = self.stack.top() else {
            return false;
        };
        frame.kind() == NodeKind::Element
            && frame
                .decl()
                .is_some_and(|d| self.dtd.as_ref().is_some_and(|dtd| dtd.element(d).is_cdata()))
    }

    fn scan_cdata_content(&mut self) -> Result<bool, Error> {
        if let Some((kind, name, value)) = self.pending_event.take() {
            return Ok(self.emit_misc(kind, name.as_deref(), value, CData));
        }
        let elem_raw = self
            .stack
            .top()
            .map(|f| raw_name(f.name()))
            .unwrap_or_default();
        let elem_name = self.stack.top().map(|f| f.name().clone());
        let mut buf = StrTendril::new();
        loop {
            let Some(c) = self.read_char() else {
                self.log(format!("end of input inside '{elem_raw}' content"));
                if buf.is_empty() {
                    self.state = Eof;
                    return Ok(false);
                }
                return Ok(self.emit_cdata(buf, Eof));
            };
            if c != '<' {
                buf.push_char(c);
                continue;
            }
            match self.peek_char() {
                Some('/') => {
                    self.read_char();
                    let mut name = StrTendril::new();
                    self.entity_mut().scan_token(&mut name, END_TAG_NAME_TERM);
                    match self.skip_whitespace() {
                        Some('>') => {
                            self.read_char();
                        },
                        Some(_) => self.skip_to_gt(),
                        None => {},
                    }
                    if name.eq_ignore_ascii_case(&elem_raw) {
                        self.end_tag = elem_name.clone();
                        self.state = EndTag;
                        if buf.is_empty() {
                            return Ok(false);
                        }
                        return Ok(self.emit_cdata(buf, EndTag));
                    }
                    // An end tag for some other element is just data here.
                    buf.push_slice("</");
                    buf.push_tendril(&name);
                    buf.push_char('>');
                },
                Some('!') => {
                    self.read_char();
                    if self.peek_char() == Some('-') {
                        self.read_char();
                        if self.peek_char() == Some('-') {
                            self.read_char();
                            let mut comment = StrTendril::new();
                            self.entity_mut().scan_to_end(&mut comment, "-->");
                            let text = clean_comment(&comment);
                            if buf.is_empty() {
                                return Ok(self.emit_misc(NodeKind::Comment, None, text, CData));
                            }
                            self.pending_event = Some((NodeKind::Comment, None, text));
                            return Ok(self.emit_cdata(buf, CData));
                        }
                        buf.push_slice("<!-");
                    } else {
                        buf.push_slice("<!");
                    }
                },
                Some('?') => {
                    self.read_char();
                    if let Some((target, value)) = self.scan_pi() {
                        if buf.is_empty() {
                            return Ok(self.emit_misc(NodeKind::Pi, Some(&target), value, CData));
                        }
                        self.pending_event = Some((NodeKind::Pi, Some(target), value));
                        return Ok(self.emit_cdata(buf, CData));
                    }
                },
                _ => buf.push_char('<'),
            }
        }
    }

    // ------------------------------------------------------------------
    // Entity expansion.

    fn expand_entity_ref(&mut self, buf: &mut StrTendril, in_attribute: bool) {
        enum Resolved {
            Append(StrTendril),
            Open(String),
            Literal,
        }

        match self.peek_char() {
            Some('#') => {
                self.read_char();
                self.entity_mut().expand_char_entity(buf);
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
                        let resolved = match self.dtd.as_ref().and_then(|d| d.entity(&name)) {
                            Some(EntityDef::Internal(text)) => Resolved::Append(text.clone()),
                            Some(EntityDef::External { system }) if !in_attribute => {
                                Resolved::Open(system.clone())
                            },
                            Some(EntityDef::External { .. }) => Resolved::Literal,
                            None => Resolved::Literal,
                        };
                        match resolved {
                            Resolved::Append(text) => buf.push_tendril(&text),
                            Resolved::Open(system) => {
                                if !self.open_external_entity(&name, &system) {
                                    push_literal_entity(buf, &name, semi);
                                }
                            },
                            Resolved::Literal => {
                                self.log(format!("undefined entity '&{name};' kept as text"));
                                push_literal_entity(buf, &name, semi);
                            },
                        }
                    },
                }
            },
            _ => buf.push_char('&'),
        }
    }

    fn open_external_entity(&mut self, name: &str, system: &str) -> bool {
        let base = self
            .entity
            .as_ref()
            .and_then(|e| e.base().map(Path::to_path_buf))
            .or_else(|| self.opts.base_uri.as_ref().map(PathBuf::from));
        match Entity::open_href(name, system, base.as_deref()) {
            Ok(child) => {
                let parent = self.entity.take().expect("input entity is open");
                self.entity = Some(child.open(parent));
                true
            },
            Err(e) => {
                self.log(format!("cannot open entity '&{name};': {e}"));
                false
            },
        }
    }

    // ------------------------------------------------------------------
    // Event emission.

    fn emit_text(&mut self, value: StrTendril, ws_only: bool, next_state: ReaderState) -> bool {
        self.state = next_state;
        if value.is_empty() {
            return false;
        }
        let kind = if ws_only {
            let significant = self
                .stack
                .top()
                .map(|f| f.space() == XmlSpace::Preserve)
                .unwrap_or(false);
            match self.opts.whitespace_handling {
                WhitespaceHandling::None => return false,
                WhitespaceHandling::Significant if !significant => return false,
                _ if significant => NodeKind::SignificantWhitespace,
                _ => NodeKind::Whitespace,
            }
        } else {
            NodeKind::Text
        };
        self.push_event(kind, None, value, next_state);
        if kind == NodeKind::Text && self.html_mode && !self.root_seen {
            self.inject_wrapper();
        }
        true
    }

    fn emit_cdata(&mut self, value: StrTendril, next_state: ReaderState) -> bool {
        let cleaned = strip_cdata_guards(&value);
        self.push_event(NodeKind::Cdata, None, cleaned, next_state);
        if self.html_mode && !self.root_seen {
            self.inject_wrapper();
        }
        true
    }

    fn emit_misc(
        &mut self,
        kind: NodeKind,
        name: Option<&str>,
        value: StrTendril,
        next_state: ReaderState,
    ) -> bool {
        self.push_event(kind, name, value, next_state);
        true
    }

    fn push_event(
        &mut self,
        kind: NodeKind,
        name: Option<&str>,
        value: StrTendril,
        next_state: ReaderState,
    ) {
        let (space, lang) = self.parent_scope();
        let slot = self.stack.push();
        slot.reset(qual_name(name.unwrap_or("")), kind);
        slot.set_value(value);
        slot.set_space(space);
        slot.set_lang(lang);
        slot.save_state(next_state);
        self.node = self.stack.count() - 1;
        self.kind = kind;
        self.state = next_state;
    }

    // ------------------------------------------------------------------
    // Whole-subtree helpers.

    /// Concatenated character data of the current element's content, up
    /// to its first non-text child or its end.
    pub fn read_string(&mut self) -> Result<StrTendril, Error> {
        let mut out = StrTendril::new();
        match self.kind {
            NodeKind::Element if !self.is_empty_element() => loop {
                if !self.read()? {
                    break;
                }
                match self.kind {
                    NodeKind::Text
                    | NodeKind::Whitespace
                    | NodeKind::SignificantWhitespace
                    | NodeKind::Cdata => out.push_tendril(&self.value()),
                    _ => break,
                }
            },
            NodeKind::Text
            | NodeKind::Whitespace
            | NodeKind::SignificantWhitespace
            | NodeKind::Cdata => loop {
                out.push_tendril(&self.value());
                if !self.read()? {
                    break;
                }
                if !matches!(
                    self.kind,
                    NodeKind::Text
                        | NodeKind::Whitespace
                        | NodeKind::SignificantWhitespace
                        | NodeKind::Cdata
                ) {
                    break;
                }
            },
            _ => {},
        }
        Ok(out)
    }

    /// Markup of the current element's content, excluding the element
    /// itself.  The reader advances past the element.
    pub fn read_inner_xml(&mut self) -> Result<String, Error> {
        self.copy_subtree(false)
    }

    /// Markup of the current node and its content.  The reader advances
    /// past the node.
    pub fn read_outer_xml(&mut self) -> Result<String, Error> {
        self.copy_subtree(true)
    }

    fn copy_subtree(&mut self, include_self: bool) -> Result<String, Error> {
        let mut out = String::new();
        let mut writer = XmlWriter::new(&mut out);
        match self.kind {
            NodeKind::Element => {
                let elem_depth = self.node;
                let empty = self.is_empty_element();
                if include_self {
                    self.write_event(&mut writer).map_err(fmt_failed)?;
                }
                if !empty {
                    loop {
                        if !self.read()? {
                            break;
                        }
                        if self.kind == NodeKind::EndElement && self.node == elem_depth {
                            if include_self {
                                self.write_event(&mut writer).map_err(fmt_failed)?;
                            }
                            break;
                        }
                        self.write_event(&mut writer).map_err(fmt_failed)?;
                    }
                }
                self.read()?;
            },
            NodeKind::None | NodeKind::Document | NodeKind::EndElement => {},
            _ => {
                if include_self {
                    self.write_event(&mut writer).map_err(fmt_failed)?;
                }
                self.read()?;
            },
        }
        Ok(out)
    }

    /// Serialize the current event into `writer`.
    pub fn write_event<W: fmt::Write>(&self, writer: &mut XmlWriter<W>) -> fmt::Result {
        let frame = unwrap_or_return!(self.cur(), Ok(()));
        match self.kind {
            NodeKind::Element => {
                let name = raw_name(frame.name());
                let attrs = (0..frame.attribute_count()).map(|i| {
                    let attr = frame.attribute(i).expect("attribute index in range");
                    (
                        raw_name(attr.name()),
                        attr.value().map(|v| &**v).unwrap_or(""),
                        attr.quote(),
                    )
                });
                writer.start_elem(&name, attrs, frame.is_empty_element())
            },
            NodeKind::EndElement => writer.end_elem(&raw_name(frame.name())),
            NodeKind::Text | NodeKind::Whitespace | NodeKind::SignificantWhitespace => {
                writer.text(frame.value())
            },
            NodeKind::Cdata => writer.cdata(frame.value()),
            NodeKind::Comment => writer.comment(frame.value()),
            NodeKind::Pi => writer.pi(&raw_name(frame.name()), frame.value()),
            NodeKind::Doctype => {
                let public = frame
                    .attribute_by_raw_name("PUBLIC", false)
                    .and_then(|a| a.value())
                    .map(|v| v.to_string());
                let system = frame
                    .attribute_by_raw_name("SYSTEM", false)
                    .and_then(|a| a.value())
                    .map(|v| v.to_string());
                let subset = (!frame.value().is_empty()).then(|| frame.value().to_string());
                writer.doctype(
                    &raw_name(frame.name()),
                    public.as_deref(),
                    system.as_deref(),
                    subset.as_deref(),
                )
            },
            _ => Ok(()),
        }
    }
}

fn fmt_failed(_: fmt::Error) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "event serialization failed",
    ))
}

fn push_literal_entity(buf: &mut StrTendril, name: &str, semi: bool) {
    buf.push_char('&');
    buf.push_slice(name);
    if semi {
        buf.push_char(';');
    }
}

/// XML forbids `--` inside comments; fold runs of dashes and pad a
/// trailing dash so the serialized form stays well-formed.
fn clean_comment(raw: &str) -> StrTendril {
    let mut text = raw.to_string();
    while text.contains("--") {
        text = text.replace("--", "-");
    }
    if text.trim_end().ends_with('-') {
        text.push(' ');
    }
    StrTendril::from_slice(&text)
}

/// Sections and guards that cannot nest inside the CDATA section the
/// reader is about to emit.
fn strip_cdata_guards(raw: &str) -> StrTendril {
    let mut text = raw.to_string();
    for guard in ["<![CDATA[", "]]>", "/**/"] {
        if text.contains(guard) {
            text = text.replace(guard, "");
        }
    }
    StrTendril::from_slice(&text)
}
