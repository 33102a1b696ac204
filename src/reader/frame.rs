// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reusable element-scope records and the high-water stack that pools them.

use markup5ever::{local_name, ns, LocalName, Prefix, QualName};
use tendril::StrTendril;

use crate::reader::states::ReaderState;

/// The kind of the current event on the reader cursor.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug, Default)]
pub enum NodeKind {
    /// Nothing has been read yet.
    #[default]
    None,
    /// The document sentinel; never reported from `read`.
    Document,
    Element,
    EndElement,
    Text,
    Cdata,
    Comment,
    Pi,
    Doctype,
    Whitespace,
    SignificantWhitespace,
    Attribute,
}

/// The `xml:space` scope in effect for the current element.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug, Default)]
pub enum XmlSpace {
    #[default]
    Default,
    Preserve,
}

/// A grow-only arena of reusable records, keyed by a live count.
///
/// Slots at indices at or above the count remain allocated and are reset,
/// never dropped, when a later `push` reuses them.
pub struct HwStack<T> {
    items: Vec<T>,
    count: usize,
    growth: usize,
}

impl<T: Default> HwStack<T> {
    pub fn new(growth: usize) -> HwStack<T> {
        HwStack {
            items: Vec::new(),
            count: 0,
            growth: growth.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Make the slot at the live count current, allocating one if the
    /// high-water mark has been reached.  The caller must reset the slot.
    pub fn push(&mut self) -> &mut T {
        if self.count == self.items.len() {
            self.items.reserve(self.growth);
            self.items.push(T::default());
        }
        let slot = &mut self.items[self.count];
        self.count += 1;
        slot
    }

    /// Decrement the live count and return the new top.
    pub fn pop(&mut self) -> Option<&mut T> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        if self.count == 0 {
            None
        } else {
            Some(&mut self.items[self.count - 1])
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        (index < self.count).then(|| &self.items[index])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        (index < self.count).then(|| &mut self.items[index])
    }

    pub fn top(&self) -> Option<&T> {
        self.count.checked_sub(1).map(|i| &self.items[i])
    }

    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.count.checked_sub(1).map(|i| &mut self.items[i])
    }

    /// Remove the slot at `index`, shifting the live tail down by one.
    /// The removed record stays allocated past the live count.
    pub fn remove_at(&mut self, index: usize) {
        if index >= self.count {
            return;
        }
        self.items[index..self.count].rotate_left(1);
        self.count -= 1;
    }

    /// Access a slot that may sit just above the live count (a record
    /// popped but not yet reused is still readable there).
    pub(crate) fn slot(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Swap two live slots.
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        debug_assert!(a < self.count && b < self.count);
        self.items.swap(a, b);
    }

    pub(crate) fn truncate(&mut self, count: usize) {
        self.count = self.count.min(count);
    }
}

fn empty_name() -> QualName {
    QualName::new(None, ns!(), local_name!(""))
}

/// Split a raw scanned name on the first colon into a prefixed `QualName`.
/// The namespace field stays empty; resolution happens lazily at query time.
pub fn qual_name(raw: &str) -> QualName {
    match raw.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => QualName::new(
            Some(Prefix::from(prefix)),
            ns!(),
            LocalName::from(local),
        ),
        _ => QualName::new(None, ns!(), LocalName::from(raw)),
    }
}

/// Render a `QualName` back to its raw `prefix:local` form.
pub fn raw_name(name: &QualName) -> String {
    match name.prefix {
        Some(ref p) => format!("{}:{}", p, name.local),
        None => name.local.to_string(),
    }
}

fn name_eq(a: &QualName, b: &QualName, case_insensitive: bool) -> bool {
    let prefix_eq = match (&a.prefix, &b.prefix) {
        (None, None) => true,
        (Some(pa), Some(pb)) => {
            if case_insensitive {
                pa.as_ref().eq_ignore_ascii_case(pb.as_ref())
            } else {
                pa == pb
            }
        },
        _ => false,
    };
    prefix_eq
        && if case_insensitive {
            a.local.as_ref().eq_ignore_ascii_case(b.local.as_ref())
        } else {
            a.local == b.local
        }
}

/// One attribute of the current element: case-normalized name, the literal
/// exactly as scanned, the quote style, and the DTD-declared default if the
/// literal was absent.
pub struct FrameAttr {
    name: QualName,
    literal: Option<StrTendril>,
    quote: Option<char>,
    default: Option<StrTendril>,
}

impl Default for FrameAttr {
    fn default() -> FrameAttr {
        FrameAttr {
            name: empty_name(),
            literal: None,
            quote: None,
            default: None,
        }
    }
}

impl FrameAttr {
    fn reset(
        &mut self,
        name: QualName,
        literal: Option<StrTendril>,
        quote: Option<char>,
        default: Option<StrTendril>,
    ) {
        self.name = name;
        self.literal = literal;
        self.quote = quote;
        self.default = default;
    }

    pub fn name(&self) -> &QualName {
        &self.name
    }

    /// The literal value if one was scanned, else the DTD default.
    pub fn value(&self) -> Option<&StrTendril> {
        self.literal.as_ref().or(self.default.as_ref())
    }

    /// True iff no literal appeared in the input.
    pub fn is_default(&self) -> bool {
        self.literal.is_none()
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }
}

/// An element scope on the open-element stack, or the record backing the
/// current non-element event (text, comment, PI, ...).
pub struct Frame {
    name: QualName,
    kind: NodeKind,
    value: StrTendril,
    is_empty: bool,
    space: XmlSpace,
    lang: StrTendril,
    decl: Option<usize>,
    saved_state: ReaderState,
    simulated: bool,
    attrs: HwStack<FrameAttr>,
}

impl Default for Frame {
    fn default() -> Frame {
        Frame {
            name: empty_name(),
            kind: NodeKind::None,
            value: StrTendril::new(),
            is_empty: false,
            space: XmlSpace::Default,
            lang: StrTendril::new(),
            decl: None,
            saved_state: ReaderState::Markup,
            simulated: false,
            attrs: HwStack::new(8),
        }
    }
}

impl Frame {
    /// Reinitialize a pooled frame for a new scope.  Whitespace and
    /// language scopes are inherited from the enclosing frame by the
    /// caller after the reset.
    pub fn reset(&mut self, name: QualName, kind: NodeKind) {
        self.name = name;
        self.kind = kind;
        self.value.clear();
        self.is_empty = false;
        self.space = XmlSpace::Default;
        self.lang.clear();
        self.decl = None;
        self.saved_state = ReaderState::Markup;
        self.simulated = false;
        self.attrs.truncate(0);
    }

    pub fn name(&self) -> &QualName {
        &self.name
    }

    pub fn set_name(&mut self, name: QualName) {
        self.name = name;
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub fn value(&self) -> &StrTendril {
        &self.value
    }

    pub fn set_value(&mut self, value: StrTendril) {
        self.value = value;
    }

    pub fn is_empty_element(&self) -> bool {
        self.is_empty
    }

    pub fn set_empty(&mut self, empty: bool) {
        self.is_empty = empty;
    }

    pub fn space(&self) -> XmlSpace {
        self.space
    }

    pub fn set_space(&mut self, space: XmlSpace) {
        self.space = space;
    }

    pub fn lang(&self) -> &StrTendril {
        &self.lang
    }

    pub fn set_lang(&mut self, lang: StrTendril) {
        self.lang = lang;
    }

    pub fn decl(&self) -> Option<usize> {
        self.decl
    }

    pub fn set_decl(&mut self, decl: Option<usize>) {
        self.decl = decl;
    }

    pub fn saved_state(&self) -> ReaderState {
        self.saved_state
    }

    pub fn save_state(&mut self, state: ReaderState) {
        self.saved_state = state;
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    pub fn set_simulated(&mut self, simulated: bool) {
        self.simulated = simulated;
    }

    /// Add an attribute, rejecting duplicates by name under the given case
    /// policy.  Returns false (and leaves the collection unchanged) on a
    /// duplicate.
    pub fn add_attribute(
        &mut self,
        name: QualName,
        literal: Option<StrTendril>,
        quote: Option<char>,
        default: Option<StrTendril>,
        case_insensitive: bool,
    ) -> bool {
        if self.index_of_attribute(&name, case_insensitive).is_some() {
            return false;
        }
        self.attrs.push().reset(name, literal, quote, default);
        true
    }

    pub fn remove_attribute(&mut self, raw: &str, case_insensitive: bool) {
        let name = qual_name(raw);
        if let Some(i) = self.index_of_attribute(&name, case_insensitive) {
            self.attrs.remove_at(i);
        }
    }

    pub fn attribute_count(&self) -> usize {
        self.attrs.count()
    }

    pub fn attribute(&self, index: usize) -> Option<&FrameAttr> {
        self.attrs.get(index)
    }

    pub fn index_of_attribute(&self, name: &QualName, case_insensitive: bool) -> Option<usize> {
        (0..self.attrs.count())
            .find(|&i| name_eq(self.attrs.get(i).unwrap().name(), name, case_insensitive))
    }

    pub fn attribute_by_raw_name(
        &self,
        raw: &str,
        case_insensitive: bool,
    ) -> Option<&FrameAttr> {
        let name = qual_name(raw);
        self.index_of_attribute(&name, case_insensitive)
            .and_then(|i| self.attrs.get(i))
    }
}
