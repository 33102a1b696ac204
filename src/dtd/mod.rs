// Copyright 2016-2017 The sgml5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The declaration store the reader consults while repairing input.
//!
//! A [`Dtd`] is a read-only lookup structure: element declarations with
//! their content models and end-tag-omissibility, attribute defaults, and
//! the named entity table.  The reader treats `can_contain` and
//! `end_tag_optional` as pure predicates on the declarations; nothing in
//! here knows about any particular document type.  `Dtd` values are
//! immutable once built and may be shared between readers.

pub mod html;

use std::collections::HashMap;

use tendril::StrTendril;

/// Content-class membership bits.  An element declaration names the
/// classes the element belongs to and the classes its content model
/// accepts.
pub mod groups {
    pub const INLINE: u32 = 1 << 0;
    pub const BLOCK: u32 = 1 << 1;
    /// Inline or block.
    pub const FLOW: u32 = INLINE | BLOCK;
    /// Elements that belong in the document head.
    pub const HEAD_CONTENT: u32 = 1 << 2;
    pub const LIST_ITEM: u32 = 1 << 3;
    /// Definition-list items (`dt`, `dd`).
    pub const DEF_ITEM: u32 = 1 << 4;
    pub const TABLE_SECTION: u32 = 1 << 5;
    pub const TABLE_ROW: u32 = 1 << 6;
    pub const TABLE_CELL: u32 = 1 << 7;
    /// `option` and `optgroup`.
    pub const OPTION_ITEM: u32 = 1 << 8;
}

/// The content model of one element declaration.
pub enum ContentModel {
    /// Declared EMPTY: no content, no end tag.
    Empty,
    /// Unparsed character content (`script`, `style`).
    Cdata,
    /// Anything goes; used for the document root.
    Any,
    /// A declared grammar, reduced to the containment question the reader
    /// asks: which content classes and which named exceptions fit here.
    Declared(DeclaredContent),
}

pub struct DeclaredContent {
    /// Classes this model accepts.  Zero means PCDATA-only content.
    pub allows: u32,
    /// Names accepted regardless of class (upper-case).
    pub names: Vec<String>,
    /// Names excluded regardless of class (upper-case).
    pub excludes: Vec<String>,
}

impl DeclaredContent {
    fn can_contain(&self, name: &str, child_groups: u32) -> bool {
        if self.excludes.iter().any(|n| n == name) {
            return false;
        }
        (self.allows & child_groups) != 0 || self.names.iter().any(|n| n == name)
    }
}

/// An attribute declaration; only the default value survives distillation
/// from the attribute list.
pub struct AttrDecl {
    pub default: Option<StrTendril>,
}

/// One element declaration.
pub struct ElementDecl {
    name: String,
    groups: u32,
    model: ContentModel,
    end_tag_optional: bool,
    attrs: HashMap<String, AttrDecl>,
}

impl ElementDecl {
    pub fn new(name: &str, groups: u32, model: ContentModel, end_tag_optional: bool) -> ElementDecl {
        ElementDecl {
            name: name.to_ascii_uppercase(),
            groups,
            // An EMPTY element has no end tag to require.
            end_tag_optional: end_tag_optional || matches!(model, ContentModel::Empty),
            model,
            attrs: HashMap::new(),
        }
    }

    /// Declared name, case-folded to upper the way SGML DTDs store it.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> u32 {
        self.groups
    }

    pub fn model(&self) -> &ContentModel {
        &self.model
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.model, ContentModel::Empty)
    }

    pub fn is_cdata(&self) -> bool {
        matches!(self.model, ContentModel::Cdata)
    }

    pub fn end_tag_optional(&self) -> bool {
        self.end_tag_optional
    }

    pub fn add_attr(&mut self, name: &str, default: Option<&str>) {
        self.attrs.insert(
            name.to_ascii_lowercase(),
            AttrDecl {
                default: default.map(StrTendril::from),
            },
        );
    }

    pub fn attr(&self, name: &str) -> Option<&AttrDecl> {
        self.attrs.get(&name.to_ascii_lowercase())
    }
}

/// A named entity defined by the DTD.
pub enum EntityDef {
    /// Replacement text supplied inline.
    Internal(StrTendril),
    /// Content lives in an external resource.
    External { system: String },
}

/// The full declaration set for one document type.
pub struct Dtd {
    name: String,
    elements: Vec<ElementDecl>,
    by_name: HashMap<String, usize>,
    entities: HashMap<String, EntityDef>,
}

impl Dtd {
    pub fn new(name: &str) -> Dtd {
        Dtd {
            name: name.to_ascii_uppercase(),
            elements: Vec::new(),
            by_name: HashMap::new(),
            entities: HashMap::new(),
        }
    }

    /// Declared root name, upper-cased.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_element(&mut self, decl: ElementDecl) -> usize {
        let index = self.elements.len();
        self.by_name.insert(decl.name.clone(), index);
        self.elements.push(decl);
        index
    }

    pub fn add_entity(&mut self, name: &str, def: EntityDef) {
        self.entities.insert(name.to_string(), def);
    }

    /// Look up an element declaration; the query is case-folded to upper.
    pub fn find_element(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn element(&self, index: usize) -> &ElementDecl {
        &self.elements[index]
    }

    pub fn element_mut(&mut self, index: usize) -> &mut ElementDecl {
        &mut self.elements[index]
    }

    /// Entity names are case-sensitive, as in XML.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Is this declaration the document root?  The root accepts anything.
    pub fn is_root(&self, index: usize) -> bool {
        self.elements[index].name == self.name
    }

    /// May the element declared at `parent` directly contain `child_name`?
    /// An undeclared child matches only by-name exceptions.
    pub fn can_contain(&self, parent: usize, child_name: &str) -> bool {
        let child = child_name.to_ascii_uppercase();
        let child_groups = self
            .find_element(&child)
            .map(|i| self.elements[i].groups)
            .unwrap_or(0);
        match self.elements[parent].model {
            ContentModel::Empty | ContentModel::Cdata => false,
            ContentModel::Any => true,
            ContentModel::Declared(ref d) => d.can_contain(&child, child_groups),
        }
    }

    /// The declared default value for an attribute of the element at
    /// `index`, if the attribute list supplies one.
    pub fn attr_default(&self, index: usize, attr_name: &str) -> Option<&StrTendril> {
        self.elements[index]
            .attr(attr_name)
            .and_then(|a| a.default.as_ref())
    }
}
