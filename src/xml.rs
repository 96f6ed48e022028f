//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! XML tree used as the parsing substrate for YIN documents.
//!
//! The tree is a general-purpose XML reader: elements with namespace
//! resolution, attribute lists and a half-ring doubly linked sibling
//! structure (the first child's `prev` points to the last child, the last
//! child's `next` is nil, so appending is O(1) without a tail pointer).
//! Nodes live in a tree-owned arena and refer to each other through index
//! handles.

use bitflags::bitflags;
use std::io::Write;
use std::rc::Rc;

use crate::context::Context;
use crate::dict::{DictStr, Dictionary};
use crate::error::{ErrorCode, Result};
use crate::iter::{NodeIterable, Siblings, Traverse};

/// Handle to an element in an [`XmlTree`] arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ElementId(pub(crate) usize);

/// Handle to an attribute in an [`XmlTree`] arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttrId(pub(crate) usize);

bitflags! {
    /// XML dump options.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct XmlPrinterFlags: u32 {
        /// Produce only the start tag.
        const OPEN = 0x01;
        /// Produce only the end tag.
        const CLOSE = 0x02;
        /// Produce only the attributes.
        const ATTRS = 0x04;
        /// Indent child elements.
        const FORMAT = 0x08;
    }
}

#[derive(Debug)]
pub(crate) struct ElementData {
    pub(crate) name: DictStr,
    /// Resolved namespace declaration in scope, if any.
    pub(crate) ns: Option<AttrId>,
    pub(crate) content: Option<DictStr>,
    pub(crate) mixed: bool,
    pub(crate) line: u64,
    pub(crate) parent: Option<ElementId>,
    pub(crate) child: Option<ElementId>,
    pub(crate) next: Option<ElementId>,
    /// Half-ring link; the first sibling points back at the last one.
    pub(crate) prev: Option<ElementId>,
    pub(crate) attr: Option<AttrId>,
}

#[derive(Debug)]
pub(crate) struct AttrData {
    /// Attribute name, or the declared prefix for namespace declarations
    /// (nil meaning the default namespace).
    pub(crate) name: Option<DictStr>,
    pub(crate) value: DictStr,
    pub(crate) next: Option<AttrId>,
    pub(crate) kind: AttrKind,
}

#[derive(Debug)]
pub(crate) enum AttrKind {
    Standard { ns: Option<AttrId> },
    NamespaceDecl { parent: ElementId },
}

/// In-memory XML document.
#[derive(Debug)]
pub struct XmlTree {
    dict: Rc<Dictionary>,
    elems: Vec<ElementData>,
    attrs: Vec<AttrData>,
    root: Option<ElementId>,
}

/// Reference to an element of an [`XmlTree`].
#[derive(Clone, Debug)]
pub struct Element<'a> {
    tree: &'a XmlTree,
    id: ElementId,
}

/// Reference to an attribute of an [`XmlTree`].
#[derive(Clone, Debug)]
pub struct Attribute<'a> {
    tree: &'a XmlTree,
    id: AttrId,
}

/// An iterator over the attributes of an element.
#[derive(Debug)]
pub struct Attributes<'a> {
    tree: &'a XmlTree,
    next: Option<AttrId>,
}

// ===== impl XmlTree =====

impl XmlTree {
    /// Create an empty tree backed by the context's dictionary.
    pub fn new(ctx: &Context) -> XmlTree {
        XmlTree {
            dict: ctx.dictionary(),
            elems: Vec::new(),
            attrs: Vec::new(),
            root: None,
        }
    }

    /// Parse an XML document into a tree.
    ///
    /// Element and attribute prefixes are resolved against the namespace
    /// declarations in scope while parsing; malformed input, unknown
    /// entities and unresolvable prefixes fail the parse.
    pub fn parse(ctx: &Context, data: &str) -> Result<XmlTree> {
        let mut tree = XmlTree::new(ctx);
        let mut parser = Parser {
            ctx,
            input: data.as_bytes(),
            pos: 0,
            line: 1,
        };
        parser.parse_document(&mut tree)?;
        Ok(tree)
    }

    /// Root element of the document.
    pub fn root(&self) -> Option<Element<'_>> {
        self.root.map(|id| Element { tree: self, id })
    }

    /// Obtain a reference to an element by handle.
    pub fn element(&self, id: ElementId) -> Element<'_> {
        Element { tree: self, id }
    }

    // ----- arena access -----

    pub(crate) fn elem(&self, id: ElementId) -> &ElementData {
        &self.elems[id.0]
    }

    pub(crate) fn elem_mut(&mut self, id: ElementId) -> &mut ElementData {
        &mut self.elems[id.0]
    }

    pub(crate) fn attr(&self, id: AttrId) -> &AttrData {
        &self.attrs[id.0]
    }

    /// Collect the child handles of an element (or the root when `parent`
    /// is nil). The snapshot allows unlinking while iterating.
    pub(crate) fn children_ids(
        &self,
        parent: Option<ElementId>,
    ) -> Vec<ElementId> {
        let mut ids = Vec::new();
        let mut next = match parent {
            Some(parent) => self.elem(parent).child,
            None => self.root,
        };
        while let Some(id) = next {
            ids.push(id);
            next = self.elem(id).next;
        }
        ids
    }

    pub(crate) fn attr_value(
        &self,
        elem: ElementId,
        name: &str,
    ) -> Option<&str> {
        let mut next = self.elem(elem).attr;
        while let Some(id) = next {
            let attr = self.attr(id);
            if let AttrKind::Standard { .. } = attr.kind {
                if attr.name.as_deref() == Some(name) {
                    return Some(attr.value.as_str());
                }
            }
            next = attr.next;
        }
        None
    }

    /// URI of the element's resolved namespace.
    pub(crate) fn elem_ns_uri(&self, elem: ElementId) -> Option<&str> {
        self.elem(elem).ns.map(|ns| self.attr(ns).value.as_str())
    }

    // ----- construction -----

    /// Append a new element under `parent` (nil appends a root sibling).
    pub fn new_element(
        &mut self,
        parent: Option<ElementId>,
        name: &str,
        content: Option<&str>,
    ) -> ElementId {
        let data = ElementData {
            name: self.dict.insert(name),
            ns: None,
            content: content.map(|c| self.dict.insert(c)),
            mixed: false,
            line: 0,
            parent: None,
            child: None,
            next: None,
            prev: None,
            attr: None,
        };
        let id = ElementId(self.elems.len());
        self.elems.push(data);
        self.add_child(parent, id);
        id
    }

    /// Declare a namespace on an element and resolve the element to it when
    /// the element's name matches the declared scope.
    pub fn new_ns_decl(
        &mut self,
        elem: ElementId,
        prefix: Option<&str>,
        uri: &str,
    ) -> AttrId {
        let data = AttrData {
            name: prefix.map(|p| self.dict.insert(p)),
            value: self.dict.insert(uri),
            next: None,
            kind: AttrKind::NamespaceDecl { parent: elem },
        };
        let id = self.push_attr(elem, data);
        if prefix.is_none() && self.elem(elem).ns.is_none() {
            self.elem_mut(elem).ns = Some(id);
        }
        id
    }

    /// Attach a standard (non-namespace) attribute to an element.
    pub fn new_attr(
        &mut self,
        elem: ElementId,
        name: &str,
        value: &str,
    ) -> AttrId {
        let data = AttrData {
            name: Some(self.dict.insert(name)),
            value: self.dict.insert(value),
            next: None,
            kind: AttrKind::Standard { ns: None },
        };
        self.push_attr(elem, data)
    }

    fn push_attr(&mut self, elem: ElementId, data: AttrData) -> AttrId {
        let id = AttrId(self.attrs.len());
        self.attrs.push(data);
        // Append at the end of the singly linked attribute list.
        match self.elem(elem).attr {
            None => self.elem_mut(elem).attr = Some(id),
            Some(first) => {
                let mut last = first;
                while let Some(next) = self.attr(last).next {
                    last = next;
                }
                self.attrs[last.0].next = Some(id);
            }
        }
        id
    }

    // ----- sibling ring maintenance -----

    /// Append `child` into the half-ring child list of `parent` (nil
    /// appends at the document's top level).
    pub fn add_child(&mut self, parent: Option<ElementId>, child: ElementId) {
        self.elem_mut(child).parent = parent;
        self.elem_mut(child).next = None;
        let first = match parent {
            Some(parent) => self.elem(parent).child,
            None => self.root,
        };
        match first {
            None => {
                // First child: the ring of one points back at itself.
                self.elem_mut(child).prev = Some(child);
                match parent {
                    Some(parent) => self.elem_mut(parent).child = Some(child),
                    None => self.root = Some(child),
                }
            }
            Some(first) => {
                let last = self.elem(first).prev.unwrap();
                self.elems[last.0].next = Some(child);
                self.elem_mut(child).prev = Some(last);
                self.elems[first.0].prev = Some(child);
            }
        }
    }

    /// Detach an element from its parent and siblings, restoring the
    /// half-ring on both sides.
    pub fn unlink(&mut self, id: ElementId) {
        let parent = self.elem(id).parent;
        let next = self.elem(id).next;
        let prev = self.elem(id).prev;
        let first = match parent {
            Some(parent) => self.elem(parent).child,
            None => self.root,
        };

        if first == Some(id) {
            // Head of the list; the successor (if any) becomes the first
            // child and inherits the back-link to the last sibling.
            match parent {
                Some(parent) => self.elem_mut(parent).child = next,
                None => self.root = next,
            }
            if let Some(next) = next {
                self.elems[next.0].prev =
                    if prev == Some(id) { Some(next) } else { prev };
            }
        } else {
            let prev = prev.unwrap();
            self.elems[prev.0].next = next;
            match next {
                Some(next) => self.elems[next.0].prev = Some(prev),
                // Last sibling removed; the first one points at the new last.
                None => {
                    let first = first.unwrap();
                    self.elems[first.0].prev = Some(prev);
                }
            }
        }

        let elem = self.elem_mut(id);
        elem.parent = None;
        elem.next = None;
        elem.prev = None;
    }

    // ----- namespace scope -----

    /// Resolve a prefix against the declarations in scope at `elem`
    /// (nearest ancestor wins).
    pub(crate) fn resolve_ns(
        &self,
        elem: ElementId,
        prefix: Option<&str>,
    ) -> Option<AttrId> {
        let mut scope = Some(elem);
        while let Some(id) = scope {
            let mut next = self.elem(id).attr;
            while let Some(attr_id) = next {
                let attr = self.attr(attr_id);
                if let AttrKind::NamespaceDecl { .. } = attr.kind {
                    if attr.name.as_deref() == prefix {
                        return Some(attr_id);
                    }
                }
                next = attr.next;
            }
            scope = self.elem(id).parent;
        }
        None
    }

    // ----- dump -----

    /// Render an element (and, without restricting options, its subtree)
    /// back to bytes.
    pub fn print_writer<W: Write>(
        &self,
        elem: ElementId,
        options: XmlPrinterFlags,
        writer: &mut W,
    ) -> Result<()> {
        if options.contains(XmlPrinterFlags::CLOSE) {
            writeln!(writer, "</{}>", self.qname(elem))?;
            return Ok(());
        }
        if options.contains(XmlPrinterFlags::ATTRS) {
            self.print_attrs(elem, writer)?;
            return Ok(());
        }
        if options.contains(XmlPrinterFlags::OPEN) {
            write!(writer, "<{}", self.qname(elem))?;
            self.print_attrs(elem, writer)?;
            writeln!(writer, ">")?;
            return Ok(());
        }
        self.print_elem(elem, options, 0, writer)
    }

    /// Render an element into a string.
    pub fn print_string(
        &self,
        elem: ElementId,
        options: XmlPrinterFlags,
    ) -> Result<String> {
        let mut buf = Vec::new();
        self.print_writer(elem, options, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    /// Render an element through a caller-provided write callback.
    pub fn print_clb<F: FnMut(&[u8])>(
        &self,
        elem: ElementId,
        options: XmlPrinterFlags,
        mut clb: F,
    ) -> Result<()> {
        let out = self.print_string(elem, options)?;
        clb(out.as_bytes());
        Ok(())
    }

    fn qname(&self, elem: ElementId) -> String {
        let data = self.elem(elem);
        match data.ns.and_then(|ns| self.attr(ns).name.as_ref()) {
            Some(prefix) => format!("{}:{}", prefix, data.name),
            None => data.name.to_string(),
        }
    }

    fn attr_qname(&self, attr: AttrId) -> String {
        let data = self.attr(attr);
        match &data.kind {
            AttrKind::NamespaceDecl { .. } => match &data.name {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            },
            AttrKind::Standard { ns } => {
                let prefix = ns.and_then(|ns| self.attr(ns).name.as_ref());
                match prefix {
                    Some(prefix) => {
                        format!("{}:{}", prefix, data.name.as_ref().unwrap())
                    }
                    None => data.name.as_ref().unwrap().to_string(),
                }
            }
        }
    }

    fn print_attrs<W: Write>(
        &self,
        elem: ElementId,
        writer: &mut W,
    ) -> Result<()> {
        let parent = self.elem(elem).parent;
        let mut next = self.elem(elem).attr;
        while let Some(id) = next {
            let attr = self.attr(id);
            if let AttrKind::NamespaceDecl { .. } = attr.kind {
                // Skip declarations that are already in scope.
                let redundant = parent
                    .and_then(|p| self.resolve_ns(p, attr.name.as_deref()))
                    .map(|in_scope| {
                        self.attr(in_scope).value == attr.value.as_str()
                    })
                    .unwrap_or(false);
                if redundant {
                    next = attr.next;
                    continue;
                }
            }
            write!(writer, " {}=\"", self.attr_qname(id))?;
            escape(&attr.value, true, writer)?;
            write!(writer, "\"")?;
            next = attr.next;
        }
        Ok(())
    }

    fn print_elem<W: Write>(
        &self,
        elem: ElementId,
        options: XmlPrinterFlags,
        level: usize,
        writer: &mut W,
    ) -> Result<()> {
        let format = options.contains(XmlPrinterFlags::FORMAT);
        let data = self.elem(elem);
        if format && level > 0 {
            write!(writer, "\n{:indent$}", "", indent = level * 2)?;
        }
        write!(writer, "<{}", self.qname(elem))?;
        self.print_attrs(elem, writer)?;

        if data.child.is_none() && data.content.is_none() {
            write!(writer, "/>")?;
            return Ok(());
        }
        write!(writer, ">")?;

        if let Some(content) = &data.content {
            escape(content, false, writer)?;
        }
        let mut has_children = false;
        let mut next = data.child;
        while let Some(child) = next {
            has_children = true;
            // Mixed content keeps the children inline.
            let child_options = if data.mixed {
                options - XmlPrinterFlags::FORMAT
            } else {
                options
            };
            self.print_elem(child, child_options, level + 1, writer)?;
            next = self.elem(child).next;
        }
        if format && has_children && !data.mixed {
            write!(writer, "\n{:indent$}", "", indent = level * 2)?;
        }
        write!(writer, "</{}>", self.qname(elem))?;
        Ok(())
    }
}

impl Drop for XmlTree {
    // Every intern performed while building the tree is paired with a
    // remove when the tree goes away.
    fn drop(&mut self) {
        for elem in &self.elems {
            self.dict.remove(&elem.name);
            if let Some(content) = &elem.content {
                self.dict.remove(content);
            }
        }
        for attr in &self.attrs {
            if let Some(name) = &attr.name {
                self.dict.remove(name);
            }
            self.dict.remove(&attr.value);
        }
    }
}

// ===== impl Element =====

impl<'a> Element<'a> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Local element name.
    pub fn name(&self) -> &'a str {
        self.tree.elem(self.id).name.as_str()
    }

    /// URI of the resolved namespace.
    pub fn namespace(&self) -> Option<&'a str> {
        self.tree.elem_ns_uri(self.id)
    }

    /// Prefix under which the namespace was declared.
    pub fn prefix(&self) -> Option<&'a str> {
        self.tree
            .elem(self.id)
            .ns
            .and_then(|ns| self.tree.attr(ns).name.as_deref())
    }

    /// Character content, for elements without child elements (or the
    /// accumulated text of mixed-content elements).
    pub fn content(&self) -> Option<&'a str> {
        self.tree.elem(self.id).content.as_deref()
    }

    /// Whether character data appeared alongside child elements.
    pub fn is_mixed(&self) -> bool {
        self.tree.elem(self.id).mixed
    }

    /// Line of the element's start tag in the source document.
    pub fn line(&self) -> u64 {
        self.tree.elem(self.id).line
    }

    /// Raw half-ring back-link: for a first child this designates the last
    /// sibling.
    pub fn prev_link(&self) -> Option<Element<'a>> {
        self.tree.elem(self.id).prev.map(|id| Element {
            tree: self.tree,
            id,
        })
    }

    /// Returns an iterator over the element's attributes.
    pub fn attributes(&self) -> Attributes<'a> {
        Attributes {
            tree: self.tree,
            next: self.tree.elem(self.id).attr,
        }
    }

    /// Value of the named standard attribute.
    pub fn attr_value(&self, name: &str) -> Option<&'a str> {
        self.tree.attr_value(self.id, name)
    }

    /// Returns an iterator over the child elements.
    pub fn children(&self) -> Siblings<'a, Element<'a>> {
        Siblings::new(self.first_child())
    }

    /// Returns an iterator over all elements in the subtree (depth-first
    /// search algorithm).
    pub fn traverse(&self) -> Traverse<'a, Element<'a>> {
        Traverse::new(self.clone())
    }
}

impl<'a> NodeIterable<'a> for Element<'a> {
    fn parent(&self) -> Option<Element<'a>> {
        self.tree.elem(self.id).parent.map(|id| Element {
            tree: self.tree,
            id,
        })
    }

    fn next_sibling(&self) -> Option<Element<'a>> {
        self.tree.elem(self.id).next.map(|id| Element {
            tree: self.tree,
            id,
        })
    }

    fn first_child(&self) -> Option<Element<'a>> {
        self.tree.elem(self.id).child.map(|id| Element {
            tree: self.tree,
            id,
        })
    }
}

impl<'a> PartialEq for Element<'a> {
    fn eq(&self, other: &Element<'_>) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

// ===== impl Attribute =====

impl<'a> Attribute<'a> {
    /// Whether this entry is a namespace declaration rather than a
    /// standard attribute.
    pub fn is_namespace_decl(&self) -> bool {
        matches!(self.tree.attr(self.id).kind, AttrKind::NamespaceDecl { .. })
    }

    /// Attribute name, or the declared prefix of a namespace declaration
    /// (nil meaning the default namespace).
    pub fn name(&self) -> Option<&'a str> {
        self.tree.attr(self.id).name.as_deref()
    }

    pub fn value(&self) -> &'a str {
        self.tree.attr(self.id).value.as_str()
    }

    /// URI of a standard attribute's resolved namespace.
    pub fn namespace(&self) -> Option<&'a str> {
        match self.tree.attr(self.id).kind {
            AttrKind::Standard { ns } => {
                ns.map(|ns| self.tree.attr(ns).value.as_str())
            }
            AttrKind::NamespaceDecl { .. } => None,
        }
    }

    /// Element a namespace declaration was written on.
    pub fn parent(&self) -> Option<Element<'a>> {
        match self.tree.attr(self.id).kind {
            AttrKind::NamespaceDecl { parent } => Some(Element {
                tree: self.tree,
                id: parent,
            }),
            AttrKind::Standard { .. } => None,
        }
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        let id = self.next?;
        self.next = self.tree.attr(id).next;
        Some(Attribute {
            tree: self.tree,
            id,
        })
    }
}

// ===== XML parser =====

struct Parser<'a> {
    ctx: &'a Context,
    input: &'a [u8],
    pos: usize,
    line: u64,
}

impl<'a> Parser<'a> {
    fn parse_document(&mut self, tree: &mut XmlTree) -> Result<()> {
        self.skip_prolog()?;
        if self.peek().is_none() {
            return Err(self.error("empty document"));
        }
        self.parse_element(tree, None)?;
        // Only whitespace and comments may follow the root element.
        self.skip_misc()?;
        if self.peek().is_some() {
            return Err(self.error("content after the root element"));
        }
        Ok(())
    }

    fn skip_prolog(&mut self) -> Result<()> {
        self.skip_ws();
        if self.starts_with("<?xml") {
            self.skip_until("?>")?;
        }
        self.skip_misc()?;
        Ok(())
    }

    // Skip whitespace, comments and processing instructions.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.skip_ws();
            if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!") {
                return Err(self.error("unsupported markup declaration"));
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(
        &mut self,
        tree: &mut XmlTree,
        parent: Option<ElementId>,
    ) -> Result<ElementId> {
        let line = self.line;
        self.expect("<")?;
        let qname = self.read_name()?;
        let (prefix, local) = crate::utils::split_prefix(qname);

        let id = ElementId(tree.elems.len());
        tree.elems.push(ElementData {
            name: tree.dict.insert(local),
            ns: None,
            content: None,
            mixed: false,
            line,
            parent: None,
            child: None,
            next: None,
            prev: None,
            attr: None,
        });
        tree.add_child(parent, id);

        // Attributes: namespace declarations are classified while reading
        // so the scope is complete before any prefix is resolved.
        let mut pending = Vec::new();
        let self_closing = loop {
            self.skip_ws();
            match self.peek() {
                Some(b'/') => {
                    self.expect("/>")?;
                    break true;
                }
                Some(b'>') => {
                    self.pos += 1;
                    break false;
                }
                Some(_) => {
                    let attr_line = self.line;
                    let aname = self.read_name()?;
                    self.skip_ws();
                    self.expect("=")?;
                    self.skip_ws();
                    let value = self.read_attr_value()?;
                    if aname == "xmlns" {
                        tree.new_ns_decl(id, None, &value);
                    } else if let Some(p) = aname.strip_prefix("xmlns:") {
                        if p.is_empty() {
                            return Err(self.error_at(
                                attr_line,
                                "namespace declaration without a prefix",
                            ));
                        }
                        tree.new_ns_decl(id, Some(p), &value);
                    } else {
                        let (aprefix, alocal) =
                            crate::utils::split_prefix(aname);
                        let attr_id = tree.new_attr(id, alocal, &value);
                        if let Some(aprefix) = aprefix {
                            pending.push((attr_id, aprefix, attr_line));
                        }
                    }
                }
                None => return Err(self.error("unterminated start tag")),
            }
        };

        // Resolve the element and its prefixed attributes against the
        // declarations now in scope.
        let resolved = tree.resolve_ns(id, prefix);
        match (prefix, resolved) {
            (Some(prefix), None) => {
                return Err(self.resolve_error(line, prefix));
            }
            (Some(_), ns) => tree.elem_mut(id).ns = ns,
            (None, ns) => tree.elem_mut(id).ns = ns,
        }
        for (attr_id, aprefix, attr_line) in pending {
            match tree.resolve_ns(id, Some(aprefix)) {
                Some(ns) => {
                    if let AttrKind::Standard { ns: slot } =
                        &mut tree.attrs[attr_id.0].kind
                    {
                        *slot = Some(ns);
                    }
                }
                None => return Err(self.resolve_error(attr_line, aprefix)),
            }
        }

        if self_closing {
            return Ok(id);
        }

        // Content: character data, child elements, CDATA and comments.
        let mut text = String::new();
        let mut has_children = false;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated element")),
                Some(b'<') if self.starts_with("</") => {
                    self.pos += 2;
                    let cname = self.read_name()?;
                    if cname != qname {
                        return Err(self.error(&format!(
                            "closing tag \"{}\" does not match \"{}\"",
                            cname, qname
                        )));
                    }
                    self.skip_ws();
                    self.expect(">")?;
                    break;
                }
                Some(b'<') if self.starts_with("<!--") => {
                    self.skip_comment()?;
                }
                Some(b'<') if self.starts_with("<![CDATA[") => {
                    self.pos += 9;
                    let chunk = self.take_until("]]>")?;
                    text.push_str(chunk);
                }
                Some(b'<') if self.starts_with("<?") => {
                    self.skip_until("?>")?;
                }
                Some(b'<') => {
                    self.parse_element(tree, Some(id))?;
                    has_children = true;
                }
                Some(b'&') => {
                    let ch = self.decode_entity()?;
                    text.push(ch);
                }
                Some(_) => {
                    let chunk = self.take_text();
                    text.push_str(chunk);
                }
            }
        }

        if has_children {
            if !text.trim().is_empty() {
                let content = tree.dict.insert(&text);
                let elem = tree.elem_mut(id);
                elem.mixed = true;
                elem.content = Some(content);
            }
        } else if !text.is_empty() {
            tree.elem_mut(id).content = Some(tree.dict.insert(&text));
        }
        Ok(id)
    }

    // ----- low-level scanning -----

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s.as_bytes())
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.starts_with(s) {
            self.pos += s.len();
            Ok(())
        } else {
            Err(self.error(&format!("expected \"{}\"", s)))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if !b.is_ascii_whitespace() {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.pos += 4;
        self.take_until("-->")?;
        Ok(())
    }

    fn skip_until(&mut self, delim: &str) -> Result<()> {
        self.take_until(delim)?;
        Ok(())
    }

    fn take_until(&mut self, delim: &str) -> Result<&'a str> {
        let start = self.pos;
        while self.pos < self.input.len() {
            if self.starts_with(delim) {
                let chunk =
                    std::str::from_utf8(&self.input[start..self.pos]).unwrap();
                self.pos += delim.len();
                return Ok(chunk);
            }
            if self.input[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        Err(self.error(&format!("missing \"{}\"", delim)))
    }

    fn is_name_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
    }

    fn is_name_char(b: u8) -> bool {
        Self::is_name_start(b) || b.is_ascii_digit() || matches!(b, b'-' | b'.' | b':')
    }

    fn read_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(b) if Self::is_name_start(b) => self.pos += 1,
            _ => return Err(self.error("invalid name")),
        }
        while let Some(b) = self.peek() {
            if !Self::is_name_char(b) {
                break;
            }
            self.pos += 1;
        }
        Ok(std::str::from_utf8(&self.input[start..self.pos]).unwrap())
    }

    fn read_attr_value(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error("attribute value is not quoted")),
        };
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error("unterminated attribute value"))
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some(b'&') => {
                    let ch = self.decode_entity()?;
                    value.push(ch);
                }
                Some(b'<') => {
                    return Err(self.error("\"<\" in attribute value"))
                }
                Some(b) => {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    // Copy the full UTF-8 sequence.
                    let s = &self.input[self.pos..];
                    let ch =
                        std::str::from_utf8(s).unwrap().chars().next().unwrap();
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
    }

    /// Take the raw character data up to the next markup or entity.
    fn take_text(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'<' || b == b'&' {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos]).unwrap()
    }

    fn decode_entity(&mut self) -> Result<char> {
        let line = self.line;
        self.pos += 1;
        let body = self.take_until(";").map_err(|_| {
            self.error_at(line, "unterminated entity reference")
        })?;
        match body {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => {
                let code = if let Some(hex) = body.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = body.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    self.error_at(
                        line,
                        &format!("unknown entity reference \"&{};\"", body),
                    )
                })
            }
        }
    }

    // ----- diagnostics -----

    fn error(&self, msg: &str) -> crate::error::Error {
        self.error_at(self.line, msg)
    }

    fn error_at(&self, line: u64, msg: &str) -> crate::error::Error {
        self.ctx.sink().error(
            ErrorCode::Xml,
            Some(line),
            format!("malformed XML: {}", msg),
        )
    }

    fn resolve_error(&self, line: u64, prefix: &str) -> crate::error::Error {
        self.ctx.sink().error(
            ErrorCode::UnresolvablePrefix,
            Some(line),
            format!("no namespace declaration in scope for prefix \"{}\"", prefix),
        )
    }
}

// ===== helper functions =====

fn escape<W: Write>(s: &str, attr: bool, writer: &mut W) -> Result<()> {
    for ch in s.chars() {
        match ch {
            '&' => write!(writer, "&amp;")?,
            '<' => write!(writer, "&lt;")?,
            '>' => write!(writer, "&gt;")?,
            '"' if attr => write!(writer, "&quot;")?,
            _ => write!(writer, "{}", ch)?,
        }
    }
    Ok(())
}
