//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Compiled YANG schema representation.
//!
//! Modules own their typedef, identity and feature tables and an arena of
//! schema nodes linked into half-ring sibling lists. Cross-module
//! references (import targets, typedef derivations, identity bases, uses
//! targets, list keys) are non-owning index handles resolved through the
//! context.

use bitflags::bitflags;
use num_derive::FromPrimitive;

use crate::context::Context;
use crate::dict::DictStr;
use crate::iter::{Ancestors, NodeIterable, Siblings, Traverse};

/// Handle to a module registered in a context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModuleId(pub(crate) usize);

/// Handle to a schema node within its module's arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeId(pub(crate) usize);

bitflags! {
    /// Bit-packed schema node flags.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct NodeFlags: u16 {
        /// Read-write configuration data.
        const CONFIG_W = 0x0001;
        /// Read-only state data.
        const CONFIG_R = 0x0002;
        const STATUS_CURR = 0x0004;
        const STATUS_DEPRC = 0x0008;
        const STATUS_OBSLT = 0x0010;
        const MANDATORY = 0x0020;
        const USER_ORDERED = 0x0040;
        const PRESENCE = 0x0080;
        /// Leaf is a list key.
        const KEY = 0x0100;
    }
}

bitflags! {
    /// Node kind mask for schema searches.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct NodeKindMask: u16 {
        const CONTAINER = 0x0001;
        const CHOICE = 0x0002;
        const LEAF = 0x0004;
        const LEAFLIST = 0x0008;
        const LIST = 0x0010;
        const ANYXML = 0x0020;
        const CASE = 0x0040;
        const GROUPING = 0x0080;
        const USES = 0x0100;
        const ANY = 0x01ff;
    }
}

/// YANG schema node kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Container,
    Choice,
    Leaf,
    LeafList,
    List,
    AnyXml,
    Case,
    Grouping,
    Uses,
}

/// Base kind of a YANG type.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum TypeKind {
    Unknown = 0,
    Binary = 1,
    Uint8 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
    String = 6,
    Bits = 7,
    Bool = 8,
    Dec64 = 9,
    Empty = 10,
    Enum = 11,
    IdentityRef = 12,
    InstanceId = 13,
    LeafRef = 14,
    Union = 15,
    Int8 = 16,
    Int16 = 17,
    Int32 = 18,
    Int64 = 19,
}

/// Canonical names of the built-in types.
pub(crate) static BUILT_IN_TYPES: &[(&str, TypeKind)] = &[
    ("binary", TypeKind::Binary),
    ("bits", TypeKind::Bits),
    ("boolean", TypeKind::Bool),
    ("decimal64", TypeKind::Dec64),
    ("empty", TypeKind::Empty),
    ("enumeration", TypeKind::Enum),
    ("identityref", TypeKind::IdentityRef),
    ("instance-identifier", TypeKind::InstanceId),
    ("int8", TypeKind::Int8),
    ("int16", TypeKind::Int16),
    ("int32", TypeKind::Int32),
    ("int64", TypeKind::Int64),
    ("leafref", TypeKind::LeafRef),
    ("string", TypeKind::String),
    ("uint8", TypeKind::Uint8),
    ("uint16", TypeKind::Uint16),
    ("uint32", TypeKind::Uint32),
    ("uint64", TypeKind::Uint64),
    ("union", TypeKind::Union),
];

/// Reference to a typedef, addressing the scope that owns it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct TpdfRef {
    pub(crate) module: ModuleId,
    pub(crate) scope: TpdfScope,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TpdfScope {
    /// Module top-level table.
    Top(usize),
    /// Table of the submodule behind the given include.
    Submodule(usize, usize),
    /// Table embedded in a container, list or grouping node.
    Node(NodeId, usize),
}

/// Reference to an identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct IdentRef {
    pub(crate) module: ModuleId,
    pub(crate) scope: IdentScope,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum IdentScope {
    Top(usize),
    Submodule(usize, usize),
}

/// Type descriptor: resolved base kind, derivation and kind-specific
/// payload.
#[derive(Debug)]
pub(crate) struct Type {
    pub(crate) kind: TypeKind,
    pub(crate) der: TypeDer,
    pub(crate) prefix: Option<DictStr>,
    pub(crate) info: TypeInfo,
}

#[derive(Debug)]
pub(crate) enum TypeDer {
    /// Derivation terminates at a built-in type.
    BuiltIn,
    Typedef(TpdfRef),
}

/// Kind-tagged payload of a type descriptor.
#[derive(Debug)]
pub(crate) enum TypeInfo {
    None,
    Enums(Vec<TypeEnum>),
    IdentityRef { base: IdentRef },
    /// Raw substatements kept for constraint kinds whose deep parsing is
    /// deferred (union, bits, ranges, patterns, leafref paths, ...).
    Unparsed(Vec<RawStmt>),
}

/// A single member of an enumeration type.
#[derive(Debug)]
pub struct TypeEnum {
    pub(crate) name: DictStr,
    pub(crate) value: i32,
}

/// An unparsed substatement recorded for later passes.
#[derive(Debug)]
pub(crate) struct RawStmt {
    pub(crate) name: DictStr,
    pub(crate) arg: Option<DictStr>,
}

#[derive(Debug)]
pub(crate) struct Typedef {
    pub(crate) name: DictStr,
    pub(crate) type_: Type,
    pub(crate) units: Option<DictStr>,
    pub(crate) dflt: Option<DictStr>,
    pub(crate) flags: NodeFlags,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
}

#[derive(Debug)]
pub(crate) struct Identity {
    pub(crate) name: DictStr,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
    pub(crate) flags: NodeFlags,
    pub(crate) base: Option<IdentRef>,
    pub(crate) derived: Vec<IdentRef>,
}

#[derive(Debug)]
pub(crate) struct Feature {
    pub(crate) name: DictStr,
    pub(crate) enabled: bool,
    pub(crate) flags: NodeFlags,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
}

#[derive(Debug)]
pub(crate) struct Revision {
    pub(crate) date: DictStr,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
}

#[derive(Debug)]
pub(crate) struct Import {
    pub(crate) prefix: DictStr,
    pub(crate) rev: Option<DictStr>,
    pub(crate) module: ModuleId,
}

#[derive(Debug)]
pub(crate) struct Include {
    pub(crate) rev: Option<DictStr>,
    pub(crate) submodule: Submodule,
}

/// Submodule descriptor; its data nodes are compiled into the owning
/// module's tree, the lookup tables stay here.
#[derive(Debug)]
pub(crate) struct Submodule {
    pub(crate) name: DictStr,
    pub(crate) belongs_to_prefix: DictStr,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
    pub(crate) org: Option<DictStr>,
    pub(crate) contact: Option<DictStr>,
    pub(crate) revisions: Vec<Revision>,
    pub(crate) imports: Vec<Import>,
    pub(crate) tpdf: Vec<Typedef>,
    pub(crate) identities: Vec<Identity>,
    pub(crate) features: Vec<Feature>,
}

/// A compiled module.
#[derive(Debug)]
pub(crate) struct Module {
    pub(crate) name: DictStr,
    pub(crate) ns: DictStr,
    pub(crate) prefix: DictStr,
    pub(crate) version: u8,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
    pub(crate) org: Option<DictStr>,
    pub(crate) contact: Option<DictStr>,
    pub(crate) implemented: bool,
    pub(crate) revisions: Vec<Revision>,
    pub(crate) imports: Vec<Import>,
    pub(crate) includes: Vec<Include>,
    pub(crate) tpdf: Vec<Typedef>,
    pub(crate) identities: Vec<Identity>,
    pub(crate) features: Vec<Feature>,
    pub(crate) nodes: Vec<SchemaNodeData>,
    pub(crate) data: Option<NodeId>,
}

#[derive(Debug)]
pub(crate) struct SchemaNodeData {
    pub(crate) name: DictStr,
    pub(crate) dsc: Option<DictStr>,
    pub(crate) ref_: Option<DictStr>,
    pub(crate) flags: NodeFlags,
    pub(crate) module: ModuleId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) child: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    /// Half-ring link; the first sibling points back at the last one.
    pub(crate) prev: Option<NodeId>,
    pub(crate) payload: NodePayload,
}

#[derive(Debug)]
pub(crate) enum NodePayload {
    Container {
        presence: Option<DictStr>,
        tpdf: Vec<Typedef>,
    },
    Choice {
        dflt: Option<DictStr>,
    },
    Leaf {
        type_: Type,
        units: Option<DictStr>,
        dflt: Option<DictStr>,
    },
    LeafList {
        type_: Type,
        units: Option<DictStr>,
        min: u32,
        max: u32,
    },
    List {
        tpdf: Vec<Typedef>,
        keys: Vec<NodeId>,
        min: u32,
        max: u32,
    },
    AnyXml,
    Case,
    Grouping {
        tpdf: Vec<Typedef>,
    },
    Uses {
        grouping: Option<(ModuleId, NodeId)>,
        refinements: Vec<RawStmt>,
    },
}

// ===== impl NodeKind =====

impl NodeKind {
    pub(crate) fn mask(self) -> NodeKindMask {
        match self {
            NodeKind::Container => NodeKindMask::CONTAINER,
            NodeKind::Choice => NodeKindMask::CHOICE,
            NodeKind::Leaf => NodeKindMask::LEAF,
            NodeKind::LeafList => NodeKindMask::LEAFLIST,
            NodeKind::List => NodeKindMask::LIST,
            NodeKind::AnyXml => NodeKindMask::ANYXML,
            NodeKind::Case => NodeKindMask::CASE,
            NodeKind::Grouping => NodeKindMask::GROUPING,
            NodeKind::Uses => NodeKindMask::USES,
        }
    }
}

// ===== impl NodePayload =====

impl NodePayload {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Container { .. } => NodeKind::Container,
            NodePayload::Choice { .. } => NodeKind::Choice,
            NodePayload::Leaf { .. } => NodeKind::Leaf,
            NodePayload::LeafList { .. } => NodeKind::LeafList,
            NodePayload::List { .. } => NodeKind::List,
            NodePayload::AnyXml => NodeKind::AnyXml,
            NodePayload::Case => NodeKind::Case,
            NodePayload::Grouping { .. } => NodeKind::Grouping,
            NodePayload::Uses { .. } => NodeKind::Uses,
        }
    }

    /// Typedef table of scopes that carry one.
    pub(crate) fn tpdf(&self) -> Option<&Vec<Typedef>> {
        match self {
            NodePayload::Container { tpdf, .. }
            | NodePayload::List { tpdf, .. }
            | NodePayload::Grouping { tpdf } => Some(tpdf),
            _ => None,
        }
    }
}

// ===== impl Type =====

impl Type {
    pub(crate) fn new(kind: TypeKind) -> Type {
        Type {
            kind,
            der: TypeDer::BuiltIn,
            prefix: None,
            info: TypeInfo::None,
        }
    }
}

// ===== impl Module =====

impl Module {
    pub(crate) fn node(&self, id: NodeId) -> &SchemaNodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNodeData {
        &mut self.nodes[id.0]
    }

    pub(crate) fn alloc_node(&mut self, data: SchemaNodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    /// Append `child` into the half-ring child list of `parent` (nil
    /// appends at the module's top level).
    pub(crate) fn add_child(
        &mut self,
        parent: Option<NodeId>,
        child: NodeId,
    ) {
        self.node_mut(child).parent = parent;
        self.node_mut(child).next = None;
        let first = match parent {
            Some(parent) => self.node(parent).child,
            None => self.data,
        };
        match first {
            None => {
                self.node_mut(child).prev = Some(child);
                match parent {
                    Some(parent) => self.node_mut(parent).child = Some(child),
                    None => self.data = Some(child),
                }
            }
            Some(first) => {
                let last = self.node(first).prev.unwrap();
                self.nodes[last.0].next = Some(child);
                self.node_mut(child).prev = Some(last);
                self.nodes[first.0].prev = Some(child);
            }
        }
    }

    /// Detach a node from its parent and siblings, restoring the half-ring
    /// on both sides.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let parent = self.node(id).parent;
        let next = self.node(id).next;
        let prev = self.node(id).prev;
        let first = match parent {
            Some(parent) => self.node(parent).child,
            None => self.data,
        };

        if first == Some(id) {
            match parent {
                Some(parent) => self.node_mut(parent).child = next,
                None => self.data = next,
            }
            if let Some(next) = next {
                self.nodes[next.0].prev =
                    if prev == Some(id) { Some(next) } else { prev };
            }
        } else {
            let prev = prev.unwrap();
            self.nodes[prev.0].next = next;
            match next {
                Some(next) => self.nodes[next.0].prev = Some(prev),
                None => {
                    let first = first.unwrap();
                    self.nodes[first.0].prev = Some(prev);
                }
            }
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.next = None;
        node.prev = None;
    }

    /// Linear search over a half-ring child list.
    pub(crate) fn find_child(
        &self,
        parent: Option<NodeId>,
        name: &str,
        mask: NodeKindMask,
    ) -> Option<NodeId> {
        let mut next = match parent {
            Some(parent) => self.node(parent).child,
            None => self.data,
        };
        while let Some(id) = next {
            let node = self.node(id);
            if mask.contains(node.payload.kind().mask())
                && node.name == name
            {
                return Some(id);
            }
            next = node.next;
        }
        None
    }

    /// Latest revision date, if any revision was declared.
    pub(crate) fn latest_revision(&self) -> Option<&str> {
        self.revisions
            .iter()
            .map(|rev| rev.date.as_str())
            .max()
    }

    /// Locate a typedef visible at module scope: the module's own table
    /// first, then each included submodule's.
    pub(crate) fn find_typedef_top(&self, name: &str) -> Option<TpdfScope> {
        self.tpdf
            .iter()
            .position(|tpdf| tpdf.name == name)
            .map(TpdfScope::Top)
            .or_else(|| {
                self.includes.iter().enumerate().find_map(|(i, incl)| {
                    incl.submodule
                        .tpdf
                        .iter()
                        .position(|tpdf| tpdf.name == name)
                        .map(|t| TpdfScope::Submodule(i, t))
                })
            })
    }
}

// ===== public accessors =====

/// A YANG module registered in a context.
#[derive(Clone, Debug)]
pub struct SchemaModule<'a> {
    context: &'a Context,
    pub(crate) id: ModuleId,
}

/// Generic YANG schema node.
#[derive(Clone, Debug)]
pub struct SchemaNode<'a> {
    context: &'a Context,
    pub(crate) module: ModuleId,
    pub(crate) id: NodeId,
}

/// A submodule included by a module.
#[derive(Clone, Debug)]
pub struct SchemaSubmodule<'a> {
    context: &'a Context,
    module: ModuleId,
    index: usize,
}

/// A YANG identity.
#[derive(Clone, Debug)]
pub struct SchemaIdentity<'a> {
    context: &'a Context,
    pub(crate) ident: IdentRef,
}

/// Type of a leaf or leaf-list node, or of a typedef.
#[derive(Clone, Debug)]
pub struct SchemaType<'a> {
    context: &'a Context,
    raw: &'a Type,
}

/// A named type derivation.
#[derive(Clone, Debug)]
pub struct SchemaTypedef<'a> {
    context: &'a Context,
    tpdf: TpdfRef,
}

/// A feature declared by a module or one of its submodules.
#[derive(Clone, Debug)]
pub struct SchemaFeature<'a> {
    feature: &'a Feature,
}

/// A revision entry of a module.
#[derive(Clone, Debug)]
pub struct SchemaRevision<'a> {
    revision: &'a Revision,
}

/// An import of a module.
#[derive(Clone, Debug)]
pub struct SchemaImport<'a> {
    context: &'a Context,
    import: &'a Import,
}

// ===== impl SchemaModule =====

impl<'a> SchemaModule<'a> {
    pub(crate) fn new(context: &'a Context, id: ModuleId) -> SchemaModule<'a> {
        SchemaModule { context, id }
    }

    pub(crate) fn raw(&self) -> &'a Module {
        self.context.module_data(self.id)
    }

    /// Name of the module.
    pub fn name(&self) -> &'a str {
        self.raw().name.as_str()
    }

    /// Latest revision of the module.
    pub fn revision(&self) -> Option<&'a str> {
        self.raw().latest_revision()
    }

    /// Namespace of the module.
    pub fn namespace(&self) -> &'a str {
        self.raw().ns.as_str()
    }

    /// Prefix of the module.
    pub fn prefix(&self) -> &'a str {
        self.raw().prefix.as_str()
    }

    /// Party/company responsible for the module.
    pub fn organization(&self) -> Option<&'a str> {
        self.raw().org.as_deref()
    }

    /// Contact information for the module.
    pub fn contact(&self) -> Option<&'a str> {
        self.raw().contact.as_deref()
    }

    /// Description of the module.
    pub fn description(&self) -> Option<&'a str> {
        self.raw().dsc.as_deref()
    }

    /// Cross-reference for the module.
    pub fn reference(&self) -> Option<&'a str> {
        self.raw().ref_.as_deref()
    }

    /// Return true if the module is implemented, not just imported.
    pub fn is_implemented(&self) -> bool {
        self.raw().implemented
    }

    /// Returns an iterator over the top-level nodes, including schema-only
    /// groupings.
    pub fn data(&self) -> Siblings<'a, SchemaNode<'a>> {
        let first = self.raw().data.map(|id| SchemaNode {
            context: self.context,
            module: self.id,
            id,
        });
        Siblings::new(first)
    }

    /// Returns an iterator over all nodes of the module (depth-first
    /// search algorithm).
    pub fn traverse(&self) -> impl Iterator<Item = SchemaNode<'a>> {
        self.data().flat_map(|snode| snode.traverse())
    }

    /// Find a top-level node by name.
    pub fn find_node(
        &self,
        name: &str,
        mask: NodeKindMask,
    ) -> Option<SchemaNode<'a>> {
        let id = self.raw().find_child(None, name, mask)?;
        Some(SchemaNode {
            context: self.context,
            module: self.id,
            id,
        })
    }

    /// Returns an iterator over the module's identities (submodule
    /// identities included).
    pub fn identities(&self) -> impl Iterator<Item = SchemaIdentity<'a>> {
        let context = self.context;
        let id = self.id;
        let module = self.raw();
        let top = (0..module.identities.len())
            .map(move |i| SchemaIdentity {
                context,
                ident: IdentRef {
                    module: id,
                    scope: IdentScope::Top(i),
                },
            });
        let sub = module.includes.iter().enumerate().flat_map(move |(s, incl)| {
            (0..incl.submodule.identities.len()).map(move |i| SchemaIdentity {
                context,
                ident: IdentRef {
                    module: id,
                    scope: IdentScope::Submodule(s, i),
                },
            })
        });
        top.chain(sub)
    }

    /// Find an identity of this module (or its submodules) by name.
    pub fn identity(&self, name: &str) -> Option<SchemaIdentity<'a>> {
        self.identities().find(|ident| ident.name() == name)
    }

    /// Typedef declared at the module's top level.
    pub fn typedef(&self, name: &str) -> Option<SchemaTypedef<'a>> {
        let scope = self.raw().find_typedef_top(name)?;
        Some(SchemaTypedef {
            context: self.context,
            tpdf: TpdfRef {
                module: self.id,
                scope,
            },
        })
    }

    /// Returns an iterator over the submodules included by this module.
    pub fn submodules(&self) -> impl Iterator<Item = SchemaSubmodule<'a>> {
        let context = self.context;
        let id = self.id;
        (0..self.raw().includes.len()).map(move |index| SchemaSubmodule {
            context,
            module: id,
            index,
        })
    }

    /// YANG language version of the module.
    pub fn version(&self) -> u8 {
        self.raw().version
    }

    /// Returns an iterator over the module's revision entries, in source
    /// order.
    pub fn revisions(&self) -> impl Iterator<Item = SchemaRevision<'a>> {
        self.raw()
            .revisions
            .iter()
            .map(|revision| SchemaRevision { revision })
    }

    /// Returns an iterator over the module's imports.
    pub fn imports(&self) -> impl Iterator<Item = SchemaImport<'a>> {
        let context = self.context;
        self.raw()
            .imports
            .iter()
            .map(move |import| SchemaImport { context, import })
    }

    /// Returns an iterator over the module's features (submodule features
    /// included).
    pub fn features(&self) -> impl Iterator<Item = SchemaFeature<'a>> {
        let module = self.raw();
        module
            .features
            .iter()
            .chain(
                module
                    .includes
                    .iter()
                    .flat_map(|incl| incl.submodule.features.iter()),
            )
            .map(|feature| SchemaFeature { feature })
    }

    /// Enumerate feature names with a parallel on/off state vector.
    pub fn features_list(&self) -> (Vec<&'a str>, Vec<bool>) {
        let module = self.raw();
        let mut names = Vec::new();
        let mut states = Vec::new();
        for feature in module.features.iter().chain(
            module
                .includes
                .iter()
                .flat_map(|incl| incl.submodule.features.iter()),
        ) {
            names.push(feature.name.as_str());
            states.push(feature.enabled);
        }
        (names, states)
    }
}

impl<'a> PartialEq for SchemaModule<'a> {
    fn eq(&self, other: &SchemaModule<'_>) -> bool {
        self.id == other.id
    }
}

// ===== impl SchemaNode =====

impl<'a> SchemaNode<'a> {
    pub(crate) fn raw(&self) -> &'a SchemaNodeData {
        self.context.module_data(self.module).node(self.id)
    }

    fn check_flag(&self, flag: NodeFlags) -> bool {
        self.raw().flags.contains(flag)
    }

    /// Schema node module.
    pub fn module(&self) -> SchemaModule<'a> {
        SchemaModule {
            context: self.context,
            id: self.raw().module,
        }
    }

    /// Returns the kind of the schema node.
    pub fn kind(&self) -> NodeKind {
        self.raw().payload.kind()
    }

    /// Schema node name.
    pub fn name(&self) -> &'a str {
        self.raw().name.as_str()
    }

    /// Description statement.
    pub fn description(&self) -> Option<&'a str> {
        self.raw().dsc.as_deref()
    }

    /// Reference statement.
    pub fn reference(&self) -> Option<&'a str> {
        self.raw().ref_.as_deref()
    }

    /// Returns whether the node is a configuration node.
    pub fn is_config(&self) -> bool {
        self.check_flag(NodeFlags::CONFIG_W)
    }

    /// Returns whether the node is a state node.
    pub fn is_state(&self) -> bool {
        self.check_flag(NodeFlags::CONFIG_R)
    }

    /// Returns whether the node's status is "current".
    pub fn is_status_current(&self) -> bool {
        self.check_flag(NodeFlags::STATUS_CURR)
    }

    /// Returns whether the node's status is "deprecated".
    pub fn is_status_deprecated(&self) -> bool {
        self.check_flag(NodeFlags::STATUS_DEPRC)
    }

    /// Returns whether the node's status is "obsolete".
    pub fn is_status_obsolete(&self) -> bool {
        self.check_flag(NodeFlags::STATUS_OBSLT)
    }

    /// Returns whether the node is mandatory.
    pub fn is_mandatory(&self) -> bool {
        self.check_flag(NodeFlags::MANDATORY)
    }

    /// Returns whether the node is a list's key.
    pub fn is_list_key(&self) -> bool {
        self.kind() == NodeKind::Leaf && self.check_flag(NodeFlags::KEY)
    }

    /// Returns whether the node is an user-ordered list or leaf-list.
    pub fn is_user_ordered(&self) -> bool {
        self.check_flag(NodeFlags::USER_ORDERED)
    }

    /// Returns whether the node is a non-presence container.
    pub fn is_np_container(&self) -> bool {
        self.kind() == NodeKind::Container
            && !self.check_flag(NodeFlags::PRESENCE)
    }

    /// The presence description of a presence container.
    pub fn presence(&self) -> Option<&'a str> {
        match &self.raw().payload {
            NodePayload::Container { presence, .. } => presence.as_deref(),
            _ => None,
        }
    }

    /// Refinement and augment descriptors recorded on a uses node,
    /// unapplied.
    pub fn refinements(
        &self,
    ) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        let refinements = match &self.raw().payload {
            NodePayload::Uses { refinements, .. } => refinements.as_slice(),
            _ => &[],
        };
        refinements
            .iter()
            .map(|stmt| (stmt.name.as_str(), stmt.arg.as_deref()))
    }

    /// Units of the leaf(-list)'s type.
    pub fn units(&self) -> Option<&'a str> {
        match &self.raw().payload {
            NodePayload::Leaf { units, .. }
            | NodePayload::LeafList { units, .. } => units.as_deref(),
            _ => None,
        }
    }

    /// The default value of the leaf (canonical string representation).
    pub fn default_value(&self) -> Option<&'a str> {
        match &self.raw().payload {
            NodePayload::Leaf { dflt, .. } => dflt.as_deref(),
            _ => None,
        }
    }

    /// The name of the choice's default case.
    pub fn default_case(&self) -> Option<&'a str> {
        match &self.raw().payload {
            NodePayload::Choice { dflt } => dflt.as_deref(),
            _ => None,
        }
    }

    /// The min-elements constraint.
    pub fn min_elements(&self) -> Option<u32> {
        let min = match &self.raw().payload {
            NodePayload::LeafList { min, .. }
            | NodePayload::List { min, .. } => *min,
            _ => return None,
        };
        if min != 0 {
            Some(min)
        } else {
            None
        }
    }

    /// The max-elements constraint.
    pub fn max_elements(&self) -> Option<u32> {
        let max = match &self.raw().payload {
            NodePayload::LeafList { max, .. }
            | NodePayload::List { max, .. } => *max,
            _ => return None,
        };
        if max != u32::MAX {
            Some(max)
        } else {
            None
        }
    }

    /// Type of the leaf(-list) node.
    pub fn leaf_type(&self) -> Option<SchemaType<'a>> {
        match &self.raw().payload {
            NodePayload::Leaf { type_, .. }
            | NodePayload::LeafList { type_, .. } => Some(SchemaType {
                context: self.context,
                raw: type_,
            }),
            _ => None,
        }
    }

    /// The grouping referenced by a uses node, once resolved.
    pub fn uses_grouping(&self) -> Option<SchemaNode<'a>> {
        match &self.raw().payload {
            NodePayload::Uses { grouping, .. } => {
                grouping.map(|(module, id)| SchemaNode {
                    context: self.context,
                    module,
                    id,
                })
            }
            _ => None,
        }
    }

    /// Returns an iterator over the keys of the list.
    pub fn list_keys(&self) -> impl Iterator<Item = SchemaNode<'a>> + 'a {
        let context = self.context;
        let module = self.module;
        let keys = match &self.raw().payload {
            NodePayload::List { keys, .. } => keys.clone(),
            _ => Vec::new(),
        };
        keys.into_iter().map(move |id| SchemaNode {
            context,
            module,
            id,
        })
    }

    /// Returns an iterator over the ancestor schema nodes.
    pub fn ancestors(&self) -> Ancestors<'a, SchemaNode<'a>> {
        Ancestors::new(self.parent())
    }

    /// Returns an iterator over the sibling schema nodes.
    pub fn siblings(&self) -> Siblings<'a, SchemaNode<'a>> {
        Siblings::new(self.next_sibling())
    }

    /// Returns an iterator over the child schema nodes.
    pub fn children(&self) -> Siblings<'a, SchemaNode<'a>> {
        Siblings::new(self.first_child())
    }

    /// Returns an iterator over all elements in the schema subtree
    /// (depth-first search algorithm).
    pub fn traverse(&self) -> Traverse<'a, SchemaNode<'a>> {
        Traverse::new(self.clone())
    }

    /// Find a direct child by name.
    pub fn find_child(
        &self,
        name: &str,
        mask: NodeKindMask,
    ) -> Option<SchemaNode<'a>> {
        let id = self
            .context
            .module_data(self.module)
            .find_child(Some(self.id), name, mask)?;
        Some(SchemaNode {
            context: self.context,
            module: self.module,
            id,
        })
    }

    /// Raw half-ring back-link: for a first child this designates the last
    /// sibling.
    pub fn prev_link(&self) -> Option<SchemaNode<'a>> {
        self.raw().prev.map(|id| SchemaNode {
            context: self.context,
            module: self.module,
            id,
        })
    }
}

impl<'a> NodeIterable<'a> for SchemaNode<'a> {
    fn parent(&self) -> Option<SchemaNode<'a>> {
        self.raw().parent.map(|id| SchemaNode {
            context: self.context,
            module: self.module,
            id,
        })
    }

    fn next_sibling(&self) -> Option<SchemaNode<'a>> {
        self.raw().next.map(|id| SchemaNode {
            context: self.context,
            module: self.module,
            id,
        })
    }

    fn first_child(&self) -> Option<SchemaNode<'a>> {
        self.raw().child.map(|id| SchemaNode {
            context: self.context,
            module: self.module,
            id,
        })
    }
}

impl<'a> PartialEq for SchemaNode<'a> {
    fn eq(&self, other: &SchemaNode<'_>) -> bool {
        self.module == other.module && self.id == other.id
    }
}

// ===== impl SchemaSubmodule =====

impl<'a> SchemaSubmodule<'a> {
    fn include(&self) -> &'a Include {
        &self.context.module_data(self.module).includes[self.index]
    }

    fn raw(&self) -> &'a Submodule {
        &self.include().submodule
    }

    /// Name of the submodule.
    pub fn name(&self) -> &'a str {
        self.raw().name.as_str()
    }

    /// Latest revision of the submodule.
    pub fn revision(&self) -> Option<&'a str> {
        self.raw()
            .revisions
            .iter()
            .map(|rev| rev.date.as_str())
            .max()
    }

    /// Revision date requested by the include statement, if any.
    pub fn include_revision(&self) -> Option<&'a str> {
        self.include().rev.as_deref()
    }

    /// Description of the submodule.
    pub fn description(&self) -> Option<&'a str> {
        self.raw().dsc.as_deref()
    }

    /// Cross-reference for the submodule.
    pub fn reference(&self) -> Option<&'a str> {
        self.raw().ref_.as_deref()
    }

    /// Party/company responsible for the submodule.
    pub fn organization(&self) -> Option<&'a str> {
        self.raw().org.as_deref()
    }

    /// Contact information for the submodule.
    pub fn contact(&self) -> Option<&'a str> {
        self.raw().contact.as_deref()
    }

    /// The module this submodule belongs to.
    pub fn module(&self) -> SchemaModule<'a> {
        SchemaModule {
            context: self.context,
            id: self.module,
        }
    }
}

// ===== impl SchemaIdentity =====

impl<'a> SchemaIdentity<'a> {
    pub(crate) fn new(
        context: &'a Context,
        ident: IdentRef,
    ) -> SchemaIdentity<'a> {
        SchemaIdentity { context, ident }
    }

    pub(crate) fn raw(&self) -> &'a Identity {
        self.context.identity_data(self.ident)
    }

    /// Name of the identity.
    pub fn name(&self) -> &'a str {
        self.raw().name.as_str()
    }

    /// Description statement.
    pub fn description(&self) -> Option<&'a str> {
        self.raw().dsc.as_deref()
    }

    /// Reference statement.
    pub fn reference(&self) -> Option<&'a str> {
        self.raw().ref_.as_deref()
    }

    /// The base this identity derives from.
    pub fn base(&self) -> Option<SchemaIdentity<'a>> {
        self.raw().base.map(|ident| SchemaIdentity {
            context: self.context,
            ident,
        })
    }

    /// Identities derived, directly or transitively, from this one.
    pub fn derived(&self) -> impl Iterator<Item = SchemaIdentity<'a>> + 'a {
        let context = self.context;
        self.raw()
            .derived
            .iter()
            .map(move |ident| SchemaIdentity {
                context,
                ident: *ident,
            })
    }

    /// Module the identity belongs to.
    pub fn module(&self) -> SchemaModule<'a> {
        SchemaModule {
            context: self.context,
            id: self.ident.module,
        }
    }
}

impl<'a> PartialEq for SchemaIdentity<'a> {
    fn eq(&self, other: &SchemaIdentity<'_>) -> bool {
        self.ident == other.ident
    }
}

// ===== impl SchemaType =====

impl<'a> SchemaType<'a> {
    /// Returns the resolved base type.
    pub fn base_kind(&self) -> TypeKind {
        self.raw.kind
    }

    /// Prefix the type was qualified with in the source.
    pub fn prefix(&self) -> Option<&'a str> {
        self.raw.prefix.as_deref()
    }

    /// The typedef this type derives from, unless the type is a plain
    /// built-in.
    pub fn derivation(&self) -> Option<SchemaTypedef<'a>> {
        match self.raw.der {
            TypeDer::BuiltIn => None,
            TypeDer::Typedef(tpdf) => Some(SchemaTypedef {
                context: self.context,
                tpdf,
            }),
        }
    }

    /// Members of an enumeration type, in source order.
    pub fn enums(&self) -> &'a [TypeEnum] {
        match &self.raw.info {
            TypeInfo::Enums(enums) => enums,
            _ => &[],
        }
    }

    /// Base identity of an identityref type.
    pub fn identity_base(&self) -> Option<SchemaIdentity<'a>> {
        match &self.raw.info {
            TypeInfo::IdentityRef { base } => Some(SchemaIdentity {
                context: self.context,
                ident: *base,
            }),
            _ => None,
        }
    }

    /// Raw substatements of kinds whose deep parsing is deferred (union
    /// members, ranges, patterns, leafref paths, fraction-digits).
    pub fn unparsed(
        &self,
    ) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        let raw = match &self.raw.info {
            TypeInfo::Unparsed(raw) => raw.as_slice(),
            _ => &[],
        };
        raw.iter()
            .map(|stmt| (stmt.name.as_str(), stmt.arg.as_deref()))
    }
}

// ===== impl SchemaTypedef =====

impl<'a> SchemaTypedef<'a> {
    pub(crate) fn raw(&self) -> &'a Typedef {
        self.context.typedef_data(self.tpdf)
    }

    /// Name of the typedef.
    pub fn name(&self) -> &'a str {
        self.raw().name.as_str()
    }

    /// The typedef's own type descriptor.
    pub fn base_type(&self) -> SchemaType<'a> {
        SchemaType {
            context: self.context,
            raw: &self.raw().type_,
        }
    }

    /// Module the typedef belongs to.
    pub fn module(&self) -> SchemaModule<'a> {
        SchemaModule {
            context: self.context,
            id: self.tpdf.module,
        }
    }

    /// Units declared on the typedef.
    pub fn units(&self) -> Option<&'a str> {
        self.raw().units.as_deref()
    }

    /// Default value declared on the typedef.
    pub fn default_value(&self) -> Option<&'a str> {
        self.raw().dflt.as_deref()
    }

    /// Description statement.
    pub fn description(&self) -> Option<&'a str> {
        self.raw().dsc.as_deref()
    }

    /// Reference statement.
    pub fn reference(&self) -> Option<&'a str> {
        self.raw().ref_.as_deref()
    }
}

impl<'a> PartialEq for SchemaTypedef<'a> {
    fn eq(&self, other: &SchemaTypedef<'_>) -> bool {
        self.tpdf == other.tpdf
    }
}

// ===== impl SchemaFeature =====

impl<'a> SchemaFeature<'a> {
    /// Name of the feature.
    pub fn name(&self) -> &'a str {
        self.feature.name.as_str()
    }

    /// Returns whether the feature is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.feature.enabled
    }

    /// Description statement.
    pub fn description(&self) -> Option<&'a str> {
        self.feature.dsc.as_deref()
    }

    /// Reference statement.
    pub fn reference(&self) -> Option<&'a str> {
        self.feature.ref_.as_deref()
    }

    /// Returns whether the feature's status is "deprecated".
    pub fn is_status_deprecated(&self) -> bool {
        self.feature.flags.contains(NodeFlags::STATUS_DEPRC)
    }
}

// ===== impl SchemaRevision =====

impl<'a> SchemaRevision<'a> {
    /// Revision date (`YYYY-MM-DD`).
    pub fn date(&self) -> &'a str {
        self.revision.date.as_str()
    }

    /// Description statement.
    pub fn description(&self) -> Option<&'a str> {
        self.revision.dsc.as_deref()
    }

    /// Reference statement.
    pub fn reference(&self) -> Option<&'a str> {
        self.revision.ref_.as_deref()
    }
}

// ===== impl SchemaImport =====

impl<'a> SchemaImport<'a> {
    /// Prefix bound to the imported module.
    pub fn prefix(&self) -> &'a str {
        self.import.prefix.as_str()
    }

    /// Revision date requested by the import statement, if any.
    pub fn revision(&self) -> Option<&'a str> {
        self.import.rev.as_deref()
    }

    /// The resolved import target.
    pub fn module(&self) -> SchemaModule<'a> {
        SchemaModule {
            context: self.context,
            id: self.import.module,
        }
    }
}

// ===== impl TypeEnum =====

impl TypeEnum {
    /// Assigned name of the enum.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Assigned (or auto-assigned) value of the enum.
    pub fn value(&self) -> i32 {
        self.value
    }
}
