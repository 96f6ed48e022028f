//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YIN schema compiler.
//!
//! The compiler walks an XML tree produced from a YIN document and
//! populates the schema model. Every scope is processed in three passes:
//! classification (singletons assigned, counted statements gathered,
//! data-definition statements detached into a staging list), table filling
//! (imports and includes resolved through the context, identities
//! allocated before their bases are bound, typedefs resolved), and finally
//! the data-definition constructors, which recurse with the same shape.

use crate::context::Context;
use crate::dict::DictStr;
use crate::error::{Error, ErrorCode, Result};
use crate::schema::{
    Feature, IdentRef, IdentScope, Identity, Import, Include, Module,
    ModuleId, NodeFlags, NodeId, NodeKind, NodeKindMask, NodePayload,
    RawStmt, Revision, SchemaNodeData, Submodule, TpdfRef, TpdfScope, Type,
    TypeDer, TypeEnum, TypeInfo, TypeKind, Typedef, BUILT_IN_TYPES,
};
use crate::utils::{check_date, has_edge_whitespace, split_prefix};
use crate::xml::{ElementId, XmlTree};

/// Namespace of the YIN serialization of YANG.
pub(crate) static YIN_NS: &str = "urn:ietf:params:xml:ns:yang:yin:1";

/// Scope the compiler is currently reading: the module itself or one of
/// its included submodules (index into the includes table).
#[derive(Clone, Copy)]
enum Scope {
    Module,
    Submodule(usize),
}

/// Classified children of a module or submodule element.
struct Classified {
    ns: Option<DictStr>,
    prefix: Option<DictStr>,
    belongs_to: Option<(DictStr, DictStr)>,
    version: Option<u8>,
    dsc: Option<DictStr>,
    ref_: Option<DictStr>,
    org: Option<DictStr>,
    contact: Option<DictStr>,
    imports: Vec<ElementId>,
    includes: Vec<ElementId>,
    revisions: Vec<ElementId>,
    tpdfs: Vec<ElementId>,
    identities: Vec<ElementId>,
    features: Vec<ElementId>,
    data: Vec<ElementId>,
}

/// Staged content of an included submodule, processed after the module's
/// own tables are in place.
struct SubStaging {
    incl: usize,
    tree: XmlTree,
    tpdfs: Vec<ElementId>,
    identities: Vec<ElementId>,
    features: Vec<ElementId>,
    data: Vec<ElementId>,
}

/// Common substatements shared by most schema statements.
struct Common {
    dsc: Option<DictStr>,
    ref_: Option<DictStr>,
    flags: NodeFlags,
}

// ===== entry point =====

/// Parse a YIN document and register the compiled module.
pub(crate) fn parse_data(
    ctx: &mut Context,
    data: &str,
    implemented: bool,
) -> Result<ModuleId> {
    let mut tree = XmlTree::parse(&*ctx, data)?;
    let root = match tree.root() {
        Some(root) => root.id(),
        None => {
            return Err(ctx.sink().error(
                ErrorCode::Xml,
                None,
                "empty document".to_string(),
            ))
        }
    };

    if tree.elem_ns_uri(root) != Some(YIN_NS) {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(tree.elem(root).line),
            "root element is not in the YIN namespace".to_string(),
        ));
    }
    let rname = tree.elem(root).name.clone();
    match rname.as_str() {
        "module" => (),
        "submodule" => {
            return Err(ctx.sink().error(
                ErrorCode::InvalidArgument,
                Some(tree.elem(root).line),
                "submodules cannot be loaded standalone".to_string(),
            ))
        }
        other => {
            return Err(unknown_statement(ctx, other, tree.elem(root).line))
        }
    }

    let name = mandatory_attr(ctx, &tree, root, "name")?;
    ctx.loading_push(&name);
    let result = read_module(ctx, &mut tree, root, name, implemented);
    ctx.loading_pop();
    if result.is_err() {
        // Roll back identity back-references created on behalf of the
        // module that failed to register.
        ctx.sweep_dangling_derived();
    }
    result
}

// ===== module reader =====

fn read_module(
    ctx: &mut Context,
    tree: &mut XmlTree,
    root: ElementId,
    name: DictStr,
    implemented: bool,
) -> Result<ModuleId> {
    let line = tree.elem(root).line;
    let c = classify(ctx, tree, root, false)?;

    let ns = c
        .ns
        .ok_or_else(|| missing_statement(ctx, "namespace", line))?;
    let prefix = c
        .prefix
        .ok_or_else(|| missing_statement(ctx, "prefix", line))?;

    // Pass 2: allocate the tables whose sizes are now known and fill them
    // in source order.
    let mut module = Module {
        name,
        ns,
        prefix,
        version: c.version.unwrap_or(1),
        dsc: c.dsc,
        ref_: c.ref_,
        org: c.org,
        contact: c.contact,
        implemented,
        revisions: Vec::with_capacity(c.revisions.len()),
        imports: Vec::with_capacity(c.imports.len()),
        includes: Vec::with_capacity(c.includes.len()),
        tpdf: Vec::with_capacity(c.tpdfs.len()),
        identities: Vec::with_capacity(c.identities.len()),
        features: Vec::with_capacity(c.features.len()),
        nodes: Vec::new(),
        data: None,
    };

    // Imports and includes come first: resolving them may load other
    // modules into the context, which must settle before any reference
    // into the module under construction is created.
    for elem in &c.imports {
        let owner = module.name.clone();
        let own_prefix = module.prefix.clone();
        read_import(ctx, tree, *elem, &owner, &own_prefix, &mut module.imports)?;
    }
    let mut substagings = Vec::new();
    for elem in &c.includes {
        read_include(ctx, tree, *elem, &mut module, &mut substagings)?;
    }

    let self_id = ModuleId(ctx.module_count());

    for elem in &c.revisions {
        let revision = read_revision(ctx, tree, *elem)?;
        module.revisions.push(revision);
    }

    // Reject duplicates before the identity pass starts mutating derived
    // lists in other modules.
    ctx.check_duplicate(&module.name, module.latest_revision())?;

    for elem in &c.features {
        let feature = read_feature(ctx, tree, *elem)?;
        module.features.push(feature);
    }
    for st in &substagings {
        for elem in &st.features {
            let feature = read_feature(ctx, &st.tree, *elem)?;
            module.includes[st.incl].submodule.features.push(feature);
        }
    }

    // Identities are allocated before anything resolves against them;
    // bases may point forward within the module or into a submodule.
    for elem in &c.identities {
        let ident = read_identity(ctx, tree, *elem)?;
        module.identities.push(ident);
    }
    for st in &substagings {
        for elem in &st.identities {
            let ident = read_identity(ctx, &st.tree, *elem)?;
            module.includes[st.incl].submodule.identities.push(ident);
        }
    }
    for (i, elem) in c.identities.iter().enumerate() {
        let ident_ref = IdentRef {
            module: self_id,
            scope: IdentScope::Top(i),
        };
        bind_identity_base(
            ctx,
            &mut module,
            self_id,
            ident_ref,
            Scope::Module,
            tree,
            *elem,
        )?;
    }
    for st in &substagings {
        for (i, elem) in st.identities.iter().enumerate() {
            let ident_ref = IdentRef {
                module: self_id,
                scope: IdentScope::Submodule(st.incl, i),
            };
            bind_identity_base(
                ctx,
                &mut module,
                self_id,
                ident_ref,
                Scope::Submodule(st.incl),
                &st.tree,
                *elem,
            )?;
        }
    }

    for elem in &c.tpdfs {
        let tpdf =
            read_typedef(ctx, &module, self_id, Scope::Module, None, tree, *elem)?;
        module.tpdf.push(tpdf);
    }
    for st in &substagings {
        for elem in &st.tpdfs {
            let tpdf = read_typedef(
                ctx,
                &module,
                self_id,
                Scope::Submodule(st.incl),
                None,
                &st.tree,
                *elem,
            )?;
            module.includes[st.incl].submodule.tpdf.push(tpdf);
        }
    }

    // Pass 3: data-definition statements, module first, then each
    // submodule's in include order.
    for elem in &c.data {
        read_data_node(ctx, &mut module, self_id, Scope::Module, tree, *elem, None)?;
    }
    for mut st in substagings {
        let data = std::mem::take(&mut st.data);
        for elem in data {
            read_data_node(
                ctx,
                &mut module,
                self_id,
                Scope::Submodule(st.incl),
                &mut st.tree,
                elem,
                None,
            )?;
        }
    }

    let id = ctx.register_module(module)?;
    debug_assert_eq!(id, self_id);
    Ok(id)
}

// ===== pass 1: classification =====

fn classify(
    ctx: &Context,
    tree: &mut XmlTree,
    parent: ElementId,
    submodule: bool,
) -> Result<Classified> {
    let mut c = Classified {
        ns: None,
        prefix: None,
        belongs_to: None,
        version: None,
        dsc: None,
        ref_: None,
        org: None,
        contact: None,
        imports: Vec::new(),
        includes: Vec::new(),
        revisions: Vec::new(),
        tpdfs: Vec::new(),
        identities: Vec::new(),
        features: Vec::new(),
        data: Vec::new(),
    };

    for child in tree.children_ids(Some(parent)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        let name = tree.elem(child).name.clone();
        let line = tree.elem(child).line;
        match name.as_str() {
            "namespace" if !submodule => {
                check_absent(ctx, c.ns.is_some(), "namespace", line)?;
                c.ns = Some(mandatory_attr(ctx, tree, child, "uri")?);
            }
            "prefix" if !submodule => {
                check_absent(ctx, c.prefix.is_some(), "prefix", line)?;
                c.prefix = Some(mandatory_attr(ctx, tree, child, "value")?);
            }
            "belongs-to" if submodule => {
                check_absent(ctx, c.belongs_to.is_some(), "belongs-to", line)?;
                let target = mandatory_attr(ctx, tree, child, "module")?;
                let mut prefix = None;
                for sub in tree.children_ids(Some(child)) {
                    if skip_foreign(ctx, tree, sub) {
                        continue;
                    }
                    match tree.elem(sub).name.as_str() {
                        "prefix" => {
                            check_absent(
                                ctx,
                                prefix.is_some(),
                                "prefix",
                                tree.elem(sub).line,
                            )?;
                            prefix = Some(mandatory_attr(
                                ctx, tree, sub, "value",
                            )?);
                        }
                        other => {
                            return Err(unknown_statement(
                                ctx,
                                other,
                                tree.elem(sub).line,
                            ))
                        }
                    }
                }
                let prefix = prefix
                    .ok_or_else(|| missing_statement(ctx, "prefix", line))?;
                c.belongs_to = Some((target, prefix));
            }
            "yang-version" => {
                check_absent(ctx, c.version.is_some(), "yang-version", line)?;
                let version = mandatory_attr(ctx, tree, child, "value")?;
                if version.as_str() != "1" {
                    return Err(invalid_argument(
                        ctx,
                        &version,
                        "yang-version",
                        line,
                    ));
                }
                c.version = Some(1);
            }
            "description" => {
                check_absent(ctx, c.dsc.is_some(), "description", line)?;
                c.dsc = Some(read_text(ctx, tree, child)?);
            }
            "reference" => {
                check_absent(ctx, c.ref_.is_some(), "reference", line)?;
                c.ref_ = Some(read_text(ctx, tree, child)?);
            }
            "organization" => {
                check_absent(ctx, c.org.is_some(), "organization", line)?;
                c.org = Some(read_text(ctx, tree, child)?);
            }
            "contact" => {
                check_absent(ctx, c.contact.is_some(), "contact", line)?;
                c.contact = Some(read_text(ctx, tree, child)?);
            }
            "import" => c.imports.push(child),
            "include" => c.includes.push(child),
            "revision" => c.revisions.push(child),
            "typedef" => c.tpdfs.push(child),
            "identity" => c.identities.push(child),
            "feature" => c.features.push(child),
            "container" | "leaf" | "leaf-list" | "list" | "choice"
            | "uses" | "grouping" | "anyxml" => {
                // Detached into the staging list so the later passes can
                // iterate each statement group cleanly.
                tree.unlink(child);
                c.data.push(child);
            }
            other => return Err(unknown_statement(ctx, other, line)),
        }
    }
    Ok(c)
}

// ===== pass 2: imports, includes, revisions, features =====

fn read_import(
    ctx: &mut Context,
    tree: &XmlTree,
    elem: ElementId,
    owner_name: &DictStr,
    own_prefix: &DictStr,
    imports: &mut Vec<Import>,
) -> Result<()> {
    let line = tree.elem(elem).line;
    let target = mandatory_attr(ctx, tree, elem, "module")?;
    let mut prefix = None;
    let mut rev = None;

    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "prefix" => {
                check_absent(ctx, prefix.is_some(), "prefix", cline)?;
                prefix = Some(mandatory_attr(ctx, tree, child, "value")?);
            }
            "revision-date" => {
                check_absent(ctx, rev.is_some(), "revision-date", cline)?;
                let date = mandatory_attr(ctx, tree, child, "date")?;
                if !check_date(&date) {
                    return Err(invalid_argument(
                        ctx,
                        &date,
                        "revision-date",
                        cline,
                    ));
                }
                rev = Some(date);
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    let prefix =
        prefix.ok_or_else(|| missing_statement(ctx, "prefix", line))?;

    // Interned names share a canonical pointer, so these are identity
    // comparisons.
    if target == *owner_name {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(line),
            format!("module \"{}\" must not import itself", target),
        ));
    }
    if prefix == *own_prefix || imports.iter().any(|imp| imp.prefix == prefix)
    {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(line),
            format!("import prefix \"{}\" is not unique", prefix),
        ));
    }

    let module = ctx.load_or_get_module(&target, rev.as_deref())?;
    imports.push(Import {
        prefix,
        rev,
        module,
    });
    Ok(())
}

fn read_include(
    ctx: &mut Context,
    tree: &XmlTree,
    elem: ElementId,
    module: &mut Module,
    substagings: &mut Vec<SubStaging>,
) -> Result<()> {
    let sub_name = mandatory_attr(ctx, tree, elem, "module")?;
    let mut rev = None;

    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "revision-date" => {
                check_absent(ctx, rev.is_some(), "revision-date", cline)?;
                let date = mandatory_attr(ctx, tree, child, "date")?;
                if !check_date(&date) {
                    return Err(invalid_argument(
                        ctx,
                        &date,
                        "revision-date",
                        cline,
                    ));
                }
                rev = Some(date);
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }

    // Submodules come from the same search directory as modules.
    let path = ctx.find_schema_file(&sub_name, rev.as_deref())?;
    let data = ctx.read_schema_file(&path)?;
    let mut subtree = XmlTree::parse(&*ctx, &data)?;
    let sroot = match subtree.root() {
        Some(root) => root.id(),
        None => {
            return Err(ctx.sink().error(
                ErrorCode::Xml,
                None,
                "empty document".to_string(),
            ))
        }
    };
    let sline = subtree.elem(sroot).line;
    if subtree.elem_ns_uri(sroot) != Some(YIN_NS)
        || subtree.elem(sroot).name.as_str() != "submodule"
    {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(sline),
            format!("\"{}\" is not a YIN submodule", path.display()),
        ));
    }
    let found_name = mandatory_attr(ctx, &subtree, sroot, "name")?;
    if found_name != sub_name {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(sline),
            format!(
                "submodule name \"{}\" does not match include \"{}\"",
                found_name, sub_name
            ),
        ));
    }

    let sc = classify(ctx, &mut subtree, sroot, true)?;
    let (belongs_to, belongs_to_prefix) = sc
        .belongs_to
        .ok_or_else(|| missing_statement(ctx, "belongs-to", sline))?;
    if belongs_to != module.name {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(sline),
            format!(
                "submodule \"{}\" belongs to module \"{}\"",
                sub_name, belongs_to
            ),
        ));
    }
    for nested in &sc.includes {
        ctx.sink().warning(
            Some(subtree.elem(*nested).line),
            "nested submodule includes are not supported, skipping",
        );
    }

    let mut imports = Vec::with_capacity(sc.imports.len());
    for ielem in &sc.imports {
        let owner = module.name.clone();
        read_import(
            ctx,
            &subtree,
            *ielem,
            &owner,
            &belongs_to_prefix,
            &mut imports,
        )?;
    }
    let mut revisions = Vec::with_capacity(sc.revisions.len());
    for relem in &sc.revisions {
        revisions.push(read_revision(ctx, &subtree, *relem)?);
    }

    let submodule = Submodule {
        name: sub_name,
        belongs_to_prefix,
        dsc: sc.dsc,
        ref_: sc.ref_,
        org: sc.org,
        contact: sc.contact,
        revisions,
        imports,
        tpdf: Vec::with_capacity(sc.tpdfs.len()),
        identities: Vec::with_capacity(sc.identities.len()),
        features: Vec::with_capacity(sc.features.len()),
    };
    module.includes.push(Include {
        rev,
        submodule,
    });
    substagings.push(SubStaging {
        incl: module.includes.len() - 1,
        tree: subtree,
        tpdfs: sc.tpdfs,
        identities: sc.identities,
        features: sc.features,
        data: sc.data,
    });
    Ok(())
}

fn read_revision(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<Revision> {
    let line = tree.elem(elem).line;
    let date = mandatory_attr(ctx, tree, elem, "date")?;
    if !check_date(&date) {
        return Err(invalid_argument(ctx, &date, "revision", line));
    }
    let mut dsc = None;
    let mut ref_ = None;
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "description" => {
                check_absent(ctx, dsc.is_some(), "description", cline)?;
                dsc = Some(read_text(ctx, tree, child)?);
            }
            "reference" => {
                check_absent(ctx, ref_.is_some(), "reference", cline)?;
                ref_ = Some(read_text(ctx, tree, child)?);
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    Ok(Revision { date, dsc, ref_ })
}

fn read_feature(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<Feature> {
    let name = mandatory_attr(ctx, tree, elem, "name")?;
    let mut c = Common::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, false)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "if-feature" => {
                ctx.sink().debug("if-feature statements are not evaluated")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    if !c.flags.intersects(status_mask()) {
        c.flags |= NodeFlags::STATUS_CURR;
    }
    Ok(Feature {
        name,
        enabled: false,
        flags: c.flags,
        dsc: c.dsc,
        ref_: c.ref_,
    })
}

// ===== pass 2: identities =====

fn read_identity(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<Identity> {
    let name = mandatory_attr(ctx, tree, elem, "name")?;
    let mut c = Common::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, false)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            // Bound after all identities of the module have been read.
            "base" => (),
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    if !c.flags.intersects(status_mask()) {
        c.flags |= NodeFlags::STATUS_CURR;
    }
    Ok(Identity {
        name,
        dsc: c.dsc,
        ref_: c.ref_,
        flags: c.flags,
        base: None,
        derived: Vec::new(),
    })
}

fn bind_identity_base(
    ctx: &mut Context,
    module: &mut Module,
    self_id: ModuleId,
    ident_ref: IdentRef,
    scope: Scope,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<()> {
    let mut base_elem = None;
    for child in tree.children_ids(Some(elem)) {
        if tree.elem_ns_uri(child) == Some(YIN_NS)
            && tree.elem(child).name.as_str() == "base"
        {
            check_absent(
                ctx,
                base_elem.is_some(),
                "base",
                tree.elem(child).line,
            )?;
            base_elem = Some(child);
        }
    }
    let base_elem = match base_elem {
        Some(base_elem) => base_elem,
        None => return Ok(()),
    };
    let line = tree.elem(base_elem).line;
    let base_name = mandatory_attr(ctx, tree, base_elem, "name")?;
    let base_ref =
        resolve_identity(ctx, module, self_id, scope, &base_name, line)?;

    // The derivation graph must stay acyclic.
    let mut cursor = Some(base_ref);
    while let Some(b) = cursor {
        if b == ident_ref {
            return Err(ctx.sink().error(
                ErrorCode::InvalidArgument,
                Some(line),
                format!("circular derivation of identity \"{}\"", base_name),
            ));
        }
        cursor = ident_get(ctx, module, self_id, b).base;
    }

    ident_get_mut(ctx, module, self_id, ident_ref).base = Some(base_ref);
    // Record the new identity in the derived list of the base and of
    // every ancestor of the base; identity-subtree queries rely on the
    // transitive lists.
    let mut cursor = Some(base_ref);
    while let Some(b) = cursor {
        let entry = ident_get_mut(ctx, module, self_id, b);
        entry.derived.push(ident_ref);
        cursor = entry.base;
    }
    Ok(())
}

fn resolve_identity(
    ctx: &Context,
    module: &Module,
    self_id: ModuleId,
    scope: Scope,
    name: &str,
    line: u64,
) -> Result<IdentRef> {
    let (prefix, local) = split_prefix(name);
    let prefix = strip_own_prefix(module, scope, prefix);

    let found = match prefix {
        None => find_local_identity(module, self_id, local),
        Some(prefix) => {
            let target = resolve_import(ctx, module, scope, prefix, line)?;
            find_local_identity(ctx.module_data(target), target, local)
        }
    };
    let found = found.ok_or_else(|| {
        ctx.sink().error(
            ErrorCode::UnknownIdentity,
            Some(line),
            format!("unknown identity \"{}\"", name),
        )
    })?;
    if ident_get(ctx, module, self_id, found)
        .flags
        .contains(NodeFlags::STATUS_OBSLT)
    {
        ctx.sink().warning(
            Some(line),
            &format!("reference to obsolete identity \"{}\"", name),
        );
    }
    Ok(found)
}

fn find_local_identity(
    module: &Module,
    module_id: ModuleId,
    name: &str,
) -> Option<IdentRef> {
    if let Some(i) =
        module.identities.iter().position(|ident| ident.name == name)
    {
        return Some(IdentRef {
            module: module_id,
            scope: IdentScope::Top(i),
        });
    }
    module.includes.iter().enumerate().find_map(|(s, incl)| {
        incl.submodule
            .identities
            .iter()
            .position(|ident| ident.name == name)
            .map(|i| IdentRef {
                module: module_id,
                scope: IdentScope::Submodule(s, i),
            })
    })
}

fn ident_get<'a>(
    ctx: &'a Context,
    module: &'a Module,
    self_id: ModuleId,
    r: IdentRef,
) -> &'a Identity {
    if r.module == self_id {
        match r.scope {
            IdentScope::Top(i) => &module.identities[i],
            IdentScope::Submodule(s, i) => {
                &module.includes[s].submodule.identities[i]
            }
        }
    } else {
        ctx.identity_data(r)
    }
}

fn ident_get_mut<'a>(
    ctx: &'a mut Context,
    module: &'a mut Module,
    self_id: ModuleId,
    r: IdentRef,
) -> &'a mut Identity {
    if r.module == self_id {
        match r.scope {
            IdentScope::Top(i) => &mut module.identities[i],
            IdentScope::Submodule(s, i) => {
                &mut module.includes[s].submodule.identities[i]
            }
        }
    } else {
        ctx.identity_data_mut(r)
    }
}

// ===== pass 2: typedefs and type resolution =====

fn read_typedef(
    ctx: &Context,
    module: &Module,
    self_id: ModuleId,
    scope: Scope,
    parent: Option<NodeId>,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<Typedef> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;
    let mut c = Common::new();
    let mut type_elem = None;
    let mut units = None;
    let mut dflt = None;

    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, false)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "type" => {
                check_absent(ctx, type_elem.is_some(), "type", cline)?;
                type_elem = Some(child);
            }
            "units" => {
                check_absent(ctx, units.is_some(), "units", cline)?;
                units = Some(mandatory_attr(ctx, tree, child, "name")?);
            }
            "default" => {
                check_absent(ctx, dflt.is_some(), "default", cline)?;
                dflt = Some(mandatory_attr(ctx, tree, child, "value")?);
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    if !c.flags.intersects(status_mask()) {
        c.flags |= NodeFlags::STATUS_CURR;
    }

    let type_elem =
        type_elem.ok_or_else(|| missing_statement(ctx, "type", line))?;
    let type_ =
        fill_type(ctx, module, self_id, scope, parent, tree, type_elem)?;

    Ok(Typedef {
        name,
        type_,
        units,
        dflt,
        flags: c.flags,
        dsc: c.dsc,
        ref_: c.ref_,
    })
}

/// Resolve a `type` statement into a type descriptor.
///
/// Unprefixed names try the built-in table first, then the typedef tables
/// of the enclosing node chain, then the module-scope tables. Prefixed
/// names route through the imports of the current scope.
fn fill_type(
    ctx: &Context,
    module: &Module,
    self_id: ModuleId,
    scope: Scope,
    parent: Option<NodeId>,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<Type> {
    let line = tree.elem(elem).line;
    let raw_name = tree.attr_value(elem, "name").ok_or_else(|| {
        missing_argument(ctx, "name", "type", line)
    })?;
    let (prefix, local) = split_prefix(raw_name);
    let stored_prefix = prefix.map(|p| ctx.dict().insert(p));
    let prefix = strip_own_prefix(module, scope, prefix);

    let mut ty = if prefix.is_none() {
        if let Some((_, kind)) =
            BUILT_IN_TYPES.iter().find(|(name, _)| *name == local)
        {
            let mut ty = Type::new(*kind);
            ty.prefix = stored_prefix;
            parse_type_info(ctx, module, self_id, scope, tree, elem, &mut ty, true)?;
            return Ok(ty);
        }

        // Walk the enclosing-node chain; only containers, lists and
        // groupings carry typedef tables, other kinds are skipped without
        // terminating the walk.
        let mut found = None;
        let mut cursor = parent;
        while let Some(id) = cursor {
            let node = module.node(id);
            if let Some(table) = node.payload.tpdf() {
                if let Some(i) =
                    table.iter().position(|tpdf| tpdf.name == local)
                {
                    found = Some(TpdfRef {
                        module: self_id,
                        scope: TpdfScope::Node(id, i),
                    });
                    break;
                }
            }
            cursor = node.parent;
        }

        let found = found.or_else(|| match scope {
            Scope::Submodule(s) => module.includes[s]
                .submodule
                .tpdf
                .iter()
                .position(|tpdf| tpdf.name == local)
                .map(|i| TpdfRef {
                    module: self_id,
                    scope: TpdfScope::Submodule(s, i),
                })
                .or_else(|| {
                    module.find_typedef_top(local).map(|scope| TpdfRef {
                        module: self_id,
                        scope,
                    })
                }),
            Scope::Module => {
                module.find_typedef_top(local).map(|scope| TpdfRef {
                    module: self_id,
                    scope,
                })
            }
        });
        let tref = found.ok_or_else(|| {
            ctx.sink().error(
                ErrorCode::UnknownTypedef,
                Some(line),
                format!("unknown type \"{}\"", raw_name),
            )
        })?;
        derive_type(ctx, module, self_id, tref, stored_prefix, raw_name, line)
    } else {
        let target =
            resolve_import(ctx, module, scope, prefix.unwrap(), line)?;
        let tscope = ctx
            .module_data(target)
            .find_typedef_top(local)
            .ok_or_else(|| {
                ctx.sink().error(
                    ErrorCode::UnknownTypedef,
                    Some(line),
                    format!("unknown type \"{}\"", raw_name),
                )
            })?;
        let tref = TpdfRef {
            module: target,
            scope: tscope,
        };
        derive_type(ctx, module, self_id, tref, stored_prefix, raw_name, line)
    };

    parse_type_info(ctx, module, self_id, scope, tree, elem, &mut ty, false)?;
    Ok(ty)
}

/// Build a derived type descriptor, copying the base kind from the
/// derivation.
fn derive_type(
    ctx: &Context,
    module: &Module,
    self_id: ModuleId,
    tref: TpdfRef,
    prefix: Option<DictStr>,
    raw_name: &str,
    line: u64,
) -> Type {
    let target = typedef_get(ctx, module, self_id, tref);
    if target.flags.contains(NodeFlags::STATUS_OBSLT) {
        ctx.sink().warning(
            Some(line),
            &format!("type \"{}\" references an obsolete typedef", raw_name),
        );
    }
    Type {
        kind: target.type_.kind,
        der: TypeDer::Typedef(tref),
        prefix,
        info: TypeInfo::None,
    }
}

fn typedef_get<'a>(
    ctx: &'a Context,
    module: &'a Module,
    self_id: ModuleId,
    r: TpdfRef,
) -> &'a Typedef {
    if r.module == self_id {
        match r.scope {
            TpdfScope::Top(i) => &module.tpdf[i],
            TpdfScope::Submodule(s, i) => {
                &module.includes[s].submodule.tpdf[i]
            }
            TpdfScope::Node(node, i) => {
                &module.node(node).payload.tpdf().unwrap()[i]
            }
        }
    } else {
        ctx.typedef_data(r)
    }
}

/// Kind-specific payload parsing, dispatched on the resolved base kind.
#[allow(clippy::too_many_arguments)]
fn parse_type_info(
    ctx: &Context,
    module: &Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &XmlTree,
    elem: ElementId,
    ty: &mut Type,
    direct: bool,
) -> Result<()> {
    let line = tree.elem(elem).line;
    match ty.kind {
        TypeKind::Enum => {
            let enums = parse_enums(ctx, tree, elem)?;
            if direct && enums.is_empty() {
                return Err(missing_statement(ctx, "enum", line));
            }
            if !enums.is_empty() {
                ty.info = TypeInfo::Enums(enums);
            }
        }
        TypeKind::IdentityRef => {
            let mut base_elem = None;
            for child in tree.children_ids(Some(elem)) {
                if skip_foreign(ctx, tree, child) {
                    continue;
                }
                match tree.elem(child).name.as_str() {
                    "base" => {
                        check_absent(
                            ctx,
                            base_elem.is_some(),
                            "base",
                            tree.elem(child).line,
                        )?;
                        base_elem = Some(child);
                    }
                    other => {
                        return Err(unknown_statement(
                            ctx,
                            other,
                            tree.elem(child).line,
                        ))
                    }
                }
            }
            match base_elem {
                Some(base_elem) => {
                    let bline = tree.elem(base_elem).line;
                    let base_name =
                        mandatory_attr(ctx, tree, base_elem, "name")?;
                    let base = resolve_identity(
                        ctx, module, self_id, scope, &base_name, bline,
                    )?;
                    ty.info = TypeInfo::IdentityRef { base };
                }
                None if direct => {
                    return Err(missing_statement(ctx, "base", line))
                }
                None => (),
            }
        }
        _ => {
            // Deeper constraint parsing (ranges, patterns, union members,
            // leafref paths, fraction-digits) is deferred; the raw
            // substatements are recorded for later passes.
            let mut raw = Vec::new();
            for child in tree.children_ids(Some(elem)) {
                if skip_foreign(ctx, tree, child) {
                    continue;
                }
                let arg = tree
                    .element(child)
                    .attributes()
                    .find(|attr| !attr.is_namespace_decl())
                    .map(|attr| ctx.dict().insert(attr.value()));
                raw.push(RawStmt {
                    name: tree.elem(child).name.clone(),
                    arg,
                });
            }
            if !raw.is_empty() {
                ty.info = TypeInfo::Unparsed(raw);
            }
        }
    }
    Ok(())
}

fn parse_enums(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<Vec<TypeEnum>> {
    let mut enums: Vec<TypeEnum> = Vec::new();
    let mut highest: Option<i32> = None;

    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        let cline = tree.elem(child).line;
        if tree.elem(child).name.as_str() != "enum" {
            return Err(unknown_statement(
                ctx,
                tree.elem(child).name.as_str(),
                cline,
            ));
        }

        let name = mandatory_attr(ctx, tree, child, "name")?;
        if has_edge_whitespace(&name) {
            return Err(ctx.sink().error(
                ErrorCode::EnumNameWhitespace,
                Some(cline),
                format!(
                    "enum name \"{}\" has leading or trailing whitespace",
                    name
                ),
            ));
        }
        if enums.iter().any(|e| e.name == name) {
            return Err(ctx.sink().error(
                ErrorCode::DuplicateEnumName,
                Some(cline),
                format!("duplicate enum name \"{}\"", name),
            ));
        }

        let mut explicit: Option<i32> = None;
        for sub in tree.children_ids(Some(child)) {
            if skip_foreign(ctx, tree, sub) {
                continue;
            }
            let sline = tree.elem(sub).line;
            match tree.elem(sub).name.as_str() {
                "value" => {
                    check_absent(ctx, explicit.is_some(), "value", sline)?;
                    let value = mandatory_attr(ctx, tree, sub, "value")?;
                    let parsed = value
                        .parse::<i64>()
                        .ok()
                        .filter(|v| {
                            *v >= i64::from(i32::MIN)
                                && *v <= i64::from(i32::MAX)
                        })
                        .ok_or_else(|| {
                            invalid_argument(ctx, &value, "value", sline)
                        })?;
                    explicit = Some(parsed as i32);
                }
                "description" | "reference" | "status" => {
                    ctx.sink().debug("enum substatement skipped")
                }
                other => {
                    return Err(unknown_statement(ctx, other, sline))
                }
            }
        }

        let value = match explicit {
            Some(value) => {
                if enums.iter().any(|e| e.value == value) {
                    return Err(ctx.sink().error(
                        ErrorCode::DuplicateEnumValue,
                        Some(cline),
                        format!(
                            "duplicate enum value {} (\"{}\")",
                            value, name
                        ),
                    ));
                }
                value
            }
            None => match highest {
                None => 0,
                Some(i32::MAX) => {
                    return Err(ctx.sink().error(
                        ErrorCode::InvalidArgument,
                        Some(cline),
                        format!(
                            "cannot auto-assign a value to enum \"{}\"",
                            name
                        ),
                    ))
                }
                Some(highest) => highest + 1,
            },
        };
        highest = Some(match highest {
            None => value,
            Some(highest) => highest.max(value),
        });
        enums.push(TypeEnum { name, value });
    }
    Ok(enums)
}

// ===== pass 3: data-definition statements =====

fn read_data_node(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let stmt = tree.elem(elem).name.clone();
    match stmt.as_str() {
        "container" => {
            read_container(ctx, module, self_id, scope, tree, elem, parent)
        }
        "leaf" => read_leaf(ctx, module, self_id, scope, tree, elem, parent),
        "leaf-list" => {
            read_leaf_list(ctx, module, self_id, scope, tree, elem, parent)
        }
        "list" => read_list(ctx, module, self_id, scope, tree, elem, parent),
        "choice" => {
            read_choice(ctx, module, self_id, scope, tree, elem, parent)
        }
        "case" => read_case(ctx, module, self_id, scope, tree, elem, parent),
        "grouping" => {
            read_grouping(ctx, module, self_id, scope, tree, elem, parent)
        }
        "uses" => read_uses(ctx, module, self_id, scope, tree, elem, parent),
        "anyxml" => {
            read_anyxml(ctx, module, self_id, scope, tree, elem, parent)
        }
        other => Err(unknown_statement(ctx, other, tree.elem(elem).line)),
    }
}

/// Allocate a node after checking the sibling-name uniqueness invariant.
/// Groupings live in their own identifier namespace; uses names reference
/// groupings and are exempt.
fn alloc_node(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    parent: Option<NodeId>,
    name: DictStr,
    line: u64,
    payload: NodePayload,
) -> Result<NodeId> {
    let mask = match payload.kind() {
        NodeKind::Grouping => NodeKindMask::GROUPING,
        NodeKind::Uses => NodeKindMask::empty(),
        _ => NodeKindMask::ANY - NodeKindMask::GROUPING - NodeKindMask::USES,
    };
    if !mask.is_empty()
        && module.find_child(parent, name.as_str(), mask).is_some()
    {
        return Err(ctx.sink().error(
            ErrorCode::InvalidArgument,
            Some(line),
            format!("duplicate node name \"{}\"", name),
        ));
    }
    Ok(module.alloc_node(SchemaNodeData {
        name,
        dsc: None,
        ref_: None,
        flags: NodeFlags::empty(),
        module: self_id,
        parent,
        child: None,
        next: None,
        prev: None,
        payload,
    }))
}

fn parent_flags(module: &Module, parent: Option<NodeId>) -> NodeFlags {
    match parent {
        Some(parent) => module.node(parent).flags,
        None => NodeFlags::empty(),
    }
}

fn finish_node(
    module: &mut Module,
    node_id: NodeId,
    parent: Option<NodeId>,
    c: Common,
) {
    let node = module.node_mut(node_id);
    node.dsc = c.dsc;
    node.ref_ = c.ref_;
    node.flags = c.flags;
    module.add_child(parent, node_id);
}

#[allow(clippy::too_many_arguments)]
fn read_leaf(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;
    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::Leaf {
            type_: Type::new(TypeKind::Unknown),
            units: None,
            dflt: None,
        },
    )?;

    let mut c = Common::new();
    let mut type_elem = None;
    let mut units = None;
    let mut dflt = None;
    let mut mandatory_seen = false;
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "type" => {
                check_absent(ctx, type_elem.is_some(), "type", cline)?;
                type_elem = Some(child);
            }
            "units" => {
                check_absent(ctx, units.is_some(), "units", cline)?;
                units = Some(mandatory_attr(ctx, tree, child, "name")?);
            }
            "default" => {
                check_absent(ctx, dflt.is_some(), "default", cline)?;
                dflt = Some(mandatory_attr(ctx, tree, child, "value")?);
            }
            "mandatory" => {
                check_absent(ctx, mandatory_seen, "mandatory", cline)?;
                mandatory_seen = true;
                if read_boolean(ctx, tree, child, "mandatory")? {
                    c.flags |= NodeFlags::MANDATORY;
                }
            }
            "when" | "must" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let type_elem =
        type_elem.ok_or_else(|| missing_statement(ctx, "type", line))?;
    let type_ = fill_type(
        ctx,
        module,
        self_id,
        scope,
        Some(node_id),
        tree,
        type_elem,
    )?;
    module.node_mut(node_id).payload = NodePayload::Leaf {
        type_,
        units,
        dflt,
    };
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_leaf_list(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;
    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::LeafList {
            type_: Type::new(TypeKind::Unknown),
            units: None,
            min: 0,
            max: u32::MAX,
        },
    )?;

    let mut c = Common::new();
    let mut type_elem = None;
    let mut units = None;
    let mut min = None;
    let mut max = None;
    let mut ordered_seen = false;
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "type" => {
                check_absent(ctx, type_elem.is_some(), "type", cline)?;
                type_elem = Some(child);
            }
            "units" => {
                check_absent(ctx, units.is_some(), "units", cline)?;
                units = Some(mandatory_attr(ctx, tree, child, "name")?);
            }
            "min-elements" => {
                check_absent(ctx, min.is_some(), "min-elements", cline)?;
                min = Some(read_min_elements(ctx, tree, child)?);
            }
            "max-elements" => {
                check_absent(ctx, max.is_some(), "max-elements", cline)?;
                max = Some(read_max_elements(ctx, tree, child)?);
            }
            "ordered-by" => {
                check_absent(ctx, ordered_seen, "ordered-by", cline)?;
                ordered_seen = true;
                if read_ordered_by(ctx, tree, child)? {
                    c.flags |= NodeFlags::USER_ORDERED;
                }
            }
            "when" | "must" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let type_elem =
        type_elem.ok_or_else(|| missing_statement(ctx, "type", line))?;
    let type_ = fill_type(
        ctx,
        module,
        self_id,
        scope,
        Some(node_id),
        tree,
        type_elem,
    )?;
    module.node_mut(node_id).payload = NodePayload::LeafList {
        type_,
        units,
        min: min.unwrap_or(0),
        max: max.unwrap_or(u32::MAX),
    };
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_container(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut presence = None;
    let mut tpdfs = Vec::new();
    let mut staged = Vec::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "presence" => {
                check_absent(ctx, presence.is_some(), "presence", cline)?;
                presence = Some(mandatory_attr(ctx, tree, child, "value")?);
                c.flags |= NodeFlags::PRESENCE;
            }
            "typedef" => tpdfs.push(child),
            "container" | "leaf" | "leaf-list" | "list" | "choice"
            | "uses" | "grouping" | "anyxml" => {
                tree.unlink(child);
                staged.push(child);
            }
            "when" | "must" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::Container {
            presence,
            tpdf: Vec::with_capacity(tpdfs.len()),
        },
    )?;
    module.node_mut(node_id).flags = c.flags;

    for telem in tpdfs {
        let tpdf = read_typedef(
            ctx,
            module,
            self_id,
            scope,
            Some(node_id),
            tree,
            telem,
        )?;
        push_node_tpdf(module, node_id, tpdf);
    }
    for delem in staged {
        read_data_node(ctx, module, self_id, scope, tree, delem, Some(node_id))?;
    }
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_list(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut key_str: Option<DictStr> = None;
    let mut min = None;
    let mut max = None;
    let mut ordered_seen = false;
    let mut tpdfs = Vec::new();
    let mut staged = Vec::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "key" => {
                check_absent(ctx, key_str.is_some(), "key", cline)?;
                key_str = Some(mandatory_attr(ctx, tree, child, "value")?);
            }
            "min-elements" => {
                check_absent(ctx, min.is_some(), "min-elements", cline)?;
                min = Some(read_min_elements(ctx, tree, child)?);
            }
            "max-elements" => {
                check_absent(ctx, max.is_some(), "max-elements", cline)?;
                max = Some(read_max_elements(ctx, tree, child)?);
            }
            "ordered-by" => {
                check_absent(ctx, ordered_seen, "ordered-by", cline)?;
                ordered_seen = true;
                if read_ordered_by(ctx, tree, child)? {
                    c.flags |= NodeFlags::USER_ORDERED;
                }
            }
            "typedef" => tpdfs.push(child),
            "container" | "leaf" | "leaf-list" | "list" | "choice"
            | "uses" | "grouping" | "anyxml" => {
                tree.unlink(child);
                staged.push(child);
            }
            "when" | "must" | "if-feature" | "unique" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::List {
            tpdf: Vec::with_capacity(tpdfs.len()),
            keys: Vec::new(),
            min: min.unwrap_or(0),
            max: max.unwrap_or(u32::MAX),
        },
    )?;
    module.node_mut(node_id).flags = c.flags;

    for telem in tpdfs {
        let tpdf = read_typedef(
            ctx,
            module,
            self_id,
            scope,
            Some(node_id),
            tree,
            telem,
        )?;
        push_node_tpdf(module, node_id, tpdf);
    }
    for delem in staged {
        read_data_node(ctx, module, self_id, scope, tree, delem, Some(node_id))?;
    }

    // Key binding happens after the child data nodes exist. A failure at
    // any step destroys the partially built list.
    bind_list_keys(ctx, module, node_id, key_str.as_ref(), line)?;

    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

fn bind_list_keys(
    ctx: &Context,
    module: &mut Module,
    list: NodeId,
    key_str: Option<&DictStr>,
    line: u64,
) -> Result<()> {
    let list_config =
        module.node(list).flags & (NodeFlags::CONFIG_W | NodeFlags::CONFIG_R);
    let is_config = list_config.contains(NodeFlags::CONFIG_W);

    let tokens: Vec<String> = match key_str {
        Some(key_str) => key_str
            .split_whitespace()
            .map(|token| token.to_string())
            .collect(),
        None => Vec::new(),
    };
    if tokens.is_empty() {
        if is_config {
            return Err(ctx.sink().error(
                ErrorCode::MissingKey,
                Some(line),
                format!(
                    "list \"{}\" is configuration but has no key",
                    module.node(list).name
                ),
            ));
        }
        return Ok(());
    }

    let mut keys = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let key_id = match module.find_child(
            Some(list),
            token,
            NodeKindMask::ANY,
        ) {
            Some(key_id) => key_id,
            None => {
                return Err(ctx.sink().error(
                    ErrorCode::KeyNotFound,
                    Some(line),
                    format!("key \"{}\" is not a child of the list", token),
                ))
            }
        };
        let key = module.node(key_id);
        if key.payload.kind() != NodeKind::Leaf {
            return Err(ctx.sink().error(
                ErrorCode::KeyNotLeaf,
                Some(line),
                format!("key \"{}\" is not a leaf", token),
            ));
        }
        if key.flags.contains(NodeFlags::KEY) {
            return Err(ctx.sink().error(
                ErrorCode::DuplicateKey,
                Some(line),
                format!("duplicate key \"{}\"", token),
            ));
        }
        if let NodePayload::Leaf { type_, .. } = &key.payload {
            if type_.kind == TypeKind::Empty {
                return Err(ctx.sink().error(
                    ErrorCode::KeyTypeEmpty,
                    Some(line),
                    format!("key \"{}\" has type \"empty\"", token),
                ));
            }
        }
        let key_config =
            key.flags & (NodeFlags::CONFIG_W | NodeFlags::CONFIG_R);
        if key_config != list_config {
            return Err(ctx.sink().error(
                ErrorCode::KeyConfigMismatch,
                Some(line),
                format!(
                    "key \"{}\" config flag differs from the list's",
                    token
                ),
            ));
        }
        module.node_mut(key_id).flags |= NodeFlags::KEY;
        keys.push(key_id);
    }

    match &mut module.node_mut(list).payload {
        NodePayload::List { keys: slot, .. } => *slot = keys,
        _ => unreachable!("list payload expected"),
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn read_choice(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut dflt = None;
    let mut mandatory_seen = false;
    let mut staged = Vec::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "default" => {
                check_absent(ctx, dflt.is_some(), "default", cline)?;
                dflt = Some(mandatory_attr(ctx, tree, child, "value")?);
            }
            "mandatory" => {
                check_absent(ctx, mandatory_seen, "mandatory", cline)?;
                mandatory_seen = true;
                if read_boolean(ctx, tree, child, "mandatory")? {
                    c.flags |= NodeFlags::MANDATORY;
                }
            }
            "case" | "container" | "leaf" | "leaf-list" | "list"
            | "anyxml" => {
                tree.unlink(child);
                staged.push(child);
            }
            "when" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::Choice { dflt },
    )?;
    module.node_mut(node_id).flags = c.flags;

    for delem in staged {
        read_data_node(ctx, module, self_id, scope, tree, delem, Some(node_id))?;
    }
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_case(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut staged = Vec::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "container" | "leaf" | "leaf-list" | "list" | "choice"
            | "uses" | "anyxml" => {
                tree.unlink(child);
                staged.push(child);
            }
            "when" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::Case,
    )?;
    module.node_mut(node_id).flags = c.flags;

    for delem in staged {
        read_data_node(ctx, module, self_id, scope, tree, delem, Some(node_id))?;
    }
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_grouping(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut tpdfs = Vec::new();
    let mut staged = Vec::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        // Groupings take no config statement.
        if common_stmt(ctx, tree, child, &mut c, false)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "typedef" => tpdfs.push(child),
            "container" | "leaf" | "leaf-list" | "list" | "choice"
            | "uses" | "grouping" | "anyxml" => {
                tree.unlink(child);
                staged.push(child);
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    if !c.flags.intersects(status_mask()) {
        c.flags |= NodeFlags::STATUS_CURR;
    }

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::Grouping {
            tpdf: Vec::with_capacity(tpdfs.len()),
        },
    )?;
    module.node_mut(node_id).flags = c.flags;

    for telem in tpdfs {
        let tpdf = read_typedef(
            ctx,
            module,
            self_id,
            scope,
            Some(node_id),
            tree,
            telem,
        )?;
        push_node_tpdf(module, node_id, tpdf);
    }
    for delem in staged {
        read_data_node(ctx, module, self_id, scope, tree, delem, Some(node_id))?;
    }
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_uses(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut refinements = Vec::new();
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, false)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            // Refinement and augment application is out of scope; the
            // descriptors are recorded unapplied.
            "refine" | "augment" => {
                let arg = tree
                    .element(child)
                    .attributes()
                    .find(|attr| !attr.is_namespace_decl())
                    .map(|attr| ctx.dict().insert(attr.value()));
                refinements.push(RawStmt {
                    name: tree.elem(child).name.clone(),
                    arg,
                });
            }
            "when" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name.clone(),
        line,
        NodePayload::Uses {
            grouping: None,
            refinements,
        },
    )?;
    module.node_mut(node_id).flags = c.flags;

    // Inside a grouping the binding is deferred; the grouping may be
    // expanded in a different scope later.
    let mut inside_grouping = false;
    let mut cursor = parent;
    while let Some(id) = cursor {
        if module.node(id).payload.kind() == NodeKind::Grouping {
            inside_grouping = true;
            break;
        }
        cursor = module.node(id).parent;
    }

    if !inside_grouping {
        let (prefix, local) = split_prefix(&name);
        let prefix = strip_own_prefix(module, scope, prefix);
        let target = match prefix {
            None => {
                // Ancestor scopes first, then the module top level.
                let mut search_parent = parent;
                loop {
                    if let Some(g) = module.find_child(
                        search_parent,
                        local,
                        NodeKindMask::GROUPING,
                    ) {
                        break Some((self_id, g));
                    }
                    match search_parent {
                        Some(id) => {
                            search_parent = module.node(id).parent
                        }
                        None => break None,
                    }
                }
            }
            Some(prefix) => {
                let target =
                    resolve_import(ctx, module, scope, prefix, line)?;
                ctx.module_data(target)
                    .find_child(None, local, NodeKindMask::GROUPING)
                    .map(|g| (target, g))
            }
        };
        let target = target.ok_or_else(|| {
            ctx.sink().error(
                ErrorCode::UnknownGrouping,
                Some(line),
                format!("invalid value \"{}\" of \"uses\"", name),
            )
        })?;
        match &mut module.node_mut(node_id).payload {
            NodePayload::Uses { grouping, .. } => *grouping = Some(target),
            _ => unreachable!("uses payload expected"),
        }
    }

    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

#[allow(clippy::too_many_arguments)]
fn read_anyxml(
    ctx: &Context,
    module: &mut Module,
    self_id: ModuleId,
    _scope: Scope,
    tree: &mut XmlTree,
    elem: ElementId,
    parent: Option<NodeId>,
) -> Result<NodeId> {
    let line = tree.elem(elem).line;
    let name = mandatory_attr(ctx, tree, elem, "name")?;

    let mut c = Common::new();
    let mut mandatory_seen = false;
    for child in tree.children_ids(Some(elem)) {
        if skip_foreign(ctx, tree, child) {
            continue;
        }
        if common_stmt(ctx, tree, child, &mut c, true)? {
            continue;
        }
        let cline = tree.elem(child).line;
        match tree.elem(child).name.as_str() {
            "mandatory" => {
                check_absent(ctx, mandatory_seen, "mandatory", cline)?;
                mandatory_seen = true;
                if read_boolean(ctx, tree, child, "mandatory")? {
                    c.flags |= NodeFlags::MANDATORY;
                }
            }
            "when" | "must" | "if-feature" => {
                ctx.sink().debug("constraint statement skipped")
            }
            other => return Err(unknown_statement(ctx, other, cline)),
        }
    }
    finalize_flags(&mut c.flags, parent_flags(module, parent));

    let node_id = alloc_node(
        ctx,
        module,
        self_id,
        parent,
        name,
        line,
        NodePayload::AnyXml,
    )?;
    finish_node(module, node_id, parent, c);
    Ok(node_id)
}

// ===== common substatements =====

impl Common {
    fn new() -> Common {
        Common {
            dsc: None,
            ref_: None,
            flags: NodeFlags::empty(),
        }
    }
}

fn config_mask() -> NodeFlags {
    NodeFlags::CONFIG_W | NodeFlags::CONFIG_R
}

fn status_mask() -> NodeFlags {
    NodeFlags::STATUS_CURR | NodeFlags::STATUS_DEPRC | NodeFlags::STATUS_OBSLT
}

/// Handle a description, reference, status or config substatement shared
/// by most schema statements. Returns whether the child was consumed.
fn common_stmt(
    ctx: &Context,
    tree: &XmlTree,
    child: ElementId,
    c: &mut Common,
    allow_config: bool,
) -> Result<bool> {
    let line = tree.elem(child).line;
    match tree.elem(child).name.as_str() {
        "description" => {
            check_absent(ctx, c.dsc.is_some(), "description", line)?;
            c.dsc = Some(read_text(ctx, tree, child)?);
        }
        "reference" => {
            check_absent(ctx, c.ref_.is_some(), "reference", line)?;
            c.ref_ = Some(read_text(ctx, tree, child)?);
        }
        "status" => {
            check_absent(
                ctx,
                c.flags.intersects(status_mask()),
                "status",
                line,
            )?;
            let value = mandatory_attr(ctx, tree, child, "value")?;
            c.flags |= match value.as_str() {
                "current" => NodeFlags::STATUS_CURR,
                "deprecated" => NodeFlags::STATUS_DEPRC,
                "obsolete" => NodeFlags::STATUS_OBSLT,
                _ => {
                    return Err(invalid_argument(ctx, &value, "status", line))
                }
            };
        }
        "config" if allow_config => {
            check_absent(
                ctx,
                c.flags.intersects(config_mask()),
                "config",
                line,
            )?;
            let value = mandatory_attr(ctx, tree, child, "value")?;
            c.flags |= match value.as_str() {
                "true" => NodeFlags::CONFIG_W,
                "false" => NodeFlags::CONFIG_R,
                _ => {
                    return Err(invalid_argument(ctx, &value, "config", line))
                }
            };
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Inherit unset config and status bits from the parent; the defaults at
/// the top level are config true and status current.
fn finalize_flags(flags: &mut NodeFlags, parent: NodeFlags) {
    if !flags.intersects(config_mask()) {
        let inherited = parent & config_mask();
        *flags |= if inherited.is_empty() {
            NodeFlags::CONFIG_W
        } else {
            inherited
        };
    }
    if !flags.intersects(status_mask()) {
        let inherited = parent & status_mask();
        *flags |= if inherited.is_empty() {
            NodeFlags::STATUS_CURR
        } else {
            inherited
        };
    }
}

// ===== shared helpers =====

fn strip_own_prefix<'a>(
    module: &Module,
    scope: Scope,
    prefix: Option<&'a str>,
) -> Option<&'a str> {
    let own = match scope {
        Scope::Module => &module.prefix,
        Scope::Submodule(i) => &module.includes[i].submodule.belongs_to_prefix,
    };
    match prefix {
        Some(prefix) if *own == prefix => None,
        prefix => prefix,
    }
}

fn resolve_import(
    ctx: &Context,
    module: &Module,
    scope: Scope,
    prefix: &str,
    line: u64,
) -> Result<ModuleId> {
    let imports = match scope {
        Scope::Module => &module.imports,
        Scope::Submodule(i) => &module.includes[i].submodule.imports,
    };
    imports
        .iter()
        .find(|imp| imp.prefix == prefix)
        .map(|imp| imp.module)
        .ok_or_else(|| {
            ctx.sink().error(
                ErrorCode::UnresolvablePrefix,
                Some(line),
                format!("prefix \"{}\" does not resolve to a module", prefix),
            )
        })
}

fn push_node_tpdf(module: &mut Module, node: NodeId, tpdf: Typedef) {
    match &mut module.node_mut(node).payload {
        NodePayload::Container { tpdf: table, .. }
        | NodePayload::List { tpdf: table, .. }
        | NodePayload::Grouping { tpdf: table } => table.push(tpdf),
        _ => unreachable!("node kind carries no typedef table"),
    }
}

fn is_yin(tree: &XmlTree, elem: ElementId) -> bool {
    tree.elem_ns_uri(elem) == Some(YIN_NS)
}

/// Statements from a foreign namespace are extensions; they are skipped
/// with a warning.
fn skip_foreign(ctx: &Context, tree: &XmlTree, elem: ElementId) -> bool {
    if is_yin(tree, elem) {
        return false;
    }
    ctx.sink().warning(
        Some(tree.elem(elem).line),
        &format!(
            "skipping unknown statement \"{}\" from foreign namespace",
            tree.elem(elem).name
        ),
    );
    true
}

fn mandatory_attr(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
    attr: &str,
) -> Result<DictStr> {
    match tree.attr_value(elem, attr) {
        Some(value) => Ok(ctx.dict().insert(value)),
        None => Err(missing_argument(
            ctx,
            attr,
            tree.elem(elem).name.as_str(),
            tree.elem(elem).line,
        )),
    }
}

/// Read the `<text>` argument element of description-like statements.
fn read_text(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<DictStr> {
    for child in tree.children_ids(Some(elem)) {
        if is_yin(tree, child) && tree.elem(child).name.as_str() == "text" {
            let content = tree.elem(child).content.as_deref().unwrap_or("");
            return Ok(ctx.dict().insert(content));
        }
    }
    Err(missing_argument(
        ctx,
        "text",
        tree.elem(elem).name.as_str(),
        tree.elem(elem).line,
    ))
}

fn read_boolean(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
    stmt: &str,
) -> Result<bool> {
    let value = mandatory_attr(ctx, tree, elem, "value")?;
    match value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid_argument(ctx, &value, stmt, tree.elem(elem).line)),
    }
}

/// Returns whether the ordering is by user.
fn read_ordered_by(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<bool> {
    let value = mandatory_attr(ctx, tree, elem, "value")?;
    match value.as_str() {
        "user" => Ok(true),
        "system" => Ok(false),
        _ => Err(invalid_argument(
            ctx,
            &value,
            "ordered-by",
            tree.elem(elem).line,
        )),
    }
}

fn read_min_elements(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<u32> {
    let value = mandatory_attr(ctx, tree, elem, "value")?;
    value.parse::<u32>().map_err(|_| {
        invalid_argument(ctx, &value, "min-elements", tree.elem(elem).line)
    })
}

fn read_max_elements(
    ctx: &Context,
    tree: &XmlTree,
    elem: ElementId,
) -> Result<u32> {
    let value = mandatory_attr(ctx, tree, elem, "value")?;
    if value.as_str() == "unbounded" {
        return Ok(u32::MAX);
    }
    value
        .parse::<u32>()
        .ok()
        .filter(|max| *max > 0)
        .ok_or_else(|| {
            invalid_argument(ctx, &value, "max-elements", tree.elem(elem).line)
        })
}

// ===== diagnostics helpers =====

fn unknown_statement(ctx: &Context, name: &str, line: u64) -> Error {
    ctx.sink().error(
        ErrorCode::UnknownStatement,
        Some(line),
        format!("unknown statement \"{}\"", name),
    )
}

fn check_absent(
    ctx: &Context,
    present: bool,
    name: &str,
    line: u64,
) -> Result<()> {
    if present {
        return Err(ctx.sink().error(
            ErrorCode::TooManyStatements,
            Some(line),
            format!("statement \"{}\" occurs too many times", name),
        ));
    }
    Ok(())
}

fn missing_statement(ctx: &Context, name: &str, line: u64) -> Error {
    ctx.sink().error(
        ErrorCode::MissingStatement,
        Some(line),
        format!("missing mandatory statement \"{}\"", name),
    )
}

fn missing_argument(
    ctx: &Context,
    attr: &str,
    stmt: &str,
    line: u64,
) -> Error {
    ctx.sink().error(
        ErrorCode::MissingArgument,
        Some(line),
        format!("missing argument \"{}\" of \"{}\"", attr, stmt),
    )
}

fn invalid_argument(
    ctx: &Context,
    value: &str,
    stmt: &str,
    line: u64,
) -> Error {
    ctx.sink().error(
        ErrorCode::InvalidArgument,
        Some(line),
        format!("invalid value \"{}\" of \"{}\"", value, stmt),
    )
}
