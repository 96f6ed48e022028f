//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! YANG context.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::dict::Dictionary;
use crate::error::{Error, ErrorCode, Result};
use crate::iter::SchemaModules;
use crate::logging::{LogLevel, LogSink};
use crate::schema::{
    IdentRef, IdentScope, Identity, Module, ModuleId, SchemaModule,
    SchemaSubmodule, TpdfRef, TpdfScope, Typedef,
};
use crate::utils::check_date;
use crate::xml::XmlTree;

/// Context of the YANG schemas.
///
/// The context holds all information about the loaded schemas. Usually the
/// application works with a single context in which all modules are loaded
/// and against which data trees are processed and validated. All operations
/// on a context execute on one thread at a time; compiled schemas can be
/// traversed freely between parses.
#[derive(Debug)]
pub struct Context {
    pub(crate) dict: Rc<Dictionary>,
    pub(crate) modules: Vec<Module>,
    searchdir: Option<PathBuf>,
    sink: LogSink,
    /// Changes with every registration; exposed through the yang-library
    /// instance tree.
    module_set_id: Cell<u32>,
    /// Names of the modules currently being parsed, to catch dependency
    /// cycles.
    loading: Vec<String>,
}

// ===== impl Context =====

impl Context {
    /// Create an empty context.
    pub fn new() -> Context {
        Context {
            dict: Rc::new(Dictionary::new()),
            modules: Vec::new(),
            searchdir: None,
            sink: LogSink::new(),
            module_set_id: Cell::new(0),
            loading: Vec::new(),
        }
    }

    /// Set the directory searched when loading modules by name.
    pub fn set_searchdir<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(self.sink.error(
                ErrorCode::Io,
                None,
                format!("\"{}\" is not a directory", dir.display()),
            ));
        }
        self.searchdir = Some(dir.to_path_buf());
        Ok(())
    }

    /// The configured module search directory.
    pub fn searchdir(&self) -> Option<&Path> {
        self.searchdir.as_deref()
    }

    /// Current verbosity threshold.
    pub fn log_level(&self) -> LogLevel {
        self.sink.level()
    }

    /// Adjust the verbosity threshold.
    pub fn set_log_level(&self, level: LogLevel) {
        self.sink.set_level(level);
    }

    /// The last error recorded on this context.
    pub fn last_error(&self) -> Option<Error> {
        self.sink.last_error()
    }

    /// Parse a module from a YIN document and register it.
    pub fn parse_module_str(
        &mut self,
        data: &str,
    ) -> Result<SchemaModule<'_>> {
        let id = crate::yin::parse_data(self, data, true)?;
        Ok(SchemaModule::new(self, id))
    }

    /// Try to find the module in the search directory and load it.
    ///
    /// Files are matched by the `<name>.yin` / `<name>@<revision>.yin`
    /// convention; without a revision the newest candidate wins.
    pub fn load_module(
        &mut self,
        name: &str,
        revision: Option<&str>,
    ) -> Result<SchemaModule<'_>> {
        let path = self.find_schema_file(name, revision)?;
        let data = self.read_schema_file(&path)?;
        let id = crate::yin::parse_data(self, &data, true)?;
        Ok(SchemaModule::new(self, id))
    }

    /// Get a module of the given name and revision; with no revision the
    /// newest registered revision is returned.
    pub fn get_module(
        &self,
        name: &str,
        revision: Option<&str>,
    ) -> Option<SchemaModule<'_>> {
        let id = self.find_module_id(name, revision)?;
        Some(SchemaModule::new(self, id))
    }

    /// Get a submodule of the given module.
    pub fn get_submodule(
        &self,
        module: &str,
        name: &str,
        revision: Option<&str>,
    ) -> Option<SchemaSubmodule<'_>> {
        let module = self.get_module(module, None)?;
        module.submodules().find(|submodule| {
            submodule.name() == name
                && (revision.is_none() || submodule.revision() == revision)
        })
    }

    /// Names of the registered modules, in registration order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Returns an iterator over the registered modules.
    pub fn modules(&self) -> SchemaModules<'_> {
        SchemaModules::new(self)
    }

    /// Returns an iterator over all schema nodes from all modules in the
    /// context (depth-first search algorithm).
    pub fn traverse(&self) -> impl Iterator<Item = crate::schema::SchemaNode<'_>> {
        self.modules().flat_map(|module| {
            module.data().flat_map(|snode| snode.traverse())
        })
    }

    /// Enable a feature (or all features, with `"*"`) of a module.
    pub fn feature_enable(
        &mut self,
        module: &str,
        feature: &str,
    ) -> Result<()> {
        self.feature_set(module, feature, true)
    }

    /// Disable a feature (or all features, with `"*"`) of a module.
    pub fn feature_disable(
        &mut self,
        module: &str,
        feature: &str,
    ) -> Result<()> {
        self.feature_set(module, feature, false)
    }

    /// Synthesize an instance tree conformant with
    /// `ietf-yang-library@2015-07-03` describing the loaded modules.
    pub fn info(&self) -> Result<XmlTree> {
        let mut tree = XmlTree::new(self);
        let root = tree.new_element(None, "modules", None);
        tree.new_ns_decl(
            root,
            None,
            "urn:ietf:params:xml:ns:yang:ietf-yang-library",
        );
        let set_id = self.module_set_id.get().to_string();
        tree.new_element(Some(root), "module-set-id", Some(&set_id));

        for module in &self.modules {
            let entry = tree.new_element(Some(root), "module", None);
            tree.new_element(Some(entry), "name", Some(module.name.as_str()));
            tree.new_element(Some(entry), "revision", module.latest_revision());
            tree.new_element(
                Some(entry),
                "namespace",
                Some(module.ns.as_str()),
            );
            let conformance =
                if module.implemented { "implement" } else { "import" };
            tree.new_element(Some(entry), "conformance", Some(conformance));

            if !module.includes.is_empty() {
                let submodules =
                    tree.new_element(Some(entry), "submodules", None);
                for incl in &module.includes {
                    let sub =
                        tree.new_element(Some(submodules), "submodule", None);
                    tree.new_element(
                        Some(sub),
                        "name",
                        Some(incl.submodule.name.as_str()),
                    );
                    let rev = incl
                        .submodule
                        .revisions
                        .iter()
                        .map(|rev| rev.date.as_str())
                        .max();
                    tree.new_element(Some(sub), "revision", rev);
                }
            }
        }
        Ok(tree)
    }

    // ----- crate-internal plumbing -----

    pub(crate) fn dictionary(&self) -> Rc<Dictionary> {
        Rc::clone(&self.dict)
    }

    pub(crate) fn dict(&self) -> &Dictionary {
        &self.dict
    }

    pub(crate) fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub(crate) fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub(crate) fn module_data(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub(crate) fn module_data_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub(crate) fn module_by_index(
        &self,
        index: usize,
    ) -> Option<SchemaModule<'_>> {
        if index < self.modules.len() {
            Some(SchemaModule::new(self, ModuleId(index)))
        } else {
            None
        }
    }

    pub(crate) fn identity_data(&self, r: IdentRef) -> &Identity {
        let module = self.module_data(r.module);
        match r.scope {
            IdentScope::Top(i) => &module.identities[i],
            IdentScope::Submodule(s, i) => {
                &module.includes[s].submodule.identities[i]
            }
        }
    }

    pub(crate) fn identity_data_mut(&mut self, r: IdentRef) -> &mut Identity {
        let module = self.module_data_mut(r.module);
        match r.scope {
            IdentScope::Top(i) => &mut module.identities[i],
            IdentScope::Submodule(s, i) => {
                &mut module.includes[s].submodule.identities[i]
            }
        }
    }

    pub(crate) fn typedef_data(&self, r: TpdfRef) -> &Typedef {
        let module = self.module_data(r.module);
        match r.scope {
            TpdfScope::Top(i) => &module.tpdf[i],
            TpdfScope::Submodule(s, i) => {
                &module.includes[s].submodule.tpdf[i]
            }
            TpdfScope::Node(node, i) => {
                module.node(node).payload.tpdf().unwrap().get(i).unwrap()
            }
        }
    }

    /// Find a registered module; without a revision the newest one wins.
    pub(crate) fn find_module_id(
        &self,
        name: &str,
        revision: Option<&str>,
    ) -> Option<ModuleId> {
        let mut found: Option<(ModuleId, Option<&str>)> = None;
        for (index, module) in self.modules.iter().enumerate() {
            if module.name != name {
                continue;
            }
            let rev = module.latest_revision();
            match revision {
                Some(revision) => {
                    if rev == Some(revision) {
                        return Some(ModuleId(index));
                    }
                }
                None => {
                    // Newest revision wins; revisionless modules are
                    // considered the oldest.
                    let newer = match &found {
                        None => true,
                        Some((_, best)) => rev > *best,
                    };
                    if newer {
                        found = Some((ModuleId(index), rev));
                    }
                }
            }
        }
        found.map(|(id, _)| id)
    }

    /// Resolve an import target: reuse a registered module or load it from
    /// the search directory (as a non-implemented dependency).
    pub(crate) fn load_or_get_module(
        &mut self,
        name: &str,
        revision: Option<&str>,
    ) -> Result<ModuleId> {
        if let Some(id) = self.find_module_id(name, revision) {
            return Ok(id);
        }
        if self.loading.iter().any(|loading| loading == name) {
            return Err(self.sink.error(
                ErrorCode::InvalidArgument,
                None,
                format!("circular dependency on module \"{}\"", name),
            ));
        }
        let path = self.find_schema_file(name, revision)?;
        let data = self.read_schema_file(&path)?;
        crate::yin::parse_data(self, &data, false)
    }

    /// Register a fully compiled module, rejecting duplicates by (name,
    /// latest revision).
    pub(crate) fn register_module(&mut self, module: Module) -> Result<ModuleId> {
        self.check_duplicate(&module.name, module.latest_revision())?;
        self.sink
            .verbose(&format!("module \"{}\" registered", module.name));
        let id = ModuleId(self.modules.len());
        self.modules.push(module);
        self.module_set_id.set(self.module_set_id.get() + 1);
        Ok(id)
    }

    /// Reject a module whose (name, latest revision) duplicates an already
    /// registered one; two revisionless modules of one name also collide.
    pub(crate) fn check_duplicate(
        &self,
        name: &str,
        revision: Option<&str>,
    ) -> Result<()> {
        for module in &self.modules {
            if module.name == name && module.latest_revision() == revision {
                return Err(self.sink.error(
                    ErrorCode::DuplicateModule,
                    None,
                    match revision {
                        Some(revision) => format!(
                            "module \"{}\" revision \"{}\" already in context",
                            name, revision
                        ),
                        None => format!(
                            "module \"{}\" already in context",
                            name
                        ),
                    },
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn loading_push(&mut self, name: &str) {
        self.loading.push(name.to_string());
    }

    pub(crate) fn loading_pop(&mut self) {
        self.loading.pop();
    }

    /// Drop identity back-references left behind by a failed parse.
    pub(crate) fn sweep_dangling_derived(&mut self) {
        let count = self.modules.len();
        for module in &mut self.modules {
            for ident in &mut module.identities {
                ident.derived.retain(|r| r.module.0 < count);
            }
            for incl in &mut module.includes {
                for ident in &mut incl.submodule.identities {
                    ident.derived.retain(|r| r.module.0 < count);
                }
            }
        }
    }

    /// Locate a schema file in the search directory.
    pub(crate) fn find_schema_file(
        &self,
        name: &str,
        revision: Option<&str>,
    ) -> Result<PathBuf> {
        let dir = self.searchdir.as_ref().ok_or_else(|| {
            self.sink.error(
                ErrorCode::Io,
                None,
                "no search directory configured".to_string(),
            )
        })?;

        if let Some(revision) = revision {
            let exact = dir.join(format!("{}@{}.yin", name, revision));
            if exact.is_file() {
                return Ok(exact);
            }
        } else {
            let plain = dir.join(format!("{}.yin", name));
            if plain.is_file() {
                return Ok(plain);
            }
            // Newest revisioned candidate.
            let mut best: Option<(String, PathBuf)> = None;
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let file_name = entry.file_name();
                    let file_name = match file_name.to_str() {
                        Some(file_name) => file_name,
                        None => continue,
                    };
                    let rev = match file_name
                        .strip_prefix(name)
                        .and_then(|rest| rest.strip_prefix('@'))
                        .and_then(|rest| rest.strip_suffix(".yin"))
                    {
                        Some(rev) if check_date(rev) => rev,
                        _ => continue,
                    };
                    if best
                        .as_ref()
                        .map(|(best_rev, _)| rev > best_rev.as_str())
                        .unwrap_or(true)
                    {
                        best = Some((rev.to_string(), entry.path()));
                    }
                }
            }
            if let Some((_, path)) = best {
                return Ok(path);
            }
        }

        Err(self.sink.error(
            ErrorCode::Io,
            None,
            format!("no schema file found for module \"{}\"", name),
        ))
    }

    pub(crate) fn read_schema_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|err| {
            self.sink.error(
                ErrorCode::Io,
                None,
                format!("cannot read \"{}\": {}", path.display(), err),
            )
        })
    }

    fn feature_set(
        &mut self,
        module: &str,
        feature: &str,
        value: bool,
    ) -> Result<()> {
        let id = self.find_module_id(module, None).ok_or_else(|| {
            self.sink.error(
                ErrorCode::InvalidArgument,
                None,
                format!("module \"{}\" not found", module),
            )
        })?;

        let module = self.module_data_mut(id);
        let mut hit = false;
        for entry in module.features.iter_mut().chain(
            module.includes.iter_mut().flat_map(|incl| {
                incl.submodule.features.iter_mut()
            }),
        ) {
            if feature == "*" || entry.name == feature {
                entry.enabled = value;
                hit = true;
            }
        }
        if hit || feature == "*" {
            Ok(())
        } else {
            Err(self.sink.error(
                ErrorCode::InvalidArgument,
                None,
                format!("feature \"{}\" not found", feature),
            ))
        }
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

impl Drop for Context {
    // Modules are released in reverse registration order, then the
    // dictionary they intern into.
    fn drop(&mut self) {
        while self.modules.pop().is_some() {}
    }
}
