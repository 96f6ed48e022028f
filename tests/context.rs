use yangkit::context::Context;
use yangkit::iter::NodeIterable;
use yangkit::schema::{NodeKind, TypeKind};
use yangkit::ErrorCode;

static SEARCH_DIR: &str = "./tests/assets/yang/";

fn create_context() -> Context {
    let mut ctx = Context::new();
    ctx.set_searchdir(SEARCH_DIR)
        .expect("Failed to set YANG search directory");
    ctx
}

#[test]
fn load_module_with_dependencies() {
    let mut ctx = create_context();
    ctx.load_module("iface", None).expect("Failed to load module");

    // The import was pulled in from the search directory.
    assert_eq!(ctx.module_names(), vec!["iface-types", "iface"]);
    let iface = ctx.get_module("iface", None).unwrap();
    assert!(iface.is_implemented());
    let types = ctx.get_module("iface-types", None).unwrap();
    assert!(!types.is_implemented());

    // Cross-module typedef resolution.
    let mtu = iface
        .traverse()
        .find(|snode| snode.name() == "mtu")
        .unwrap();
    let mtu_type = mtu.leaf_type().unwrap();
    assert_eq!(mtu_type.base_kind(), TypeKind::Uint16);
    assert_eq!(
        mtu_type.derivation().unwrap(),
        types.typedef("mtu-value").unwrap()
    );

    // Cross-module identityref resolution.
    let iftype = iface
        .traverse()
        .find(|snode| snode.name() == "type")
        .unwrap();
    assert_eq!(
        iftype.leaf_type().unwrap().identity_base().unwrap(),
        types.identity("interface-type").unwrap()
    );
    let derived: Vec<&str> = types
        .identity("interface-type")
        .unwrap()
        .derived()
        .map(|ident| ident.name())
        .collect();
    assert_eq!(derived, vec!["ethernet", "fast-ethernet"]);

    // The list keys were bound.
    let list = iface
        .traverse()
        .find(|snode| snode.kind() == NodeKind::List)
        .unwrap();
    let keys: Vec<&str> =
        list.list_keys().map(|snode| snode.name()).collect();
    assert_eq!(keys, vec!["name"]);
}

#[test]
fn submodule_content_is_compiled_in() {
    let mut ctx = create_context();
    ctx.load_module("iface", None).unwrap();
    let iface = ctx.get_module("iface", None).unwrap();

    // The submodule's data tree landed in the owning module.
    let state = iface
        .data()
        .find(|snode| snode.name() == "iface-state")
        .unwrap();
    assert!(state.is_state());
    assert_eq!(state.module().name(), "iface");

    // A module-level leaf resolves a typedef declared in the submodule.
    let description = iface
        .traverse()
        .find(|snode| snode.name() == "description")
        .unwrap();
    assert_eq!(
        description.leaf_type().unwrap().base_kind(),
        TypeKind::String
    );
    assert_eq!(
        description.leaf_type().unwrap().derivation().unwrap().name(),
        "if-description"
    );

    let submodule = ctx.get_submodule("iface", "iface-sub", None).unwrap();
    assert_eq!(submodule.name(), "iface-sub");
    assert_eq!(submodule.revision(), Some("2015-03-01"));
    assert_eq!(submodule.module().name(), "iface");
}

#[test]
fn load_module_picks_newest_revision() {
    let mut ctx = create_context();
    let module = ctx.load_module("revved", None).unwrap();
    assert_eq!(module.revision(), Some("2015-07-03"));
    assert!(module.find_node("new", yangkit::schema::NodeKindMask::ANY).is_some());
}

#[test]
fn load_module_by_revision() {
    let mut ctx = create_context();
    let module = ctx.load_module("revved", Some("2015-01-10")).unwrap();
    assert_eq!(module.revision(), Some("2015-01-10"));
}

#[test]
fn load_module_twice_fails() {
    let mut ctx = create_context();
    ctx.load_module("iface", None).unwrap();
    let names = ctx.module_names().join(",");

    let err = ctx.load_module("iface", None).unwrap_err();
    assert_eq!(err.errcode, ErrorCode::DuplicateModule);
    assert_eq!(ctx.module_names().join(","), names);
}

#[test]
fn load_missing_module_fails() {
    let mut ctx = create_context();
    let err = ctx.load_module("no-such-module", None).unwrap_err();
    assert_eq!(err.errcode, ErrorCode::Io);
    assert_eq!(ctx.last_error().unwrap().errcode, ErrorCode::Io);
}

#[test]
fn searchdir_must_be_a_directory() {
    let mut ctx = Context::new();
    assert!(ctx.set_searchdir("./tests/assets/yang/iface.yin").is_err());
    assert!(ctx.set_searchdir("./no/such/dir").is_err());
    assert!(ctx.set_searchdir(SEARCH_DIR).is_ok());
    assert_eq!(
        ctx.searchdir().unwrap().to_str().unwrap(),
        "./tests/assets/yang/"
    );
}

#[test]
fn load_without_searchdir_fails() {
    let mut ctx = Context::new();
    let err = ctx.load_module("iface", None).unwrap_err();
    assert_eq!(err.errcode, ErrorCode::Io);
}

#[test]
fn yang_library_with_submodules() {
    let mut ctx = create_context();
    ctx.load_module("iface", None).unwrap();

    let info = ctx.info().unwrap();
    let root = info.root().unwrap();
    let entries: Vec<_> =
        root.children().filter(|c| c.name() == "module").collect();
    assert_eq!(entries.len(), 2);

    let child = |entry: &yangkit::xml::Element<'_>, name: &str| {
        entry
            .children()
            .find(|c| c.name() == name)
            .map(|c| c.content().unwrap_or("").to_string())
    };
    assert_eq!(child(&entries[0], "name").unwrap(), "iface-types");
    assert_eq!(child(&entries[0], "conformance").unwrap(), "import");
    assert_eq!(child(&entries[1], "name").unwrap(), "iface");
    assert_eq!(child(&entries[1], "revision").unwrap(), "2015-04-20");
    assert_eq!(child(&entries[1], "conformance").unwrap(), "implement");

    let submodules = entries[1]
        .children()
        .find(|c| c.name() == "submodules")
        .unwrap();
    let sub = submodules.first_child().unwrap();
    assert_eq!(
        sub.children().find(|c| c.name() == "name").unwrap().content(),
        Some("iface-sub")
    );
}

#[test]
fn module_set_id_changes_on_registration() {
    let mut ctx = create_context();
    let set_id = |ctx: &Context| {
        let info = ctx.info().unwrap();
        let root = info.root().unwrap();
        root.children()
            .find(|c| c.name() == "module-set-id")
            .unwrap()
            .content()
            .unwrap()
            .to_string()
    };
    let before = set_id(&ctx);
    ctx.load_module("revved", None).unwrap();
    let after = set_id(&ctx);
    assert_ne!(before, after);
    // A failed load leaves the id alone.
    let _ = ctx.load_module("revved", None).unwrap_err();
    assert_eq!(set_id(&ctx), after);
}

#[test]
fn module_features_from_file() {
    let mut ctx = create_context();
    ctx.load_module("iface", None).unwrap();
    let module = ctx.get_module("iface", None).unwrap();
    let (names, states) = module.features_list();
    assert_eq!(names, vec!["snmp"]);
    assert_eq!(states, vec![false]);

    ctx.feature_enable("iface", "snmp").unwrap();
    let module = ctx.get_module("iface", None).unwrap();
    assert_eq!(module.features_list().1, vec![true]);
}

#[test]
fn modules_iterator_order() {
    let mut ctx = create_context();
    ctx.load_module("iface", None).unwrap();
    ctx.load_module("revved", None).unwrap();
    let names: Vec<&str> =
        ctx.modules().map(|module| module.name()).collect();
    assert_eq!(names, vec!["iface-types", "iface", "revved"]);
}
