use yangkit::context::Context;
use yangkit::schema::{NodeKind, TypeKind};
use yangkit::ErrorCode;

/// Wrap a module body into a YIN document with default namespace/prefix.
fn module_yin(name: &str, body: &str) -> String {
    format!(
        "<module name=\"{name}\" xmlns=\"urn:ietf:params:xml:ns:yang:yin:1\">\
         <namespace uri=\"urn:{name}\"/><prefix value=\"{name}\"/>{body}</module>",
        name = name,
        body = body
    )
}

fn parse(body: &str) -> Context {
    let mut ctx = Context::new();
    ctx.parse_module_str(&module_yin("m", body))
        .expect("Failed to parse module");
    ctx
}

fn parse_err(body: &str) -> ErrorCode {
    let mut ctx = Context::new();
    let err = ctx
        .parse_module_str(&module_yin("m", body))
        .expect_err("parse unexpectedly succeeded");
    err.errcode
}

#[test]
fn minimal_module() {
    let ctx = parse("<leaf name=\"x\"><type name=\"string\"/></leaf>");
    let module = ctx.get_module("m", None).unwrap();
    assert_eq!(module.name(), "m");
    assert_eq!(module.namespace(), "urn:m");
    assert_eq!(module.prefix(), "m");
    assert_eq!(module.revision(), None);
    assert!(module.is_implemented());

    let data: Vec<_> = module.data().collect();
    assert_eq!(data.len(), 1);
    let leaf = &data[0];
    assert_eq!(leaf.name(), "x");
    assert_eq!(leaf.kind(), NodeKind::Leaf);
    assert_eq!(leaf.leaf_type().unwrap().base_kind(), TypeKind::String);
    assert!(leaf.is_config());
    assert!(leaf.is_status_current());
}

#[test]
fn minimal_module_yang_library() {
    let ctx = parse("<leaf name=\"x\"><type name=\"string\"/></leaf>");
    let info = ctx.info().unwrap();
    let root = info.root().unwrap();
    assert_eq!(root.name(), "modules");
    assert_eq!(
        root.namespace(),
        Some("urn:ietf:params:xml:ns:yang:ietf-yang-library")
    );
    assert!(root
        .children()
        .any(|child| child.name() == "module-set-id"));

    let entries: Vec<_> =
        root.children().filter(|c| c.name() == "module").collect();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    let child = |name: &str| {
        entry
            .children()
            .find(|c| c.name() == name)
            .expect("missing yang-library leaf")
    };
    assert_eq!(child("name").content(), Some("m"));
    assert_eq!(child("revision").content(), None);
    assert_eq!(child("namespace").content(), Some("urn:m"));
    assert_eq!(child("conformance").content(), Some("implement"));
}

#[test]
fn module_metadata() {
    let ctx = parse(
        "<yang-version value=\"1\"/>\
         <organization><text>Example, Inc.</text></organization>\
         <contact><text>support@example.com</text></contact>\
         <description><text>Test module.</text></description>\
         <revision date=\"2015-03-01\"><description><text>First.</text></description></revision>\
         <revision date=\"2015-07-03\"/>",
    );
    let module = ctx.get_module("m", None).unwrap();
    assert_eq!(module.organization(), Some("Example, Inc."));
    assert_eq!(module.contact(), Some("support@example.com"));
    assert_eq!(module.description(), Some("Test module."));
    // The newest revision wins.
    assert_eq!(module.revision(), Some("2015-07-03"));
}

#[test]
fn enum_auto_assignment() {
    let ctx = parse(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\"a\"/>\
         <enum name=\"b\"><value value=\"5\"/></enum>\
         <enum name=\"c\"/>\
         </type></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module.data().next().unwrap();
    let ltype = leaf.leaf_type().unwrap();
    assert_eq!(ltype.base_kind(), TypeKind::Enum);
    let enums: Vec<(&str, i32)> = ltype
        .enums()
        .iter()
        .map(|e| (e.name(), e.value()))
        .collect();
    assert_eq!(enums, vec![("a", 0), ("b", 5), ("c", 6)]);
}

#[test]
fn enum_duplicate_value() {
    let code = parse_err(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\"a\"><value value=\"1\"/></enum>\
         <enum name=\"b\"><value value=\"1\"/></enum>\
         </type></leaf>",
    );
    assert_eq!(code, ErrorCode::DuplicateEnumValue);
}

#[test]
fn enum_duplicate_name() {
    let code = parse_err(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\"a\"/><enum name=\"a\"/>\
         </type></leaf>",
    );
    assert_eq!(code, ErrorCode::DuplicateEnumName);
}

#[test]
fn enum_whitespace_name() {
    let code = parse_err(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\" a\"/>\
         </type></leaf>",
    );
    assert_eq!(code, ErrorCode::EnumNameWhitespace);
}

#[test]
fn enum_value_boundaries() {
    // Auto-assignment right past the maximum must fail.
    let code = parse_err(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\"a\"><value value=\"2147483647\"/></enum>\
         <enum name=\"b\"/>\
         </type></leaf>",
    );
    assert_eq!(code, ErrorCode::InvalidArgument);

    // An explicit value of 2^31 is out of range.
    let code = parse_err(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\"a\"><value value=\"2147483648\"/></enum>\
         </type></leaf>",
    );
    assert_eq!(code, ErrorCode::InvalidArgument);

    // The minimum value is still accepted.
    let ctx = parse(
        "<leaf name=\"l\"><type name=\"enumeration\">\
         <enum name=\"a\"><value value=\"-2147483648\"/></enum>\
         </type></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module.data().next().unwrap();
    assert_eq!(leaf.leaf_type().unwrap().enums()[0].value(), i32::MIN);
}

#[test]
fn list_key_binding() {
    let ctx = parse(
        "<list name=\"L\"><key value=\"k\"/>\
         <leaf name=\"k\"><type name=\"string\"/></leaf>\
         <leaf name=\"v\"><type name=\"string\"/></leaf>\
         </list>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let list = module.data().next().unwrap();
    assert_eq!(list.kind(), NodeKind::List);
    assert!(list.is_config());

    let keys: Vec<_> = list.list_keys().collect();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].name(), "k");
    assert!(keys[0].is_list_key());
    let v = list.children().find(|n| n.name() == "v").unwrap();
    assert!(!v.is_list_key());
}

#[test]
fn list_key_empty_type() {
    let code = parse_err(
        "<list name=\"L\"><key value=\"k\"/>\
         <leaf name=\"k\"><type name=\"empty\"/></leaf>\
         </list>",
    );
    assert_eq!(code, ErrorCode::KeyTypeEmpty);
}

#[test]
fn list_key_missing() {
    let code = parse_err(
        "<list name=\"L\">\
         <leaf name=\"k\"><type name=\"string\"/></leaf>\
         </list>",
    );
    assert_eq!(code, ErrorCode::MissingKey);
}

#[test]
fn list_key_not_found() {
    let code = parse_err(
        "<list name=\"L\"><key value=\"z\"/>\
         <leaf name=\"k\"><type name=\"string\"/></leaf>\
         </list>",
    );
    assert_eq!(code, ErrorCode::KeyNotFound);
}

#[test]
fn list_key_not_a_leaf() {
    let code = parse_err(
        "<list name=\"L\"><key value=\"c\"/>\
         <container name=\"c\"/>\
         <leaf name=\"k\"><type name=\"string\"/></leaf>\
         </list>",
    );
    assert_eq!(code, ErrorCode::KeyNotLeaf);
}

#[test]
fn list_key_duplicate() {
    let code = parse_err(
        "<list name=\"L\"><key value=\"k k\"/>\
         <leaf name=\"k\"><type name=\"string\"/></leaf>\
         </list>",
    );
    assert_eq!(code, ErrorCode::DuplicateKey);
}

#[test]
fn list_key_config_mismatch() {
    let code = parse_err(
        "<list name=\"L\"><key value=\"k\"/>\
         <leaf name=\"k\"><config value=\"false\"/><type name=\"string\"/></leaf>\
         </list>",
    );
    assert_eq!(code, ErrorCode::KeyConfigMismatch);
}

#[test]
fn state_list_needs_no_key() {
    let ctx = parse(
        "<list name=\"L\"><config value=\"false\"/>\
         <leaf name=\"v\"><type name=\"string\"/></leaf>\
         </list>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let list = module.data().next().unwrap();
    assert!(list.is_state());
    assert_eq!(list.list_keys().count(), 0);
}

#[test]
fn identity_derivation() {
    let ctx = parse(
        "<identity name=\"base\"/>\
         <identity name=\"a\"><base name=\"base\"/></identity>\
         <identity name=\"b\"><base name=\"a\"/></identity>",
    );
    let module = ctx.get_module("m", None).unwrap();

    let base = module.identity("base").unwrap();
    let a = module.identity("a").unwrap();
    let b = module.identity("b").unwrap();

    let derived: Vec<&str> = base.derived().map(|i| i.name()).collect();
    assert_eq!(derived, vec!["a", "b"]);
    let derived: Vec<&str> = a.derived().map(|i| i.name()).collect();
    assert_eq!(derived, vec!["b"]);
    assert_eq!(b.derived().count(), 0);

    assert_eq!(b.base().unwrap(), a);
    assert_eq!(a.base().unwrap(), base);
    assert!(base.base().is_none());
}

#[test]
fn identity_forward_reference() {
    // The base is declared after its derivative.
    let ctx = parse(
        "<identity name=\"a\"><base name=\"base\"/></identity>\
         <identity name=\"base\"/>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let base = module.identity("base").unwrap();
    assert_eq!(base.derived().count(), 1);
}

#[test]
fn identity_cycle_fails() {
    let code = parse_err(
        "<identity name=\"a\"><base name=\"b\"/></identity>\
         <identity name=\"b\"><base name=\"a\"/></identity>",
    );
    assert_eq!(code, ErrorCode::InvalidArgument);
}

#[test]
fn identityref_leaf() {
    let ctx = parse(
        "<identity name=\"crypto\"/>\
         <identity name=\"aes\"><base name=\"crypto\"/></identity>\
         <leaf name=\"l\"><type name=\"identityref\"><base name=\"crypto\"/></type></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module
        .data()
        .find(|n| n.kind() == NodeKind::Leaf)
        .unwrap();
    let ltype = leaf.leaf_type().unwrap();
    assert_eq!(ltype.base_kind(), TypeKind::IdentityRef);
    assert_eq!(
        ltype.identity_base().unwrap(),
        module.identity("crypto").unwrap()
    );
}

#[test]
fn identityref_requires_base() {
    let code = parse_err(
        "<leaf name=\"l\"><type name=\"identityref\"/></leaf>",
    );
    assert_eq!(code, ErrorCode::MissingStatement);
}

#[test]
fn cross_module_typedef() {
    let mut ctx = Context::new();
    ctx.parse_module_str(&module_yin(
        "p",
        "<typedef name=\"t\"><type name=\"uint32\"/></typedef>",
    ))
    .unwrap();
    ctx.parse_module_str(
        "<module name=\"q\" xmlns=\"urn:ietf:params:xml:ns:yang:yin:1\">\
         <namespace uri=\"urn:q\"/><prefix value=\"q\"/>\
         <import module=\"p\"><prefix value=\"pp\"/></import>\
         <leaf name=\"n\"><type name=\"pp:t\"/></leaf>\
         </module>",
    )
    .unwrap();

    let p = ctx.get_module("p", None).unwrap();
    let q = ctx.get_module("q", None).unwrap();
    let leaf = q.data().next().unwrap();
    let ltype = leaf.leaf_type().unwrap();
    assert_eq!(ltype.base_kind(), TypeKind::Uint32);
    assert_eq!(ltype.prefix(), Some("pp"));
    let der = ltype.derivation().unwrap();
    assert_eq!(der, p.typedef("t").unwrap());
    assert_eq!(der.name(), "t");
}

#[test]
fn typedef_chain_terminates_at_builtin() {
    let ctx = parse(
        "<typedef name=\"t1\"><type name=\"uint8\"/></typedef>\
         <typedef name=\"t2\"><type name=\"t1\"/></typedef>\
         <leaf name=\"l\"><type name=\"t2\"/></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module.data().next().unwrap();
    let ltype = leaf.leaf_type().unwrap();
    assert_eq!(ltype.base_kind(), TypeKind::Uint8);

    let t2 = ltype.derivation().unwrap();
    assert_eq!(t2.name(), "t2");
    let t1 = t2.base_type().derivation().unwrap();
    assert_eq!(t1.name(), "t1");
    // The chain ends at a built-in.
    assert!(t1.base_type().derivation().is_none());
    assert_eq!(t1.base_type().base_kind(), TypeKind::Uint8);
}

#[test]
fn typedef_scoped_in_container() {
    let ctx = parse(
        "<container name=\"c\">\
         <typedef name=\"local\"><type name=\"int16\"/></typedef>\
         <leaf name=\"l\"><type name=\"local\"/></leaf>\
         </container>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let container = module.data().next().unwrap();
    let leaf = container.children().next().unwrap();
    assert_eq!(leaf.leaf_type().unwrap().base_kind(), TypeKind::Int16);
}

#[test]
fn unknown_typedef_fails() {
    let code =
        parse_err("<leaf name=\"l\"><type name=\"nope\"/></leaf>");
    assert_eq!(code, ErrorCode::UnknownTypedef);
}

#[test]
fn unresolvable_type_prefix_fails() {
    let code =
        parse_err("<leaf name=\"l\"><type name=\"zz:t\"/></leaf>");
    assert_eq!(code, ErrorCode::UnresolvablePrefix);
}

#[test]
fn own_prefix_is_local() {
    let ctx = parse(
        "<typedef name=\"t\"><type name=\"uint8\"/></typedef>\
         <leaf name=\"l\"><type name=\"m:t\"/></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module.data().next().unwrap();
    assert_eq!(leaf.leaf_type().unwrap().base_kind(), TypeKind::Uint8);
}

#[test]
fn config_and_status_inheritance() {
    let ctx = parse(
        "<container name=\"state\">\
         <config value=\"false\"/><status value=\"deprecated\"/>\
         <leaf name=\"l\"><type name=\"string\"/></leaf>\
         </container>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let container = module.data().next().unwrap();
    assert!(container.is_state());
    assert!(container.is_status_deprecated());
    let leaf = container.children().next().unwrap();
    assert!(leaf.is_state());
    assert!(!leaf.is_config());
    assert!(leaf.is_status_deprecated());
}

#[test]
fn leaf_properties() {
    let ctx = parse(
        "<leaf name=\"l\">\
         <type name=\"uint16\"/><units name=\"octets\"/>\
         <default value=\"1500\"/><mandatory value=\"false\"/>\
         <description><text>MTU.</text></description>\
         </leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module.data().next().unwrap();
    assert_eq!(leaf.units(), Some("octets"));
    assert_eq!(leaf.default_value(), Some("1500"));
    assert_eq!(leaf.description(), Some("MTU."));
    assert!(!leaf.is_mandatory());
}

#[test]
fn leaf_list_constraints() {
    let ctx = parse(
        "<leaf-list name=\"ll\">\
         <type name=\"string\"/>\
         <min-elements value=\"2\"/><max-elements value=\"10\"/>\
         <ordered-by value=\"user\"/>\
         </leaf-list>\
         <leaf-list name=\"plain\"><type name=\"string\"/></leaf-list>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let ll = module.data().next().unwrap();
    assert_eq!(ll.kind(), NodeKind::LeafList);
    assert_eq!(ll.min_elements(), Some(2));
    assert_eq!(ll.max_elements(), Some(10));
    assert!(ll.is_user_ordered());

    let plain = module.data().nth(1).unwrap();
    assert_eq!(plain.min_elements(), None);
    assert_eq!(plain.max_elements(), None);
    assert!(!plain.is_user_ordered());
}

#[test]
fn presence_container() {
    let ctx = parse(
        "<container name=\"c\"><presence value=\"enables logging\"/></container>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let container = module.data().next().unwrap();
    assert_eq!(container.presence(), Some("enables logging"));
}

#[test]
fn anyxml_node() {
    let ctx = parse(
        "<anyxml name=\"blob\"><mandatory value=\"true\"/></anyxml>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let node = module.data().next().unwrap();
    assert_eq!(node.kind(), NodeKind::AnyXml);
    assert!(node.is_mandatory());
}

#[test]
fn choice_with_cases() {
    let ctx = parse(
        "<choice name=\"transport\">\
         <case name=\"tcp\"><leaf name=\"port\"><type name=\"uint16\"/></leaf></case>\
         <leaf name=\"unix-socket\"><type name=\"string\"/></leaf>\
         </choice>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let choice = module.data().next().unwrap();
    assert_eq!(choice.kind(), NodeKind::Choice);
    let kinds: Vec<NodeKind> =
        choice.children().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Case, NodeKind::Leaf]);
}

#[test]
fn uses_resolves_grouping() {
    let ctx = parse(
        "<grouping name=\"endpoint\">\
         <leaf name=\"address\"><type name=\"string\"/></leaf>\
         </grouping>\
         <container name=\"server\"><uses name=\"endpoint\"/></container>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let grouping = module
        .data()
        .find(|n| n.kind() == NodeKind::Grouping)
        .unwrap();
    let server = module
        .data()
        .find(|n| n.kind() == NodeKind::Container)
        .unwrap();
    let uses = server.children().next().unwrap();
    assert_eq!(uses.kind(), NodeKind::Uses);
    assert_eq!(uses.uses_grouping().unwrap(), grouping);
}

#[test]
fn uses_deferred_inside_grouping() {
    let ctx = parse(
        "<grouping name=\"a\"><leaf name=\"l\"><type name=\"string\"/></leaf></grouping>\
         <grouping name=\"b\"><uses name=\"a\"/></grouping>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let b = module.data().nth(1).unwrap();
    let uses = b.children().next().unwrap();
    // Binding inside a grouping is deferred until expansion.
    assert!(uses.uses_grouping().is_none());
}

#[test]
fn uses_unknown_grouping_fails() {
    let code =
        parse_err("<container name=\"c\"><uses name=\"nope\"/></container>");
    assert_eq!(code, ErrorCode::UnknownGrouping);
}

#[test]
fn duplicate_module_registration() {
    let mut ctx = Context::new();
    let body = module_yin("m", "<leaf name=\"x\"><type name=\"string\"/></leaf>");
    ctx.parse_module_str(&body).unwrap();

    let err = ctx.parse_module_str(&body).unwrap_err();
    assert_eq!(err.errcode, ErrorCode::DuplicateModule);
    // The context state is identical to the state after the first load.
    assert_eq!(ctx.module_names(), vec!["m"]);
    assert_eq!(ctx.last_error().unwrap().errcode, ErrorCode::DuplicateModule);

    // A different revision of the same name is fine.
    ctx.parse_module_str(&module_yin(
        "m",
        "<revision date=\"2015-07-03\"/><leaf name=\"x\"><type name=\"string\"/></leaf>",
    ))
    .unwrap();
    assert_eq!(ctx.module_names(), vec!["m", "m"]);
}

#[test]
fn self_import_fails() {
    let code = parse_err(
        "<import module=\"m\"><prefix value=\"me\"/></import>",
    );
    assert_eq!(code, ErrorCode::InvalidArgument);
}

#[test]
fn unknown_statement_fails() {
    let code = parse_err("<rpc name=\"r\"/>");
    assert_eq!(code, ErrorCode::UnknownStatement);
}

#[test]
fn foreign_namespace_statement_is_skipped() {
    let ctx = parse(
        "<x:annotation xmlns:x=\"urn:ext\"/>\
         <leaf name=\"l\"><type name=\"string\"/></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    assert_eq!(module.data().count(), 1);
}

#[test]
fn missing_mandatory_statements() {
    // Leaf without a type.
    assert_eq!(
        parse_err("<leaf name=\"l\"/>"),
        ErrorCode::MissingStatement
    );
    // Module without a namespace.
    let mut ctx = Context::new();
    let err = ctx
        .parse_module_str(
            "<module name=\"m\" xmlns=\"urn:ietf:params:xml:ns:yang:yin:1\">\
             <prefix value=\"m\"/></module>",
        )
        .unwrap_err();
    assert_eq!(err.errcode, ErrorCode::MissingStatement);
    // Leaf without a name.
    assert_eq!(
        parse_err("<leaf><type name=\"string\"/></leaf>"),
        ErrorCode::MissingArgument
    );
}

#[test]
fn duplicate_singleton_statement_fails() {
    let code = parse_err(
        "<description><text>a</text></description>\
         <description><text>b</text></description>",
    );
    assert_eq!(code, ErrorCode::TooManyStatements);
}

#[test]
fn invalid_yang_version_fails() {
    let code = parse_err("<yang-version value=\"1.1\"/>");
    assert_eq!(code, ErrorCode::InvalidArgument);
}

#[test]
fn duplicate_sibling_names_fail() {
    let code = parse_err(
        "<leaf name=\"x\"><type name=\"string\"/></leaf>\
         <container name=\"x\"/>",
    );
    assert_eq!(code, ErrorCode::InvalidArgument);
}

#[test]
fn features() {
    let mut ctx = Context::new();
    ctx.parse_module_str(&module_yin(
        "m",
        "<feature name=\"compression\"/>\
         <feature name=\"encryption\"><status value=\"deprecated\"/></feature>",
    ))
    .unwrap();

    let module = ctx.get_module("m", None).unwrap();
    let (names, states) = module.features_list();
    assert_eq!(names, vec!["compression", "encryption"]);
    assert_eq!(states, vec![false, false]);

    ctx.feature_enable("m", "compression").unwrap();
    let module = ctx.get_module("m", None).unwrap();
    let (_, states) = module.features_list();
    assert_eq!(states, vec![true, false]);

    ctx.feature_enable("m", "*").unwrap();
    let module = ctx.get_module("m", None).unwrap();
    let (_, states) = module.features_list();
    assert_eq!(states, vec![true, true]);

    ctx.feature_disable("m", "encryption").unwrap();
    let module = ctx.get_module("m", None).unwrap();
    let (_, states) = module.features_list();
    assert_eq!(states, vec![true, false]);

    assert!(ctx.feature_enable("m", "nope").is_err());
}

#[test]
fn union_payload_is_recorded_raw() {
    let ctx = parse(
        "<leaf name=\"l\"><type name=\"union\">\
         <type name=\"uint8\"/><type name=\"string\"/>\
         </type></leaf>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let leaf = module.data().next().unwrap();
    // Deep union parsing is deferred; only the base kind is resolved.
    assert_eq!(leaf.leaf_type().unwrap().base_kind(), TypeKind::Union);
}

#[test]
fn schema_iterators() {
    let ctx = parse(
        "<container name=\"a\">\
         <container name=\"b\">\
         <leaf name=\"c\"><type name=\"string\"/></leaf>\
         </container>\
         <leaf name=\"d\"><type name=\"string\"/></leaf>\
         </container>",
    );
    let module = ctx.get_module("m", None).unwrap();
    let names: Vec<&str> =
        module.traverse().map(|snode| snode.name()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);

    let c = module
        .traverse()
        .find(|snode| snode.name() == "c")
        .unwrap();
    let ancestors: Vec<&str> =
        c.ancestors().map(|snode| snode.name()).collect();
    assert_eq!(ancestors, vec!["b", "a"]);

    let b = module.data().next().unwrap().children().next().unwrap();
    let siblings: Vec<&str> =
        b.siblings().map(|snode| snode.name()).collect();
    assert_eq!(siblings, vec!["d"]);
}
