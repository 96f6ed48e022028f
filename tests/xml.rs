use yangkit::context::Context;
use yangkit::iter::NodeIterable;
use yangkit::xml::{XmlPrinterFlags, XmlTree};
use yangkit::ErrorCode;

fn parse(data: &str) -> (Context, XmlTree) {
    let ctx = Context::new();
    let tree = XmlTree::parse(&ctx, data).expect("Failed to parse XML");
    (ctx, tree)
}

#[test]
fn xml_basic_structure() {
    let (_ctx, tree) = parse(
        "<top><first/><second>value</second><third attr=\"x\"/></top>",
    );
    let root = tree.root().unwrap();
    assert_eq!(root.name(), "top");

    let names: Vec<&str> =
        root.children().map(|child| child.name()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);

    let second = root.children().nth(1).unwrap();
    assert_eq!(second.content(), Some("value"));
    let third = root.children().nth(2).unwrap();
    assert_eq!(third.attr_value("attr"), Some("x"));
}

#[test]
fn xml_half_ring_invariants() {
    let (_ctx, tree) = parse("<top><a/><b/><c/><d/></top>");
    let root = tree.root().unwrap();
    let children: Vec<_> = root.children().collect();
    assert_eq!(children.len(), 4);

    // The first child's prev points at the last child.
    let first = &children[0];
    let last = &children[children.len() - 1];
    assert_eq!(first.prev_link().unwrap().name(), last.name());
    // Walking next from the first reaches the last in N-1 steps.
    let mut steps = 0;
    let mut cursor = first.clone();
    while let Some(next) = cursor.next_sibling() {
        cursor = next;
        steps += 1;
    }
    assert_eq!(steps, children.len() - 1);
    assert_eq!(cursor.name(), "d");
    // Interior back-links.
    assert_eq!(children[2].prev_link().unwrap().name(), "b");
}

#[test]
fn xml_unlink_restores_ring() {
    let ctx = Context::new();
    let mut tree =
        XmlTree::parse(&ctx, "<top><a/><b/><c/></top>").unwrap();
    let root = tree.root().unwrap().id();
    let b = tree.root().unwrap().children().nth(1).unwrap().id();

    tree.unlink(b);
    let root = tree.element(root);
    let names: Vec<&str> = root.children().map(|c| c.name()).collect();
    assert_eq!(names, vec!["a", "c"]);
    let first = root.first_child().unwrap();
    assert_eq!(first.prev_link().unwrap().name(), "c");
    assert!(first.next_sibling().unwrap().next_sibling().is_none());

    // Unlinking the head moves the back-link onto the new first child.
    let ctx = Context::new();
    let mut tree =
        XmlTree::parse(&ctx, "<top><a/><b/><c/></top>").unwrap();
    let a = tree.root().unwrap().first_child().unwrap().id();
    tree.unlink(a);
    let first = tree.root().unwrap().first_child().unwrap();
    assert_eq!(first.name(), "b");
    assert_eq!(first.prev_link().unwrap().name(), "c");
}

#[test]
fn xml_entities_and_cdata() {
    let (_ctx, tree) = parse(
        "<e a=\"1 &lt; 2 &amp; 3 &gt; 2\">&quot;x&apos; &#65;&#x42;<![CDATA[<raw&>]]></e>",
    );
    let root = tree.root().unwrap();
    assert_eq!(root.attr_value("a"), Some("1 < 2 & 3 > 2"));
    assert_eq!(root.content(), Some("\"x' AB<raw&>"));
}

#[test]
fn xml_unknown_entity_fails() {
    let ctx = Context::new();
    assert!(XmlTree::parse(&ctx, "<e>&nope;</e>").is_err());
    assert_eq!(ctx.last_error().unwrap().errcode, ErrorCode::Xml);
}

#[test]
fn xml_comments_are_discarded() {
    let (_ctx, tree) =
        parse("<top><!-- note --><a/><!-- trailing --></top>");
    let root = tree.root().unwrap();
    assert_eq!(root.children().count(), 1);
    assert!(!root.is_mixed());
}

#[test]
fn xml_mixed_content_flag() {
    let (_ctx, tree) = parse("<top>text <a/> more</top>");
    let root = tree.root().unwrap();
    assert!(root.is_mixed());
    assert_eq!(root.children().count(), 1);

    let (_ctx, tree) = parse("<top>  <a/>  </top>");
    let root = tree.root().unwrap();
    // Whitespace around child elements is not mixed content.
    assert!(!root.is_mixed());
    assert_eq!(root.content(), None);
}

#[test]
fn xml_namespace_resolution() {
    let (_ctx, tree) = parse(
        "<a xmlns=\"urn:def\" xmlns:p=\"urn:p\"><p:b p:attr=\"v\"/><c xmlns=\"urn:inner\"><d/></c></a>",
    );
    let root = tree.root().unwrap();
    assert_eq!(root.namespace(), Some("urn:def"));

    let b = root.first_child().unwrap();
    assert_eq!(b.name(), "b");
    assert_eq!(b.namespace(), Some("urn:p"));
    assert_eq!(b.prefix(), Some("p"));
    let attr = b.attributes().find(|a| !a.is_namespace_decl()).unwrap();
    assert_eq!(attr.namespace(), Some("urn:p"));

    // Nearest ancestor declaration wins.
    let c = b.next_sibling().unwrap();
    assert_eq!(c.namespace(), Some("urn:inner"));
    let d = c.first_child().unwrap();
    assert_eq!(d.namespace(), Some("urn:inner"));
}

#[test]
fn xml_unresolvable_prefix_fails() {
    let ctx = Context::new();
    assert!(XmlTree::parse(&ctx, "<p:a xmlns=\"urn:x\"/>").is_err());
    assert_eq!(
        ctx.last_error().unwrap().errcode,
        ErrorCode::UnresolvablePrefix
    );
}

#[test]
fn xml_malformed_documents_fail() {
    let ctx = Context::new();
    assert!(XmlTree::parse(&ctx, "").is_err());
    assert!(XmlTree::parse(&ctx, "   ").is_err());
    assert!(XmlTree::parse(&ctx, "<a><b></a>").is_err());
    assert!(XmlTree::parse(&ctx, "<a>").is_err());
    assert!(XmlTree::parse(&ctx, "<a none></a>").is_err());
    assert!(XmlTree::parse(&ctx, "<a/><b/>").is_err());
}

#[test]
fn xml_source_lines() {
    let (_ctx, tree) = parse("<top>\n  <a/>\n  <b/>\n</top>");
    let root = tree.root().unwrap();
    assert_eq!(root.line(), 1);
    let lines: Vec<u64> = root.children().map(|c| c.line()).collect();
    assert_eq!(lines, vec![2, 3]);
}

#[test]
fn xml_dump_round_trip() {
    let input = "<?xml version=\"1.0\"?>\n<a xmlns=\"urn:a\" xmlns:p=\"urn:p\">\n  <b attr=\"1 &lt; 2\">text &amp; more</b>\n  <p:c/>\n  <d><e>x</e></d>\n</a>";
    let ctx = Context::new();
    let tree = XmlTree::parse(&ctx, input).unwrap();
    let first = tree
        .print_string(tree.root().unwrap().id(), XmlPrinterFlags::empty())
        .unwrap();

    let tree2 = XmlTree::parse(&ctx, &first).unwrap();
    let second = tree2
        .print_string(tree2.root().unwrap().id(), XmlPrinterFlags::empty())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn xml_dump_options() {
    let (_ctx, tree) = parse("<a x=\"1\"><b/></a>");
    let root = tree.root().unwrap().id();

    let open = tree.print_string(root, XmlPrinterFlags::OPEN).unwrap();
    assert_eq!(open, "<a x=\"1\">\n");
    let close = tree.print_string(root, XmlPrinterFlags::CLOSE).unwrap();
    assert_eq!(close, "</a>\n");
    let attrs = tree.print_string(root, XmlPrinterFlags::ATTRS).unwrap();
    assert_eq!(attrs, " x=\"1\"");

    let formatted =
        tree.print_string(root, XmlPrinterFlags::FORMAT).unwrap();
    assert_eq!(formatted, "<a x=\"1\">\n  <b/>\n</a>");
}

#[test]
fn xml_dump_skips_in_scope_declarations() {
    // The inner declaration repeats the outer one and must not be
    // re-emitted; the changed declaration must be kept.
    let (_ctx, tree) = parse(
        "<a xmlns=\"urn:a\"><b xmlns=\"urn:a\"/><c xmlns=\"urn:c\"/></a>",
    );
    let out = tree
        .print_string(tree.root().unwrap().id(), XmlPrinterFlags::empty())
        .unwrap();
    assert_eq!(
        out,
        "<a xmlns=\"urn:a\"><b/><c xmlns=\"urn:c\"/></a>"
    );
}

#[test]
fn xml_print_callback_target() {
    let (_ctx, tree) = parse("<a><b/></a>");
    let mut collected = Vec::new();
    tree.print_clb(
        tree.root().unwrap().id(),
        XmlPrinterFlags::empty(),
        |chunk| collected.extend_from_slice(chunk),
    )
    .unwrap();
    assert_eq!(String::from_utf8(collected).unwrap(), "<a><b/></a>");
}

#[test]
fn xml_traverse_depth_first() {
    let (_ctx, tree) = parse("<a><b><c/></b><d/></a>");
    let root = tree.root().unwrap();
    let names: Vec<&str> = root.traverse().map(|e| e.name()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
}
