use yangkit::context::Context;
use yangkit::xml::XmlPrinterFlags;

static MODULE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<module name="demo" xmlns="urn:ietf:params:xml:ns:yang:yin:1">
  <namespace uri="urn:example:demo"/>
  <prefix value="dm"/>
  <revision date="2015-07-03"/>
  <leaf name="hostname"><type name="string"/></leaf>
</module>"#;

fn main() {
    env_logger::init();

    // Initialize context and load a module.
    let mut ctx = Context::new();
    ctx.parse_module_str(MODULE)
        .expect("Failed to parse module");

    // Print the ietf-yang-library view of the context.
    let info = ctx.info().expect("Failed to build yang-library data");
    let root = info.root().unwrap();
    let out = info
        .print_string(root.id(), XmlPrinterFlags::FORMAT)
        .expect("Failed to print yang-library data");
    println!("{}", out);
}
