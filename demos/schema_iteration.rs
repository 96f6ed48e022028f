use yangkit::context::Context;

static MODULE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<module name="demo" xmlns="urn:ietf:params:xml:ns:yang:yin:1">
  <namespace uri="urn:example:demo"/>
  <prefix value="dm"/>
  <container name="system">
    <leaf name="hostname"><type name="string"/></leaf>
    <list name="user">
      <key value="name"/>
      <leaf name="name"><type name="string"/></leaf>
      <leaf name="uid"><type name="uint32"/></leaf>
    </list>
  </container>
</module>"#;

fn main() {
    // Initialize context.
    let mut ctx = Context::new();
    let module = ctx
        .parse_module_str(MODULE)
        .expect("Failed to parse module");

    // Iterate over all schema nodes of the module and print their names
    // and flags.
    println!("Data (DFS iteration):");
    for snode in module.traverse() {
        println!(
            "  {} ({:?}, config={})",
            snode.name(),
            snode.kind(),
            snode.is_config()
        );
    }
}
