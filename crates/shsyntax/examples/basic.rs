//! Basic shsyntax usage example
//!
//! Run with: cargo run --example basic

use shsyntax::NodeKind;

fn main() -> anyhow::Result<()> {
    let script = r#"
export PATH="/usr/local/bin:$PATH" LANG=C
declare -a ports=(80 [5]=443 8080)
if [[ -n "$HOME" ]]; then
    echo "home is $HOME"
fi
"#;

    let parse = shsyntax::parse(script)?;
    println!("{} statements", parse.tree().root().child_nodes().count());

    // Every variable definition, whatever builtin introduced it
    for def in parse.tree().var_defs() {
        println!("definition: {}", def.text());
    }

    // Array entries, indexed or not
    for node in parse.tree().root().descendants() {
        if node.kind() == NodeKind::ArrayLiteral {
            let entries: Vec<String> = node.child_nodes().map(|n| n.text()).collect();
            println!("array entries: {entries:?}");
        }
    }

    // Malformed input still yields a tree, with error nodes where it broke
    let broken = shsyntax::parse("export a=(1 2 3\necho still parsed")?;
    for diagnostic in broken.diagnostics() {
        println!("error: {diagnostic}");
    }
    print!("{}", broken.tree().debug_dump());

    Ok(())
}
