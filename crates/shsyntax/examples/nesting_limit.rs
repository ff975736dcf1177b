//! Nesting limit example
//!
//! Shows how deeply nested input is cut off at the configured ceiling and
//! reported as a single error node.
//! Run with: cargo run --example nesting_limit

use shsyntax::{DEPTH_EXCEEDED_MESSAGE, ParseLimits, Parser, ParserOptions};

fn main() -> anyhow::Result<()> {
    let depth = 50;
    let script = format!("{}echo deep{}\necho after", "( ".repeat(depth), " )".repeat(depth));

    println!("=== Default limit ===\n");
    let parse = Parser::new(&script).parse()?;
    println!(
        "errors: {}, peak depth: {}",
        parse.diagnostics().len(),
        parse.stats().peak_depth
    );

    println!("\n=== Limit of 10 ===\n");
    let options = ParserOptions::new().limits(ParseLimits::new().max_depth(10));
    let parse = Parser::with_options(&script, options).parse()?;
    for diagnostic in parse.diagnostics() {
        let marker = if diagnostic.message == DEPTH_EXCEEDED_MESSAGE {
            " (nesting limit)"
        } else {
            ""
        };
        println!("{diagnostic}{marker}");
    }
    println!(
        "statements: {}, depth trips: {}",
        parse.tree().root().child_nodes().count(),
        parse.stats().depth_trips
    );

    Ok(())
}
