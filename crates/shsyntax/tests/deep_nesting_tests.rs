//! Deeply nested input must be bounded by the nesting limit, never by the
//! native stack.
//!
//! Parses run on a thread with a large stack: the limit bounds how many
//! guarded levels are entered, but each level still costs several frames
//! (more in debug builds).

use shsyntax::{DEPTH_EXCEEDED_MESSAGE, Parse, Parser, ParserOptions};

const STACK_SIZE: usize = 256 * 1024 * 1024;

fn parse_with(input: String, options: ParserOptions) -> Parse {
    std::thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(move || Parser::with_options(&input, options).parse().unwrap())
        .unwrap()
        .join()
        .unwrap()
}

fn parse(input: String) -> Parse {
    parse_with(input, ParserOptions::default())
}

fn depth_errors(parse: &Parse) -> usize {
    parse
        .diagnostics()
        .iter()
        .filter(|d| d.message == DEPTH_EXCEEDED_MESSAGE)
        .count()
}

fn nested_subshells(depth: usize) -> String {
    format!("{}a{}", "( ".repeat(depth), " )".repeat(depth))
}

#[test]
fn two_thousand_spaced_subshells_yield_one_depth_error() {
    let input = nested_subshells(2000);
    let parse = parse(input.clone());

    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(depth_errors(&parse), 1);
    assert_eq!(parse.stats().depth_trips, 1);
    assert_eq!(parse.tree().root().text(), input);
    assert!(parse.stats().markers.balanced());
}

#[test]
fn two_thousand_unspaced_parens_yield_one_depth_error() {
    let input = format!("{}{}", "(".repeat(2000), ")".repeat(2000));
    let parse = parse(input.clone());

    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(depth_errors(&parse), 1);
    assert_eq!(parse.tree().root().text(), input);
    assert!(parse.stats().markers.balanced());
}

#[test]
fn statement_after_deep_region_still_parses() {
    let input = format!("{}\necho after\n", nested_subshells(2000));
    let parse = parse(input);

    let statements: Vec<String> = parse
        .tree()
        .root()
        .child_nodes()
        .map(|n| n.text())
        .collect();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[1], "echo after");
}

#[test]
fn nesting_below_the_limit_is_clean() {
    let parse = parse(nested_subshells(400));

    assert!(!parse.has_errors());
    assert_eq!(parse.stats().depth_trips, 0);
    assert_eq!(parse.stats().peak_depth, 400);
}

#[test]
fn raised_limit_admits_deeper_nesting() {
    let options = ParserOptions::new().max_depth(2500);
    let parse = parse_with(nested_subshells(2000), options);

    assert!(!parse.has_errors());
    assert_eq!(parse.stats().peak_depth, 2000);
}

#[test]
fn nested_command_substitutions() {
    let input = format!("echo {}x{}", "$(".repeat(2000), ")".repeat(2000));
    let parse = parse(input.clone());

    assert_eq!(depth_errors(&parse), 1);
    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(parse.tree().root().text(), input);
}

#[test]
fn later_trips_use_a_distinct_message() {
    let input = format!("{}\n{}", nested_subshells(50), nested_subshells(50));
    let options = ParserOptions::new().max_depth(10);
    let parse = parse_with(input, options);

    let messages: Vec<String> = parse.diagnostics().into_iter().map(|d| d.message).collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], DEPTH_EXCEEDED_MESSAGE);
    assert_ne!(messages[1], DEPTH_EXCEEDED_MESSAGE);
    assert_eq!(parse.stats().depth_trips, 2);
}

#[test]
fn long_flat_lists_take_no_depth() {
    let input = vec!["a"; 5000].join(" && ");
    let parse = parse(input);

    assert!(!parse.has_errors());
    assert_eq!(parse.stats().peak_depth, 0);
}

#[test]
fn docker_entrypoint_does_not_trip_the_limit() {
    let input = include_str!("fixtures/docker-entrypoint.sh").to_string();
    let parse = parse(input.clone());

    assert_eq!(depth_errors(&parse), 0);
    assert_eq!(parse.stats().depth_trips, 0);
    assert_eq!(parse.tree().root().text(), input);
}

#[test]
fn nested_subscripts() {
    let input = format!("echo $(( {}1{} ))", "a[".repeat(2000), "]".repeat(2000));
    let parse = parse(input.clone());

    assert_eq!(depth_errors(&parse), 1);
    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(parse.tree().root().text(), input);
    assert!(parse.stats().markers.balanced());
}

#[test]
fn nested_function_definitions() {
    let input = format!("{}x{}", "f() { ".repeat(2000), "; }".repeat(2000));
    let parse = parse(input.clone());

    assert_eq!(depth_errors(&parse), 1);
    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(parse.tree().root().text(), input);
}

#[test]
fn statement_after_deep_functions_still_parses() {
    let input = format!("{}x{}\necho after", "f() { ".repeat(600), "; }".repeat(600));
    let parse = parse(input);

    assert_eq!(parse.diagnostics().len(), 1);
    let last = parse.tree().root().child_nodes().last().unwrap();
    assert_eq!(last.text(), "echo after");
}

#[test]
fn nested_case_commands() {
    let input = format!("{}x{}", "case a in b) ".repeat(2000), " ;; esac".repeat(2000));
    let parse = parse(input.clone());

    assert_eq!(depth_errors(&parse), 1);
    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(parse.tree().root().text(), input);
    assert!(parse.stats().markers.balanced());
}
