//! Error recovery: each malformed region yields one error node, and the
//! statements around it parse as if it were not there.

use pretty_assertions::assert_eq;
use shsyntax::{NodeKind, Parse};

fn parse(input: &str) -> Parse {
    shsyntax::parse(input).unwrap()
}

fn messages(parse: &Parse) -> Vec<String> {
    parse.diagnostics().into_iter().map(|d| d.message).collect()
}

fn statement_texts(parse: &Parse) -> Vec<String> {
    parse
        .tree()
        .root()
        .child_nodes()
        .map(|n| n.text())
        .collect()
}

#[test]
fn stray_closer_between_statements() {
    let parse = parse("echo a\n) b c\necho d");
    assert_eq!(messages(&parse), vec!["unexpected ')'"]);
    assert_eq!(statement_texts(&parse), vec!["echo a", ") b c", "echo d"]);
    assert_eq!(parse.tree().root().child_nodes().nth(1).unwrap().kind(), NodeKind::Error);
}

#[test]
fn unclosed_compound_commands() {
    for (input, expected) in [
        ("if true; then echo", "expected 'fi'"),
        ("while true; do echo", "expected 'done'"),
        ("for x in a b; do echo", "expected 'done'"),
        ("case x in a) echo ;;", "expected 'esac'"),
        ("( echo", "expected ')'"),
        ("{ echo", "expected '}'"),
        ("[[ -n x", "expected ']]'"),
        ("(( 1 + 2", "expected '))'"),
    ] {
        let parse = parse(input);
        assert_eq!(messages(&parse), vec![expected], "{input}");
        assert_eq!(parse.tree().root().text(), input);
    }
}

#[test]
fn error_inside_group_does_not_leak() {
    let parse = parse("{ echo a; ) ; echo b; }\necho c");
    assert_eq!(messages(&parse), vec!["unexpected ')'"]);
    let kinds: Vec<NodeKind> = parse.tree().root().child_nodes().map(|n| n.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Group, NodeKind::SimpleCommand]);
}

#[test]
fn unclosed_substitution_runs_to_end_of_input() {
    let input = "echo $(date\necho next";
    let parse = parse(input);
    assert_eq!(messages(&parse), vec!["expected ')'"]);
    assert_eq!(parse.tree().root().child_nodes().count(), 1);
    assert_eq!(parse.tree().root().text(), input);
}

#[test]
fn missing_pieces_are_zero_width() {
    let parse = parse("a &&\nif x; b; fi");
    let diagnostics = parse.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "expected 'then'");
    assert!(diagnostics[0].span.is_empty());
}

#[test]
fn several_independent_errors() {
    let parse = parse("echo a | ;\nfi\nexport b=(1 2; echo ok\necho ${x");
    assert_eq!(
        messages(&parse),
        vec![
            "expected a command after '|'",
            "unexpected 'fi'",
            "expected ')' to close the array literal",
            "expected '}'",
        ]
    );
}

#[test]
fn garbage_after_compound_is_one_error() {
    let parse = parse("(a) b c; echo d");
    assert_eq!(messages(&parse), vec!["expected end of command"]);
    let last = parse.tree().root().child_nodes().last().unwrap();
    assert_eq!(last.text(), "echo d");
}

#[test]
fn error_nodes_carry_their_region() {
    let parse = parse("echo ok\nesac 1 2\n");
    let errors = parse.tree().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text(), "esac 1 2");
    assert_eq!(errors[0].error_message(), Some("unexpected 'esac'"));
    assert_eq!(errors[0].span().start.line, 2);
}

#[test]
fn marker_lifecycle_stays_balanced_under_recovery() {
    for input in [
        "if (( ; then",
        "case in esac",
        "for ((;;) do",
        "f() ",
        "echo ${a[",
        "x=( [1 ",
        "`echo $(`",
    ] {
        let parse = parse(input);
        assert!(parse.stats().markers.balanced(), "{input}");
        assert_eq!(parse.tree().root().text(), input);
    }
}
