//! Property-based tests for the parser
//!
//! Uses proptest to generate random inputs and verify the parser always
//! returns a complete, lossless tree with balanced markers.

use proptest::prelude::*;
use shsyntax::{NodeKind, NodeOrToken, Parse};

fn parse(input: &str) -> Parse {
    shsyntax::parse(input).unwrap()
}

/// Strategies for generating bash-like input
mod strategies {
    use proptest::prelude::*;

    /// Generate arbitrary strings (may be invalid bash)
    pub fn arbitrary_string() -> impl Strategy<Value = String> {
        prop::string::string_regex(".{0,100}").unwrap()
    }

    /// Strings made mostly of shell punctuation
    pub fn punctuation_soup() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z$(){}\\[\\]<>|&;=\"'`\\\\# \n+-]{0,80}").unwrap()
    }

    /// Generate valid bash identifiers
    pub fn identifier() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,20}").unwrap()
    }

    /// Generate simple words (alphanumeric + some special chars)
    pub fn word() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9_./-]{1,30}").unwrap()
    }

    /// Generate a simple echo command
    pub fn echo_command() -> impl Strategy<Value = String> {
        word().prop_map(|w| format!("echo {}", w))
    }

    /// Generate a variable assignment
    pub fn assignment() -> impl Strategy<Value = String> {
        (identifier(), word()).prop_map(|(name, value)| format!("{}={}", name, value))
    }

    /// Generate the items of an export: bare names, scalars and arrays
    pub fn export_items() -> impl Strategy<Value = Vec<String>> {
        let item = prop_oneof![
            identifier(),
            assignment(),
            (identifier(), prop::collection::vec(word(), 0..4))
                .prop_map(|(name, items)| format!("{}=({})", name, items.join(" "))),
        ];
        prop::collection::vec(item, 1..4)
    }

    /// Generate an export command
    pub fn export() -> impl Strategy<Value = String> {
        export_items().prop_map(|items| format!("export {}", items.join(" ")))
    }

    /// Generate a simple bash script (one or more commands)
    pub fn simple_script() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                echo_command(),
                assignment(),
                export(),
                Just("true".to_string()),
                Just("false".to_string()),
            ],
            1..5,
        )
        .prop_map(|commands| commands.join("\n"))
    }

    /// Balanced nesting of subshells, groups and substitutions
    pub fn nested(depth: u32) -> impl Strategy<Value = String> {
        let leaf = echo_command();
        leaf.prop_recursive(depth, 64, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|s| format!("( {} )", s)),
                inner.clone().prop_map(|s| format!("{{ {}; }}", s)),
                inner.clone().prop_map(|s| format!("echo $( {} )", s)),
                (inner.clone(), inner).prop_map(|(a, b)| format!("{} && {}", a, b)),
            ]
        })
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Parser never fails and loses no input
    #[test]
    fn lossless_on_arbitrary_input(input in strategies::arbitrary_string()) {
        let parse = parse(&input);
        prop_assert_eq!(parse.tree().root().text(), input);
    }

    /// Tokens tile the input with contiguous spans
    #[test]
    fn tokens_tile_input(input in strategies::punctuation_soup()) {
        let parse = parse(&input);
        let tokens = parse.tree().tokens();
        let mut offset = 0;
        for token in &tokens {
            prop_assert_eq!(token.span.start.offset, offset);
            prop_assert!(!token.text.is_empty());
            offset = token.span.end.offset;
        }
        prop_assert_eq!(offset, input.len());
    }

    /// Every marker is closed exactly once, whatever the input
    #[test]
    fn markers_balanced(input in strategies::punctuation_soup()) {
        let parse = parse(&input);
        prop_assert!(parse.stats().markers.balanced());
        prop_assert_eq!(parse.tree().root().kind(), NodeKind::File);
    }

    /// Error nodes always carry a message
    #[test]
    fn errors_have_messages(input in strategies::punctuation_soup()) {
        let parse = parse(&input);
        for error in parse.tree().errors() {
            prop_assert!(error.error_message().is_some_and(|m| !m.is_empty()));
        }
    }

    /// Children tile their parent: contiguous, no gaps, and the root covers the input
    #[test]
    fn children_tile_parent(input in strategies::punctuation_soup()) {
        let parse = parse(&input);
        prop_assert_eq!(parse.tree().root().span().range(), 0..input.len());
        for node in parse.tree().root().descendants() {
            let spans: Vec<_> = node
                .children()
                .map(|c| match c {
                    NodeOrToken::Node(n) => n.span(),
                    NodeOrToken::Token(t) => t.span,
                })
                .collect();
            let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
                continue;
            };
            prop_assert_eq!(first.start.offset, node.span().start.offset);
            prop_assert_eq!(last.end.offset, node.span().end.offset);
            for pair in spans.windows(2) {
                prop_assert_eq!(pair[0].end.offset, pair[1].start.offset);
            }
        }
    }

    /// Node spans nest inside their parent's span
    #[test]
    fn spans_nest(input in strategies::punctuation_soup()) {
        let parse = parse(&input);
        for node in parse.tree().root().descendants() {
            if let Some(parent) = node.parent() {
                prop_assert!(parent.span().start.offset <= node.span().start.offset);
                prop_assert!(node.span().end.offset <= parent.span().end.offset);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Generated valid scripts parse without errors
    #[test]
    fn valid_scripts_parse_cleanly(script in strategies::simple_script()) {
        let parse = parse(&script);
        prop_assert!(parse.diagnostics().is_empty(), "{:?}", parse.diagnostics());
        prop_assert_eq!(parse.tree().root().text(), script);
    }

    /// Balanced nesting below the limit never trips it
    #[test]
    fn nesting_below_limit_is_clean(script in strategies::nested(8)) {
        let parse = parse(&script);
        prop_assert!(parse.diagnostics().is_empty(), "{:?}", parse.diagnostics());
        prop_assert_eq!(parse.stats().depth_trips, 0);
    }

    /// Every item of a generated export is one VarDef
    #[test]
    fn export_items_are_definitions(items in strategies::export_items()) {
        let script = format!("export {}", items.join(" "));
        let parse = parse(&script);
        prop_assert!(parse.diagnostics().is_empty(), "{:?}", parse.diagnostics());
        let defs: Vec<String> = parse.tree().var_defs().iter().map(|d| d.text()).collect();
        prop_assert_eq!(defs, items);
    }
}
