//! Compound commands
//!
//! Every compound command nests statement lists, so each one is entered
//! through the recursion guard. A compound whose closer never appears becomes
//! one error node covering everything it consumed.

use super::command::trailing_redirects;
use super::word::{self, at_word_start};
use super::{Stop, arith, command, produced, recovery, statement_list};
use crate::parser::tokens::TokenKind;
use crate::parser::{Marker, NodeKind, ParseResult, Parser, RuleFailure};

const CASE_ITEM_END: [Stop; 4] = [
    Stop::Token(TokenKind::DoubleSemicolon),
    Stop::Token(TokenKind::SemiAmp),
    Stop::Token(TokenKind::DoubleSemiAmp),
    Stop::Keyword("esac"),
];

/// Consume `closer`, then trailing redirects, and complete `m` as `kind`.
fn finish(p: &mut Parser, m: Marker, closer: Stop, kind: NodeKind) -> ParseResult {
    let (found, text) = match closer {
        Stop::Token(token) => (p.at(token), closer_text(token)),
        Stop::Keyword(keyword) => (p.at_keyword(keyword), keyword),
    };
    if !found {
        return Err(RuleFailure::Recovered(
            p.error(m, &format!("expected '{text}'")),
        ));
    }
    p.bump();
    trailing_redirects(p);
    Ok(p.complete(m, kind))
}

fn closer_text(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::RightParen => ")",
        TokenKind::RightCurly => "}",
        TokenKind::DoubleRightParen => "))",
        TokenKind::RightDoubleBracket => "]]",
        _ => "closer",
    }
}

/// Statements until one of `stops` (or an enclosing closer).
fn body(p: &mut Parser, stops: &[Stop]) {
    p.with_stops(stops, statement_list);
}

/// `( list )`
pub(super) fn subshell(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        body(p, &[Stop::Token(TokenKind::RightParen)]);
        finish(p, m, Stop::Token(TokenKind::RightParen), NodeKind::Subshell)
    })
}

/// `{ list; }`
pub(super) fn group(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        body(p, &[Stop::Token(TokenKind::RightCurly)]);
        finish(p, m, Stop::Token(TokenKind::RightCurly), NodeKind::Group)
    })
}

/// `(( expr ))`
pub(super) fn arith_command(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        arith::body(p, TokenKind::DoubleRightParen);
        finish(
            p,
            m,
            Stop::Token(TokenKind::DoubleRightParen),
            NodeKind::ArithCommand,
        )
    })
}

/// `if list; then list; [elif list; then list;]... [else list;] fi`
pub(super) fn if_command(p: &mut Parser) -> ParseResult {
    const CLAUSE_END: [Stop; 4] = [
        Stop::Keyword("then"),
        Stop::Keyword("elif"),
        Stop::Keyword("else"),
        Stop::Keyword("fi"),
    ];
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        body(p, &CLAUSE_END);
        p.expect_keyword("then");
        body(p, &CLAUSE_END);
        while p.at_keyword("elif") {
            p.bump();
            body(p, &CLAUSE_END);
            p.expect_keyword("then");
            body(p, &CLAUSE_END);
        }
        if p.at_keyword("else") {
            p.bump();
            body(p, &CLAUSE_END);
        }
        finish(p, m, Stop::Keyword("fi"), NodeKind::IfCommand)
    })
}

/// `do list done`
fn do_group(p: &mut Parser, m: Marker, kind: NodeKind) -> ParseResult {
    const LOOP_END: [Stop; 2] = [Stop::Keyword("do"), Stop::Keyword("done")];
    p.skip_newlines();
    if p.at(TokenKind::Semicolon) {
        p.bump();
        p.skip_newlines();
    }
    p.expect_keyword("do");
    body(p, &LOOP_END);
    finish(p, m, Stop::Keyword("done"), kind)
}

/// `while list; do list; done` and `until ...`
pub(super) fn while_command(p: &mut Parser) -> ParseResult {
    let kind = if p.at_keyword("until") {
        NodeKind::UntilCommand
    } else {
        NodeKind::WhileCommand
    };
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        body(p, &[Stop::Keyword("do"), Stop::Keyword("done")]);
        do_group(p, m, kind)
    })
}

/// `for name [in words]; do list; done`, `for ((a; b; c)); do list; done`, `select ...`
pub(super) fn for_command(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        if p.at(TokenKind::DoubleLeftParen) {
            p.bump();
            for section in 0..3 {
                if !matches!(
                    p.current(),
                    TokenKind::Semicolon | TokenKind::DoubleRightParen
                ) {
                    let _ = arith::expression(p);
                }
                arith::stray_until(p, &[TokenKind::Semicolon, TokenKind::DoubleRightParen]);
                if section < 2 {
                    p.expect(TokenKind::Semicolon, "';'");
                }
            }
            p.expect(TokenKind::DoubleRightParen, "'))'");
            return do_group(p, m, NodeKind::ForCommand);
        }

        if p.at(TokenKind::Word) {
            p.bump();
        } else {
            p.missing("expected a variable name");
        }
        p.skip_newlines();
        if p.at_keyword("in") {
            p.bump();
            while at_word_start(p) {
                let _ = word::word(p);
            }
        }
        do_group(p, m, NodeKind::ForCommand)
    })
}

/// `case word in [(]pattern[|pattern]) list ;; ... esac`
pub(super) fn case_command(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        if produced(word::word(p)).is_none() {
            p.missing("expected a word after 'case'");
        }
        p.skip_newlines();
        p.expect_keyword("in");
        loop {
            p.skip_newlines();
            if p.at_keyword("esac") || p.at(TokenKind::Eof) || p.at_stop() {
                break;
            }
            if produced(case_item(p)).is_none() {
                recovery::error_until_boundary(p, "expected a case pattern");
            }
            if at_item_terminator(p) {
                p.bump();
            }
        }
        finish(p, m, Stop::Keyword("esac"), NodeKind::CaseCommand)
    })
}

fn at_item_terminator(p: &Parser) -> bool {
    matches!(
        p.current(),
        TokenKind::DoubleSemicolon | TokenKind::SemiAmp | TokenKind::DoubleSemiAmp
    )
}

fn case_item(p: &mut Parser) -> ParseResult {
    if !p.at(TokenKind::LeftParen) && !at_word_start(p) {
        return Err(RuleFailure::NotApplicable);
    }
    let m = p.open();
    if p.at(TokenKind::LeftParen) {
        p.bump();
    }
    loop {
        if produced(word::word(p)).is_none() {
            p.missing("expected a pattern");
        }
        if !p.at(TokenKind::Pipe) {
            break;
        }
        p.bump();
    }
    if !p.at(TokenKind::RightParen) {
        while !recovery::at_boundary(p) && !p.at_keyword("esac") {
            p.bump();
        }
        if at_item_terminator(p) {
            p.bump();
        }
        return Err(recovery::recover(p, m, "expected ')' after the case pattern"));
    }
    p.bump();
    body(p, &CASE_ITEM_END);
    if at_item_terminator(p) {
        p.bump();
    }
    Ok(p.complete(m, NodeKind::CaseItem))
}

/// `function name [()] body` or `name () body`
pub(super) fn function_def(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        if p.at_keyword("function") {
            p.bump();
            if p.at(TokenKind::Word) {
                p.bump();
            } else {
                p.missing("expected a function name");
            }
        } else {
            p.bump();
        }
        if p.at(TokenKind::LeftParen) {
            p.bump();
            p.expect(TokenKind::RightParen, "')'");
        }
        p.skip_newlines();
        if produced(command(p)).is_none() {
            p.missing("expected a function body");
        }
        Ok(p.complete(m, NodeKind::FunctionDef))
    })
}

/// `[[ expression ]]`
///
/// The expression is kept flat: words and operators in source order.
pub(super) fn conditional(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.guarded(m, |p, m| {
        p.bump();
        let mut last = TokenKind::LeftDoubleBracket;
        loop {
            let kind = p.current();
            match kind {
                TokenKind::RightDoubleBracket | TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Semicolon
                    if !matches!(last, TokenKind::AndAnd | TokenKind::OrOr) =>
                {
                    break;
                }
                _ if at_word_start(p) => {
                    let _ = word::word(p);
                }
                _ => p.bump(),
            }
            last = kind;
        }
        finish(
            p,
            m,
            Stop::Token(TokenKind::RightDoubleBracket),
            NodeKind::ConditionalCommand,
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::parser::{Node, NodeKind, Parse, Parser};

    fn parse(input: &str) -> Parse {
        Parser::new(input).parse().unwrap()
    }

    fn first(parse: &Parse) -> Node<'_> {
        parse.tree().root().child_nodes().next().unwrap()
    }

    fn messages(input: &str) -> Vec<String> {
        parse(input)
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_subshell_and_group_with_redirect() {
        let parse = parse("( a; b ) > out && { c; } 2>&1");
        let list = first(&parse);
        let kinds: Vec<_> = list.child_nodes().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::Subshell, NodeKind::Group]);
        let subshell = list.child_nodes().next().unwrap();
        assert_eq!(subshell.text(), "( a; b ) > out");
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_if_elif_else() {
        let parse = parse("if a; then b; elif c; then d; else e; fi");
        let cmd = first(&parse);
        assert_eq!(cmd.kind(), NodeKind::IfCommand);
        assert_eq!(cmd.child_nodes().count(), 5);
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_if_missing_fi() {
        assert_eq!(messages("if a; then b"), vec!["expected 'fi'"]);
    }

    #[test]
    fn test_if_missing_then() {
        assert_eq!(messages("if a; b; fi"), vec!["expected 'then'"]);
    }

    #[test]
    fn test_loops() {
        for (input, kind) in [
            ("while a; do b; done", NodeKind::WhileCommand),
            ("until a\ndo\n  b\ndone", NodeKind::UntilCommand),
            ("for x in 1 2 3; do echo $x; done", NodeKind::ForCommand),
            ("for x; do :; done", NodeKind::ForCommand),
            ("for ((i = 0; i < 3; i++)); do :; done", NodeKind::ForCommand),
            ("select x in a b\ndo break; done", NodeKind::ForCommand),
        ] {
            let parse = parse(input);
            assert_eq!(first(&parse).kind(), kind, "{input}");
            assert!(!parse.has_errors(), "{input}: {:?}", parse.diagnostics());
        }
    }

    #[test]
    fn test_case() {
        let parse = parse("case $x in\n  a|b) one ;;\n  (c) two ;&\n  *) ;;\nesac");
        let cmd = first(&parse);
        assert_eq!(cmd.kind(), NodeKind::CaseCommand);
        let items = cmd
            .child_nodes()
            .filter(|n| n.kind() == NodeKind::CaseItem)
            .count();
        assert_eq!(items, 3);
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    }

    #[test]
    fn test_case_missing_paren() {
        let found = messages("case x in\n  a one ;;\n  b) two ;;\nesac");
        assert_eq!(found, vec!["expected ')' after the case pattern"]);
    }

    #[test]
    fn test_functions() {
        for input in ["f() { a; }", "function f { a; }", "function f() ( a )"] {
            let parse = parse(input);
            assert_eq!(first(&parse).kind(), NodeKind::FunctionDef, "{input}");
            assert!(!parse.has_errors(), "{input}: {:?}", parse.diagnostics());
        }
    }

    #[test]
    fn test_conditional() {
        let parse = parse("[[ -n $x && ( $y == z* ) ]] && echo ok");
        let list = first(&parse);
        assert_eq!(
            list.child_nodes().next().unwrap().kind(),
            NodeKind::ConditionalCommand
        );
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    }

    #[test]
    fn test_conditional_continues_after_operator_newline() {
        assert!(messages("[[ a &&\n b ]]").is_empty());
        assert_eq!(messages("[[ a\n b"), vec!["expected ']]'"]);
    }

    #[test]
    fn test_unclosed_group_is_one_error() {
        let found = messages("{ a; b\necho c");
        assert_eq!(found, vec!["expected '}'"]);
    }
}
