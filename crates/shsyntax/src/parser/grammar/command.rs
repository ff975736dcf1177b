//! Simple commands and redirections

use super::builtin::{self, Builtin};
use super::var_def;
use super::word;
use crate::parser::tokens::TokenKind;
use crate::parser::{NodeKind, ParseResult, Parser, RuleFailure};

/// `[assignments] [redirects] [name args...]`, redirects anywhere.
///
/// Prefix assignments with no command word make a `VarDefCommand`.
/// `export`, `declare` and the other declaration builtins are handed to
/// [`builtin::declaration`].
pub(super) fn simple_command(p: &mut Parser) -> ParseResult {
    let m = p.open();
    let mut defs = 0;
    loop {
        if p.at(TokenKind::AssignmentWord) {
            let _ = var_def::assignment(p);
            defs += 1;
        } else if at_redirect(p) {
            let _ = redirect(p);
        } else {
            break;
        }
    }

    if !word::at_word_start(p) {
        if !p.consumed_since(&m) {
            p.rollback(m);
            return Err(RuleFailure::NotApplicable);
        }
        let kind = if defs > 0 {
            NodeKind::VarDefCommand
        } else {
            NodeKind::SimpleCommand
        };
        return Ok(p.complete(m, kind));
    }

    p.eat_trivia();
    if let Some(builtin) = Builtin::at(p) {
        return builtin::declaration(p, m, builtin, defs);
    }

    let _ = word::word(p);
    arguments(p);
    Ok(p.complete(m, NodeKind::SimpleCommand))
}

/// Words and redirects up to the end of the command.
fn arguments(p: &mut Parser) {
    loop {
        if at_redirect(p) {
            let _ = redirect(p);
        } else if word::at_word_start(p) {
            let _ = word::word(p);
        } else {
            break;
        }
    }
}

pub(super) fn at_redirect(p: &Parser) -> bool {
    p.current().is_redirect_op() || p.at(TokenKind::FileDescriptor)
}

/// Redirections trailing a compound command.
pub(super) fn trailing_redirects(p: &mut Parser) {
    while at_redirect(p) {
        let _ = redirect(p);
    }
}

/// `[n]op target`
pub(super) fn redirect(p: &mut Parser) -> ParseResult {
    let m = p.open();
    if p.at(TokenKind::FileDescriptor) {
        p.bump();
    }
    if !p.current().is_redirect_op() {
        return Err(RuleFailure::Recovered(
            p.error(m, "expected a redirection operator"),
        ));
    }
    let op = p.current_text().to_string();
    p.bump();
    if word::at_word_start(p) {
        let _ = word::word(p);
        Ok(p.complete(m, NodeKind::Redirect))
    } else {
        Err(RuleFailure::Recovered(
            p.error(m, &format!("expected a file name after '{op}'")),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::parser::{NodeKind, Parse, Parser};

    fn parse(input: &str) -> Parse {
        Parser::new(input).parse().unwrap()
    }

    fn command_parts(parse: &Parse) -> Vec<NodeKind> {
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        cmd.child_nodes().map(|n| n.kind()).collect()
    }

    #[test]
    fn test_prefix_assignments_and_redirects() {
        let parse = parse("LANG=C 2>/dev/null sort -u <in >out");
        assert_eq!(
            command_parts(&parse),
            vec![
                NodeKind::VarDef,
                NodeKind::Redirect,
                NodeKind::Word,
                NodeKind::Word,
                NodeKind::Redirect,
                NodeKind::Redirect,
            ]
        );
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_redirect_only_command() {
        let parse = parse("> file");
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        assert_eq!(cmd.kind(), NodeKind::SimpleCommand);
        assert_eq!(command_parts(&parse), vec![NodeKind::Redirect]);
    }

    #[test]
    fn test_fd_duplication() {
        let parse = parse("cmd 2>&1 &>>log");
        let redirects: Vec<String> = parse
            .tree()
            .root()
            .descendants()
            .filter(|n| n.kind() == NodeKind::Redirect)
            .map(|n| n.text())
            .collect();
        assert_eq!(redirects, vec!["2>&1", "&>>log"]);
    }

    #[test]
    fn test_heredoc_redirect_keeps_body_in_tree() {
        let input = "cat <<EOF\nhello\nEOF\necho after";
        let parse = parse(input);
        assert!(!parse.has_errors());
        assert_eq!(parse.tree().root().text(), input);
        assert_eq!(parse.tree().root().child_nodes().count(), 2);
    }

    #[test]
    fn test_missing_redirect_target() {
        let parse = parse("echo hi >; echo next");
        let diagnostics = parse.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "expected a file name after '>'");
        assert_eq!(parse.tree().root().child_nodes().count(), 2);
    }
}
