//! Words and the expansions inside them
//!
//! A word is a run of adjacent parts with no trivia in between:
//! `pre"$x"$(cmd)post` is one [`NodeKind::Word`]. Substitutions and
//! `${..}` nest, so each goes through the recursion guard.

use super::{Stop, arith, statement_list, var_def};
use crate::parser::tokens::TokenKind;
use crate::parser::{Marker, NodeKind, ParseResult, Parser, RuleFailure};

/// Which parts may be glued into a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WordContext {
    /// Arguments: `--opt=$x`, `a[1]=x`
    Command,
    /// Name of a dynamic definition: stops before `=`
    Name,
    /// Arithmetic operand: `arr[i]`
    Arith,
}

/// The current token starts a word.
pub(super) fn at_word_start(p: &Parser) -> bool {
    let kind = p.current();
    kind.is_word_part() && !(kind == TokenKind::Backtick && p.inside_backticks())
}

pub(super) fn word(p: &mut Parser) -> ParseResult {
    word_in(p, WordContext::Command)
}

pub(super) fn word_in(p: &mut Parser, context: WordContext) -> ParseResult {
    if !at_word_start(p) {
        return Err(RuleFailure::NotApplicable);
    }
    let m = p.open();
    let mut prev: Option<TokenKind> = None;
    loop {
        let kind = p.raw(0);
        match kind {
            TokenKind::Word
            | TokenKind::Number
            | TokenKind::AssignmentWord
            | TokenKind::Variable
            | TokenKind::SingleQuoted => p.bump_raw(),
            TokenKind::Eq | TokenKind::AddEq
                if prev.is_some() && context == WordContext::Command =>
            {
                p.bump_raw()
            }
            TokenKind::LeftSquare
                if (prev == Some(TokenKind::AssignmentWord) && context == WordContext::Command)
                    || (prev == Some(TokenKind::Word) && context == WordContext::Arith) =>
            {
                let _ = var_def::subscript(p);
            }
            TokenKind::Dollar if opens_expansion(p.raw(1)) => {
                let _ = dollar(p);
            }
            TokenKind::Dollar => p.bump_raw(),
            TokenKind::StringBegin => string(p),
            TokenKind::Backtick if !p.inside_backticks() => {
                let _ = backtick(p);
            }
            TokenKind::ProcessSubIn | TokenKind::ProcessSubOut => {
                let _ = process_substitution(p);
            }
            _ => break,
        }
        prev = Some(kind);
    }
    Ok(p.complete(m, NodeKind::Word))
}

fn opens_expansion(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LeftParen | TokenKind::DoubleLeftParen | TokenKind::LeftCurly
    )
}

/// Close `m` as `kind` at `closer`, or as an error when it is missing.
pub(super) fn close(
    p: &mut Parser,
    m: Marker,
    closer: TokenKind,
    text: &str,
    kind: NodeKind,
) -> ParseResult {
    if p.at(closer) {
        p.bump();
        Ok(p.complete(m, kind))
    } else {
        Err(RuleFailure::Recovered(p.error(m, &format!("expected '{text}'"))))
    }
}

/// `$(..)`, `$((..))` or `${..}`; the cursor is on the `$`.
pub(super) fn dollar(p: &mut Parser) -> ParseResult {
    let m = p.open_raw();
    p.bump_raw();
    match p.raw(0) {
        TokenKind::LeftParen => p.guarded(m, |p, m| {
            p.bump_raw();
            p.in_substitution(Stop::Token(TokenKind::RightParen), statement_list);
            close(p, m, TokenKind::RightParen, ")", NodeKind::CommandSubstitution)
        }),
        TokenKind::DoubleLeftParen => p.guarded(m, |p, m| {
            p.bump_raw();
            arith::body(p, TokenKind::DoubleRightParen);
            close(p, m, TokenKind::DoubleRightParen, "))", NodeKind::ArithExpansion)
        }),
        TokenKind::LeftCurly => p.guarded(m, param_expansion),
        _ => Err(RuleFailure::Recovered(
            p.error(m, "expected '(' or '{' after '$'"),
        )),
    }
}

/// `${name[sub]op value}`; the cursor is on the `{`.
fn param_expansion(p: &mut Parser, m: Marker) -> ParseResult {
    p.bump_raw();
    loop {
        match p.raw(0) {
            TokenKind::RightCurly => {
                p.bump_raw();
                return Ok(p.complete(m, NodeKind::ParamExpansion));
            }
            TokenKind::Eof => break,
            TokenKind::LeftSquare => {
                let _ = var_def::subscript(p);
            }
            TokenKind::Dollar if opens_expansion(p.raw(1)) => {
                let _ = dollar(p);
            }
            TokenKind::StringBegin => string(p),
            TokenKind::Backtick if !p.inside_backticks() => {
                let _ = backtick(p);
            }
            _ => p.bump_raw(),
        }
    }
    Err(RuleFailure::Recovered(p.error(m, "expected '}'")))
}

/// `"..."`: tokens stay in the enclosing word, expansions become nodes.
fn string(p: &mut Parser) {
    p.bump_raw();
    loop {
        match p.raw(0) {
            TokenKind::StringEnd => {
                p.bump_raw();
                return;
            }
            TokenKind::Eof => {
                p.missing("expected '\"'");
                return;
            }
            TokenKind::Dollar if opens_expansion(p.raw(1)) => {
                let _ = dollar(p);
            }
            // inside quotes a backtick always opens a substitution
            TokenKind::Backtick => {
                let _ = backtick(p);
            }
            _ => p.bump_raw(),
        }
    }
}

/// `` `..` ``
fn backtick(p: &mut Parser) -> ParseResult {
    let m = p.open_raw();
    p.guarded(m, |p, m| {
        p.bump_raw();
        p.in_substitution(Stop::Token(TokenKind::Backtick), statement_list);
        close(p, m, TokenKind::Backtick, "`", NodeKind::CommandSubstitution)
    })
}

/// `<(..)` or `>(..)`
fn process_substitution(p: &mut Parser) -> ParseResult {
    let m = p.open_raw();
    p.guarded(m, |p, m| {
        p.bump_raw();
        p.in_substitution(Stop::Token(TokenKind::RightParen), statement_list);
        close(p, m, TokenKind::RightParen, ")", NodeKind::ProcessSubstitution)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::parser::{NodeKind, Parse, Parser};

    fn parse(input: &str) -> Parse {
        Parser::new(input).parse().unwrap()
    }

    fn first_arg(parse: &Parse) -> crate::parser::Node<'_> {
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        cmd.child_nodes().nth(1).unwrap()
    }

    #[test]
    fn test_adjacent_parts_form_one_word() {
        let parse = parse("echo pre\"$x\"$(date)'q'post");
        let word = first_arg(&parse);
        assert_eq!(word.kind(), NodeKind::Word);
        assert_eq!(word.text(), "pre\"$x\"$(date)'q'post");
        let nested: Vec<_> = word.child_nodes().map(|n| n.kind()).collect();
        assert_eq!(nested, vec![NodeKind::CommandSubstitution]);
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_nested_substitutions() {
        let parse = parse("echo \"$(echo `date` ${x:-$(pwd)})\"");
        let kinds: Vec<_> = parse.tree().root().descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == NodeKind::CommandSubstitution)
                .count(),
            3
        );
        assert!(kinds.contains(&NodeKind::ParamExpansion));
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_arith_expansion() {
        let parse = parse("echo $(( (1 + 2) * x[3] ))");
        let word = first_arg(&parse);
        let expansion = word.child_nodes().next().unwrap();
        assert_eq!(expansion.kind(), NodeKind::ArithExpansion);
        let kinds: Vec<_> = expansion.descendants().map(|n| n.kind()).collect();
        assert!(kinds.contains(&NodeKind::ArithParen));
        assert!(kinds.contains(&NodeKind::Subscript));
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_process_substitution() {
        let parse = parse("diff <(a) >(b)");
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        let subs = cmd
            .descendants()
            .filter(|n| n.kind() == NodeKind::ProcessSubstitution)
            .count();
        assert_eq!(subs, 2);
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_unclosed_command_substitution() {
        let parse = parse("echo $(date");
        let diagnostics = parse.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "expected ')'");
        assert_eq!(diagnostics[0].span.range(), 5..11);
    }

    #[test]
    fn test_unclosed_param_expansion() {
        let diagnostics = parse("echo ${x:-y").diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "expected '}'");
    }

    #[test]
    fn test_unterminated_string_is_zero_width_error_at_end() {
        let input = "echo \"abc";
        let diagnostics = parse(input).diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "expected '\"'");
        assert!(diagnostics[0].span.is_empty());
        assert_eq!(diagnostics[0].span.start.offset, input.len());
    }

    #[test]
    fn test_fi_inside_substitution_does_not_close_if() {
        let parse = parse("if true; then x=$(echo fi; echo done); fi");
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    }
}
