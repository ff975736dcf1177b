//! Variable definitions, array literals and subscripts

use super::word::{self, WordContext};
use super::{arith, recovery};
use crate::parser::tokens::TokenKind;
use crate::parser::{Marker, NodeKind, ParseResult, Parser, RuleFailure};

/// `name=value`, `name+=value`, `name[i]=value`, `name=(...)`.
///
/// The cursor is on the assignment word.
pub(super) fn assignment(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.bump();
    if p.raw(0) == TokenKind::LeftSquare {
        let _ = subscript(p);
    }
    definition_value(p, m)
}

/// A bare name argument of `export`, `local` and friends.
pub(super) fn name_only(p: &mut Parser) -> ParseResult {
    let m = p.open();
    p.bump();
    Ok(p.complete(m, NodeKind::VarDef))
}

/// `$name=value` or `${name}=value`: the name is an expansion.
pub(super) fn dynamic(p: &mut Parser) -> ParseResult {
    let m = p.open();
    let _ = word::word_in(p, WordContext::Name);
    definition_value(p, m)
}

/// `=` or `+=` and the value, then close the definition.
fn definition_value(p: &mut Parser, m: Marker) -> ParseResult {
    if matches!(p.raw(0), TokenKind::Eq | TokenKind::AddEq) {
        p.bump_raw();
        match p.raw(0) {
            TokenKind::LeftParen => {
                let _ = array_literal(p);
            }
            kind if kind.is_word_part() => {
                let _ = word::word(p);
            }
            // `a=` assigns the empty string
            _ => {}
        }
    }
    Ok(p.complete(m, NodeKind::VarDef))
}

/// `( item [i]=item ... )`; the cursor is on the `(`.
///
/// Newlines separate items. A literal that is never closed becomes one
/// error node reaching to the end of the statement, or to its first
/// newline when it spans lines.
pub(super) fn array_literal(p: &mut Parser) -> ParseResult {
    let m = p.open_raw();
    p.bump_raw();
    let mut closed_ahead = None;
    loop {
        if p.at(TokenKind::Newline)
            && !*closed_ahead.get_or_insert_with(|| array_closes_ahead(p))
        {
            break;
        }
        p.skip_newlines();
        match p.current() {
            TokenKind::RightParen => {
                p.bump();
                return Ok(p.complete(m, NodeKind::ArrayLiteral));
            }
            TokenKind::LeftSquare => {
                let _ = indexed_entry(p);
            }
            _ if word::at_word_start(p) => {
                let _ = word::word(p);
            }
            _ => break,
        }
    }
    while !recovery::at_boundary(p)
        && !matches!(
            p.current(),
            TokenKind::Pipe | TokenKind::PipeAmp | TokenKind::AndAnd | TokenKind::OrOr
        )
        && !p.current().is_redirect_op()
    {
        p.bump();
    }
    Err(RuleFailure::Recovered(
        p.error(m, "expected ')' to close the array literal"),
    ))
}

/// The array literal being parsed is closed before end of input.
///
/// Follows the lexer: the first `)` outside a substitution closes the
/// literal, an operator ends it unclosed.
fn array_closes_ahead(p: &Parser) -> bool {
    let mut depth = 0usize;
    let mut in_backticks = false;
    let mut prev = TokenKind::Eof;
    let mut i = 0;
    loop {
        let kind = p.raw(i);
        i += 1;
        if kind == TokenKind::Eof {
            return false;
        }
        if kind.is_trivia() {
            continue;
        }
        if in_backticks {
            in_backticks = kind != TokenKind::Backtick;
            continue;
        }
        match kind {
            TokenKind::Backtick => in_backticks = true,
            TokenKind::LeftParen if depth > 0 || prev == TokenKind::Dollar => depth += 1,
            TokenKind::ProcessSubIn | TokenKind::ProcessSubOut | TokenKind::DoubleLeftParen => {
                depth += 1;
            }
            TokenKind::DoubleRightParen => depth = depth.saturating_sub(1),
            TokenKind::RightParen if depth == 0 => return true,
            TokenKind::RightParen => depth -= 1,
            TokenKind::Semicolon
            | TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::PipeAmp
            | TokenKind::AndAnd
            | TokenKind::OrOr
            | TokenKind::DoubleSemicolon
            | TokenKind::SemiAmp
            | TokenKind::DoubleSemiAmp
                if depth == 0 =>
            {
                return false;
            }
            other if depth == 0 && other.is_redirect_op() => return false,
            _ => {}
        }
        prev = kind;
    }
}

/// `[i]=value` inside an array literal.
fn indexed_entry(p: &mut Parser) -> ParseResult {
    let m = p.open();
    let _ = subscript(p);
    if !matches!(p.raw(0), TokenKind::Eq | TokenKind::AddEq) {
        // `[abc]` alone is a glob pattern word
        return Ok(p.complete(m, NodeKind::Word));
    }
    p.bump_raw();
    if p.raw(0).is_word_part() {
        let _ = word::word(p);
    }
    Ok(p.complete(m, NodeKind::ArrayIndexedEntry))
}

/// `[expr]`; the cursor is on the `[`.
///
/// `@` and `*` are accepted as whole subscripts. Anything the expression
/// grammar cannot use is kept inside the node; only a missing `]` is an error.
pub(super) fn subscript(p: &mut Parser) -> ParseResult {
    let m = p.open_raw();
    p.guarded(m, |p, m| {
        p.bump_raw();
        if p.at(TokenKind::ArithOperator)
            && p.current_text() == "*"
            && p.nth(1) == TokenKind::RightSquare
        {
            p.bump();
        } else if !p.at(TokenKind::RightSquare) {
            let _ = arith::expression(p);
        }
        while !matches!(
            p.current(),
            TokenKind::RightSquare | TokenKind::Eof | TokenKind::Newline
        ) {
            p.bump();
        }
        if p.at(TokenKind::RightSquare) {
            p.bump();
            Ok(p.complete(m, NodeKind::Subscript))
        } else {
            Err(RuleFailure::Recovered(p.error(m, "expected ']'")))
        }
    })
}
