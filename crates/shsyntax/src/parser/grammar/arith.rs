//! Arithmetic expressions
//!
//! Used by `$(( ))`, `(( ))`, C-style `for` headers and subscripts.
//! Binary operators are parsed by precedence climbing; left-associative
//! chains are loops. Right-associative operators, the ternary, unary
//! prefixes and parentheses recurse, and each of those takes a guard level.

use super::word::{self, WordContext};
use super::{produced, recovery};
use crate::parser::tokens::TokenKind;
use crate::parser::{NodeKind, ParseResult, Parser, RuleFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binding power of a binary operator; higher binds tighter.
fn binding_power(op: &str) -> Option<(u8, Assoc)> {
    let power = match op {
        "," => (1, Assoc::Left),
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "<<=" | ">>=" | "&=" | "^=" | "|=" => {
            (2, Assoc::Right)
        }
        "?" => (3, Assoc::Right),
        "||" => (4, Assoc::Left),
        "&&" => (5, Assoc::Left),
        "|" => (6, Assoc::Left),
        "^" => (7, Assoc::Left),
        "&" => (8, Assoc::Left),
        "==" | "!=" => (9, Assoc::Left),
        "<" | ">" | "<=" | ">=" => (10, Assoc::Left),
        "<<" | ">>" => (11, Assoc::Left),
        "+" | "-" => (12, Assoc::Left),
        "*" | "/" | "%" => (13, Assoc::Left),
        "**" => (14, Assoc::Right),
        _ => return None,
    };
    Some(power)
}

fn at_operator(p: &Parser, ops: &[&str]) -> bool {
    p.at(TokenKind::ArithOperator) && ops.contains(&p.current_text())
}

/// Full expression, comma operator included.
pub(super) fn expression(p: &mut Parser) -> ParseResult {
    expression_bp(p, 1)
}

/// Contents of `$(( ))` or `(( ))` up to `closer`.
///
/// Tokens the expression cannot use are wrapped in one error node.
pub(super) fn body(p: &mut Parser, closer: TokenKind) {
    if !p.at(closer) {
        let _ = expression(p);
    }
    stray_until(p, &[closer]);
}

/// Wrap everything before one of `closers` (or end of input) in an error node.
pub(super) fn stray_until(p: &mut Parser, closers: &[TokenKind]) {
    if p.at(TokenKind::Eof) || closers.contains(&p.current()) {
        return;
    }
    let m = p.open();
    while !p.at(TokenKind::Eof) && !closers.contains(&p.current()) {
        p.bump();
    }
    let _ = recovery::recover(p, m, "unexpected token in arithmetic expression");
}

fn expression_bp(p: &mut Parser, min_power: u8) -> ParseResult {
    let mut result = unary(p);
    loop {
        let Some(lhs) = produced(result) else {
            return result;
        };
        if !p.at(TokenKind::ArithOperator) {
            return result;
        }
        let Some((power, assoc)) = binding_power(p.current_text()) else {
            return result;
        };
        if power < min_power {
            return result;
        }
        let ternary = p.current_text() == "?";
        let m = p.open_before(&lhs);
        p.bump();
        result = if ternary {
            p.guarded(m, |p, m| {
                let then = expression_bp(p, 2);
                operand(p, then);
                if at_operator(p, &[":"]) {
                    p.bump();
                    let otherwise = expression_bp(p, power);
                    operand(p, otherwise);
                } else {
                    p.missing("expected ':' in conditional expression");
                }
                Ok(p.complete(m, NodeKind::ArithTernary))
            })
        } else if assoc == Assoc::Right {
            p.guarded(m, |p, m| {
                let rhs = expression_bp(p, power);
                operand(p, rhs);
                Ok(p.complete(m, NodeKind::ArithBinary))
            })
        } else {
            let rhs = expression_bp(p, power + 1);
            operand(p, rhs);
            Ok(p.complete(m, NodeKind::ArithBinary))
        };
    }
}

/// Leave a zero-width error where an operand should have been.
fn operand(p: &mut Parser, result: ParseResult) {
    if produced(result).is_none() {
        p.missing("expected an operand");
    }
}

fn unary(p: &mut Parser) -> ParseResult {
    if at_operator(p, &["!", "~", "+", "-", "++", "--"]) {
        let m = p.open();
        p.bump();
        return p.guarded(m, |p, m| {
            let inner = unary(p);
            operand(p, inner);
            Ok(p.complete(m, NodeKind::ArithUnary))
        });
    }
    postfix(p)
}

fn postfix(p: &mut Parser) -> ParseResult {
    let mut result = primary(p);
    while let Some(inner) = produced(result) {
        if !at_operator(p, &["++", "--"]) {
            break;
        }
        let m = p.open_before(&inner);
        p.bump();
        result = Ok(p.complete(m, NodeKind::ArithUnary));
    }
    result
}

fn primary(p: &mut Parser) -> ParseResult {
    match p.current() {
        TokenKind::LeftParen => {
            let m = p.open();
            p.guarded(m, |p, m| {
                p.bump();
                let _ = expression(p);
                stray_until(p, &[TokenKind::RightParen, TokenKind::DoubleRightParen]);
                word::close(p, m, TokenKind::RightParen, ")", NodeKind::ArithParen)
            })
        }
        _ if word::at_word_start(p) => word::word_in(p, WordContext::Arith),
        _ => Err(RuleFailure::NotApplicable),
    }
}
