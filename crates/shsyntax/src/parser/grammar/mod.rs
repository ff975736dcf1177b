//! Grammar rules
//!
//! One function per construct. Each rule is entered only after first-token
//! dispatch says it applies; a rule that turns out not to apply returns
//! [`RuleFailure::NotApplicable`] without leaving anything behind.
//!
//! Lists (`a && b`, `a | b`, statement sequences) are loops. Recursion only
//! happens through nesting constructs, and every one of those goes through
//! [`Parser::guarded`].

mod arith;
mod builtin;
mod command;
mod compound;
mod var_def;
mod word;

use super::recovery::{self, Stop};
use super::tokens::TokenKind;
use super::{CompletedMarker, NodeKind, ParseResult, Parser, RuleFailure};

/// The node a rule left behind, successful or not.
fn produced(result: ParseResult) -> Option<CompletedMarker> {
    match result {
        Ok(cm) | Err(RuleFailure::Recovered(cm)) | Err(RuleFailure::DepthExceeded(cm)) => Some(cm),
        Err(RuleFailure::NotApplicable) | Err(RuleFailure::RolledBack) => None,
    }
}

/// Whole script: every token, trivia included, ends up under the root.
pub(crate) fn file(p: &mut Parser) {
    let m = p.open_raw();
    statement_list(p);
    p.bump_rest();
    p.complete(m, NodeKind::File);
}

/// Statements up to end of input or the closer of an enclosing construct.
///
/// Separators stay as bare tokens of the enclosing node. A region that does
/// not start a statement becomes one error node reaching to the next boundary.
pub(crate) fn statement_list(p: &mut Parser) {
    loop {
        match p.current() {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Amp => {
                p.bump();
                continue;
            }
            TokenKind::Eof => break,
            _ if p.at_stop() => break,
            _ => {}
        }

        let result = and_or(p);
        if produced(result).is_none() {
            let message = format!("unexpected '{}'", p.current_text());
            recovery::error_until_boundary(p, &message);
            continue;
        }
        if recovery::at_boundary(p) {
            continue;
        }
        if result.is_ok() {
            recovery::error_until_boundary(p, "expected end of command");
        } else {
            // the failed statement already carries its error node
            while !recovery::at_boundary(p) {
                p.bump();
            }
        }
    }
}

/// `a && b || c`, left-nested.
fn and_or(p: &mut Parser) -> ParseResult {
    let mut result = pipeline(p);
    loop {
        let Some(lhs) = produced(result) else {
            return result;
        };
        if !matches!(p.current(), TokenKind::AndAnd | TokenKind::OrOr) {
            return result;
        }
        let m = p.open_before(&lhs);
        let op = p.current_text().to_string();
        p.bump();
        p.skip_newlines();
        if produced(pipeline(p)).is_none() {
            p.missing(&format!("expected a command after '{op}'"));
        }
        result = Ok(p.complete(m, NodeKind::AndOrList));
    }
}

fn at_pipeline_prefix(p: &Parser) -> bool {
    // `!` after `time` lexes as a plain word
    p.at(TokenKind::Bang) || p.at_keyword("!") || p.at_keyword("time")
}

/// `[time [-p]] [!] cmd | cmd |& cmd`
fn pipeline(p: &mut Parser) -> ParseResult {
    let prefix = if at_pipeline_prefix(p) {
        let m = p.open();
        while at_pipeline_prefix(p) {
            let timed = p.at_keyword("time");
            p.bump();
            if timed && p.at(TokenKind::Word) && p.current_text() == "-p" {
                p.bump();
            }
        }
        Some(m)
    } else {
        None
    };

    let first = command(p);
    let Some(lhs) = produced(first) else {
        // a bare `!` or `time` is still a pipeline
        return match prefix {
            Some(m) => Ok(p.complete(m, NodeKind::Pipeline)),
            None => first,
        };
    };
    if !matches!(p.current(), TokenKind::Pipe | TokenKind::PipeAmp) {
        return match prefix {
            Some(m) => Ok(p.complete(m, NodeKind::Pipeline)),
            None => first,
        };
    }

    let m = match prefix {
        Some(m) => m,
        None => p.open_before(&lhs),
    };
    while matches!(p.current(), TokenKind::Pipe | TokenKind::PipeAmp) {
        p.bump();
        p.skip_newlines();
        if produced(command(p)).is_none() {
            p.missing("expected a command after '|'");
        }
    }
    Ok(p.complete(m, NodeKind::Pipeline))
}

/// Words that only mean something in the middle of a compound command.
fn is_reserved_closer(word: &str) -> bool {
    matches!(
        word,
        "then" | "else" | "elif" | "fi" | "do" | "done" | "esac"
    )
}

/// Dispatch on the first token of a command.
fn command(p: &mut Parser) -> ParseResult {
    match p.current() {
        TokenKind::LeftParen => compound::subshell(p),
        TokenKind::DoubleLeftParen => compound::arith_command(p),
        TokenKind::LeftCurly => compound::group(p),
        TokenKind::LeftDoubleBracket => compound::conditional(p),
        TokenKind::Word => match p.current_text() {
            "if" => compound::if_command(p),
            "while" | "until" => compound::while_command(p),
            "for" | "select" => compound::for_command(p),
            "case" => compound::case_command(p),
            "function" => compound::function_def(p),
            word if is_reserved_closer(word) => Err(RuleFailure::NotApplicable),
            _ if p.nth(1) == TokenKind::LeftParen && p.nth(2) == TokenKind::RightParen => {
                compound::function_def(p)
            }
            _ => command::simple_command(p),
        },
        TokenKind::AssignmentWord | TokenKind::FileDescriptor => command::simple_command(p),
        kind if kind.is_redirect_op() || word::at_word_start(p) => command::simple_command(p),
        _ => Err(RuleFailure::NotApplicable),
    }
}
