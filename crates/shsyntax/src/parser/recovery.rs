//! Error recovery
//!
//! A rule that fails after consuming tokens closes its marker as an error
//! node; a rule that consumed nothing rolls back so another rule (or the
//! statement list) can try. Resynchronization skips to the next statement
//! boundary so one malformed region yields one error node.

use super::builder::Marker;
use super::tokens::TokenKind;
use super::{Parser, RuleFailure};

/// Stable message of the nesting-limit diagnostic.
pub const DEPTH_EXCEEDED_MESSAGE: &str =
    "Internal parser error: Maximum level of nested calls reached";

/// Message for nesting-limit trips after the first one in a file.
pub const DEPTH_SKIPPED_MESSAGE: &str = "Nested construct skipped: nesting limit reached";

/// A token that closes an enclosing construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    Token(TokenKind),
    /// Reserved word in command position (`fi`, `done`, `esac`, ...)
    Keyword(&'static str),
}

/// Close `marker` as an error if it consumed input, otherwise roll it back.
pub(crate) fn recover(p: &mut Parser, marker: Marker, message: &str) -> RuleFailure {
    if p.consumed_since(&marker) {
        #[cfg(feature = "logging")]
        tracing::trace!(
            message,
            at = %p.log_config().token_for_log(p.current_text()),
            "closing error node"
        );
        RuleFailure::Recovered(p.error(marker, message))
    } else {
        #[cfg(feature = "logging")]
        tracing::trace!(message, "rolling back");
        p.rollback(marker);
        RuleFailure::RolledBack
    }
}

/// True at a statement terminator, an enclosing closer, or end of input.
pub(crate) fn at_boundary(p: &Parser) -> bool {
    p.current().is_statement_terminator() || p.at_stop()
}

/// Consume the current token and everything up to the next boundary.
pub(crate) fn resync(p: &mut Parser) {
    if p.current() != TokenKind::Eof {
        p.bump();
    }
    while !at_boundary(p) {
        p.bump();
    }
}

/// Wrap the tokens up to the next boundary in one error node.
pub(crate) fn error_until_boundary(p: &mut Parser, message: &str) {
    let m = p.open();
    resync(p);
    let _ = recover(p, m, message);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Paren,
    DoubleParen,
    Curly,
    Square,
    DoubleBracket,
    Quote,
    Backtick,
    Keyword(&'static str),
}

impl Open {
    fn closed_by(self, kind: TokenKind, text: &str) -> bool {
        match self {
            Open::Paren => kind == TokenKind::RightParen,
            Open::DoubleParen => kind == TokenKind::DoubleRightParen,
            Open::Curly => kind == TokenKind::RightCurly,
            Open::Square => kind == TokenKind::RightSquare,
            Open::DoubleBracket => kind == TokenKind::RightDoubleBracket,
            Open::Quote => kind == TokenKind::StringEnd,
            Open::Backtick => kind == TokenKind::Backtick,
            Open::Keyword(closer) => kind == TokenKind::Word && text == closer,
        }
    }
}

fn opener(kind: TokenKind, text: &str, command_position: bool) -> Option<Open> {
    match kind {
        TokenKind::LeftParen | TokenKind::ProcessSubIn | TokenKind::ProcessSubOut => {
            Some(Open::Paren)
        }
        TokenKind::DoubleLeftParen => Some(Open::DoubleParen),
        TokenKind::LeftCurly => Some(Open::Curly),
        TokenKind::LeftSquare => Some(Open::Square),
        TokenKind::LeftDoubleBracket => Some(Open::DoubleBracket),
        TokenKind::StringBegin => Some(Open::Quote),
        TokenKind::Backtick => Some(Open::Backtick),
        TokenKind::Word if command_position => match text {
            "if" => Some(Open::Keyword("fi")),
            "case" => Some(Open::Keyword("esac")),
            "while" | "until" | "for" | "select" => Some(Open::Keyword("done")),
            _ => None,
        },
        _ => None,
    }
}

fn is_closer(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::RightParen
            | TokenKind::DoubleRightParen
            | TokenKind::RightCurly
            | TokenKind::RightSquare
            | TokenKind::RightDoubleBracket
            | TokenKind::StringEnd
    )
}

/// Consume the construct starting at the cursor up to its balanced closer.
///
/// Uses an explicit stack, so skipping arbitrarily deep input costs no
/// native stack. A region with no opener ends before the first closer or
/// statement terminator. A function header (`name ()` or `function name`)
/// extends the region through the function body.
pub(crate) fn skip_nested_region(p: &mut Parser) {
    let mut open: Vec<Open> = Vec::new();
    let mut seen_open = false;
    let mut command_position = true;
    let mut first = true;
    // Inside a function header: the body has not been entered yet
    let mut body_pending = false;
    let mut name_pending = false;
    loop {
        let kind = p.raw(0);
        if kind == TokenKind::Eof || (seen_open && open.is_empty() && !body_pending) {
            break;
        }
        if kind.is_trivia() {
            p.bump_raw();
            continue;
        }
        let text = p.raw_text(0).to_string();
        let at_top = open.is_empty();
        if at_top && body_pending && kind == TokenKind::Newline {
            p.bump_raw();
            continue;
        }
        if at_top && (is_closer(kind) || kind.is_statement_terminator()) {
            break;
        }

        if first {
            first = false;
            if kind == TokenKind::Word
                && (text == "function" || next_significant(p) == TokenKind::LeftParen)
            {
                body_pending = true;
                name_pending = text == "function";
            }
        } else if at_top && body_pending {
            if name_pending {
                name_pending = false;
            } else if !(kind == TokenKind::LeftParen
                && next_significant(p) == TokenKind::RightParen)
            {
                body_pending = false;
            }
        }

        if open.last().is_some_and(|top| top.closed_by(kind, &text)) {
            open.pop();
        } else if let Some(o) = opener(kind, &text, command_position) {
            open.push(o);
            seen_open = true;
        }
        p.bump_raw();

        command_position = matches!(
            kind,
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Amp
                | TokenKind::AndAnd
                | TokenKind::OrOr
                | TokenKind::Pipe
                | TokenKind::PipeAmp
                | TokenKind::LeftParen
                | TokenKind::LeftCurly
                | TokenKind::DoubleSemicolon
                | TokenKind::SemiAmp
                | TokenKind::DoubleSemiAmp
        ) || (kind == TokenKind::Word
            && matches!(text.as_str(), "then" | "do" | "else" | "elif"))
            // `)` ending a case pattern
            || (kind == TokenKind::RightParen && open.last() == Some(&Open::Keyword("esac")))
            || (body_pending && open.is_empty());
    }
}

/// Kind of the first non-trivia token after the current one.
fn next_significant(p: &Parser) -> TokenKind {
    let mut i = 1;
    while p.raw(i).is_trivia() {
        i += 1;
    }
    p.raw(i)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::NodeKind;

    #[test]
    fn recover_rolls_back_when_nothing_was_consumed() {
        let mut p = Parser::new("a b");
        let m = p.open();
        assert!(matches!(recover(&mut p, m, "unused"), RuleFailure::RolledBack));
        assert_eq!(p.current_text(), "a");

        let m = p.open();
        p.bump();
        assert!(matches!(
            recover(&mut p, m, "bad"),
            RuleFailure::Recovered(c) if c.kind() == NodeKind::Error
        ));
        assert_eq!(p.current_text(), "b");
    }

    #[test]
    fn skip_nested_region_stops_at_balanced_closer() {
        for (input, rest) in [("( a ( b ) ) c", "c"), ("{ a; { b; }; } next", "next")] {
            let mut p = Parser::new(input);
            skip_nested_region(&mut p);
            assert_eq!(p.current_text(), rest, "{input}");
        }
    }

    #[test]
    fn skip_without_opener_stops_before_closer() {
        let mut p = Parser::new("a b ) c");
        skip_nested_region(&mut p);
        assert_eq!(p.current(), TokenKind::RightParen);
    }

    #[test]
    fn resync_stops_at_statement_terminator() {
        let mut p = Parser::new("x y z; w");
        resync(&mut p);
        assert_eq!(p.current(), TokenKind::Semicolon);
    }

    #[test]
    fn skip_nested_region_covers_function_body() {
        for (input, rest) in [
            ("f() { f() { x; }; } rest", "rest"),
            ("f ()\n{ a; } rest", "rest"),
            ("function g { b; } rest", "rest"),
            ("function g () ( c ) rest", "rest"),
        ] {
            let mut p = Parser::new(input);
            skip_nested_region(&mut p);
            assert_eq!(p.current_text(), rest, "{input:?}");
        }
    }

    #[test]
    fn skip_nested_region_enters_commands_after_case_patterns() {
        let mut p = Parser::new("case a in b) case a in (b) x ;; esac ;; esac rest");
        skip_nested_region(&mut p);
        assert_eq!(p.current_text(), "rest");
    }
}
