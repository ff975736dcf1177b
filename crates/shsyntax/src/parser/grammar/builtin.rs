//! Declaration builtins: `export`, `declare`, `local`, `readonly`, `typeset`, `unset`
//!
//! Each argument is classified on its own: `name=value` (scalar, array or
//! indexed), a bare name, a dynamic `$name=value`, or a plain word such as
//! an option or `$(cmd)`. Redirects may appear anywhere.

use super::command;
use super::var_def;
use super::word;
use crate::parser::tokens::TokenKind;
use crate::parser::{Marker, NodeKind, ParseResult, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Builtin {
    Export,
    Declare,
    Local,
    Readonly,
    Typeset,
    Unset,
}

impl Builtin {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "export" => Some(Builtin::Export),
            "declare" => Some(Builtin::Declare),
            "local" => Some(Builtin::Local),
            "readonly" => Some(Builtin::Readonly),
            "typeset" => Some(Builtin::Typeset),
            "unset" => Some(Builtin::Unset),
            _ => None,
        }
    }

    /// The builtin name at the cursor, standing as a word of its own.
    pub(super) fn at(p: &Parser) -> Option<Self> {
        if p.raw(0) != TokenKind::Word {
            return None;
        }
        let next = p.raw(1);
        if next.is_word_part() || matches!(next, TokenKind::Eq | TokenKind::AddEq) {
            return None;
        }
        Self::from_word(p.raw_text(0))
    }

    /// Arguments of `unset` name variables but do not define them.
    fn defines(self) -> bool {
        self != Builtin::Unset
    }
}

/// Parse the builtin word and its arguments into `m`.
///
/// `prefix_defs` counts assignments already parsed before the builtin word
/// (`a=1 export b`). The node is a `VarDefCommand` when any definition was
/// found, otherwise a `BuiltinCommand`.
pub(super) fn declaration(
    p: &mut Parser,
    m: Marker,
    builtin: Builtin,
    prefix_defs: usize,
) -> ParseResult {
    let _ = word::word(p);
    let mut defs = prefix_defs;
    loop {
        p.eat_trivia();
        if command::at_redirect(p) {
            let _ = command::redirect(p);
            continue;
        }
        let kind = p.raw(0);
        if builtin.defines() && kind == TokenKind::AssignmentWord {
            let _ = var_def::assignment(p);
            defs += 1;
        } else if builtin.defines() && dynamic_definition_ahead(p) {
            let _ = var_def::dynamic(p);
            defs += 1;
        } else if builtin.defines() && kind == TokenKind::Word && bare_name_ahead(p) {
            let _ = var_def::name_only(p);
            defs += 1;
        } else if word::at_word_start(p) {
            let _ = word::word(p);
        } else {
            break;
        }
    }

    #[cfg(feature = "logging")]
    tracing::trace!(?builtin, defs, "declaration command");

    let kind = if defs > 0 {
        NodeKind::VarDefCommand
    } else {
        NodeKind::BuiltinCommand
    };
    Ok(p.complete(m, kind))
}

/// `$name=` or `${...}=` starts at the cursor.
fn dynamic_definition_ahead(p: &Parser) -> bool {
    let is_eq = |kind: TokenKind| matches!(kind, TokenKind::Eq | TokenKind::AddEq);
    match (p.raw(0), p.raw(1)) {
        (TokenKind::Variable, next) => is_eq(next),
        (TokenKind::Dollar, TokenKind::LeftCurly) => {
            let mut depth = 0usize;
            let mut i = 1;
            loop {
                match p.raw(i) {
                    TokenKind::LeftCurly => depth += 1,
                    TokenKind::RightCurly => {
                        depth -= 1;
                        if depth == 0 {
                            return is_eq(p.raw(i + 1));
                        }
                    }
                    TokenKind::Eof | TokenKind::Newline => return false,
                    _ => {}
                }
                i += 1;
            }
        }
        _ => false,
    }
}

/// A plain identifier standing alone as an argument.
fn bare_name_ahead(p: &Parser) -> bool {
    let text = p.raw_text(0);
    let mut chars = text.chars();
    let starts_like_name = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_like_name
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !p.raw(1).is_word_part()
}
