//! Token types consumed by the parser
//!
//! The lexer is lossless: whitespace, comments and here-document bodies are
//! tokens too, so concatenating every token's text reproduces the input.

use serde::Serialize;

use super::span::Span;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Spaces and tabs
    Whitespace,
    /// Backslash-newline
    LineContinuation,
    /// `# ...` up to (not including) the newline
    Comment,
    /// Newline character
    Newline,

    /// A plain word (command name, argument, keyword, pattern)
    Word,
    /// Identifier immediately followed by `=`, `+=` or `[..]=`
    AssignmentWord,
    /// All-digit word (also arithmetic literals)
    Number,
    /// `$name`, `$1`, `$@`, `$?`, ...
    Variable,
    /// `$` introducing `${`, `$(` or `$((`
    Dollar,
    /// Digits directly in front of a redirection operator (`2>`)
    FileDescriptor,

    /// Opening `"` (or `$"`)
    StringBegin,
    /// Literal text inside double quotes
    StringContent,
    /// Closing `"`
    StringEnd,
    /// `'...'` or `$'...'`
    SingleQuoted,
    /// `` ` `` opening or closing a backquoted substitution
    Backtick,

    /// `=`
    Eq,
    /// `+=`
    AddEq,

    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `((`
    DoubleLeftParen,
    /// `))`
    DoubleRightParen,
    /// `{`
    LeftCurly,
    /// `}`
    RightCurly,
    /// `[`
    LeftSquare,
    /// `]`
    RightSquare,
    /// `[[`
    LeftDoubleBracket,
    /// `]]`
    RightDoubleBracket,
    /// `<(`
    ProcessSubIn,
    /// `>(`
    ProcessSubOut,

    /// `;`
    Semicolon,
    /// `;;`
    DoubleSemicolon,
    /// `;&`
    SemiAmp,
    /// `;;&`
    DoubleSemiAmp,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `|&`
    PipeAmp,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!` in command position
    Bang,

    /// `<`
    Less,
    /// `>`
    Greater,
    /// `>>`
    GreaterGreater,
    /// `>|`
    GreaterPipe,
    /// `<>`
    LessGreater,
    /// `<&`
    LessAmp,
    /// `>&`
    GreaterAmp,
    /// `&>`
    AmpGreater,
    /// `&>>`
    AmpGreaterGreater,
    /// `<<`
    HereDoc,
    /// `<<-`
    HereDocStrip,
    /// `<<<`
    HereString,
    /// Here-document body lines
    HereDocContent,
    /// Here-document terminator line
    HereDocEnd,

    /// Operator inside `$(( ))`, `(( ))` or a subscript
    ArithOperator,
    /// Operator inside `${ }` (`:-`, `#`, `%%`, ...)
    ParamOperator,

    /// A character the lexer could not place
    Unknown,
    /// End-of-input sentinel; never stored in a token stream
    Eof,
}

impl TokenKind {
    /// Tokens the grammar skips over; they still land in the tree.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineContinuation
                | TokenKind::Comment
                | TokenKind::HereDocContent
                | TokenKind::HereDocEnd
        )
    }

    /// Redirection operators (without the optional fd prefix).
    pub fn is_redirect_op(self) -> bool {
        matches!(
            self,
            TokenKind::Less
                | TokenKind::Greater
                | TokenKind::GreaterGreater
                | TokenKind::GreaterPipe
                | TokenKind::LessGreater
                | TokenKind::LessAmp
                | TokenKind::GreaterAmp
                | TokenKind::AmpGreater
                | TokenKind::AmpGreaterGreater
                | TokenKind::HereDoc
                | TokenKind::HereDocStrip
                | TokenKind::HereString
        )
    }

    /// Tokens that end a statement.
    pub fn is_statement_terminator(self) -> bool {
        matches!(
            self,
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Amp
                | TokenKind::DoubleSemicolon
                | TokenKind::SemiAmp
                | TokenKind::DoubleSemiAmp
                | TokenKind::Eof
        )
    }

    /// Tokens that can start or continue a word.
    pub fn is_word_part(self) -> bool {
        matches!(
            self,
            TokenKind::Word
                | TokenKind::AssignmentWord
                | TokenKind::Number
                | TokenKind::Variable
                | TokenKind::Dollar
                | TokenKind::StringBegin
                | TokenKind::SingleQuoted
                | TokenKind::Backtick
                | TokenKind::ProcessSubIn
                | TokenKind::ProcessSubOut
        )
    }
}

/// An immutable lexical token with its source text and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}
