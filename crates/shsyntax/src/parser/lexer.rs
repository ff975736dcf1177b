//! Lexer for bash scripts
//!
//! Tokenizes input into a lossless stream of tokens with source position
//! tracking. Context (inside `$(..)`, `"..."`, `${..}`, `$((..))`, array
//! literals) is tracked with an explicit mode stack, so nesting never recurses.
//! The lexer never fails: unterminated constructs run to end of input and the
//! parser reports them.

use std::collections::VecDeque;

use super::span::{Position, Span};
use super::tokens::{Token, TokenKind};

/// Arithmetic operators, longest first.
const ARITH_OPERATORS: &[&str] = &[
    "<<=", ">>=", "**", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=",
    "*=", "/=", "%=", "&=", "^=", "|=", "+", "-", "*", "/", "%", "<", ">", "!", "~", "&", "^",
    "|", "?", ":", ",", "=",
];

/// Two-character parameter expansion operators.
const PARAM_OPERATORS: &[&str] = &[
    ":-", ":=", ":+", ":?", "##", "%%", "//", "/#", "/%", "^^", ",,",
];

/// What closes a nested command context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    /// Top level: nothing closes it
    Eof,
    /// `$(..)`, `<(..)`, `>(..)`
    Paren,
    /// `` `..` ``
    Backtick,
}

/// What closes an arithmetic context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithCloser {
    /// `))`
    DoubleParen,
    /// `]` of a subscript
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Command { parens: u32, closer: Closer },
    DoubleQuote,
    Param { seen_name: bool, seen_op: bool },
    Arith { parens: u32, squares: u32, closer: ArithCloser },
    Array,
}

/// Progress through `name[sub]=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AssignState {
    #[default]
    None,
    /// After the name (or an array entry's `[`): `=`/`+=` may follow
    Name,
    /// After `=`: a `(` opens an array literal
    Value,
}

#[derive(Debug, Clone)]
struct PendingHereDoc {
    delimiter: String,
    strip_tabs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HereDocPhase {
    Idle,
    Body,
    Terminator,
}

/// Where to continue if an array literal turns out to be unterminated.
struct Restart<'a> {
    /// Tokens up to and including the array's first newline
    tokens: usize,
    /// Mode stack height with the array on top
    array_depth: usize,
    /// Lexer state just after that newline, outside the array
    lexer: Lexer<'a>,
}

/// Lexer for bash scripts.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    /// Current position in the input
    position: Position,
    modes: Vec<Mode>,
    assign: AssignState,
    /// A `$` was just emitted and `(`, `((` or `{` follows
    dollar_pending: bool,
    /// The next token may start a command (keywords, `{`, `}`, `((`)
    command_start: bool,
    /// Kind of the last token, trivia included
    last_raw: Option<TokenKind>,
    /// The last `}` closed a `${..}`
    closed_param: bool,
    /// Open `[[` constructs
    conditionals: u32,
    /// `function` was read; the next word is the function name
    function_header: bool,
    expect_heredoc_delimiter: Option<bool>,
    heredocs: VecDeque<PendingHereDoc>,
    heredoc_phase: HereDocPhase,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: Position::new(),
            modes: vec![Mode::Command {
                parens: 0,
                closer: Closer::Eof,
            }],
            assign: AssignState::None,
            dollar_pending: false,
            command_start: true,
            last_raw: None,
            closed_param: false,
            conditionals: 0,
            function_header: false,
            expect_heredoc_delimiter: None,
            heredocs: VecDeque::new(),
            heredoc_phase: HereDocPhase::Idle,
        }
    }

    /// Get the current position in the input.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Lex the whole input.
    ///
    /// An array literal still open at end of input ends at its first
    /// newline: lexing restarts there in command mode, so the lines after
    /// `a=(1 2` are read as commands.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut restart: Option<Restart<'a>> = None;
        loop {
            let in_array = self.modes.last() == Some(&Mode::Array);
            let Some(token) = self.next_token() else {
                match restart.take() {
                    Some(r) => {
                        tokens.truncate(r.tokens);
                        self = r.lexer;
                        continue;
                    }
                    None => break,
                }
            };
            let newline_in_array = in_array && token.kind == TokenKind::Newline;
            tokens.push(token);

            if restart
                .as_ref()
                .is_some_and(|r| self.modes.len() < r.array_depth)
            {
                // the array was closed
                restart = None;
            }
            if newline_in_array && restart.is_none() {
                let array_depth = self.modes.len();
                let mut lexer = self.clone();
                lexer.modes.truncate(array_depth - 1);
                lexer.command_start = true;
                lexer.assign = AssignState::None;
                restart = Some(Restart {
                    tokens: tokens.len(),
                    array_depth,
                    lexer,
                });
            }
        }
        tokens
    }

    /// Get the next token with its source span, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.rest().is_empty() {
            return None;
        }
        let start = self.position;
        let kind = self.next_kind();
        debug_assert!(self.position.offset > start.offset, "lexer made no progress");
        let text = &self.input[start.offset..self.position.offset];
        self.record(kind, text);
        Some(Token::new(
            kind,
            text,
            Span::from_positions(start, self.position),
        ))
    }

    fn record(&mut self, kind: TokenKind, text: &str) {
        self.last_raw = Some(kind);
        if kind != TokenKind::RightCurly {
            self.closed_param = false;
        }
        if kind.is_trivia() {
            return;
        }
        let was_start = self.command_start;
        self.command_start = match kind {
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
            | TokenKind::Bang
            | TokenKind::Backtick
            | TokenKind::RightParen => true,
            TokenKind::Word => matches!(
                text,
                "then" | "do" | "else" | "elif" | "if" | "while" | "until" | "time" | "for"
            ),
            _ => false,
        };
        // `function name {`: the body may follow the name directly
        if std::mem::take(&mut self.function_header) {
            self.command_start = true;
        } else if was_start && kind == TokenKind::Word && text == "function" {
            self.function_header = true;
        }
        if kind == TokenKind::Newline && !self.heredocs.is_empty() {
            self.heredoc_phase = HereDocPhase::Body;
        }
    }

    fn next_kind(&mut self) -> TokenKind {
        if self.heredoc_phase != HereDocPhase::Idle {
            return self.lex_heredoc();
        }
        if std::mem::take(&mut self.dollar_pending) {
            if let Some(kind) = self.lex_after_dollar() {
                return kind;
            }
        }
        match self.modes.last().copied() {
            Some(Mode::DoubleQuote) => self.lex_double_quoted(),
            Some(Mode::Param { seen_name, seen_op }) => self.lex_param(seen_name, seen_op),
            Some(Mode::Arith {
                parens,
                squares,
                closer,
            }) => self.lex_arith(parens, squares, closer),
            Some(Mode::Array) => self.lex_array(),
            Some(Mode::Command { parens, closer }) => self.lex_command(parens, closer),
            None => self.lex_command(0, Closer::Eof),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position.offset..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position.advance(ch);
        Some(ch)
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn set_top(&mut self, mode: Mode) {
        if let Some(top) = self.modes.last_mut() {
            *top = mode;
        }
    }

    fn pop_mode(&mut self) {
        // the outermost command mode is never popped
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    fn push_substitution(&mut self, closer: Closer) {
        self.modes.push(Mode::Command { parens: 0, closer });
    }

    // ---------------------------------------------------------------
    // Command mode
    // ---------------------------------------------------------------

    fn lex_command(&mut self, parens: u32, closer: Closer) -> TokenKind {
        let assign = std::mem::take(&mut self.assign);
        let Some(ch) = self.peek_char() else {
            return TokenKind::Eof;
        };

        if let Some(strip_tabs) = self.expect_heredoc_delimiter {
            if !matches!(ch, ' ' | '\t') {
                self.expect_heredoc_delimiter = None;
                if !matches!(ch, '\n' | ';' | '|' | '&' | '<' | '>' | '(' | ')') {
                    return self.read_heredoc_delimiter(strip_tabs);
                }
            }
        }

        match ch {
            ' ' | '\t' => self.read_whitespace(false),
            '\\' if self.peek_nth(1) == Some('\n') => {
                self.advance_n(2);
                TokenKind::LineContinuation
            }
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            '#' => self.read_comment(),
            '=' if assign == AssignState::Name || self.follows_expansion() => {
                self.advance();
                self.assign = AssignState::Value;
                TokenKind::Eq
            }
            '+' if (assign == AssignState::Name || self.follows_expansion())
                && self.peek_nth(1) == Some('=') =>
            {
                self.advance_n(2);
                self.assign = AssignState::Value;
                TokenKind::AddEq
            }
            '[' if assign == AssignState::Name => {
                self.advance();
                self.modes.push(Mode::Arith {
                    parens: 0,
                    squares: 0,
                    closer: ArithCloser::Square,
                });
                self.assign = AssignState::Name;
                TokenKind::LeftSquare
            }
            '(' if assign == AssignState::Value => {
                self.advance();
                self.modes.push(Mode::Array);
                TokenKind::LeftParen
            }
            ';' | '|' | '&' | '<' | '>' => self.read_operator(),
            '(' => {
                if self.command_start && self.peek_nth(1) == Some('(') {
                    self.advance_n(2);
                    self.modes.push(Mode::Arith {
                        parens: 0,
                        squares: 0,
                        closer: ArithCloser::DoubleParen,
                    });
                    return TokenKind::DoubleLeftParen;
                }
                self.advance();
                self.set_top(Mode::Command {
                    parens: parens + 1,
                    closer,
                });
                TokenKind::LeftParen
            }
            ')' => {
                self.advance();
                if parens > 0 {
                    self.set_top(Mode::Command {
                        parens: parens - 1,
                        closer,
                    });
                } else if closer == Closer::Paren {
                    self.pop_mode();
                }
                TokenKind::RightParen
            }
            '`' => {
                self.advance();
                if closer == Closer::Backtick {
                    self.pop_mode();
                } else {
                    self.push_substitution(Closer::Backtick);
                }
                TokenKind::Backtick
            }
            '{' if self.command_start && self.is_brace_group_start() => {
                self.advance();
                TokenKind::LeftCurly
            }
            '}' if self.command_start => {
                self.advance();
                TokenKind::RightCurly
            }
            '[' if self.command_start && self.starts_with("[[") && self.is_separated_at(2) => {
                self.advance_n(2);
                self.conditionals += 1;
                TokenKind::LeftDoubleBracket
            }
            ']' if self.conditionals > 0 && self.starts_with("]]") && self.is_separated_at(2) => {
                self.advance_n(2);
                self.conditionals -= 1;
                TokenKind::RightDoubleBracket
            }
            '!' if self.command_start && self.is_separated_at(1) => {
                self.advance();
                TokenKind::Bang
            }
            _ => self.lex_word_start(),
        }
    }

    /// Shared by command and array mode: quotes, expansions and words.
    fn lex_word_start(&mut self) -> TokenKind {
        let Some(ch) = self.peek_char() else {
            return TokenKind::Eof;
        };
        match ch {
            '\'' => self.read_single_quoted(),
            '"' => {
                self.advance();
                self.modes.push(Mode::DoubleQuote);
                TokenKind::StringBegin
            }
            '$' => self.lex_dollar(),
            '0'..='9' if self.is_fd_prefix() => {
                while matches!(self.peek_char(), Some('0'..='9')) {
                    self.advance();
                }
                TokenKind::FileDescriptor
            }
            c if is_name_start(c) && self.at_word_boundary() && self.looks_like_assignment() => {
                while matches!(self.peek_char(), Some(c) if is_name_char(c)) {
                    self.advance();
                }
                self.assign = AssignState::Name;
                TokenKind::AssignmentWord
            }
            _ => self.read_word(),
        }
    }

    fn read_operator(&mut self) -> TokenKind {
        let (len, kind) = if self.starts_with(";;&") {
            (3, TokenKind::DoubleSemiAmp)
        } else if self.starts_with(";;") {
            (2, TokenKind::DoubleSemicolon)
        } else if self.starts_with(";&") {
            (2, TokenKind::SemiAmp)
        } else if self.starts_with(";") {
            (1, TokenKind::Semicolon)
        } else if self.starts_with("||") {
            (2, TokenKind::OrOr)
        } else if self.starts_with("|&") {
            (2, TokenKind::PipeAmp)
        } else if self.starts_with("|") {
            (1, TokenKind::Pipe)
        } else if self.starts_with("&&") {
            (2, TokenKind::AndAnd)
        } else if self.starts_with("&>>") {
            (3, TokenKind::AmpGreaterGreater)
        } else if self.starts_with("&>") {
            (2, TokenKind::AmpGreater)
        } else if self.starts_with("&") {
            (1, TokenKind::Amp)
        } else if self.starts_with(">>") {
            (2, TokenKind::GreaterGreater)
        } else if self.starts_with(">&") {
            (2, TokenKind::GreaterAmp)
        } else if self.starts_with(">|") {
            (2, TokenKind::GreaterPipe)
        } else if self.starts_with(">(") {
            (2, TokenKind::ProcessSubOut)
        } else if self.starts_with(">") {
            (1, TokenKind::Greater)
        } else if self.starts_with("<<<") {
            (3, TokenKind::HereString)
        } else if self.starts_with("<<-") {
            (3, TokenKind::HereDocStrip)
        } else if self.starts_with("<<") {
            (2, TokenKind::HereDoc)
        } else if self.starts_with("<&") {
            (2, TokenKind::LessAmp)
        } else if self.starts_with("<>") {
            (2, TokenKind::LessGreater)
        } else if self.starts_with("<(") {
            (2, TokenKind::ProcessSubIn)
        } else {
            (1, TokenKind::Less)
        };
        self.advance_n(len);
        match kind {
            TokenKind::ProcessSubIn | TokenKind::ProcessSubOut => {
                self.push_substitution(Closer::Paren)
            }
            TokenKind::HereDoc => self.expect_heredoc_delimiter = Some(false),
            TokenKind::HereDocStrip => self.expect_heredoc_delimiter = Some(true),
            _ => {}
        }
        kind
    }

    /// `=` or `+=` glued to a preceding `$name` or `${..}` (`export $a=$b`).
    fn follows_expansion(&self) -> bool {
        match self.last_raw {
            Some(TokenKind::Variable) => true,
            Some(TokenKind::RightCurly) => self.closed_param,
            _ => false,
        }
    }

    /// The previous token cannot glue onto a word starting here.
    fn at_word_boundary(&self) -> bool {
        match self.last_raw {
            None => true,
            Some(kind) => {
                kind.is_trivia()
                    || matches!(
                        kind,
                        TokenKind::Newline
                            | TokenKind::Semicolon
                            | TokenKind::Amp
                            | TokenKind::Pipe
                            | TokenKind::PipeAmp
                            | TokenKind::AndAnd
                            | TokenKind::OrOr
                            | TokenKind::LeftParen
                            | TokenKind::LeftCurly
                            | TokenKind::DoubleSemicolon
                            | TokenKind::SemiAmp
                            | TokenKind::DoubleSemiAmp
                            | TokenKind::Bang
                            | TokenKind::Backtick
                    )
            }
        }
    }

    /// Check if { is followed by whitespace (brace group start)
    fn is_brace_group_start(&self) -> bool {
        matches!(self.peek_nth(1), Some(' ') | Some('\t') | Some('\n') | None)
    }

    /// The char at `n` ends a word (whitespace, operator or end of input).
    fn is_separated_at(&self, n: usize) -> bool {
        matches!(
            self.peek_nth(n),
            None | Some(' ' | '\t' | '\n' | ';' | '&' | '|' | ')' | '<' | '>')
        )
    }

    /// Digits directly followed by `<` or `>` (`2>`, `10<&`).
    fn is_fd_prefix(&self) -> bool {
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        matches!(self.rest().as_bytes().get(digits), Some(b'<' | b'>'))
    }

    /// Peek past an identifier for `=`, `+=` or `[..]=`.
    fn looks_like_assignment(&self) -> bool {
        let rest = self.rest();
        let name_len = rest
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map_or(rest.len(), |(i, _)| i);
        let after = &rest[name_len..];
        if after.starts_with('=') || after.starts_with("+=") {
            return true;
        }
        if !after.starts_with('[') {
            return false;
        }
        let mut depth = 0usize;
        for (i, c) in after.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        let tail = &after[i + 1..];
                        return tail.starts_with('=') || tail.starts_with("+=");
                    }
                }
                ' ' | '\t' | '\n' | ';' | '&' | '|' => return false,
                _ => {}
            }
        }
        false
    }

    fn read_whitespace(&mut self, include_newlines: bool) -> TokenKind {
        while let Some(ch) = self.peek_char() {
            if ch == ' ' || ch == '\t' || (include_newlines && ch == '\n') {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Whitespace
    }

    fn read_comment(&mut self) -> TokenKind {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        TokenKind::Comment
    }

    fn read_single_quoted(&mut self) -> TokenKind {
        self.advance(); // consume opening '
        while let Some(ch) = self.advance() {
            if ch == '\'' {
                break;
            }
        }
        TokenKind::SingleQuoted
    }

    fn read_word(&mut self) -> TokenKind {
        let start = self.position.offset;
        while let Some(ch) = self.peek_char() {
            match ch {
                '\\' => {
                    if self.peek_nth(1) == Some('\n') {
                        break;
                    }
                    self.advance();
                    self.advance();
                }
                '(' if self.position.offset > start
                    && self.input[start..self.position.offset]
                        .ends_with(['@', '?', '*', '+', '!']) =>
                {
                    // Extglob: @(...), ?(...), *(...), +(...), !(...)
                    self.read_balanced('(', ')');
                }
                c if is_word_char(c) => {
                    self.advance();
                }
                _ => break,
            }
        }
        if self.position.offset == start {
            // a metacharacter no other rule claimed
            self.advance();
            return TokenKind::Unknown;
        }
        let text = &self.input[start..self.position.offset];
        if text.bytes().all(|b| b.is_ascii_digit()) {
            TokenKind::Number
        } else {
            TokenKind::Word
        }
    }

    fn read_balanced(&mut self, open: char, close: char) {
        let mut depth = 0usize;
        while let Some(c) = self.advance() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            } else if c == '\\' {
                self.advance();
            }
        }
    }

    // ---------------------------------------------------------------
    // Expansions
    // ---------------------------------------------------------------

    fn lex_dollar(&mut self) -> TokenKind {
        match self.peek_nth(1) {
            Some('(') | Some('{') => {
                self.advance();
                self.dollar_pending = true;
                TokenKind::Dollar
            }
            Some('\'') => {
                self.advance_n(2);
                while let Some(ch) = self.advance() {
                    match ch {
                        '\\' => {
                            self.advance();
                        }
                        '\'' => break,
                        _ => {}
                    }
                }
                TokenKind::SingleQuoted
            }
            Some('"') => {
                self.advance_n(2);
                self.modes.push(Mode::DoubleQuote);
                TokenKind::StringBegin
            }
            Some(c) if is_name_start(c) => {
                self.advance();
                while matches!(self.peek_char(), Some(c) if is_name_char(c)) {
                    self.advance();
                }
                TokenKind::Variable
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '@' | '*' | '#' | '?' | '-' | '$' | '!') => {
                self.advance_n(2);
                TokenKind::Variable
            }
            _ => {
                self.advance();
                TokenKind::Word
            }
        }
    }

    fn lex_after_dollar(&mut self) -> Option<TokenKind> {
        if self.starts_with("((") {
            self.advance_n(2);
            self.modes.push(Mode::Arith {
                parens: 0,
                squares: 0,
                closer: ArithCloser::DoubleParen,
            });
            Some(TokenKind::DoubleLeftParen)
        } else if self.starts_with("(") {
            self.advance();
            self.push_substitution(Closer::Paren);
            Some(TokenKind::LeftParen)
        } else if self.starts_with("{") {
            self.advance();
            self.modes.push(Mode::Param {
                seen_name: false,
                seen_op: false,
            });
            Some(TokenKind::LeftCurly)
        } else {
            None
        }
    }

    fn lex_double_quoted(&mut self) -> TokenKind {
        match self.peek_char() {
            Some('"') => {
                self.advance();
                self.pop_mode();
                TokenKind::StringEnd
            }
            Some('$') if !matches!(self.peek_nth(1), Some('\'') | Some('"') | None) => {
                self.lex_dollar()
            }
            Some('`') => {
                self.advance();
                self.push_substitution(Closer::Backtick);
                TokenKind::Backtick
            }
            _ => {
                let start = self.position.offset;
                while let Some(ch) = self.peek_char() {
                    match ch {
                        '"' | '`' => break,
                        '$' if self.position.offset > start => break,
                        '\\' => {
                            self.advance();
                            self.advance();
                        }
                        _ => {
                            self.advance();
                        }
                    }
                }
                TokenKind::StringContent
            }
        }
    }

    fn lex_param(&mut self, seen_name: bool, seen_op: bool) -> TokenKind {
        let Some(ch) = self.peek_char() else {
            return TokenKind::Eof;
        };
        match ch {
            '}' => {
                self.advance();
                self.pop_mode();
                self.closed_param = true;
                return TokenKind::RightCurly;
            }
            '$' => return self.lex_dollar(),
            '"' => {
                self.advance();
                self.modes.push(Mode::DoubleQuote);
                return TokenKind::StringBegin;
            }
            '\'' => return self.read_single_quoted(),
            '`' => {
                self.advance();
                self.push_substitution(Closer::Backtick);
                return TokenKind::Backtick;
            }
            _ => {}
        }

        if !seen_name {
            if matches!(ch, '#' | '!')
                && matches!(self.peek_nth(1), Some(c) if is_name_char(c) || matches!(c, '@' | '*'))
            {
                self.advance();
                return TokenKind::ParamOperator;
            }
            self.set_top(Mode::Param {
                seen_name: true,
                seen_op,
            });
            if is_name_char(ch) {
                while matches!(self.peek_char(), Some(c) if is_name_char(c)) {
                    self.advance();
                }
                return TokenKind::Word;
            }
            if matches!(ch, '@' | '*' | '#' | '?' | '-' | '$' | '!') {
                self.advance();
                return TokenKind::Word;
            }
        }

        if !seen_op {
            if ch == '[' {
                self.advance();
                self.modes.push(Mode::Arith {
                    parens: 0,
                    squares: 0,
                    closer: ArithCloser::Square,
                });
                return TokenKind::LeftSquare;
            }
            if is_param_operator_char(ch) {
                let len = if PARAM_OPERATORS.iter().any(|op| self.starts_with(op)) {
                    2
                } else {
                    1
                };
                self.advance_n(len);
                self.set_top(Mode::Param {
                    seen_name: true,
                    seen_op: true,
                });
                return TokenKind::ParamOperator;
            }
        }

        if matches!(ch, ' ' | '\t') {
            return self.read_whitespace(false);
        }
        let start = self.position.offset;
        while let Some(c) = self.peek_char() {
            match c {
                '}' | '$' | '"' | '\'' | '`' | ' ' | '\t' => break,
                '\\' => {
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        if self.position.offset == start {
            self.advance();
            return TokenKind::Unknown;
        }
        TokenKind::Word
    }

    fn lex_arith(&mut self, parens: u32, squares: u32, closer: ArithCloser) -> TokenKind {
        let Some(ch) = self.peek_char() else {
            return TokenKind::Eof;
        };
        let set = |lexer: &mut Self, parens: u32, squares: u32| {
            lexer.set_top(Mode::Arith {
                parens,
                squares,
                closer,
            })
        };
        match ch {
            ' ' | '\t' | '\n' => self.read_whitespace(true),
            '\\' if self.peek_nth(1) == Some('\n') => {
                self.advance_n(2);
                TokenKind::LineContinuation
            }
            '0'..='9' => {
                while matches!(self.peek_char(), Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '#' | '@'))
                {
                    self.advance();
                }
                TokenKind::Number
            }
            c if is_name_start(c) => {
                while matches!(self.peek_char(), Some(c) if is_name_char(c)) {
                    self.advance();
                }
                TokenKind::Word
            }
            '$' => self.lex_dollar(),
            '"' => {
                self.advance();
                self.modes.push(Mode::DoubleQuote);
                TokenKind::StringBegin
            }
            '\'' => self.read_single_quoted(),
            '`' => {
                self.advance();
                self.push_substitution(Closer::Backtick);
                TokenKind::Backtick
            }
            '(' => {
                self.advance();
                set(self, parens + 1, squares);
                TokenKind::LeftParen
            }
            ')' => {
                if parens > 0 {
                    self.advance();
                    set(self, parens - 1, squares);
                    return TokenKind::RightParen;
                }
                if closer == ArithCloser::DoubleParen && self.starts_with("))") {
                    self.advance_n(2);
                    self.pop_mode();
                    return TokenKind::DoubleRightParen;
                }
                // unbalanced: leave arithmetic so the rest of the line lexes normally
                self.advance();
                self.pop_mode();
                TokenKind::RightParen
            }
            '[' => {
                self.advance();
                set(self, parens, squares + 1);
                TokenKind::LeftSquare
            }
            ']' => {
                self.advance();
                if squares > 0 {
                    set(self, parens, squares - 1);
                } else if closer == ArithCloser::Square {
                    self.pop_mode();
                }
                TokenKind::RightSquare
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            '@' => {
                self.advance();
                TokenKind::Word
            }
            _ => {
                if let Some(op) = ARITH_OPERATORS.iter().find(|op| self.starts_with(op)) {
                    self.advance_n(op.len());
                    TokenKind::ArithOperator
                } else {
                    self.advance();
                    TokenKind::Unknown
                }
            }
        }
    }

    fn lex_array(&mut self) -> TokenKind {
        let assign = std::mem::take(&mut self.assign);
        let Some(ch) = self.peek_char() else {
            return TokenKind::Eof;
        };
        match ch {
            ' ' | '\t' => self.read_whitespace(false),
            '\\' if self.peek_nth(1) == Some('\n') => {
                self.advance_n(2);
                TokenKind::LineContinuation
            }
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            '#' => self.read_comment(),
            ')' => {
                self.advance();
                self.pop_mode();
                TokenKind::RightParen
            }
            '(' => {
                self.advance();
                TokenKind::LeftParen
            }
            '[' => {
                self.advance();
                self.modes.push(Mode::Arith {
                    parens: 0,
                    squares: 0,
                    closer: ArithCloser::Square,
                });
                self.assign = AssignState::Name;
                TokenKind::LeftSquare
            }
            '=' if assign == AssignState::Name => {
                self.advance();
                TokenKind::Eq
            }
            '+' if assign == AssignState::Name && self.peek_nth(1) == Some('=') => {
                self.advance_n(2);
                TokenKind::AddEq
            }
            ';' | '|' | '&' | '<' | '>' => {
                // an operator cannot appear in an array literal: it was never closed
                self.pop_mode();
                self.read_operator()
            }
            '`' => {
                self.advance();
                self.push_substitution(Closer::Backtick);
                TokenKind::Backtick
            }
            _ => self.lex_word_start(),
        }
    }

    // ---------------------------------------------------------------
    // Here-documents
    // ---------------------------------------------------------------

    fn read_heredoc_delimiter(&mut self, strip_tabs: bool) -> TokenKind {
        let start = self.position.offset;
        let mut delimiter = String::new();
        let mut quote: Option<char> = None;
        while let Some(ch) = self.peek_char() {
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => delimiter.push(ch),
                None => match ch {
                    '\'' | '"' => quote = Some(ch),
                    '\\' => {
                        self.advance();
                        if let Some(next) = self.peek_char() {
                            delimiter.push(next);
                        } else {
                            break;
                        }
                    }
                    c if is_word_char(c) => delimiter.push(c),
                    _ => break,
                },
            }
            self.advance();
        }
        if self.position.offset == start {
            self.advance();
        }
        self.heredocs.push_back(PendingHereDoc {
            delimiter,
            strip_tabs,
        });
        TokenKind::Word
    }

    /// Read here document content until the delimiter line is found
    fn lex_heredoc(&mut self) -> TokenKind {
        let Some(pending) = self.heredocs.front().cloned() else {
            self.heredoc_phase = HereDocPhase::Idle;
            return self.next_kind();
        };
        let rest = self.rest();
        let mut offset = 0;
        let mut terminator: Option<usize> = None;
        while offset < rest.len() {
            let line_end = rest[offset..].find('\n').map_or(rest.len(), |i| offset + i);
            let line = &rest[offset..line_end];
            let candidate = if pending.strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line
            };
            if candidate == pending.delimiter {
                terminator = Some(line_end);
                break;
            }
            offset = (line_end + 1).min(rest.len());
        }

        match (self.heredoc_phase, terminator) {
            (HereDocPhase::Body, Some(_)) if offset > 0 => {
                self.advance_to(self.position.offset + offset);
                self.heredoc_phase = HereDocPhase::Terminator;
                TokenKind::HereDocContent
            }
            (_, Some(end)) => {
                self.advance_to(self.position.offset + end);
                self.finish_heredoc();
                TokenKind::HereDocEnd
            }
            (_, None) => {
                self.advance_to(self.input.len());
                self.finish_heredoc();
                TokenKind::HereDocContent
            }
        }
    }

    fn finish_heredoc(&mut self) {
        self.heredocs.pop_front();
        self.heredoc_phase = HereDocPhase::Idle;
    }

    fn advance_to(&mut self, offset: usize) {
        while self.position.offset < offset {
            if self.advance().is_none() {
                break;
            }
        }
    }
}

/// Lex a whole script.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_param_operator_char(c: char) -> bool {
    matches!(c, ':' | '-' | '=' | '+' | '?' | '#' | '%' | '/' | '^' | ',' | '@')
}

fn is_word_char(ch: char) -> bool {
    !matches!(
        ch,
        ' ' | '\t'
            | '\n'
            | ';'
            | '|'
            | '&'
            | '>'
            | '<'
            | '('
            | ')'
            | '\''
            | '"'
            | '`'
            | '$'
    )
}
