//! Token source with bounded lookahead and backtracking
//!
//! The grammar reads tokens only through [`TokenSource`]: `peek` never moves
//! the cursor, `advance` moves it by one, and `mark`/`rollback` restore an
//! earlier cursor. Lookahead is raw; the parser decides what counts as trivia.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::tokens::{Token, TokenKind};

/// Identity handed to each new source so `rollback` can reject positions
/// marked on another one. This counter is the only state shared between
/// parses; it carries no parse data, and concurrent parsers only ever see
/// distinct IDs.
static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(0);

/// Misuse of a [`TokenSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenSourceError {
    /// `advance` was called with the cursor at end of input.
    #[error("advance past end of input")]
    EndOfInput,

    /// `rollback` got a position from another source or from the future.
    #[error("invalid source position {position} (cursor at {cursor})")]
    InvalidPosition { position: usize, cursor: usize },
}

/// Opaque cursor position returned by [`TokenSource::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    source: u64,
    index: usize,
}

impl SourcePos {
    /// Index of the next token at the time of marking.
    pub fn index(self) -> usize {
        self.index
    }
}

/// Cursor over a lexed token sequence.
#[derive(Debug)]
pub struct TokenSource {
    id: u64,
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
            tokens,
            cursor: 0,
        }
    }

    /// Kind of the token `n` positions ahead; `Eof` past the end.
    pub fn peek(&self, n: usize) -> TokenKind {
        self.peek_token(n).map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Token `n` positions ahead, if any.
    pub fn peek_token(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.cursor + n)
    }

    /// Text of the token `n` positions ahead; empty past the end.
    pub fn peek_text(&self, n: usize) -> &str {
        self.peek_token(n).map_or("", |t| t.text.as_str())
    }

    /// Consume the current token.
    pub fn advance(&mut self) -> Result<Token, TokenSourceError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or(TokenSourceError::EndOfInput)?;
        self.cursor += 1;
        Ok(token)
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Remember the current cursor.
    pub fn mark(&self) -> SourcePos {
        SourcePos {
            source: self.id,
            index: self.cursor,
        }
    }

    /// Restore a cursor obtained from [`mark`](Self::mark).
    ///
    /// Only positions at or before the current cursor are accepted.
    pub fn rollback(&mut self, pos: SourcePos) -> Result<(), TokenSourceError> {
        if pos.source != self.id || pos.index > self.cursor {
            return Err(TokenSourceError::InvalidPosition {
                position: pos.index,
                cursor: self.cursor,
            });
        }
        self.cursor = pos.index;
        Ok(())
    }

    /// Number of tokens consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
