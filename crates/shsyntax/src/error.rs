//! Error types for shsyntax
//!
//! Malformed scripts never produce an [`Error`]: syntax problems become error
//! nodes in the tree. These errors report misuse of the parser's own
//! machinery, which indicates a bug rather than bad input.

use thiserror::Error;

use crate::parser::builder::BuilderError;
use crate::parser::source::TokenSourceError;

/// Result type alias using shsyntax's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// shsyntax error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The token cursor was driven past the end or rolled back to a bad position.
    #[error("internal parser error: {0}")]
    TokenSource(#[from] TokenSourceError),

    /// Markers were closed twice, out of order, or left open.
    #[error("internal parser error: {0}")]
    Builder(#[from] BuilderError),

    /// Internal error for unexpected failures.
    ///
    /// Use this for logic errors that indicate a bug in a grammar rule.
    #[error("internal parser error: {0}")]
    Internal(String),
}
