//! shsyntax - Error-tolerant parser for bash scripts
//!
//! Produces a lossless syntax tree for any input. Malformed regions become
//! error nodes with a message, and parsing resumes at the next statement, so
//! editors and linters get a complete tree even for half-typed scripts.
//!
//! # Example
//!
//! ```rust
//! let parse = shsyntax::parse("export a=(1 [10]=2 3)")?;
//! assert!(!parse.has_errors());
//!
//! let defs = parse.tree().var_defs();
//! assert_eq!(defs.len(), 1);
//! assert_eq!(defs[0].text(), "a=(1 [10]=2 3)");
//! # Ok::<(), shsyntax::Error>(())
//! ```
//!
//! # Nesting
//!
//! Deeply nested input (`((((...))))`, `$($($(...)))`) is bounded by
//! [`ParseLimits::max_depth`]. Past the ceiling the innermost region becomes a
//! single error node with the message [`DEPTH_EXCEEDED_MESSAGE`] and the rest
//! of the file parses normally.
//!
//! ```rust
//! use shsyntax::{DEPTH_EXCEEDED_MESSAGE, Parser, ParserOptions};
//!
//! let options = ParserOptions::new().max_depth(2);
//! let parse = Parser::with_options("( ( ( a ) ) )\necho ok", options).parse()?;
//! let diagnostics = parse.diagnostics();
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].message, DEPTH_EXCEEDED_MESSAGE);
//! # Ok::<(), shsyntax::Error>(())
//! ```

mod error;
mod limits;
#[cfg_attr(not(feature = "logging"), allow(dead_code))]
mod logging_impl;
pub mod parser;

pub use error::{Error, Result};
pub use limits::{DEFAULT_MAX_DEPTH, ParseLimits};
pub use logging_impl::LogConfig;
pub use parser::recovery::DEPTH_EXCEEDED_MESSAGE;
pub use parser::{
    Diagnostic, Node, NodeKind, NodeOrToken, Parse, ParseStats, Parser, ParserOptions, Span,
    SyntaxTree, Token, TokenKind,
};

/// Parse `script` with default options.
///
/// Shorthand for `Parser::new(script).parse()`.
pub fn parse(script: &str) -> Result<Parse> {
    Parser::new(script).parse()
}
