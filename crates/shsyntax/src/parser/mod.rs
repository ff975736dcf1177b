//! Parser module for shsyntax
//!
//! Implements an error-tolerant recursive descent parser for bash scripts.
//! Rules read tokens from a [`TokenSource`] through the [`TreeBuilder`],
//! open markers for the nodes they recognize, and report failure as a
//! [`RuleFailure`] value. Malformed input becomes error nodes; it never
//! aborts the parse.

pub mod ast;
pub mod builder;
mod grammar;
pub mod lexer;
pub mod recovery;
pub mod source;
pub mod span;
pub mod tokens;

pub use ast::{Diagnostic, Node, NodeId, NodeKind, NodeOrToken, SyntaxTree};
pub use builder::{BuilderStats, CompletedMarker, Marker, TreeBuilder};
pub use lexer::Lexer;
pub use source::{SourcePos, TokenSource};
pub use span::{Position, Span};
pub use tokens::{Token, TokenKind};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::limits::{ParseLimits, RecursionGuard};
use crate::logging_impl::LogConfig;
use recovery::Stop;

/// Outcome of a grammar rule.
pub type ParseResult = std::result::Result<CompletedMarker, RuleFailure>;

/// Why a grammar rule did not produce its node.
#[derive(Debug, Clone, Copy)]
pub enum RuleFailure {
    /// The first token does not start this construct; nothing was consumed.
    NotApplicable,
    /// The rule started, found nothing it could keep, and rewound.
    RolledBack,
    /// The rule consumed input and closed it as an error node.
    Recovered(CompletedMarker),
    /// The nesting limit was hit; the region is an error node.
    DepthExceeded(CompletedMarker),
}

/// Options for a single parse.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub limits: ParseLimits,
    pub log: LogConfig,
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Shorthand for `limits(ParseLimits::new().max_depth(depth))`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.limits.max_depth = depth;
        self
    }

    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}

/// Counters collected during a parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub tokens: usize,
    pub markers: BuilderStats,
    /// Deepest nesting level reached
    pub peak_depth: usize,
    /// Constructs skipped at the nesting limit
    pub depth_trips: usize,
}

/// A finished parse: the tree plus statistics.
#[derive(Debug, Clone)]
pub struct Parse {
    tree: SyntaxTree,
    stats: ParseStats,
}

impl Parse {
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn into_tree(self) -> SyntaxTree {
        self.tree
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Error nodes as diagnostics, in source order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.tree.diagnostics()
    }

    pub fn has_errors(&self) -> bool {
        !self.tree.errors().is_empty()
    }
}

/// Parser for bash scripts.
pub struct Parser {
    builder: TreeBuilder,
    guard: RecursionGuard,
    /// Closers of enclosing constructs, innermost last
    stops: Vec<Stop>,
    options: ParserOptions,
    tokens: usize,
}

impl Parser {
    /// Create a new parser for the given input.
    pub fn new(input: &str) -> Self {
        Self::with_options(input, ParserOptions::default())
    }

    pub fn with_options(input: &str, options: ParserOptions) -> Self {
        #[cfg(feature = "logging")]
        tracing::debug!(
            script = %crate::logging_impl::format_script_for_log(input, &options.log),
            max_depth = options.limits.max_depth,
            "lexing script"
        );
        Self::from_tokens(lexer::tokenize(input), options)
    }

    /// Parse an already lexed token sequence covering the whole input.
    pub fn from_tokens(tokens: Vec<Token>, options: ParserOptions) -> Self {
        let count = tokens.len();
        Self {
            builder: TreeBuilder::new(TokenSource::new(tokens)),
            guard: RecursionGuard::new(&options.limits),
            stops: Vec::new(),
            options,
            tokens: count,
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse the input and return the tree.
    ///
    /// Malformed scripts still return `Ok`; their problems are error nodes.
    /// `Err` means the parser broke its own invariants.
    pub fn parse(mut self) -> Result<Parse> {
        grammar::file(&mut self);

        if self.guard.depth() != 0 {
            self.builder.record(Error::Internal(format!(
                "nesting depth {} left after parse",
                self.guard.depth()
            )));
        }
        let peak_depth = self.guard.peak();
        let depth_trips = self.guard.trips();
        let tokens = self.tokens;
        let (tree, markers) = self.builder.finish()?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            tokens,
            nodes = tree.len(),
            errors = tree.errors().len(),
            peak_depth,
            "parse finished"
        );

        Ok(Parse {
            tree,
            stats: ParseStats {
                tokens,
                markers,
                peak_depth,
                depth_trips,
            },
        })
    }

    // ---------------------------------------------------------------
    // Lookahead
    // ---------------------------------------------------------------

    /// Raw lookahead, trivia included.
    pub(crate) fn raw(&self, n: usize) -> TokenKind {
        self.builder.peek(n)
    }

    pub(crate) fn raw_text(&self, n: usize) -> &str {
        self.builder.peek_text(n)
    }

    /// Raw index of the `n`th significant token ahead.
    fn nth_index(&self, n: usize) -> usize {
        let mut seen = 0;
        let mut i = 0;
        loop {
            let kind = self.raw(i);
            if kind == TokenKind::Eof {
                return i;
            }
            if !kind.is_trivia() {
                if seen == n {
                    return i;
                }
                seen += 1;
            }
            i += 1;
        }
    }

    /// Kind of the `n`th significant token ahead.
    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.raw(self.nth_index(n))
    }

    pub(crate) fn nth_text(&self, n: usize) -> &str {
        self.raw_text(self.nth_index(n))
    }

    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(crate) fn current_text(&self) -> &str {
        self.nth_text(0)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// At a reserved word (only meaningful in command position).
    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.current() == TokenKind::Word && self.current_text() == keyword
    }

    /// At a closer of any enclosing construct.
    pub(crate) fn at_stop(&self) -> bool {
        self.stops.iter().any(|stop| match *stop {
            Stop::Token(kind) => self.at(kind),
            Stop::Keyword(keyword) => self.at_keyword(keyword),
        })
    }

    // ---------------------------------------------------------------
    // Consuming
    // ---------------------------------------------------------------

    pub(crate) fn eat_trivia(&mut self) {
        while self.raw(0).is_trivia() {
            self.builder.bump();
        }
    }

    /// Consume leading trivia and the next significant token.
    pub(crate) fn bump(&mut self) {
        self.eat_trivia();
        if self.raw(0) != TokenKind::Eof {
            self.builder.bump();
        }
    }

    /// Consume exactly the next raw token.
    pub(crate) fn bump_raw(&mut self) {
        if self.raw(0) != TokenKind::Eof {
            self.builder.bump();
        }
    }

    /// Consume every remaining token, trivia or not.
    pub(crate) fn bump_rest(&mut self) {
        while self.raw(0) != TokenKind::Eof {
            self.builder.bump();
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    /// Consume `kind` or leave a zero-width "expected" error.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.missing(&format!("expected {what}"));
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            self.missing(&format!("expected '{keyword}'"));
            false
        }
    }

    /// Zero-width error node at the cursor.
    pub(crate) fn missing(&mut self, message: &str) {
        let m = self.builder.open();
        self.builder.error(m, message);
    }

    // ---------------------------------------------------------------
    // Markers
    // ---------------------------------------------------------------

    /// Open a node at the next significant token; leading trivia stays outside.
    pub(crate) fn open(&mut self) -> Marker {
        self.eat_trivia();
        self.builder.open()
    }

    /// Open a node exactly at the cursor (inside a word).
    pub(crate) fn open_raw(&mut self) -> Marker {
        self.builder.open()
    }

    pub(crate) fn open_before(&mut self, child: &CompletedMarker) -> Marker {
        self.builder.open_before(child)
    }

    pub(crate) fn complete(&mut self, m: Marker, kind: NodeKind) -> CompletedMarker {
        self.builder.complete(m, kind)
    }

    pub(crate) fn error(&mut self, m: Marker, message: &str) -> CompletedMarker {
        self.builder.error(m, message)
    }

    pub(crate) fn rollback(&mut self, m: Marker) {
        self.builder.rollback(m)
    }

    pub(crate) fn consumed_since(&self, m: &Marker) -> bool {
        self.builder.consumed_since(m)
    }

    // ---------------------------------------------------------------
    // Nesting
    // ---------------------------------------------------------------

    /// Run `rule` with `stops` added to the enclosing closers.
    pub(crate) fn with_stops<R>(&mut self, stops: &[Stop], rule: impl FnOnce(&mut Self) -> R) -> R {
        let len = self.stops.len();
        self.stops.extend_from_slice(stops);
        let result = rule(self);
        self.stops.truncate(len);
        result
    }

    /// Run `rule` inside a substitution, where only `closer` ends the list.
    pub(crate) fn in_substitution<R>(
        &mut self,
        closer: Stop,
        rule: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let outer = std::mem::replace(&mut self.stops, vec![closer]);
        let result = rule(self);
        self.stops = outer;
        result
    }

    /// An unescaped backtick here closes a substitution.
    pub(crate) fn inside_backticks(&self) -> bool {
        self.stops.contains(&Stop::Token(TokenKind::Backtick))
    }

    /// Run a nesting rule one level deeper.
    ///
    /// `m` must be open at the construct's first token. At the nesting limit
    /// the construct is skipped up to its balanced closer and `m` becomes the
    /// depth error node; the fixed message is used for the first trip in a file.
    pub(crate) fn guarded(
        &mut self,
        m: Marker,
        rule: impl FnOnce(&mut Self, Marker) -> ParseResult,
    ) -> ParseResult {
        match self.guard.enter() {
            Ok(token) => {
                let result = rule(self, m);
                self.guard.exit(token);
                result
            }
            Err(_exceeded) => {
                #[cfg(feature = "logging")]
                tracing::warn!(
                    depth = _exceeded.depth,
                    max = _exceeded.max,
                    "nesting limit reached, skipping construct"
                );
                recovery::skip_nested_region(self);
                let message = if self.guard.trips() == 1 {
                    recovery::DEPTH_EXCEEDED_MESSAGE
                } else {
                    recovery::DEPTH_SKIPPED_MESSAGE
                };
                Err(RuleFailure::DepthExceeded(self.error(m, message)))
            }
        }
    }

    #[cfg(feature = "logging")]
    pub(crate) fn log_config(&self) -> &LogConfig {
        &self.options.log
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Parse {
        Parser::new(input).parse().unwrap()
    }

    fn top_kinds(parse: &Parse) -> Vec<NodeKind> {
        parse.tree().root().child_nodes().map(|n| n.kind()).collect()
    }

    #[test]
    fn test_parse_simple_command() {
        let parse = parse("echo hello");
        assert_eq!(top_kinds(&parse), vec![NodeKind::SimpleCommand]);
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        let words: Vec<String> = cmd.child_nodes().map(|w| w.text()).collect();
        assert_eq!(words, vec!["echo", "hello"]);
    }

    #[test]
    fn test_parse_variable() {
        let parse = parse("echo $HOME");
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        let arg = cmd.child_nodes().nth(1).unwrap();
        assert_eq!(arg.kind(), NodeKind::Word);
        assert_eq!(arg.child_tokens().next().unwrap().kind, TokenKind::Variable);
    }

    #[test]
    fn test_parse_pipeline() {
        let parse = parse("echo hello | cat");
        assert_eq!(top_kinds(&parse), vec![NodeKind::Pipeline]);
        let pipeline = parse.tree().root().child_nodes().next().unwrap();
        assert_eq!(pipeline.child_nodes().count(), 2);
    }

    #[test]
    fn test_parse_redirect_out() {
        let parse = parse("echo hello > /tmp/out");
        let cmd = parse.tree().root().child_nodes().next().unwrap();
        let redirect = cmd
            .child_nodes()
            .find(|n| n.kind() == NodeKind::Redirect)
            .unwrap();
        assert_eq!(redirect.text(), "> /tmp/out");
    }

    #[test]
    fn test_parse_command_list_and_or() {
        let parse = parse("true && echo success || echo fallback");
        assert_eq!(top_kinds(&parse), vec![NodeKind::AndOrList]);
        let outer = parse.tree().root().child_nodes().next().unwrap();
        // left-nested: ((true && echo success) || echo fallback)
        let inner = outer.child_nodes().next().unwrap();
        assert_eq!(inner.kind(), NodeKind::AndOrList);
        assert_eq!(inner.text(), "true && echo success");
    }

    #[test]
    fn test_file_covers_whole_input() {
        let input = "  # leading\necho a ;  echo b  \n\n";
        let parse = parse(input);
        assert_eq!(parse.tree().root().text(), input);
        assert_eq!(parse.tree().root().span().range(), 0..input.len());
    }

    #[test]
    fn test_empty_input() {
        let parse = parse("");
        assert_eq!(parse.tree().root().kind(), NodeKind::File);
        assert!(parse.tree().root().span().is_empty());
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_unexpected_closer_is_one_error() {
        let parse = parse("echo a\n) b c\necho d");
        let diagnostics = parse.diagnostics();
        assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
        assert_eq!(top_kinds(&parse).last(), Some(&NodeKind::SimpleCommand));
    }

    #[test]
    fn test_stats_are_balanced() {
        let parse = parse("if a; then (b | c) && { d; }; fi; x=(1 2");
        let stats = parse.stats();
        assert!(stats.markers.balanced(), "{stats:?}");
        assert_eq!(stats.depth_trips, 0);
        assert!(stats.peak_depth >= 3);
    }

    #[test]
    fn test_options_builder() {
        let options = ParserOptions::new().max_depth(3);
        assert_eq!(options.limits.max_depth, 3);
        let parse = Parser::with_options("( ( ( ( a ) ) ) )", options)
            .parse()
            .unwrap();
        assert_eq!(parse.stats().depth_trips, 1);
        assert_eq!(
            parse.diagnostics()[0].message,
            recovery::DEPTH_EXCEEDED_MESSAGE
        );
    }
}
