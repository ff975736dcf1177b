//! Event-based tree builder
//!
//! Grammar rules open a [`Marker`], consume tokens, and then close the marker
//! exactly once: [`complete`](TreeBuilder::complete) with a kind,
//! [`error`](TreeBuilder::error) with a message, or
//! [`rollback`](TreeBuilder::rollback) to discard the node and rewind the
//! token cursor. Markers close in LIFO order. Closing produces events; the
//! tree is materialized once, iteratively, by [`finish`](TreeBuilder::finish).
//!
//! A completed node can be wrapped after the fact with
//! [`open_before`](TreeBuilder::open_before), which is how left-nested lists
//! (`a && b || c`) are built without recursion.
//!
//! Discipline violations never panic. The first one is recorded and returned
//! from `finish`.

use serde::Serialize;
use thiserror::Error;

use super::ast::{Child, NodeData, NodeId, NodeKind, SyntaxTree};
use super::source::{SourcePos, TokenSource};
use super::span::{Position, Span};
use super::tokens::{Token, TokenKind};
use crate::error::{Error, Result};

/// Marker discipline violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// The marker is not open in this builder (closed before, or foreign).
    #[error("marker {0} is not open")]
    AlreadyClosed(u32),

    /// An outer marker was closed while an inner one was still open.
    #[error("marker {closed} closed while marker {innermost} is still open")]
    OutOfOrder { closed: u32, innermost: u32 },

    /// Markers were still open when the tree was finished.
    #[error("{0} marker(s) left open")]
    DanglingMarkers(usize),

    /// Tokens or nodes ended up outside the root node.
    #[error("content outside the root node")]
    Unrooted,
}

/// Handle for an open node.
#[must_use = "a marker must be completed, closed as an error, or rolled back"]
#[derive(Debug)]
pub struct Marker {
    id: u32,
    event: usize,
    source: SourcePos,
    /// Start event of the node this marker wraps, if opened with `open_before`
    wraps: Option<usize>,
}

/// Handle for a closed node, usable with [`TreeBuilder::open_before`].
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    event: usize,
    kind: NodeKind,
}

impl CompletedMarker {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// Counters for marker lifecycle checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuilderStats {
    pub opened: usize,
    pub completed: usize,
    pub errored: usize,
    pub rolled_back: usize,
}

impl BuilderStats {
    /// Every opened marker was closed exactly once.
    pub fn balanced(&self) -> bool {
        self.opened == self.completed + self.errored + self.rolled_back
    }
}

#[derive(Debug)]
enum Event {
    Start {
        kind: Option<NodeKind>,
        message: Option<String>,
        /// Offset to the Start event of the node that wraps this one
        forward_parent: Option<usize>,
        position: Position,
    },
    Token(Token),
    Finish,
    Tombstone,
}

/// Accumulates parse events over a [`TokenSource`].
#[derive(Debug)]
pub struct TreeBuilder {
    source: TokenSource,
    events: Vec<Event>,
    /// Ids of open markers, innermost last
    open: Vec<u32>,
    next_id: u32,
    stats: BuilderStats,
    violation: Option<Error>,
    /// End of the last token
    end: Position,
}

impl TreeBuilder {
    pub fn new(source: TokenSource) -> Self {
        let end = source
            .peek_token(source.len().saturating_sub(1))
            .map_or(Position::new(), |t| t.span.end);
        Self {
            source,
            events: Vec::new(),
            open: Vec::new(),
            next_id: 0,
            stats: BuilderStats::default(),
            violation: None,
            end,
        }
    }

    /// Raw lookahead, trivia included.
    pub fn peek(&self, n: usize) -> TokenKind {
        self.source.peek(n)
    }

    pub fn peek_token(&self, n: usize) -> Option<&Token> {
        self.source.peek_token(n)
    }

    pub fn peek_text(&self, n: usize) -> &str {
        self.source.peek_text(n)
    }

    /// Number of tokens consumed so far.
    pub fn consumed(&self) -> usize {
        self.source.consumed()
    }

    /// Move the current token into the innermost open node.
    pub fn bump(&mut self) {
        match self.source.advance() {
            Ok(token) => self.events.push(Event::Token(token)),
            Err(err) => self.record(err.into()),
        }
    }

    /// Open a node at the current cursor.
    pub fn open(&mut self) -> Marker {
        let event = self.events.len();
        let position = self.next_position();
        self.events.push(Event::Start {
            kind: None,
            message: None,
            forward_parent: None,
            position,
        });
        self.push_marker(event, None)
    }

    /// Open a node that will wrap the already completed `child`.
    pub fn open_before(&mut self, child: &CompletedMarker) -> Marker {
        let event = self.events.len();
        let position = match &self.events[child.event] {
            Event::Start { position, .. } => *position,
            _ => self.next_position(),
        };
        self.events.push(Event::Start {
            kind: None,
            message: None,
            forward_parent: None,
            position,
        });
        if let Event::Start { forward_parent, .. } = &mut self.events[child.event] {
            *forward_parent = Some(event - child.event);
        }
        self.push_marker(event, Some(child.event))
    }

    fn push_marker(&mut self, event: usize, wraps: Option<usize>) -> Marker {
        let id = self.next_id;
        self.next_id += 1;
        self.open.push(id);
        self.stats.opened += 1;
        Marker {
            id,
            event,
            source: self.source.mark(),
            wraps,
        }
    }

    /// Close `marker` as a node of `kind`.
    pub fn complete(&mut self, marker: Marker, kind: NodeKind) -> CompletedMarker {
        self.stats.completed += 1;
        self.close(marker, kind, None)
    }

    /// Close `marker` as an error node carrying `message`.
    pub fn error(&mut self, marker: Marker, message: impl Into<String>) -> CompletedMarker {
        self.stats.errored += 1;
        self.close(marker, NodeKind::Error, Some(message.into()))
    }

    fn close(&mut self, marker: Marker, kind: NodeKind, msg: Option<String>) -> CompletedMarker {
        self.pop_marker(marker.id);
        if let Some(Event::Start { kind: k, message, .. }) = self.events.get_mut(marker.event) {
            *k = Some(kind);
            *message = msg;
        }
        self.events.push(Event::Finish);
        CompletedMarker {
            event: marker.event,
            kind,
        }
    }

    /// Discard `marker`, everything recorded inside it, and rewind the cursor.
    pub fn rollback(&mut self, marker: Marker) {
        self.stats.rolled_back += 1;
        self.pop_marker(marker.id);
        if let Some(wrapped) = marker.wraps {
            if let Some(Event::Start { forward_parent, .. }) = self.events.get_mut(wrapped) {
                *forward_parent = None;
            }
        }
        self.events.truncate(marker.event);
        if let Err(err) = self.source.rollback(marker.source) {
            self.record(err.into());
        }
    }

    /// Tokens were consumed since `marker` was opened.
    pub fn consumed_since(&self, marker: &Marker) -> bool {
        self.source.consumed() > marker.source.index()
    }

    pub fn stats(&self) -> BuilderStats {
        self.stats
    }

    /// Record a violation found outside the builder (first one wins).
    pub fn record(&mut self, err: Error) {
        if self.violation.is_none() {
            self.violation = Some(err);
        }
    }

    fn pop_marker(&mut self, id: u32) {
        match self.open.last() {
            Some(&top) if top == id => {
                self.open.pop();
            }
            Some(&top) => {
                if let Some(idx) = self.open.iter().rposition(|&open| open == id) {
                    self.open.remove(idx);
                    self.record(
                        BuilderError::OutOfOrder {
                            closed: id,
                            innermost: top,
                        }
                        .into(),
                    );
                } else {
                    self.record(BuilderError::AlreadyClosed(id).into());
                }
            }
            None => self.record(BuilderError::AlreadyClosed(id).into()),
        }
    }

    fn next_position(&self) -> Position {
        self.source
            .peek_token(0)
            .map_or(self.end, |t| t.span.start)
    }

    /// Materialize the tree.
    pub fn finish(self) -> Result<(SyntaxTree, BuilderStats)> {
        if let Some(err) = self.violation {
            return Err(err);
        }
        if !self.open.is_empty() {
            return Err(BuilderError::DanglingMarkers(self.open.len()).into());
        }
        if !self.source.at_end() {
            return Err(Error::Internal(format!(
                "{} token(s) left unconsumed",
                self.source.len() - self.source.consumed()
            )));
        }
        let stats = self.stats;
        let tree = build(self.events)?;
        Ok((tree, stats))
    }
}

/// Replay events into an arena, resolving forward parents.
fn build(mut events: Vec<Event>) -> Result<SyntaxTree> {
    let mut nodes: Vec<NodeData> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut chain: Vec<(NodeKind, Option<String>, Position)> = Vec::new();

    for i in 0..events.len() {
        match std::mem::replace(&mut events[i], Event::Tombstone) {
            Event::Start {
                kind,
                message,
                forward_parent,
                position,
            } => {
                let Some(kind) = kind else { continue };
                chain.push((kind, message, position));
                let mut idx = i;
                let mut next = forward_parent;
                while let Some(offset) = next {
                    idx += offset;
                    next = None;
                    if let Event::Start {
                        kind: Some(kind),
                        message,
                        forward_parent,
                        position,
                    } = std::mem::replace(&mut events[idx], Event::Tombstone)
                    {
                        chain.push((kind, message, position));
                        next = forward_parent;
                    }
                }
                for (kind, message, position) in chain.drain(..).rev() {
                    let parent = stack.last().copied();
                    if parent.is_none() && !nodes.is_empty() {
                        return Err(BuilderError::Unrooted.into());
                    }
                    let id = NodeId(nodes.len() as u32);
                    nodes.push(NodeData {
                        kind,
                        span: Span::at(position),
                        parent,
                        children: Vec::new(),
                        message,
                    });
                    if let Some(parent) = parent {
                        nodes[parent.index()].children.push(Child::Node(id));
                    }
                    stack.push(id);
                }
            }
            Event::Token(token) => {
                let Some(&top) = stack.last() else {
                    return Err(BuilderError::Unrooted.into());
                };
                nodes[top.index()].children.push(Child::Token(token));
            }
            Event::Finish => {
                let Some(id) = stack.pop() else {
                    return Err(BuilderError::Unrooted.into());
                };
                let span = {
                    let children = &nodes[id.index()].children;
                    let first = children.first().map(|c| child_span(&nodes, c));
                    let last = children.last().map(|c| child_span(&nodes, c));
                    match (first, last) {
                        (Some(first), Some(last)) => first.merge(last),
                        _ => nodes[id.index()].span,
                    }
                };
                nodes[id.index()].span = span;
            }
            Event::Tombstone => {}
        }
    }

    if nodes.is_empty() || !stack.is_empty() {
        return Err(BuilderError::Unrooted.into());
    }
    Ok(SyntaxTree::from_nodes(nodes))
}

fn child_span(nodes: &[NodeData], child: &Child) -> Span {
    match child {
        Child::Token(t) => t.span,
        Child::Node(id) => nodes[id.index()].span,
    }
}
