//! Syntax tree for parsed bash scripts
//!
//! The tree is lossless: every token of the input, trivia included, is a leaf
//! of exactly one node, so the root's text is the original script. Nodes live
//! in an arena and are addressed by [`NodeId`]; [`Node`] is a borrowed view.

use std::fmt::Write as _;

use serde::Serialize;

use super::span::Span;
use super::tokens::Token;

/// Kinds of interior nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// Whole script
    File,
    /// `a && b`, `a || b` (left-nested)
    AndOrList,
    /// `a | b`, `! a`, `time a`
    Pipeline,
    /// Command name, arguments, prefix assignments and redirections
    SimpleCommand,
    /// Builtin declaration command with at least one variable definition
    VarDefCommand,
    /// Builtin declaration command without variable definitions
    BuiltinCommand,
    /// `name=value`, `name[i]=value`, `name=(...)`, bare `name`, `$a=$b`
    VarDef,
    /// `(a b [3]=c)`
    ArrayLiteral,
    /// `[3]=c` inside an array literal
    ArrayIndexedEntry,
    /// `[expr]` after a name
    Subscript,
    /// One shell word made of adjacent parts
    Word,
    /// `${...}`
    ParamExpansion,
    /// `$(...)` or `` `...` ``
    CommandSubstitution,
    /// `<(...)`, `>(...)`
    ProcessSubstitution,
    /// `$((...))`
    ArithExpansion,
    /// `(( ... ))`
    ArithCommand,
    ArithBinary,
    ArithUnary,
    ArithParen,
    ArithTernary,
    /// `( ... )`
    Subshell,
    /// `{ ...; }`
    Group,
    IfCommand,
    WhileCommand,
    UntilCommand,
    /// `for`/`select`, including the C-style form
    ForCommand,
    CaseCommand,
    /// `pattern) list ;;`
    CaseItem,
    FunctionDef,
    /// `[[ ... ]]`
    ConditionalCommand,
    /// `> file`, `2>&1`, `<<EOF`
    Redirect,
    /// Malformed region with a message
    Error,
}

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A child slot: either a nested node or a token.
#[derive(Debug, Clone)]
pub enum Child {
    Node(NodeId),
    Token(Token),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) span: Span,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<Child>,
    pub(crate) message: Option<String>,
}

/// A located error message taken from an error node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.span.start, self.message)
    }
}

/// Finished, immutable syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Build from nodes in preorder; node 0 is the root.
    pub(crate) fn from_nodes(nodes: Vec<NodeData>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes }
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    /// View of a node; `None` for ids from another tree.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All error nodes in source order.
    pub fn errors(&self) -> Vec<Node<'_>> {
        self.root()
            .descendants()
            .filter(|n| n.kind() == NodeKind::Error)
            .collect()
    }

    /// All variable definitions in source order.
    pub fn var_defs(&self) -> Vec<Node<'_>> {
        self.root()
            .descendants()
            .filter(|n| n.kind() == NodeKind::VarDef)
            .collect()
    }

    /// Error nodes as diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors()
            .into_iter()
            .map(|n| Diagnostic {
                message: n.error_message().unwrap_or_default().to_string(),
                span: n.span(),
            })
            .collect()
    }

    /// All tokens in source order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        let mut stack = vec![self.root().children_raw().iter()];
        while let Some(top) = stack.last_mut() {
            match top.next() {
                Some(Child::Token(t)) => out.push(t),
                Some(Child::Node(id)) => stack.push(self.nodes[id.index()].children.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    /// Indented listing of every node and token.
    ///
    /// ```text
    /// File@0..10
    ///   VarDefCommand@0..10
    ///     Word@0..6
    ///       Word@0..6 "export"
    /// ```
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<(usize, &Child)> = Vec::new();
        let root = Child::Node(NodeId(0));
        stack.push((0, &root));
        while let Some((depth, child)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match child {
                Child::Token(t) => {
                    let _ = writeln!(out, "{indent}{:?}@{} {:?}", t.kind, t.span, t.text);
                }
                Child::Node(id) => {
                    let data = &self.nodes[id.index()];
                    let _ = match &data.message {
                        Some(msg) => writeln!(out, "{indent}{:?}@{} {msg:?}", data.kind, data.span),
                        None => writeln!(out, "{indent}{:?}@{}", data.kind, data.span),
                    };
                    for c in data.children.iter().rev() {
                        stack.push((depth + 1, c));
                    }
                }
            }
        }
        out
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

/// A child as seen through a [`Node`] view.
#[derive(Clone, Copy)]
pub enum NodeOrToken<'t> {
    Node(Node<'t>),
    Token(&'t Token),
}

impl<'t> Node<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.index()]
    }

    fn children_raw(&self) -> &'t [Child] {
        &self.data().children
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn span(&self) -> Span {
        self.data().span
    }

    /// Message of an error node.
    pub fn error_message(&self) -> Option<&'t str> {
        self.data().message.as_deref()
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|id| Node {
            tree: self.tree,
            id,
        })
    }

    /// Children in source order.
    pub fn children(&self) -> impl Iterator<Item = NodeOrToken<'t>> + 't {
        let tree = self.tree;
        self.children_raw().iter().map(move |c| match c {
            Child::Node(id) => NodeOrToken::Node(Node { tree, id: *id }),
            Child::Token(t) => NodeOrToken::Token(t),
        })
    }

    /// Child nodes only.
    pub fn child_nodes(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter_map(|c| match c {
            NodeOrToken::Node(n) => Some(n),
            NodeOrToken::Token(_) => None,
        })
    }

    /// Direct child tokens only.
    pub fn child_tokens(&self) -> impl Iterator<Item = &'t Token> + 't {
        self.children().filter_map(|c| match c {
            NodeOrToken::Token(t) => Some(t),
            NodeOrToken::Node(_) => None,
        })
    }

    /// This node and everything below it, preorder.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Source text covered by this node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.children_raw().iter()];
        while let Some(top) = stack.last_mut() {
            match top.next() {
                Some(Child::Token(t)) => out.push_str(&t.text),
                Some(Child::Node(id)) => {
                    stack.push(self.tree.nodes[id.index()].children.iter())
                }
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    /// Text with trivia dropped and tokens joined by single spaces.
    pub fn significant_text(&self) -> String {
        let mut ordered: Vec<&Token> = Vec::new();
        let mut stack = vec![self.children_raw().iter()];
        while let Some(top) = stack.last_mut() {
            match top.next() {
                Some(Child::Token(t)) if !t.kind.is_trivia() => ordered.push(t),
                Some(Child::Token(_)) => {}
                Some(Child::Node(id)) => {
                    stack.push(self.tree.nodes[id.index()].children.iter())
                }
                None => {
                    stack.pop();
                }
            }
        }
        ordered
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}", self.kind(), self.span())
    }
}

/// Preorder iterator over a subtree.
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let data = &self.tree.nodes[id.index()];
        for child in data.children.iter().rev() {
            if let Child::Node(child_id) = child {
                self.stack.push(*child_id);
            }
        }
        Some(Node {
            tree: self.tree,
            id,
        })
    }
}
