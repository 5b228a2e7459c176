//! The typed parse tree handed to the resolution pass.
//!
//! Nodes are stored flat and addressed by [`NodeId`]. Each node can have exactly one symbol
//! recorded against it; recording a second one is a compiler defect.

use std::fmt;
use std::sync::Arc;
use crate::errors::error::{InternalError, PassResult};
use crate::span::SourceSpan;
use crate::symbols::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A written type such as `Integer` or `Dict of (String, List of Integer)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: String,
    pub arguments: Vec<TypeRef>,
    pub span: SourceSpan,
}

impl TypeRef {
    pub fn named(name: &str, span: SourceSpan) -> Self {
        TypeRef { name: name.to_string(), arguments: Vec::new(), span }
    }

    pub fn of(name: &str, arguments: Vec<TypeRef>, span: SourceSpan) -> Self {
        TypeRef { name: name.to_string(), arguments, span }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arguments.as_slice() {
            [] => write!(f, "{}", self.name),
            [single] => write!(f, "{} of {}", self.name, single),
            many => {
                let parts: Vec<String> = many.iter().map(ToString::to_string).collect();
                write!(f, "{} of ({})", self.name, parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Character(char),
}

/// `??` and `?:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescingOp {
    NullSafe,
    Elvis,
}

/// `<?`, `<=?`, `>?` and `>=?`: yields one of the operands rather than a Boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescingComparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl CoalescingComparison {
    pub fn text(self) -> &'static str {
        match self {
            CoalescingComparison::Less => "<?",
            CoalescingComparison::LessOrEqual => "<=?",
            CoalescingComparison::Greater => ">?",
            CoalescingComparison::GreaterOrEqual => ">=?",
        }
    }
}

/// The statement and expression forms of `this(...)` and `super(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryReference {
    This,
    Super,
}

impl PrimaryReference {
    pub fn text(self) -> &'static str {
        match self {
            PrimaryReference::This => "this",
            PrimaryReference::Super => "super",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessStep {
    Field { name: String, span: SourceSpan },
    Call { name: String, arguments: Vec<NodeId>, span: SourceSpan },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    This,
    Super,
    Paren(NodeId),
    /// Function call, delegate call, or construction when `name` is a type.
    Call { name: String, type_arguments: Vec<TypeRef>, arguments: Vec<NodeId> },
    List(Vec<NodeId>),
    Dict(Vec<(NodeId, NodeId)>),
    Unary { operator: String, operand: NodeId },
    Binary { operator: String, left: NodeId, right: NodeId },
    IsSet(NodeId),
    Coalescing { op: CoalescingOp, left: NodeId, right: NodeId },
    CoalescingEquality { op: CoalescingComparison, left: NodeId, right: NodeId },
    Ternary { control: NodeId, when_true: NodeId, when_false: NodeId },
    Range { start: NodeId, end: NodeId },
    In { operand: NodeId, container: NodeId, negated: bool },
    ObjectAccess { target: NodeId, steps: Vec<AccessStep> },
    Stream(Pipeline),
    /// `this(...)` or `super(...)`: delegation to another constructor.
    ConstructorCall { reference: PrimaryReference, arguments: Vec<NodeId> },
    Switch(Box<Switch>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: SourceSpan,
    pub text: String,
    pub in_string_interpolation: bool,
}

/// `source | stage | stage ... > termination`
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub source: NodeId,
    pub stages: Vec<NodeId>,
    pub termination: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Cat(Vec<NodeId>),
    For(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamSource {
    pub kind: SourceKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageOperation {
    Filter,
    Map,
    Group,
    Join,
    Split,
    Uniq,
    Sort,
    Flatten,
    Skip,
    Head,
    Tail,
    Call,
    Async,
    Tee,
}

impl StageOperation {
    pub fn text(self) -> &'static str {
        match self {
            StageOperation::Filter => "filter",
            StageOperation::Map => "map",
            StageOperation::Group => "group",
            StageOperation::Join => "join",
            StageOperation::Split => "split",
            StageOperation::Uniq => "uniq",
            StageOperation::Sort => "sort",
            StageOperation::Flatten => "flatten",
            StageOperation::Skip => "skip",
            StageOperation::Head => "head",
            StageOperation::Tail => "tail",
            StageOperation::Call => "call",
            StageOperation::Async => "async",
            StageOperation::Tee => "tee",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamStage {
    pub operation: StageOperation,
    pub parts: Vec<NodeId>,
    /// Only `tee` uses this: an optional receiver of the stream's current values.
    pub tee_into: Option<NodeId>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminationKind {
    Collect(TypeRef),
    Into(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamTermination {
    pub kind: TerminationKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Expr(ExprNode),
    Source(StreamSource),
    Stage(StreamStage),
    Termination(StreamTermination),
}

impl Node {
    pub fn span(&self) -> &SourceSpan {
        match self {
            Node::Expr(expr) => &expr.span,
            Node::Source(source) => &source.span,
            Node::Stage(stage) => &stage.span,
            Node::Termination(termination) => &termination.span,
        }
    }
}

/// `=` assigns; every other form is an operator call on the target's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    /// `:=?` assigns only when the target is unset.
    AssignIfUnset,
    Add,
    Subtract,
    Multiply,
    Divide,
    Merge,
    Replace,
    Copy,
}

impl AssignOp {
    pub fn text(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AssignIfUnset => ":=?",
            AssignOp::Add => "+=",
            AssignOp::Subtract => "-=",
            AssignOp::Multiply => "*=",
            AssignOp::Divide => "/=",
            AssignOp::Merge => ":~:",
            AssignOp::Replace => ":^:",
            AssignOp::Copy => ":=:",
        }
    }

    /// Whether the statement gives the target a value rather than changing the one it holds.
    pub fn is_assignment(self) -> bool {
        matches!(self, AssignOp::Assign | AssignOp::AssignIfUnset)
    }
}

/// `<- rtn as T: initial` on a switch.
#[derive(Debug, Clone, PartialEq)]
pub struct Returning {
    pub name: String,
    pub declared: Option<TypeRef>,
    pub initializer: Option<NodeId>,
    pub span: SourceSpan,
}

/// `case a, b` or `case < a`. Without an operator each value is compared with `==`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub operator: Option<String>,
    pub matches: Vec<NodeId>,
    pub body: Vec<Stmt>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub control: NodeId,
    /// Required when the switch is used as an expression; it is the value produced.
    pub returning: Option<Returning>,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Vec<Stmt>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declare {
        name: String,
        declared: Option<TypeRef>,
        initializer: Option<NodeId>,
        constant: bool,
        span: SourceSpan,
    },
    Assign { target: NodeId, operator: AssignOp, value: NodeId, span: SourceSpan },
    Expression(NodeId),
    Block(Vec<Stmt>),
    Switch(Switch),
}

impl Stmt {
    pub fn assign(target: NodeId, value: NodeId, span: SourceSpan) -> Self {
        Stmt::Assign { target, operator: AssignOp::Assign, value, span }
    }
}

/// A generic used with type arguments. The operators its body assumes of each parameter are
/// only all known once every body has been resolved, so the uses are kept and checked then.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterisationUse {
    pub span: SourceSpan,
    pub generic: SymbolId,
    pub arguments: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    pub method: SymbolId,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Aggregate { symbol: SymbolId, bodies: Vec<MethodBody> },
    Function { symbol: SymbolId, body: Vec<Stmt> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseTree {
    nodes: Vec<Node>,
    recorded: Vec<Option<SymbolId>>,
    parameterisations: Vec<ParameterisationUse>,
}

impl ParseTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.recorded.push(None);
        id
    }

    pub fn add_expr(&mut self, kind: ExprKind, span: SourceSpan, text: &str) -> NodeId {
        self.push(Node::Expr(ExprNode { kind, span, text: text.to_string(), in_string_interpolation: false }))
    }

    pub fn add_source(&mut self, kind: SourceKind, span: SourceSpan) -> NodeId {
        self.push(Node::Source(StreamSource { kind, span }))
    }

    pub fn add_stage(&mut self, operation: StageOperation, parts: Vec<NodeId>, span: SourceSpan) -> NodeId {
        self.push(Node::Stage(StreamStage { operation, parts, tee_into: None, span }))
    }

    pub fn add_tee(&mut self, parts: Vec<NodeId>, tee_into: Option<NodeId>, span: SourceSpan) -> NodeId {
        self.push(Node::Stage(StreamStage { operation: StageOperation::Tee, parts, tee_into, span }))
    }

    pub fn add_termination(&mut self, kind: TerminationKind, span: SourceSpan) -> NodeId {
        self.push(Node::Termination(StreamTermination { kind, span }))
    }

    pub fn mark_interpolated(&mut self, id: NodeId) {
        if let Some(Node::Expr(expr)) = self.nodes.get_mut(id.index()) {
            expr.in_string_interpolation = true;
        }
    }

    pub fn node(&self, id: NodeId) -> PassResult<&Node> {
        self.nodes.get(id.index()).ok_or(InternalError::UnknownNode(id))
    }

    pub fn expr(&self, id: NodeId) -> PassResult<&ExprNode> {
        match self.node(id)? {
            Node::Expr(expr) => Ok(expr),
            _ => Err(InternalError::UnexpectedNode { node: id, expected: "an expression" }),
        }
    }

    pub fn source(&self, id: NodeId) -> PassResult<&StreamSource> {
        match self.node(id)? {
            Node::Source(source) => Ok(source),
            _ => Err(InternalError::UnexpectedNode { node: id, expected: "a stream source" }),
        }
    }

    pub fn stage(&self, id: NodeId) -> PassResult<&StreamStage> {
        match self.node(id)? {
            Node::Stage(stage) => Ok(stage),
            _ => Err(InternalError::UnexpectedNode { node: id, expected: "a stream stage" }),
        }
    }

    pub fn termination(&self, id: NodeId) -> PassResult<&StreamTermination> {
        match self.node(id)? {
            Node::Termination(termination) => Ok(termination),
            _ => Err(InternalError::UnexpectedNode { node: id, expected: "a stream termination" }),
        }
    }

    pub fn span(&self, id: NodeId) -> PassResult<SourceSpan> {
        Ok(self.node(id)?.span().clone())
    }

    /// Associates a symbol with a node, once.
    pub fn record(&mut self, id: NodeId, symbol: SymbolId) -> PassResult<()> {
        let slot = self.recorded.get_mut(id.index()).ok_or(InternalError::UnknownNode(id))?;
        if let Some(existing) = *slot {
            return Err(InternalError::AlreadyRecorded { node: id, existing });
        }
        *slot = Some(symbol);
        Ok(())
    }

    pub fn recorded(&self, id: NodeId) -> Option<SymbolId> {
        self.recorded.get(id.index()).copied().flatten()
    }

    pub fn note_parameterisations(&mut self, uses: impl IntoIterator<Item = ParameterisationUse>) {
        self.parameterisations.extend(uses);
    }

    /// Every generic use made while resolving this tree.
    pub fn parameterisations(&self) -> &[ParameterisationUse] {
        &self.parameterisations
    }

    pub fn expression_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate()
            .filter(|(_, node)| matches!(node, Node::Expr(_)))
            .map(|(index, _)| NodeId(index as u32))
    }

    pub fn identifier(&mut self, name: &str, span: SourceSpan) -> NodeId {
        self.add_expr(ExprKind::Identifier(name.to_string()), span, name)
    }

    pub fn literal(&mut self, literal: Literal, span: SourceSpan) -> NodeId {
        let text = match &literal {
            Literal::Integer(value) => value.to_string(),
            Literal::Float(value) => value.to_string(),
            Literal::String(value) => format!("\"{value}\""),
            Literal::Boolean(value) => value.to_string(),
            Literal::Character(value) => format!("'{value}'"),
        };
        self.add_expr(ExprKind::Literal(literal), span, &text)
    }

    pub fn binary(&mut self, operator: &str, left: NodeId, right: NodeId, span: SourceSpan) -> NodeId {
        let text = format!("{} {} {}", self.text_of(left), operator, self.text_of(right));
        self.add_expr(ExprKind::Binary { operator: operator.to_string(), left, right }, span, &text)
    }

    pub fn unary(&mut self, operator: &str, operand: NodeId, span: SourceSpan) -> NodeId {
        let text = format!("{}{}", operator, self.text_of(operand));
        self.add_expr(ExprKind::Unary { operator: operator.to_string(), operand }, span, &text)
    }

    pub fn call(&mut self, name: &str, arguments: Vec<NodeId>, span: SourceSpan) -> NodeId {
        self.add_expr(ExprKind::Call { name: name.to_string(), type_arguments: Vec::new(), arguments }, span, &format!("{name}()"))
    }

    fn text_of(&self, id: NodeId) -> &str {
        match self.nodes.get(id.index()) {
            Some(Node::Expr(expr)) => &expr.text,
            _ => "?",
        }
    }
}

/// One source file: its declarations and the parse tree their bodies point into.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: Arc<str>,
    pub declarations: Vec<Declaration>,
    pub tree: ParseTree,
}

impl SourceFile {
    pub fn new(name: &str) -> Self {
        SourceFile { name: Arc::from(name), declarations: Vec::new(), tree: ParseTree::new() }
    }

    pub fn span(&self, line: usize, column: usize) -> SourceSpan {
        SourceSpan::new(self.name.clone(), line, column)
    }
}
