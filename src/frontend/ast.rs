//! Abstract Syntax Tree definitions for Kestrel
//!
//! Every node category is a closed sum type, so the checker matches exhaustively and a new node kind cannot be
//! silently ignored. Nodes carry byte spans; leaf spans are `start + text.len()`, composite spans merge their
//! children.
//!
//! Declarations refer to their symbols by arena handle ([`EntityId`]), never by pointer, so the tree can be shared
//! read-only between worker threads.

use std::fmt;

use crate::frontend::symbols::EntityId;
use kestrel_core::lang::operators::OperatorId;

/// Byte offset into the source buffer.
pub type Pos = usize;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Span of a leaf whose source text has `len` bytes.
    pub fn leaf(start: Pos, len: usize) -> Self {
        Self { start, end: start + len }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// Index of a top-level item in [`Program::items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parsed source buffer: one item per top-level statement, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Spanned<TopLevel>>,
}

impl Program {
    /// Look up a top-level declaration by id.
    pub fn decl(&self, id: DeclId) -> Option<&Spanned<TopLevel>> {
        self.items.get(id.index())
    }

    /// Iterate over well-formed top-level declarations with their ids.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.items.iter().enumerate().filter_map(|(i, item)| match &item.node {
            TopLevel::Decl(decl) => Some((DeclId(i as u32), decl)),
            TopLevel::Invalid(_) => None,
        })
    }
}

/// Top-level statements. Only declarations are legal at this level.
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Decl(Decl),
    /// Anything else, preserving the offending source text.
    Invalid(String),
}

// ============================================================================
// Statements
// ============================================================================

/// `name := value` or `name :: value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: Spanned<Ident>,
    pub entity: EntityId,
    /// `true` for `::`. Decided by the operator alone, never by the value.
    pub constant: bool,
    pub value: Spanned<Expr>,
    /// Set when this declaration collided with an earlier one in the same scope.
    pub redeclares: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Spanned<Ident>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Invalid,
    Decl(Decl),
    Assign(Assign),
    Return(Spanned<Expr>),
    Block(Block),
    Expr(Spanned<Expr>),
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Invalid,
    Ident(Ident),
    Literal(Literal),
    Unary(UnaryOp, Box<Spanned<Expr>>),
    Binary(Box<Spanned<Expr>>, BinaryOp, Box<Spanned<Expr>>),
    Ternary {
        cond: Box<Spanned<Expr>>,
        then_branch: Box<Spanned<Expr>>,
        else_branch: Box<Spanned<Expr>>,
    },
    Paren(Box<Spanned<Expr>>),
    Function(FunctionLit),
}

/// Numeric literal text exactly as scanned (prefixes and `_` separators included).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(String),
    Float(String),
}

/// `fn(a, b) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLit {
    pub params: Vec<Param>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Spanned<Ident>,
    pub entity: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Level 1
    Or,
    // Level 2
    And,
    // Level 3
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Level 4
    Add,
    Sub,
    BitOr,
    BitXor,
    // Level 5
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
}

impl BinaryOp {
    /// Map a binary operator token to its AST operator.
    pub fn from_operator(id: OperatorId) -> Option<Self> {
        Some(match id {
            OperatorId::OrOr => BinaryOp::Or,
            OperatorId::AndAnd => BinaryOp::And,
            OperatorId::EqEq => BinaryOp::Eq,
            OperatorId::NotEq => BinaryOp::NotEq,
            OperatorId::Lt => BinaryOp::Lt,
            OperatorId::LtEq => BinaryOp::LtEq,
            OperatorId::Gt => BinaryOp::Gt,
            OperatorId::GtEq => BinaryOp::GtEq,
            OperatorId::Plus => BinaryOp::Add,
            OperatorId::Minus => BinaryOp::Sub,
            OperatorId::Pipe => BinaryOp::BitOr,
            OperatorId::Caret => BinaryOp::BitXor,
            OperatorId::Star => BinaryOp::Mul,
            OperatorId::Slash => BinaryOp::Div,
            OperatorId::Percent => BinaryOp::Rem,
            OperatorId::Shl => BinaryOp::Shl,
            OperatorId::Shr => BinaryOp::Shr,
            OperatorId::Amp => BinaryOp::BitAnd,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

// ============================================================================
// S-expression dumps (`--parse`, tests)
// ============================================================================

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Invalid => write!(f, "<invalid>"),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Literal(Literal::Int(text) | Literal::Float(text)) => write!(f, "{}", text),
            Expr::Unary(op, operand) => write!(f, "({} {})", op, operand),
            Expr::Binary(lhs, op, rhs) => write!(f, "({} {} {})", op, lhs, rhs),
            Expr::Ternary {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "(? {} {} {})", cond, then_branch, else_branch),
            Expr::Paren(inner) => write!(f, "(paren {})", inner),
            Expr::Function(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.name.node.as_str()).collect();
                write!(f, "(fn ({}) {})", params.join(" "), func.body)
            }
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stmts: Vec<String> = self.stmts.iter().map(|s| s.to_string()).collect();
        write!(f, "{{{}}}", stmts.join("; "))
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.constant { "::" } else { ":=" };
        write!(f, "({} {} {})", op, self.name, self.value)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Invalid => write!(f, "<invalid>"),
            Stmt::Decl(decl) => fmt::Display::fmt(decl, f),
            Stmt::Assign(assign) => write!(f, "(= {} {})", assign.target, assign.value),
            Stmt::Return(value) => write!(f, "(return {})", value),
            Stmt::Block(block) => fmt::Display::fmt(block, f),
            Stmt::Expr(expr) => fmt::Display::fmt(expr, f),
        }
    }
}

impl fmt::Display for TopLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopLevel::Decl(decl) => fmt::Display::fmt(decl, f),
            TopLevel::Invalid(text) => write!(f, "<invalid {:?}>", text),
        }
    }
}

/// One item per line.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}
