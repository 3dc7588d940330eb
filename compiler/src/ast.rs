// AST node types for .src source files.
//
// Every node carries a `SimpleSpan` for error reporting in the analyzer.
// Spans are byte offsets into the file the declaration came from; the file
// itself is tracked on `SourceAst`.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

use crate::id::FileId;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

// ── Root ──

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAst {
    pub file: FileId,
    pub decls: Vec<Decl>,
}

// ── Declarations ──

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub public: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Fun(FunDecl),
    Val(ValDecl),
}

impl Decl {
    pub fn name(&self) -> &Ident {
        match &self.kind {
            DeclKind::Fun(f) => &f.name,
            DeclKind::Val(v) => &v.name,
        }
    }
}

/// `fun NAME(PARAMS)[: TYPE] { STMT* }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    /// `None` means `Unit`.
    pub ret: Option<TypeRef>,
    pub body: Vec<Stmt>,
    pub body_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeRef,
}

/// `val NAME: TYPE = EXPR;`
#[derive(Debug, Clone, PartialEq)]
pub struct ValDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub init: Expr,
}

/// A type name as written (`Int`, `Bool`, `Unit`); validated by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: String,
    pub span: Span,
}

// ── Statements ──

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let { name: Ident, value: Expr },
    Print(Expr),
    Return(Option<Expr>),
    Expr(Expr),
}

// ── Expressions ──

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    Name(Ident),
    Call { callee: Ident, args: Vec<Expr> },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Eq,
    Lt,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Eq => "==",
            BinOp::Lt => "<",
        }
    }

    /// Mnemonic used in IR dumps and bitcode.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Eq => "eq",
            BinOp::Lt => "lt",
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<BinOp> {
        Some(match s {
            "add" => BinOp::Add,
            "sub" => BinOp::Sub,
            "mul" => BinOp::Mul,
            "eq" => BinOp::Eq,
            "lt" => BinOp::Lt,
            _ => return None,
        })
    }

    /// Evaluate on integer operands with wrapping arithmetic; comparisons
    /// yield 0 or 1.
    pub fn eval(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            BinOp::Add => lhs.wrapping_add(rhs),
            BinOp::Sub => lhs.wrapping_sub(rhs),
            BinOp::Mul => lhs.wrapping_mul(rhs),
            BinOp::Eq => i64::from(lhs == rhs),
            BinOp::Lt => i64::from(lhs < rhs),
        }
    }
}

// ── Identifier ──

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}
