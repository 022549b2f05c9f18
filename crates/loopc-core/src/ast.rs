//! Abstract syntax tree for the loop language.
//!
//! Every node carries its own [`SourceSpan`]; [`Identifier`] additionally
//! carries the two resolution slots the resolve pass fills in
//! (`ref_type`/`ref_index`) so the emitter never has to repeat name lookup.

use serde::{Deserialize, Serialize};

pub use crate::span::SourceSpan;

/// Where a name resolves to, set by the resolve pass (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefType {
    Global,
    Export,
    Local,
    Upvalue,
}

/// A name reference. `ref_type`/`ref_index` start `None` and are filled in
/// by the resolver; the emitter requires them to be `Some` and treats a
/// lingering `None` as an internal bug, not a user-facing error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub span: SourceSpan,
    pub name: String,
    pub ref_type: Option<RefType>,
    pub ref_index: Option<usize>,
}

impl Identifier {
    pub fn new(span: SourceSpan, name: impl Into<String>) -> Self {
        Identifier {
            span,
            name: name.into(),
            ref_type: None,
            ref_index: None,
        }
    }
}

/// One entry of a closure's upvalue list, built by the resolver and
/// consumed by the `BuildClosure` emission (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpvalueDescriptor {
    pub index: usize,
    pub is_local: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOpType {
    Plus,
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOpType {
    LogicalOr,
    LogicalAnd,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryPair {
    pub span: SourceSpan,
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    IntegerLiteral {
        span: SourceSpan,
        value: i64,
    },
    BoolLiteral {
        span: SourceSpan,
        value: bool,
    },
    NullLiteral {
        span: SourceSpan,
    },
    StringLiteral {
        span: SourceSpan,
        value: String,
    },
    VarExpr {
        name: Identifier,
    },
    Assignment {
        span: SourceSpan,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    UnaryOp {
        span: SourceSpan,
        op: UnaryOpType,
        operand: Box<Expr>,
    },
    BinaryOp {
        span: SourceSpan,
        op: BinaryOpType,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    CallExpr {
        span: SourceSpan,
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    GetAttrExpr {
        span: SourceSpan,
        object: Box<Expr>,
        attr: Identifier,
    },
    GetItemExpr {
        span: SourceSpan,
        object: Box<Expr>,
        index: Vec<Expr>,
    },
    DictionaryLiteral {
        span: SourceSpan,
        entries: Vec<DictionaryPair>,
    },
    ListLiteral {
        span: SourceSpan,
        elements: Vec<Expr>,
    },
}

impl Expr {
    pub fn span(&self) -> SourceSpan {
        match self {
            Expr::IntegerLiteral { span, .. }
            | Expr::BoolLiteral { span, .. }
            | Expr::NullLiteral { span }
            | Expr::StringLiteral { span, .. }
            | Expr::Assignment { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::CallExpr { span, .. }
            | Expr::GetAttrExpr { span, .. }
            | Expr::GetItemExpr { span, .. }
            | Expr::DictionaryLiteral { span, .. }
            | Expr::ListLiteral { span, .. } => *span,
            Expr::VarExpr { name } => name.span,
        }
    }
}

/// A binding pattern, used by `VarDecl`/`LetDecl`/`ForInStmt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Identifier { name: Identifier },
    List { span: SourceSpan, patterns: Vec<Pattern> },
}

impl Pattern {
    pub fn span(&self) -> SourceSpan {
        match self {
            Pattern::Identifier { name } => name.span,
            Pattern::List { span, .. } => *span,
        }
    }
}

/// A single method inside a `ClassDecl`. Not a `Stmt` in its own right,
/// matching the original's separation of `Method` from `FuncDecl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub span: SourceSpan,
    pub name: Identifier,
    pub args: Vec<Identifier>,
    pub body: Box<Stmt>,
    /// Filled in by the resolver once the method body is resolved, same as
    /// `FuncDecl::upvalues`.
    pub upvalues: Vec<UpvalueDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    ImportAsStmt {
        span: SourceSpan,
        path: String,
        name: Identifier,
    },
    ImportFromStmt {
        span: SourceSpan,
        names: Vec<Identifier>,
        path: String,
    },
    PrintStmt {
        span: SourceSpan,
        expr: Expr,
    },
    ExprStmt {
        span: SourceSpan,
        expr: Expr,
    },
    VarDecl {
        span: SourceSpan,
        export: bool,
        pattern: Pattern,
        value: Option<Expr>,
    },
    LetDecl {
        span: SourceSpan,
        export: bool,
        pattern: Pattern,
        value: Option<Expr>,
    },
    BlockStmt {
        span: SourceSpan,
        stmts: Vec<Stmt>,
        /// Per-local captured flags, filled in by the resolver when the
        /// enclosing scope is popped (§4.3).
        locals: Vec<bool>,
    },
    IfStmt {
        span: SourceSpan,
        condition: Expr,
        then_arm: Box<Stmt>,
        else_arm: Option<Box<Stmt>>,
    },
    WhileStmt {
        span: SourceSpan,
        condition: Expr,
        block: Box<Stmt>,
    },
    FuncDecl {
        span: SourceSpan,
        export: bool,
        name: Identifier,
        args: Vec<Identifier>,
        body: Box<Stmt>,
        /// Filled in by the resolver once the function body is resolved.
        upvalues: Vec<UpvalueDescriptor>,
    },
    ReturnStmt {
        span: SourceSpan,
        value: Option<Expr>,
    },
    ClassDecl {
        span: SourceSpan,
        export: bool,
        name: Identifier,
        parent: Option<Identifier>,
        methods: Vec<Method>,
    },
    TryStmt {
        span: SourceSpan,
        try_block: Box<Stmt>,
        catch_name: Identifier,
        catch_block: Box<Stmt>,
    },
    ThrowStmt {
        span: SourceSpan,
        expr: Expr,
    },
    ForInStmt {
        span: SourceSpan,
        pattern: Pattern,
        expr: Expr,
        body: Box<Stmt>,
        /// Hidden local slots the resolver allocates alongside `pattern`
        /// to drive the length/`GetItem` iteration protocol (§4.5) — the
        /// iterable itself and the running index.
        iter_index: Option<usize>,
        counter_index: Option<usize>,
        /// Captured flags for `[iter, counter, pattern]`, in that
        /// declaration order, filled in when the loop's scope is popped.
        locals: Vec<bool>,
    },
    BreakStmt {
        span: SourceSpan,
    },
    ContinueStmt {
        span: SourceSpan,
    },
}

impl Stmt {
    pub fn span(&self) -> SourceSpan {
        match self {
            Stmt::ImportAsStmt { span, .. }
            | Stmt::ImportFromStmt { span, .. }
            | Stmt::PrintStmt { span, .. }
            | Stmt::ExprStmt { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::LetDecl { span, .. }
            | Stmt::BlockStmt { span, .. }
            | Stmt::IfStmt { span, .. }
            | Stmt::WhileStmt { span, .. }
            | Stmt::FuncDecl { span, .. }
            | Stmt::ReturnStmt { span, .. }
            | Stmt::ClassDecl { span, .. }
            | Stmt::TryStmt { span, .. }
            | Stmt::ThrowStmt { span, .. }
            | Stmt::ForInStmt { span, .. }
            | Stmt::BreakStmt { span }
            | Stmt::ContinueStmt { span } => *span,
        }
    }
}

/// The top-level compilation unit: a flat statement list plus the global
/// slot count the resolver computes once resolution finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub statements: Vec<Stmt>,
    pub globals_count: usize,
}

impl Module {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Module {
            statements,
            globals_count: 0,
        }
    }
}
