//! Syntax tree of a btrpsl script.
//!
//! Produced by the parser and walked by the evaluator. Every node carries
//! the position of its first token. No resolution is done here.

// ──────────────────────────────────────────────
// Positions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Pos { line, column }
    }
}

// ──────────────────────────────────────────────
// Statements
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// A `key` or `key=value` option of a template instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOption {
    pub key: String,
    pub value: Option<Expr>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// namespace a.b.c;
    Namespace { name: String, pos: Pos },
    /// import a.b; or import a.*; -- `id` keeps the trailing `.*`
    Import { id: String, pos: Pos },
    /// export $a, $b to ns, ns2.*; -- `scopes` is None without a `to` clause
    Export {
        targets: Vec<Expr>,
        scopes: Option<Vec<String>>,
        pos: Pos,
    },
    /// VM[1..3] : tiny<clone, boot=7>;
    TemplateAssign {
        target: Expr,
        template: String,
        options: Vec<TemplateOption>,
        pos: Pos,
    },
    /// $x = e; $x += e; ...
    Assign {
        label: String,
        op: AssignOp,
        value: Expr,
        pos: Pos,
    },
    /// [>>]keyword(args);
    Constraint {
        keyword: String,
        args: Vec<Expr>,
        continuous: bool,
        pos: Pos,
    },
    For {
        var: String,
        collection: Expr,
        body: Block,
        pos: Pos,
    },
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
        pos: Pos,
    },
    Block(Block),
}

impl Stmt {
    pub fn pos(&self) -> Pos {
        match self {
            Stmt::Namespace { pos, .. }
            | Stmt::Import { pos, .. }
            | Stmt::Export { pos, .. }
            | Stmt::TemplateAssign { pos, .. }
            | Stmt::Assign { pos, .. }
            | Stmt::Constraint { pos, .. }
            | Stmt::For { pos, .. }
            | Stmt::If { pos, .. } => *pos,
            Stmt::Block(b) => b.pos,
        }
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Size,
    Neg,
}

/// What the candidates of an enumeration denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    Var,
    Vm,
    Node,
}

/// One comma-separated item between brackets.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeItem {
    Single(Expr),
    Interval { from: Expr, to: Expr },
}

/// `head[R1, R2, ...]tail`, brackets stripped. For nodes and variables the
/// head keeps its sigil.
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    pub kind: EnumKind,
    pub head: String,
    pub items: Vec<RangeItem>,
    pub tail: String,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Raw literal text, validated on evaluation
    Number { raw: String, pos: Pos },
    Str { value: String, pos: Pos },
    Var { label: String, pos: Pos },
    /// A VM identifier, relative to the script namespace
    Vm { name: String, pos: Pos },
    /// A node name, `@` included
    Node { name: String, pos: Pos },
    Enum(Enumeration),
    SetLiteral { items: Vec<Expr>, pos: Pos },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        pos: Pos,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: Pos,
    },
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Number { pos, .. }
            | Expr::Str { pos, .. }
            | Expr::Var { pos, .. }
            | Expr::Vm { pos, .. }
            | Expr::Node { pos, .. }
            | Expr::SetLiteral { pos, .. }
            | Expr::Binary { pos, .. }
            | Expr::Unary { pos, .. } => *pos,
            Expr::Enum(e) => e.pos,
        }
    }
}
