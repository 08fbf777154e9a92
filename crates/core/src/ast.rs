//! Input AST for the Sapling backend.
//!
//! The tokenizer and parser are external collaborators: they hand the
//! compiler an immutable tree of these nodes (in practice as serde JSON,
//! the same way the codegen-side crates consume interchange bundles). The
//! backend never parses source text itself.
//!
//! Node variants mirror the statements and expressions the analyzer
//! dispatches on; every composite node exposes its children in source
//! order so the analysis walk stays left-to-right depth-first.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Provenance
// ──────────────────────────────────────────────

/// Source position of a leaf token, carried through for error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Plus,
    Minus,
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    /// Possibly-dotted name reference, e.g. `x` or `ns.counter`.
    Name {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prov: Option<Provenance>,
    },
    /// Integer literal.
    Int { value: i64 },
    /// String literal (quotes already stripped by the parser).
    Str { value: String },
    /// Unary `+e` / `-e`.
    Unary { op: UnOp, operand: Box<Expr> },
    /// Binary arithmetic `a op b`.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Comparison chain `a < b <= c`: N operands, N-1 operators.
    Compare { operands: Vec<Expr>, ops: Vec<CmpOp> },
    /// Logical conjunction of all terms.
    AllOf { terms: Vec<Expr> },
    /// Logical disjunction of any term.
    AnyOf { terms: Vec<Expr> },
    /// Call expression: `target(args...)`.
    Call { target: Box<Expr>, args: Vec<Expr> },
    /// Inclusive integer range `start..end`, usable as a for=in iterable.
    Range { start: Box<Expr>, end: Box<Expr> },
}

impl Expr {
    pub fn name(path: &str) -> Expr {
        Expr::Name {
            path: path.to_owned(),
            prov: None,
        }
    }

    pub fn int(value: i64) -> Expr {
        Expr::Int { value }
    }

    pub fn str(value: &str) -> Expr {
        Expr::Str {
            value: value.to_owned(),
        }
    }
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

/// A function parameter: `name: data_type args...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub target: String,
    pub data_type: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// A declared function return slot: `-> data_type args...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSpec {
    pub data_type: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// Visibility of one namespace section block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    Public,
    Default,
}

/// One section of a namespace body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceBlock {
    pub visibility: Visibility,
    pub body: Vec<Stmt>,
}

// ──────────────────────────────────────────────
// Statements
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    /// Type annotation: `x: score args...` (declares without assigning).
    Annotation {
        targets: Vec<String>,
        data_type: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Plain assignment: `a, b = x, y`. Targets and values zip pairwise.
    Assignment { targets: Vec<Expr>, values: Vec<Expr> },
    /// Combined annotation + assignment: `x: score = 5`.
    AnnAssignment {
        targets: Vec<String>,
        data_type: String,
        #[serde(default)]
        args: Vec<Expr>,
        values: Vec<Expr>,
    },
    /// Augmented assignment: `x += e` and friends.
    AugAssignment {
        op: BinOp,
        targets: Vec<Expr>,
        values: Vec<Expr>,
    },
    /// Expression statement (typically a call such as `print(...)`).
    Expr { value: Expr },
    /// `if condition: then else: or_else` -- `or_else` may be empty.
    If {
        condition: Expr,
        then: Vec<Stmt>,
        #[serde(default)]
        or_else: Vec<Stmt>,
    },
    /// `while condition: body`.
    While { condition: Expr, body: Vec<Stmt> },
    /// Classic three-part loop: `for init; condition; step: body`.
    For {
        init: Box<Stmt>,
        condition: Expr,
        step: Box<Stmt>,
        body: Vec<Stmt>,
    },
    /// Iterator loop over an iterable value: `for var in iter: body`.
    ForIn {
        var: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    /// Function declaration.
    FuncDef {
        name: String,
        #[serde(default)]
        params: Vec<Param>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        returns: Option<ReturnSpec>,
        body: Vec<Stmt>,
    },
    /// Namespace declaration with visibility-sectioned blocks.
    NamespaceDef {
        name: String,
        blocks: Vec<NamespaceBlock>,
    },
    /// `return e` inside a function body.
    Return { value: Expr },
}

/// A whole compilation unit: the ordered top-level statements of the entry
/// module. Import merging happens in the external frontend; the backend
/// sees one already-merged module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}
