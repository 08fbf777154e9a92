//! Deferred constructs. The first pass over the AST never emits commands;
//! it produces a tree of [`Op`]s in which everything that must wait for
//! full name binding is wrapped in a [`Construct`]. The second pass walks
//! that tree and performs all evaluation and emission.

use crate::ast::{BinOp, CmpOp, UnOp};
use crate::value::{BlockId, Value};

/// What a construct does when the second pass reaches it.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Re-enter a block construct (module, if, while, for, function,
    /// namespace, range) and lower it in place.
    Reference,
    /// Emit the creation command for a declared resource.
    Declare,
    /// `target = args[0]`.
    Assign,
    /// `target op= args[0]`, in place.
    AugAssign(BinOp),
    /// Binary arithmetic over `args[0] op args[1]`.
    Bin(BinOp),
    /// Unary arithmetic over `args[0]`.
    Unary(UnOp),
    /// Comparison chain: `args` are the operands, `ops` the operators
    /// between each adjacent pair.
    Compare(Vec<CmpOp>),
    /// Conjunction of all `args`.
    AllOf,
    /// Disjunction of any `args`.
    AnyOf,
    /// Call `target` with `args`.
    Call,
    /// Assign `args[0]` into the return slot of the enclosing function.
    Return,
}

/// Construct target: a block's recorded state, a value produced by another
/// op, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    None,
    Block(BlockId),
    Op(Box<Op>),
}

/// One step of lowering work.
#[derive(Debug, Clone, PartialEq)]
pub struct Construct {
    pub method: Method,
    pub target: Target,
    pub args: Vec<Op>,
}

/// A node in the deferred-operation tree. `Ready` values pass through
/// evaluation unchanged, except that an unresolved name placeholder gets
/// its late lookup. `Seq` splices its children into the enclosing frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Ready(Value),
    Construct(Box<Construct>),
    Seq(Vec<Op>),
}

impl Op {
    pub fn construct(method: Method, target: Target, args: Vec<Op>) -> Op {
        Op::Construct(Box::new(Construct { method, target, args }))
    }

    pub fn reference(block: BlockId, args: Vec<Op>) -> Op {
        Op::construct(Method::Reference, Target::Block(block), args)
    }

    pub fn none() -> Op {
        Op::Ready(Value::None)
    }
}
