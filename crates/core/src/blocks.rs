//! Recorded state for block constructs. The first pass allocates every
//! name a block will need (files, scopes, synthetic scores) and parks it
//! here; the second pass re-enters the block through its [`BlockId`] and
//! emits against the recorded names.

use crate::emit::UnitId;
use crate::path::AttributePath;
use crate::scope::ScopeId;
use crate::value::{BlockId, ScoreHandle};

#[derive(Debug)]
pub struct ModuleBlock {
    pub unit: UnitId,
    pub scope: ScopeId,
}

#[derive(Debug)]
pub struct IfBlock {
    pub unit: UnitId,
    pub then_scope: ScopeId,
    /// Present only when an else arm exists.
    pub else_scope: Option<ScopeId>,
    pub then_prefix: String,
    pub else_prefix: Option<String>,
    /// Mutual-exclusion flag, allocated only when an else arm exists.
    pub check_attr: Option<AttributePath>,
}

/// Body state shared by `while` and classic `for`.
#[derive(Debug)]
pub struct LoopBlock {
    pub unit: UnitId,
    pub scope: ScopeId,
    pub prefix: String,
}

#[derive(Debug)]
pub struct ForInBlock {
    pub unit: UnitId,
    pub scope: ScopeId,
    pub prefix: String,
    /// The user-visible loop variable, declared in the body scope.
    pub var: ScoreHandle,
}

/// An inclusive integer range. Bounds and the iteration item are only
/// known once the second pass evaluates the range expression.
#[derive(Debug)]
pub struct RangeBlock {
    pub unit: UnitId,
    pub item: Option<ScoreHandle>,
    pub end: Option<i64>,
}

#[derive(Debug)]
pub struct FunctionBlock {
    pub unit: UnitId,
    pub scope: ScopeId,
    pub name: String,
    pub params: Vec<ScoreHandle>,
    /// Return slot, present when the signature declares one.
    pub ret: Option<ScoreHandle>,
}

#[derive(Debug)]
pub struct SpaceBlock {
    pub unit: UnitId,
    pub scope: ScopeId,
    pub name: String,
}

#[derive(Debug)]
pub enum BlockState {
    Module(ModuleBlock),
    If(IfBlock),
    While(LoopBlock),
    For(LoopBlock),
    ForIn(ForInBlock),
    Range(RangeBlock),
    Function(FunctionBlock),
    Space(SpaceBlock),
}

/// Arena of block states, indexed by [`BlockId`].
#[derive(Debug, Default)]
pub struct BlockArena {
    blocks: Vec<BlockState>,
}

impl BlockArena {
    pub fn new() -> Self {
        BlockArena::default()
    }

    pub fn alloc(&mut self, state: BlockState) -> BlockId {
        self.blocks.push(state);
        BlockId(self.blocks.len() - 1)
    }

    pub fn get(&self, id: BlockId) -> &BlockState {
        &self.blocks[id.0]
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut BlockState {
        &mut self.blocks[id.0]
    }
}
