//! The compiler value: owns the scope arena, emitter, name table, and
//! block states for one compilation. Two passes over one module: analysis
//! (see `analyze`) builds the deferred-operation tree without emitting,
//! then the reference pass (see `reference`) evaluates it and emits every
//! command. All state is owned here, so compilations are independent.

use crate::blocks::BlockArena;
use crate::builtins;
use crate::config::Config;
use crate::emit::{CodeUnit, EmitEnv, Emitter};
use crate::error::CompileError;
use crate::ast::Module;
use crate::names::NameTable;
use crate::path::AttributePath;
use crate::scope::ScopeArena;
use crate::value::BlockId;

/// The finished product: every code unit of the pack, ready for the
/// codegen layer to lay out on disk.
#[derive(Debug)]
pub struct CompiledPack {
    pub project: String,
    pub units: Vec<CodeUnit>,
}

pub struct Compiler {
    pub(crate) config: Config,
    pub(crate) scope: ScopeArena,
    pub(crate) emitter: Emitter,
    pub(crate) names: NameTable,
    pub(crate) blocks: BlockArena,
    /// Emission-scope name stack; maintained identically by both passes so
    /// names allocated in the first land in the file entered by the second.
    pub(crate) prefix: Vec<String>,
    /// Enclosing function constructs, innermost last.
    pub(crate) func_stack: Vec<BlockId>,
}

impl Compiler {
    pub fn new(config: Config) -> Result<Self, CompileError> {
        let mut scope = ScopeArena::new();
        builtins::install(&mut scope)?;
        let names = NameTable::new(&config.project_name);
        Ok(Compiler {
            config,
            scope,
            emitter: Emitter::new(),
            names,
            blocks: BlockArena::new(),
            prefix: Vec::new(),
            func_stack: Vec::new(),
        })
    }

    /// Compile one merged module into a pack. Consumes the compiler; any
    /// error unwinds the whole compilation with no partial output.
    pub fn compile(mut self, module: &Module) -> Result<CompiledPack, CompileError> {
        let root = self.formalize_module(module)?;
        self.eval_op(root)?;
        Ok(CompiledPack {
            project: self.config.project_name,
            units: self.emitter.into_units(),
        })
    }

    pub(crate) fn env(&mut self) -> EmitEnv<'_> {
        EmitEnv {
            emitter: &mut self.emitter,
            names: &mut self.names,
            prefix: &self.prefix,
        }
    }

    /// Attribute under the current emission prefix.
    pub(crate) fn local_attr(&self, name: &str) -> AttributePath {
        AttributePath::new(name).prefixed(&self.prefix)
    }
}

/// Convenience wrapper: compile `module` under `config` in one call.
pub fn compile(config: Config, module: &Module) -> Result<CompiledPack, CompileError> {
    Compiler::new(config)?.compile(module)
}
